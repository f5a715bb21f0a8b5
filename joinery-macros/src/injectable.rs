//! `#[derive(Injectable)]` implementation.

use darling::util::parse_expr::preserve_str_literal;
use darling::{FromDeriveInput, FromField, ast};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Expr, GenericArgument, Ident, Path, PathArguments, Type, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: Ident,
    generics: syn::Generics,
    data: ast::Data<(), InjectField>,
    id: Option<String>,
    #[darling(rename = "crate")]
    krate: Option<Path>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default, with = preserve_str_literal, map = Some)]
    default: Option<Expr>,
    id: Option<String>,
    #[darling(default)]
    primitive: bool,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let parsed = match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(err) => return err.write_errors().into(),
    };

    match expand(parsed) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand(input: InjectableInput) -> darling::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(darling::Error::custom(
            "Injectable cannot be derived for generic types; write the blueprint by hand",
        )
        .with_span(&input.generics));
    }

    let krate = input.krate.unwrap_or_else(|| syn::parse_quote!(::joinery));
    let ident = &input.ident;

    let blueprint = match &input.id {
        Some(id) => quote! { #krate::Blueprint::new(#id) },
        None => quote! { #krate::Blueprint::of::<#ident>() },
    };

    let fields = input
        .data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

    let mut errors = darling::Error::accumulator();
    let mut params = Vec::new();
    let mut inits = Vec::new();

    for field in &fields.fields {
        let Some(name) = &field.ident else { continue };
        if let Some((param, init)) = errors.handle(field_tokens(&krate, name, field)) {
            params.push(param);
            inits.push(init);
        }
    }
    errors.finish()?;

    let construct = if fields.style.is_unit() {
        quote! { |_| ::core::result::Result::Ok(#ident) }
    } else {
        quote! { |args| ::core::result::Result::Ok(#ident { #(#inits,)* }) }
    };

    Ok(quote! {
        impl #krate::Injectable for #ident {
            fn blueprint() -> #krate::Blueprint {
                #blueprint
                    #(.param(#params))*
                    .construct(#construct)
            }
        }

        #krate::__private::inventory::submit! {
            #krate::BlueprintRegistration::new(<#ident as #krate::Injectable>::blueprint)
        }
    })
}

/// Parameter declaration and constructor initializer for one field.
fn field_tokens(krate: &Path, name: &Ident, field: &InjectField) -> darling::Result<(TokenStream2, TokenStream2)> {
    let key = name.to_string();
    let ty = &field.ty;
    let inner = if field.primitive { None } else { arc_inner(ty) };

    match inner {
        Some(inner) => {
            let declared = match &field.id {
                Some(id) => quote! { #id },
                None => quote! { #krate::Identifier::of::<#inner>() },
            };
            let default = field.default.as_ref().map(|expr| {
                quote! { .default_instance({ let value: #ty = #expr; value }) }
            });
            Ok((
                quote! { #krate::Param::typed(#key, #declared) #default },
                quote! { #name: args.arc::<#inner>(#key)? },
            ))
        }
        None => {
            if field.id.is_some() {
                return Err(darling::Error::custom("`id` only applies to `Arc<_>` fields").with_span(name));
            }
            let default = field.default.as_ref().map(|expr| {
                let expr = default_expr(expr);
                quote! { .default_value::<#ty>({ let value: #ty = #expr; value }) }
            });
            Ok((
                quote! { #krate::Param::primitive(#key) #default },
                quote! { #name: args.value::<#ty>(#key)? },
            ))
        }
    }
}

/// String literals convert into the field type, so `default = "localhost"`
/// works for `String` fields.
fn default_expr(expr: &Expr) -> TokenStream2 {
    match expr {
        Expr::Lit(syn::ExprLit { lit: syn::Lit::Str(_), .. }) => quote! { ::core::convert::Into::into(#expr) },
        _ => quote! { #expr },
    }
}

/// `X` for a field typed `Arc<X>` (any path ending in `Arc`).
fn arc_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else { return None };
    if path.qself.is_some() {
        return None;
    }

    let last = path.path.segments.last()?;
    if last.ident != "Arc" {
        return None;
    }

    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };

    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: TokenStream2) -> InjectableInput {
        let input: DeriveInput = syn::parse2(tokens).unwrap();
        InjectableInput::from_derive_input(&input).unwrap()
    }

    #[test]
    fn arc_fields_are_typed() {
        let ty: Type = syn::parse_quote!(std::sync::Arc<Logger>);
        let inner = arc_inner(&ty).unwrap();
        assert_eq!(quote!(#inner).to_string(), "Logger");

        let ty: Type = syn::parse_quote!(u64);
        assert!(arc_inner(&ty).is_none());

        let ty: Type = syn::parse_quote!(Option<Arc<Logger>>);
        assert!(arc_inner(&ty).is_none());
    }

    #[test]
    fn attributes_parsed() {
        let input = parse(quote! {
            #[inject(id = "svc", crate = "crate::di")]
            struct Service {
                logger: Arc<Logger>,
                #[inject(default = 30)]
                timeout: u64,
                #[inject(primitive)]
                raw: Arc<String>,
            }
        });

        assert_eq!(input.id.as_deref(), Some("svc"));
        assert!(input.krate.is_some());

        let fields = input.data.take_struct().unwrap().fields;
        assert_eq!(fields.len(), 3);
        assert!(fields[1].default.is_some());
        assert!(fields[2].primitive);
    }

    #[test]
    fn expansion_mentions_every_field() {
        let output = expand(parse(quote! {
            struct Service {
                logger: Arc<Logger>,
                #[inject(default = 30)]
                timeout: u64,
            }
        }))
        .unwrap()
        .to_string();

        assert!(output.contains("Param :: typed (\"logger\""));
        assert!(output.contains("Param :: primitive (\"timeout\")"));
        assert!(output.contains("default_value"));
        assert!(output.contains("inventory :: submit !"));
    }

    #[test]
    fn string_literal_defaults_convert() {
        let literal: Expr = syn::parse_quote!("localhost");
        assert!(default_expr(&literal).to_string().contains("Into :: into"));

        let number: Expr = syn::parse_quote!(30);
        assert_eq!(default_expr(&number).to_string(), "30");
    }

    #[test]
    fn generic_types_rejected() {
        let result = expand(parse(quote! {
            struct Wrapper<T> {
                inner: Arc<T>,
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn id_on_primitive_rejected() {
        let result = expand(parse(quote! {
            struct Job {
                #[inject(id = "Queue")]
                queue: String,
            }
        }));
        assert!(result.is_err());
    }
}
