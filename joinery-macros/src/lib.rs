//! Procedural macros for joinery.
//!
//! * `#[derive(Injectable)]` - generates a constructor blueprint and
//!   submits it to the container's catalog

use proc_macro::TokenStream;

mod injectable;

/// Derives `Injectable` for a struct with named fields or a unit struct.
///
/// Every field becomes a constructor parameter, in declaration order:
/// * `Arc<X>` fields are class-typed and resolved as `Identifier::of::<X>()`
/// * any other field is a primitive, taken by value (`Clone`)
///
/// Field attributes:
/// * `#[inject(default = expr)]` - default value; makes the parameter optional
/// * `#[inject(id = "Name")]` - resolve an `Arc` field under another identifier
/// * `#[inject(primitive)]` - treat an `Arc` field as a primitive value
///
/// Struct attributes:
/// * `#[inject(id = "Name")]` - identifier of the derived type
/// * `#[inject(crate = "path")]` - path of the runtime crate (default `::joinery`)
///
/// ```ignore
/// #[derive(Injectable)]
/// struct Mailer {
///     transport: Arc<SmtpTransport>,
///     #[inject(default = 3)]
///     retries: u8,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
