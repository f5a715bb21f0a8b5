//! Blueprints: declared constructors.
//!
//! Rust has no runtime constructor introspection, so every constructible
//! type declares its parameter list up front in a [`Blueprint`]. The build
//! engine reads the declared [`Param`]s, resolves a value for each, and
//! hands the ordered [`Arguments`] to the blueprint's constructor.
//!
//! Blueprints are written by hand or generated with
//! `#[derive(Injectable)]`. Derived, non-generic types are also submitted
//! to a process-wide catalog, so the container finds them without any
//! registration.
//!
//! # Examples
//! ```
//! use joinery_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Logger;
//! struct Service {
//!     logger: Arc<Logger>,
//!     timeout: u64,
//! }
//!
//! let blueprint = Blueprint::new("Service")
//!     .param(Param::typed("logger", "Logger"))
//!     .param(Param::primitive("timeout").default_value(30u64))
//!     .construct(|args| {
//!         Ok(Service {
//!             logger: args.arc("logger")?,
//!             timeout: args.value("timeout")?,
//!         })
//!     });
//!
//! assert_eq!(blueprint.params().len(), 2);
//! assert!(blueprint.is_instantiable());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::error::{ContainerError, Result};
use crate::identifier::Identifier;
use crate::instance::{Instance, downcast, instance};

type ConstructorFn = dyn Fn(&Arguments) -> Result<Instance> + Send + Sync;

/// A declared constructor parameter.
#[derive(Clone)]
pub struct Param {
    name: Identifier,
    declared_type: Option<Identifier>,
    default: Option<Instance>,
}

impl Param {
    /// An untyped parameter: filled from explicit values, contextual
    /// `"$name"` overrides, or its default.
    pub fn primitive(name: impl Into<Identifier>) -> Self {
        Self { name: name.into(), declared_type: None, default: None }
    }

    /// A class-typed parameter: filled by resolving `declared_type`.
    pub fn typed(name: impl Into<Identifier>, declared_type: impl Into<Identifier>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type.into()),
            default: None,
        }
    }

    /// Gives the parameter a default value, making it optional.
    pub fn default_value<T: Any + Send + Sync>(self, value: T) -> Self {
        self.default_instance(instance(value))
    }

    /// Same as [`Param::default_value`] for an already erased value,
    /// e.g. an `Arc<T>` that a typed parameter should receive as is.
    pub fn default_instance(mut self, value: Instance) -> Self {
        self.default = Some(value);
        self
    }

    #[inline]
    pub fn name(&self) -> &Identifier {
        &self.name
    }

    #[inline]
    pub fn declared_type(&self) -> Option<&Identifier> {
        self.declared_type.as_ref()
    }

    #[inline]
    pub fn default(&self) -> Option<&Instance> {
        self.default.as_ref()
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Optional parameters are exactly those with a default.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.has_default()
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Resolved constructor arguments, in declaration order.
pub struct Arguments {
    owner: Identifier,
    values: Vec<(Identifier, Instance)>,
}

impl Arguments {
    pub(crate) fn new(owner: Identifier, values: Vec<(Identifier, Instance)>) -> Self {
        Self { owner, values }
    }

    /// The type being constructed.
    pub fn owner(&self) -> &Identifier {
        &self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw argument for the parameter called `name`.
    pub fn instance(&self, name: &str) -> Result<Instance> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ContainerError::MissingArgument {
                owner: self.owner.clone(),
                parameter: name.into(),
            })
    }

    /// Argument downcast to a shared `Arc<T>`, for class dependencies.
    pub fn arc<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        downcast::<T>(&Identifier::variable(name), self.instance(name)?)
    }

    /// Argument cloned out by value, for primitives.
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T> {
        self.arc::<T>(name).map(|value| T::clone(&value))
    }

    /// Raw argument at `position`.
    pub fn at(&self, position: usize) -> Option<&Instance> {
        self.values.get(position).map(|(_, value)| value)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("owner", &self.owner)
            .field("names", &self.values.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// Declared constructor of one type.
#[derive(Clone)]
pub struct Blueprint {
    identifier: Identifier,
    params: Vec<Param>,
    constructor: Option<Arc<ConstructorFn>>,
    produces: Option<TypeId>,
}

impl Blueprint {
    /// Starts a blueprint for `identifier` with no parameters and no
    /// constructor yet.
    pub fn new(identifier: impl Into<Identifier>) -> Self {
        Self {
            identifier: identifier.into(),
            params: Vec::new(),
            constructor: None,
            produces: None,
        }
    }

    /// Starts a blueprint identified as the Rust type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Identifier::of::<T>())
    }

    /// A blueprint that can never be instantiated, for abstract contracts
    /// that must be bound before use.
    pub fn abstract_type(identifier: impl Into<Identifier>) -> Self {
        Self::new(identifier)
    }

    /// Appends a constructor parameter.
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the constructor.
    pub fn construct<T, F>(mut self, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.produces = Some(TypeId::of::<T>());
        self.constructor = Some(Arc::new(move |args: &Arguments| {
            Ok(Arc::new(constructor(args)?) as Instance)
        }));
        self
    }

    /// Whether the constructor produces a `T`.
    ///
    /// Distinguishes types whose identifiers collide, such as two
    /// `Client` structs from different modules.
    pub fn produces<T: Any>(&self) -> bool {
        self.produces == Some(TypeId::of::<T>())
    }

    #[inline]
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    /// Runs the constructor.
    ///
    /// Callers check [`Blueprint::is_instantiable`] first; an abstract
    /// blueprint reaching this point reports itself as a construction
    /// failure.
    pub(crate) fn instantiate(&self, args: &Arguments) -> Result<Instance> {
        match &self.constructor {
            Some(constructor) => constructor(args),
            None => Err(ContainerError::construction(
                self.identifier.clone(),
                "blueprint has no constructor",
            )),
        }
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("identifier", &self.identifier)
            .field("params", &self.params)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// A type that declares its own blueprint.
///
/// Usually derived:
///
/// ```rust,ignore
/// #[derive(Injectable)]
/// struct Mailer {
///     transport: Arc<SmtpTransport>,
///     #[inject(default = 3)]
///     retries: u8,
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    fn blueprint() -> Blueprint;

    /// The identifier this type is resolved under.
    fn identifier() -> Identifier
    where
        Self: Sized,
    {
        Self::blueprint().identifier().clone()
    }
}

/// Entry of the process-wide blueprint catalog.
///
/// Submitted through `inventory` by `#[derive(Injectable)]`.
pub struct BlueprintRegistration {
    blueprint: fn() -> Blueprint,
}

impl BlueprintRegistration {
    pub const fn new(blueprint: fn() -> Blueprint) -> Self {
        Self { blueprint }
    }
}

inventory::collect!(BlueprintRegistration);

static CATALOG: Lazy<HashMap<Identifier, Blueprint>> = Lazy::new(|| {
    let mut catalog: HashMap<Identifier, Blueprint> = HashMap::new();
    for registration in inventory::iter::<BlueprintRegistration> {
        let blueprint = (registration.blueprint)();
        if let Some(shadowed) = catalog.insert(blueprint.identifier().clone(), blueprint) {
            warn!(
                identifier = %shadowed.identifier(),
                "Two catalogued types share an identifier; only one resolves by name. \
                 Give one of them #[inject(id = \"...\")]"
            );
        }
    }
    debug!(blueprints = catalog.len(), "Loaded blueprint catalog");
    catalog
});

/// Looks up a catalogued blueprint.
pub fn catalogued(identifier: &str) -> Option<Blueprint> {
    CATALOG.get(identifier).cloned()
}

/// Identifiers of every catalogued blueprint.
pub fn catalogued_identifiers() -> Vec<Identifier> {
    CATALOG.keys().cloned().collect()
}
