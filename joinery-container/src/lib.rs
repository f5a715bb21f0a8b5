//! Core container implementation for joinery.
//!
//! Everything lives behind [`Container`]; the modules below are the
//! pieces it is made of. Most users want [`prelude`].

pub mod binding;
pub mod blueprint;
pub mod container;
pub mod contextual;
pub mod error;
pub mod global;
pub mod graph;
pub mod identifier;
pub mod instance;
pub mod lifetime;
pub mod parameters;
pub mod provider;
pub mod settings;
mod stack;

pub use binding::{Concrete, Factory};
pub use blueprint::{Arguments, Blueprint, BlueprintRegistration, Injectable, Param};
pub use container::{Container, ContainerBuilder, prelude};
pub use contextual::{ContextualBindingBuilder, ContextualNeeds, ContextualValue};
pub use error::{
    CircularDependencyError, ContainerError, NotInstantiableError, Result, UnresolvableDependencyError,
};
pub use identifier::Identifier;
pub use instance::{Instance, downcast, instance};
pub use lifetime::Lifetime;
pub use parameters::{ParamKey, Parameters};
pub use provider::{ProviderValues, ServiceProvider};
pub use settings::{CachePolicy, ContainerSettings};

/// Used by `#[derive(Injectable)]`; not public API.
#[doc(hidden)]
pub mod __private {
    pub use inventory;
}
