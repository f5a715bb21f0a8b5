//! Contextual bindings: per-consumer overrides.
//!
//! While a consumer is the innermost entry of the build stack, its
//! contextual bindings take precedence over the global binding store.
//! Class dependencies are keyed by their identifier, untyped parameters
//! by `"$" + name`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use tracing::debug;

use crate::binding::{Concrete, Factory};
use crate::container::Container;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::instance::{Instance, instance};
use crate::parameters::Parameters;

/// What a consumer receives instead of the global binding.
#[derive(Clone)]
pub enum ContextualValue {
    /// Resolve this identifier instead.
    Type(Identifier),
    /// Invoke this factory (with empty parameters).
    Factory(Factory),
    /// Hand over this value as is.
    Value(Instance),
}

impl ContextualValue {
    /// Wraps a literal value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        ContextualValue::Value(instance(value))
    }
}

impl From<Concrete> for ContextualValue {
    fn from(concrete: Concrete) -> Self {
        match concrete {
            Concrete::Type(id) => ContextualValue::Type(id),
            Concrete::Factory(factory) => ContextualValue::Factory(factory),
        }
    }
}

impl From<Factory> for ContextualValue {
    fn from(factory: Factory) -> Self {
        ContextualValue::Factory(factory)
    }
}

impl fmt::Debug for ContextualValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextualValue::Type(id) => f.debug_tuple("Type").field(id).finish(),
            ContextualValue::Factory(factory) => f.debug_tuple("Factory").field(factory).finish(),
            ContextualValue::Value(_) => f.write_str("Value(..)"),
        }
    }
}

/// Overrides keyed by consumer, then by dependency key.
#[derive(Debug, Default)]
pub(crate) struct ContextualMap {
    overrides: DashMap<Identifier, HashMap<Identifier, ContextualValue>>,
}

impl ContextualMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, consumer: Identifier, dependency: Identifier, value: ContextualValue) {
        debug!(consumer = %consumer, dependency = %dependency, value = ?value, "Registered contextual binding");
        self.overrides.entry(consumer).or_default().insert(dependency, value);
    }

    /// Override registered for `dependency` when built by `consumer`.
    pub fn lookup(&self, consumer: &str, dependency: &str) -> Option<ContextualValue> {
        self.overrides
            .get(consumer)
            .and_then(|entry| entry.value().get(dependency).cloned())
    }
}

/// Fluent builder returned by [`Container::when`].
///
/// ```
/// use joinery_container::prelude::*;
///
/// let container = Container::new();
/// container.when("ReportJob").needs("$timeout").give(90u64);
/// container.when("ReportJob").needs("Storage").give_type("S3Storage");
/// ```
#[must_use = "a contextual binding is only registered once `give` is called"]
pub struct ContextualBindingBuilder<'c> {
    container: &'c Container,
    consumer: Identifier,
}

impl<'c> ContextualBindingBuilder<'c> {
    pub(crate) fn new(container: &'c Container, consumer: Identifier) -> Self {
        Self { container, consumer }
    }

    /// Names the dependency to override: an identifier, or `"$name"` for
    /// an untyped parameter.
    pub fn needs(self, dependency: impl Into<Identifier>) -> ContextualNeeds<'c> {
        ContextualNeeds {
            container: self.container,
            consumer: self.consumer,
            dependency: dependency.into(),
        }
    }
}

/// Second step of [`Container::when`].
#[must_use = "a contextual binding is only registered once `give` is called"]
pub struct ContextualNeeds<'c> {
    container: &'c Container,
    consumer: Identifier,
    dependency: Identifier,
}

impl<'c> ContextualNeeds<'c> {
    /// Gives a literal value.
    pub fn give<T: Any + Send + Sync>(self, value: T) -> &'c Container {
        self.give_value(ContextualValue::value(value))
    }

    /// Gives another identifier to resolve.
    pub fn give_type(self, concrete: impl Into<Identifier>) -> &'c Container {
        self.give_value(ContextualValue::Type(concrete.into()))
    }

    /// Gives a factory, invoked on each build of the consumer.
    pub fn give_factory<T, F>(self, factory: F) -> &'c Container
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> Result<T> + Send + Sync + 'static,
    {
        self.give_value(ContextualValue::Factory(Factory::new(factory)))
    }

    pub fn give_value(self, value: ContextualValue) -> &'c Container {
        self.container.bind_contextual(self.consumer, self.dependency, value);
        self.container
    }
}
