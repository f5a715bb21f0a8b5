//! # The Container
//!
//! Turns an identifier into a fully constructed object graph.
//!
//! # Architecture
//! ```text
//! resolve(abstract)
//!     │
//!     ├── instance cache hit? ──────────────────────────────> instance
//!     │
//!     ├── concrete = contextual override | binding | abstract
//!     │
//!     ├── concrete is another identifier ──> resolve(concrete)
//!     │
//!     └── build(concrete)
//!             ├── factory ──> factory(container, parameters)
//!             └── blueprint ──> resolve every Param ──> constructor(arguments)
//! ```
//!
//! # Examples
//! ```rust
//! use joinery_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Logger {
//!     id: u32,
//! }
//!
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let container = Container::new();
//! container.bind_factory("Logger", |_, _| Ok(Logger { id: 1 }), true);
//! container.define(
//!     Blueprint::new("Service")
//!         .param(Param::typed("logger", "Logger"))
//!         .construct(|args| Ok(Service { logger: args.arc("logger")? })),
//! );
//!
//! let service: Arc<Service> = container.make("Service").expect("Failed to resolve");
//! assert_eq!(service.logger.id, 1);
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use joinery_support::rendering::suggest_similar;
use parking_lot::ReentrantMutex;
use tracing::{debug, info, trace};

use crate::binding::{BindingStore, Concrete, Factory};
use crate::blueprint::{self, Arguments, Blueprint, Injectable, Param};
use crate::contextual::{ContextualBindingBuilder, ContextualMap, ContextualValue};
use crate::error::{
    CircularDependencyError, ContainerError, NotInstantiableError, Result, UnresolvableDependencyError,
};
use crate::identifier::Identifier;
use crate::instance::{Instance, downcast, instance};
use crate::lifetime::Lifetime;
use crate::parameters::Parameters;
use crate::provider::{ProviderValues, ServiceProvider};
use crate::settings::{CachePolicy, ContainerSettings};
use crate::stack::{BuildFrame, BuildStack, FactoryCall};

// ============================================================
// ContainerBuilder
// ============================================================

/// Collects settings, blueprints, bindings and providers, then builds a
/// [`Container`].
///
/// Everything the builder does can also be done on a live container; the
/// builder only fixes the order (blueprints, bindings, then providers).
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .cache_policy(CachePolicy::EveryResolve)
///     .singleton("Cache", "RedisCache")
///     .provider(MailProvider::default())
///     .build()?;
/// ```
pub struct ContainerBuilder {
    settings: ContainerSettings,
    blueprints: Vec<Blueprint>,
    bindings: Vec<(Identifier, Concrete, Lifetime)>,
    providers: Vec<(Arc<dyn ServiceProvider>, ProviderValues)>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            settings: ContainerSettings::default(),
            blueprints: Vec::new(),
            bindings: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Replaces all settings at once.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.settings.cache_policy = policy;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.settings.max_suggestions = max;
        self
    }

    // ── Blueprints ──

    pub fn define(mut self, blueprint: Blueprint) -> Self {
        self.blueprints.push(blueprint);
        self
    }

    pub fn define_type<T: Injectable>(self) -> Self {
        self.define(T::blueprint())
    }

    // ── Bindings ──

    pub fn bind(
        mut self,
        abstract_id: impl Into<Identifier>,
        concrete: impl Into<Concrete>,
        shared: bool,
    ) -> Self {
        self.bindings
            .push((abstract_id.into(), concrete.into(), Lifetime::from_shared(shared)));
        self
    }

    pub fn singleton(self, abstract_id: impl Into<Identifier>, concrete: impl Into<Concrete>) -> Self {
        self.bind(abstract_id, concrete, true)
    }

    // ── Providers ──

    /// Registers a provider with no values once the container is built.
    pub fn provider(self, provider: impl ServiceProvider) -> Self {
        self.provider_with(provider, ProviderValues::new())
    }

    pub fn provider_with(mut self, provider: impl ServiceProvider, values: ProviderValues) -> Self {
        let provider: Arc<dyn ServiceProvider> = Arc::new(provider);
        self.providers.push((provider, values));
        self
    }

    // ── Build ──

    /// Builds the container.
    ///
    /// # Errors
    /// Fails with [`ContainerError::Provider`] when a provider's
    /// registration hook fails.
    pub fn build(self) -> Result<Container> {
        info!(
            blueprints = self.blueprints.len(),
            bindings = self.bindings.len(),
            providers = self.providers.len(),
            "Building container"
        );

        let container = Container::with_settings(self.settings);
        for blueprint in self.blueprints {
            container.define(blueprint);
        }
        for (abstract_id, concrete, lifetime) in self.bindings {
            container.bindings.bind(abstract_id, concrete, lifetime);
        }
        for (provider, values) in self.providers {
            container.register_shared(provider, values, false)?;
        }

        info!("Container built successfully");
        Ok(container)
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Runtime dependency-resolution container.
///
/// All methods take `&self`, so factories and providers that receive the
/// container can keep registering into it. The container is `Send + Sync`;
/// resolutions are serialized per container by a reentrant lock, which
/// lets a factory resolve further dependencies on the same thread.
pub struct Container {
    pub(crate) settings: ContainerSettings,
    pub(crate) bindings: BindingStore,
    pub(crate) contextual: ContextualMap,
    pub(crate) instances: DashMap<Identifier, Instance>,
    pub(crate) resolved: DashSet<Identifier>,
    pub(crate) blueprints: DashMap<Identifier, Blueprint>,
    pub(crate) slots: DashMap<Identifier, Instance>,
    pub(crate) providers: DashMap<Identifier, Arc<dyn ServiceProvider>>,
    build_stack: ReentrantMutex<RefCell<BuildStack>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::with_settings(ContainerSettings::default())
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            settings,
            bindings: BindingStore::new(),
            contextual: ContextualMap::new(),
            instances: DashMap::new(),
            resolved: DashSet::new(),
            blueprints: DashMap::new(),
            slots: DashMap::new(),
            providers: DashMap::new(),
            build_stack: ReentrantMutex::new(RefCell::new(BuildStack::default())),
        }
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Blueprints ──

    /// Registers a blueprint, replacing any earlier one for the same
    /// identifier. Container-local blueprints shadow catalogued ones.
    pub fn define(&self, blueprint: Blueprint) -> &Self {
        debug!(
            identifier = %blueprint.identifier(),
            params = blueprint.params().len(),
            instantiable = blueprint.is_instantiable(),
            "Defined blueprint"
        );
        self.blueprints.insert(blueprint.identifier().clone(), blueprint);
        self
    }

    pub fn define_type<T: Injectable>(&self) -> &Self {
        self.define(T::blueprint())
    }

    /// The blueprint `identifier` builds with, local definitions first.
    pub fn blueprint(&self, identifier: &str) -> Option<Blueprint> {
        self.blueprints
            .get(identifier)
            .map(|entry| entry.value().clone())
            .or_else(|| blueprint::catalogued(identifier))
    }

    // ── Bindings ──

    /// Binds `abstract_id` to a concrete identifier or factory.
    ///
    /// Re-binding overwrites the earlier binding but keeps any instance
    /// already cached for `abstract_id`; use [`Container::force_bind`] to
    /// drop it as well.
    pub fn bind(
        &self,
        abstract_id: impl Into<Identifier>,
        concrete: impl Into<Concrete>,
        shared: bool,
    ) -> &Self {
        self.bindings
            .bind(abstract_id.into(), concrete.into(), Lifetime::from_shared(shared));
        self
    }

    pub fn singleton(&self, abstract_id: impl Into<Identifier>, concrete: impl Into<Concrete>) -> &Self {
        self.bind(abstract_id, concrete, true)
    }

    /// Binds `abstract_id` to a factory.
    ///
    /// The factory may resolve other identifiers through the container it
    /// receives. Resolving `abstract_id` itself from inside the factory,
    /// directly or through other bound factories, fails with
    /// [`ContainerError::CircularDependency`] instead of recursing.
    pub fn bind_factory<T, F>(&self, abstract_id: impl Into<Identifier>, factory: F, shared: bool) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> Result<T> + Send + Sync + 'static,
    {
        self.bind(abstract_id, Factory::new(factory), shared)
    }

    pub fn singleton_factory<T, F>(&self, abstract_id: impl Into<Identifier>, factory: F) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> Result<T> + Send + Sync + 'static,
    {
        self.bind_factory(abstract_id, factory, true)
    }

    /// Binds and drops the instance cached for `abstract_id`, if any.
    pub fn force_bind(
        &self,
        abstract_id: impl Into<Identifier>,
        concrete: impl Into<Concrete>,
        shared: bool,
    ) -> &Self {
        let abstract_id = abstract_id.into();
        self.forget_instance(&abstract_id);
        self.bind(abstract_id, concrete, shared)
    }

    /// Seeds the instance cache: `abstract_id` resolves to `value` from
    /// now on. Returns the shared handle.
    pub fn instance<T: Any + Send + Sync>(&self, abstract_id: impl Into<Identifier>, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.instance_raw(abstract_id, value.clone());
        value
    }

    pub fn instance_raw(&self, abstract_id: impl Into<Identifier>, value: Instance) -> &Self {
        let abstract_id = abstract_id.into();
        debug!(abstract_id = %abstract_id, "Registered instance");
        self.instances.insert(abstract_id, value);
        self
    }

    pub fn forget_instance(&self, abstract_id: &str) -> Option<Instance> {
        self.instances.remove(abstract_id).map(|(_, value)| value)
    }

    pub fn flush_instances(&self) {
        debug!(count = self.instances.len(), "Flushing instances");
        self.instances.clear();
    }

    /// Whether `abstract_id` has a binding or a cached instance.
    pub fn bound(&self, abstract_id: &str) -> bool {
        self.bindings.contains(abstract_id) || self.instances.contains_key(abstract_id)
    }

    /// Whether `abstract_id` is bound as shared or already cached.
    pub fn is_shared(&self, abstract_id: &str) -> bool {
        self.instances.contains_key(abstract_id)
            || self
                .bindings
                .get(abstract_id)
                .is_some_and(|binding| binding.lifetime.is_shared())
    }

    /// Whether `abstract_id` has been resolved at least once.
    pub fn is_resolved(&self, abstract_id: &str) -> bool {
        self.resolved.contains(abstract_id)
    }

    // ── Contextual bindings ──

    /// While `consumer` is being built, `dependency` resolves to `value`.
    ///
    /// `dependency` is the dependency's identifier, or `"$name"` for an
    /// untyped parameter.
    pub fn bind_contextual(
        &self,
        consumer: impl Into<Identifier>,
        dependency: impl Into<Identifier>,
        value: impl Into<ContextualValue>,
    ) -> &Self {
        self.contextual.add(consumer.into(), dependency.into(), value.into());
        self
    }

    /// Starts a fluent contextual binding for `consumer`.
    pub fn when(&self, consumer: impl Into<Identifier>) -> ContextualBindingBuilder<'_> {
        ContextualBindingBuilder::new(self, consumer.into())
    }

    // ── Resolution ──

    /// Resolves `abstract_id` into an instance.
    ///
    /// # Errors
    /// - [`ContainerError::NotInstantiable`]: no constructible realization
    /// - [`ContainerError::UnresolvableDependency`]: untyped parameter without a value
    /// - [`ContainerError::CircularDependency`]: a type needs itself
    pub fn resolve(&self, abstract_id: impl Into<Identifier>) -> Result<Instance> {
        self.resolve_with(abstract_id, &Parameters::default())
    }

    /// Resolves `abstract_id`, passing explicit constructor values.
    pub fn resolve_with(&self, abstract_id: impl Into<Identifier>, params: &Parameters) -> Result<Instance> {
        let abstract_id = abstract_id.into();
        trace!(abstract_id = %abstract_id, "Resolving");

        let stack = self.build_stack.lock();
        self.resolve_in(&stack, &abstract_id, params, &[])
    }

    /// Resolves and downcasts.
    ///
    /// ```rust,ignore
    /// let mailer: Arc<Mailer> = container.make("Mailer")?;
    /// ```
    pub fn make<T: Any + Send + Sync>(&self, abstract_id: impl Into<Identifier>) -> Result<Arc<T>> {
        self.make_with(abstract_id, &Parameters::default())
    }

    pub fn make_with<T: Any + Send + Sync>(
        &self,
        abstract_id: impl Into<Identifier>,
        params: &Parameters,
    ) -> Result<Arc<T>> {
        let abstract_id = abstract_id.into();
        let instance = self.resolve_with(abstract_id.clone(), params)?;
        downcast::<T>(&abstract_id, instance)
    }

    /// Resolves an [`Injectable`] type under its own identifier.
    ///
    /// Bindings and cached instances for that identifier apply as usual.
    /// Otherwise, when the blueprint found under the identifier builds some
    /// other type (two derived types sharing a name), `T` is built from its
    /// own blueprint.
    pub fn make_type<T: Injectable>(&self) -> Result<Arc<T>> {
        let identifier = T::identifier();

        let foreign = !self.bindings.contains(&identifier)
            && !self.instances.contains_key(&identifier)
            && self
                .blueprint(&identifier)
                .is_some_and(|blueprint| !blueprint.produces::<T>());

        if foreign {
            trace!(identifier = %identifier, "Catalogued blueprint belongs to another type; using the type's own");
            let stack = self.build_stack.lock();
            let instance = self.build_blueprint(&stack, &identifier, &T::blueprint(), &Parameters::default())?;
            self.resolved.insert(identifier.clone());
            return downcast::<T>(&identifier, instance);
        }

        self.make::<T>(identifier)
    }

    /// Builds `concrete` directly, bypassing the instance cache and the
    /// binding store for the outermost step.
    pub fn build(&self, concrete: impl Into<Concrete>, params: &Parameters) -> Result<Instance> {
        let stack = self.build_stack.lock();
        self.build_in(&stack, &concrete.into(), params)
    }

    // ── Raw slots ──

    /// Whether a raw slot holds a value for `identifier`.
    pub fn has(&self, identifier: &str) -> bool {
        self.slots.contains_key(identifier)
    }

    /// Raw slot value, untouched by resolution.
    pub fn get(&self, identifier: &str) -> Option<Instance> {
        self.slots.get(identifier).map(|entry| entry.value().clone())
    }

    pub fn get_as<T: Any + Send + Sync>(&self, identifier: &str) -> Result<Option<Arc<T>>> {
        self.get(identifier)
            .map(|value| downcast::<T>(&Identifier::from(identifier), value))
            .transpose()
    }

    pub fn set<T: Any + Send + Sync>(&self, identifier: impl Into<Identifier>, value: T) -> &Self {
        self.set_instance(identifier, instance(value))
    }

    pub fn set_instance(&self, identifier: impl Into<Identifier>, value: Instance) -> &Self {
        self.slots.insert(identifier.into(), value);
        self
    }

    pub fn remove(&self, identifier: &str) -> Option<Instance> {
        self.slots.remove(identifier).map(|(_, value)| value)
    }

    // ── Engine ──

    fn resolve_in(
        &self,
        stack: &RefCell<BuildStack>,
        abstract_id: &Identifier,
        params: &Parameters,
        hops: &[Identifier],
    ) -> Result<Instance> {
        let contextual = self.contextual_for(stack, abstract_id);

        if contextual.is_none() {
            if let Some(cached) = self.instances.get(abstract_id).map(|entry| entry.value().clone()) {
                trace!(abstract_id = %abstract_id, "Returning cached instance");
                return Ok(cached);
            }
        }

        // Contextual results are never cached: other consumers must keep
        // seeing the global binding.
        let (concrete, lifetime) = match contextual {
            Some(ContextualValue::Value(value)) => {
                trace!(abstract_id = %abstract_id, "Using contextual value");
                return Ok(value);
            }
            Some(ContextualValue::Type(id)) => (Concrete::Type(id), None),
            Some(ContextualValue::Factory(factory)) => (Concrete::Factory(factory), None),
            None => {
                let (concrete, lifetime) = self.bindings.concrete_for(abstract_id);
                (concrete, Some(lifetime))
            }
        };

        let instance = match &concrete {
            Concrete::Type(next) if !concrete.is_buildable_for(abstract_id) => {
                let mut chain = hops.to_vec();
                chain.push(abstract_id.clone());
                if chain.contains(next) {
                    chain.push(next.clone());
                    return Err(ContainerError::CircularDependency(CircularDependencyError { chain }));
                }
                trace!(from = %abstract_id, to = %next, "Following binding");
                self.resolve_in(stack, next, params, &chain)?
            }
            // Only bound factories are tracked: a contextual and a global
            // factory for the same identifier may nest.
            Concrete::Factory(_) if lifetime.is_some() => {
                let _call = FactoryCall::enter(stack, abstract_id.clone())?;
                self.build_in(stack, &concrete, params)?
            }
            _ => self.build_in(stack, &concrete, params)?,
        };

        if let Some(lifetime) = lifetime {
            if self.settings.cache_policy.should_cache(lifetime) {
                self.instances.insert(abstract_id.clone(), instance.clone());
            }
        }
        self.resolved.insert(abstract_id.clone());

        Ok(instance)
    }

    fn build_in(&self, stack: &RefCell<BuildStack>, concrete: &Concrete, params: &Parameters) -> Result<Instance> {
        let identifier = match concrete {
            Concrete::Factory(factory) => {
                trace!("Invoking factory");
                return factory.call(self, params);
            }
            Concrete::Type(identifier) => identifier,
        };

        match self.blueprint(identifier) {
            Some(blueprint) => self.build_blueprint(stack, identifier, &blueprint, params),
            None => {
                let chain = stack.borrow().chain();
                Err(self.not_instantiable(identifier, chain))
            }
        }
    }

    fn build_blueprint(
        &self,
        stack: &RefCell<BuildStack>,
        identifier: &Identifier,
        blueprint: &Blueprint,
        params: &Parameters,
    ) -> Result<Instance> {
        if !blueprint.is_instantiable() {
            let chain = stack.borrow().chain();
            return Err(self.not_instantiable(identifier, chain));
        }

        let frame = BuildFrame::enter(stack, identifier.clone())?;

        if blueprint.params().is_empty() {
            drop(frame);
            return blueprint.instantiate(&Arguments::new(identifier.clone(), Vec::new()));
        }

        let explicit = params.keyed_by_name(blueprint.params());
        let mut values = Vec::with_capacity(blueprint.params().len());
        for param in blueprint.params() {
            let value = self.resolve_param(stack, identifier, param, &explicit)?;
            values.push((param.name().clone(), value));
        }

        drop(frame);
        trace!(identifier = %identifier, arguments = values.len(), "Instantiating");
        blueprint.instantiate(&Arguments::new(identifier.clone(), values))
    }

    fn resolve_param(
        &self,
        stack: &RefCell<BuildStack>,
        declaring: &Identifier,
        param: &Param,
        explicit: &HashMap<Identifier, Instance>,
    ) -> Result<Instance> {
        if let Some(value) = explicit.get(param.name()) {
            return Ok(value.clone());
        }

        let Some(declared) = param.declared_type() else {
            return self.resolve_primitive(stack, declaring, param);
        };

        self.resolve_in(stack, declared, &Parameters::default(), &[])
            .or_else(|err| match param.default() {
                Some(default) if !err.is_circular() => {
                    trace!(parameter = %param.name(), error = %err, "Falling back to default");
                    Ok(default.clone())
                }
                _ => Err(err),
            })
    }

    fn resolve_primitive(&self, stack: &RefCell<BuildStack>, declaring: &Identifier, param: &Param) -> Result<Instance> {
        match self.contextual_for(stack, &Identifier::variable(param.name())) {
            Some(ContextualValue::Value(value)) => Ok(value),
            Some(ContextualValue::Factory(factory)) => factory.call(self, &Parameters::default()),
            Some(ContextualValue::Type(id)) => self.resolve_in(stack, &id, &Parameters::default(), &[]),
            None => param.default().cloned().ok_or_else(|| {
                ContainerError::UnresolvableDependency(UnresolvableDependencyError {
                    parameter: param.name().clone(),
                    declaring: declaring.clone(),
                })
            }),
        }
    }

    /// Contextual override for `dependency`, seen from the innermost
    /// consumer on the build stack.
    fn contextual_for(&self, stack: &RefCell<BuildStack>, dependency: &str) -> Option<ContextualValue> {
        let consumer = stack.borrow().current().cloned()?;
        self.contextual.lookup(&consumer, dependency)
    }

    pub(crate) fn not_instantiable(&self, target: &Identifier, chain: Vec<Identifier>) -> ContainerError {
        ContainerError::NotInstantiable(NotInstantiableError {
            target: target.clone(),
            chain,
            suggestions: self.find_suggestions(target),
        })
    }

    fn find_suggestions(&self, target: &Identifier) -> Vec<String> {
        if self.settings.max_suggestions == 0 {
            return Vec::new();
        }

        let mut known = self.bindings.identifiers();
        known.extend(self.blueprints.iter().map(|entry| entry.key().clone()));
        known.extend(blueprint::catalogued_identifiers());
        known.sort();
        known.dedup();

        let names: Vec<&str> = known.iter().map(Identifier::as_str).collect();
        suggest_similar(target, &names, self.settings.max_suggestions)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .field("blueprints", &self.blueprints.len())
            .field("instances", &self.instances.len())
            .field("providers", &self.providers.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::binding::{Concrete, Factory};
    pub use crate::blueprint::{Arguments, Blueprint, Injectable, Param};
    pub use crate::contextual::ContextualValue;
    pub use crate::error::{ContainerError, Result};
    pub use crate::identifier::Identifier;
    pub use crate::instance::Instance;
    pub use crate::lifetime::Lifetime;
    pub use crate::parameters::{ParamKey, Parameters};
    pub use crate::provider::{ProviderValues, ServiceProvider};
    pub use crate::settings::{CachePolicy, ContainerSettings};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
