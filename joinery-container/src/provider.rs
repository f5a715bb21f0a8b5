//! Service providers: modules of related registrations.
//!
//! A provider groups the bindings, blueprints and values of one part of an
//! application, similar to a Laravel `ServiceProvider`.
//!
//! # Examples
//! ```rust
//! use joinery_container::prelude::*;
//!
//! struct Mailer {
//!     host: String,
//! }
//!
//! #[derive(Default)]
//! struct MailProvider;
//!
//! impl ServiceProvider for MailProvider {
//!     fn register(&self, container: &Container, values: &ProviderValues) -> Result<()> {
//!         let host = values
//!             .get::<String>("mail.host")?
//!             .map(|host| (*host).clone())
//!             .unwrap_or_else(|| String::from("localhost"));
//!         container.singleton_factory("Mailer", move |_, _| Ok(Mailer { host: host.clone() }));
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::new();
//! container
//!     .register(MailProvider, ProviderValues::new().with("mail.host", String::from("smtp.local")), false)
//!     .expect("provider registers");
//!
//! let mailer = container.make::<Mailer>("Mailer").unwrap();
//! assert_eq!(mailer.host, "smtp.local");
//! assert!(container.has("mail.host"));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::identifier::Identifier;
use crate::instance::{Instance, downcast, instance};

/// A module that registers related dependencies into a container.
///
/// Split registrations by concern instead of one giant block:
///
/// ```rust,ignore
/// container.register(DatabaseProvider, ProviderValues::new(), false)?;
/// container.register(AuthProvider, ProviderValues::new(), false)?;
/// container.register(MailProvider, ProviderValues::new(), false)?;
/// ```
pub trait ServiceProvider: Send + Sync + 'static {
    /// Registers bindings, blueprints and values into `container`.
    ///
    /// `values` are the overrides the provider was registered with; they
    /// are already stored in the container's raw slots when this runs.
    fn register(&self, container: &Container, values: &ProviderValues) -> Result<()>;

    /// Name the provider is registered under. Registering a second
    /// provider with the same name is a no-op unless forced.
    fn name(&self) -> Identifier {
        Identifier::of::<Self>()
    }
}

/// Values handed to a provider at registration time.
#[derive(Clone, Default)]
pub struct ProviderValues {
    entries: Vec<(Identifier, Instance)>,
}

impl ProviderValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Any + Send + Sync>(mut self, key: impl Into<Identifier>, value: T) -> Self {
        self.entries.push((key.into(), instance(value)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Identifier, Instance)> {
        self.entries.iter()
    }

    /// Typed value under `key`; the last one wins when repeated.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(k, value)| downcast::<T>(k, value.clone()))
            .transpose()
    }
}

impl fmt::Debug for ProviderValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}

impl Container {
    /// Registers a service provider.
    ///
    /// When a provider with the same name is already registered and
    /// `force` is false, nothing happens. Otherwise `values` are written to
    /// the raw slots, the provider's hook runs against this container, and
    /// the provider is recorded.
    ///
    /// # Errors
    /// [`ContainerError::Provider`] wrapping whatever the hook returned.
    pub fn register(&self, provider: impl ServiceProvider, values: ProviderValues, force: bool) -> Result<&Self> {
        self.register_shared(Arc::new(provider), values, force)
    }

    /// Materializes `P` from its `Default` and registers it.
    pub fn register_default<P>(&self, values: ProviderValues, force: bool) -> Result<&Self>
    where
        P: ServiceProvider + Default,
    {
        self.register(P::default(), values, force)
    }

    #[instrument(skip_all, fields(provider = %provider.name(), force = force))]
    pub fn register_shared(
        &self,
        provider: Arc<dyn ServiceProvider>,
        values: ProviderValues,
        force: bool,
    ) -> Result<&Self> {
        let name = provider.name();

        if !force && self.providers.contains_key(&name) {
            debug!("Provider already registered, skipping");
            return Ok(self);
        }

        for (key, value) in values.iter() {
            self.set_instance(key.clone(), value.clone());
        }

        provider
            .register(self, &values)
            .map_err(|source| ContainerError::Provider {
                provider: name.clone(),
                source: Box::new(source),
            })?;

        self.providers.insert(name, provider);
        debug!(values = values.len(), "Registered service provider");
        Ok(self)
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn ServiceProvider>> {
        self.providers.get(name).map(|entry| entry.value().clone())
    }

    /// Names of all registered providers.
    pub fn provider_names(&self) -> Vec<Identifier> {
        self.providers.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting {
        calls: Arc<AtomicU32>,
    }

    impl ServiceProvider for Counting {
        fn register(&self, container: &Container, _values: &ProviderValues) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            container.bind_factory("Clock", |_, _| Ok(0u64), true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Failing;

    impl ServiceProvider for Failing {
        fn register(&self, container: &Container, _values: &ProviderValues) -> Result<()> {
            container.resolve("MissingContract").map(|_| ())
        }

        fn name(&self) -> Identifier {
            Identifier::from("failing")
        }
    }

    #[test]
    fn provider_registers_bindings() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container
            .register(Counting { calls: calls.clone() }, ProviderValues::new(), false)
            .unwrap();

        assert!(container.bound("Clock"));
        assert!(container.has_provider("Counting"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_registration_is_noop_unless_forced() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();

        for _ in 0..2 {
            container
                .register(Counting { calls: calls.clone() }, ProviderValues::new(), false)
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        container
            .register(Counting { calls: calls.clone() }, ProviderValues::new(), true)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn values_seed_raw_slots() {
        let container = Container::new();
        container
            .register(
                Counting { calls: Arc::new(AtomicU32::new(0)) },
                ProviderValues::new().with("clock.zone", String::from("UTC")),
                false,
            )
            .unwrap();

        assert_eq!(*container.get_as::<String>("clock.zone").unwrap().unwrap(), "UTC");
    }

    #[test]
    fn failing_hook_wrapped_and_not_recorded() {
        let container = Container::new();

        match container.register_default::<Failing>(ProviderValues::new(), false) {
            Err(ContainerError::Provider { provider, source }) => {
                assert_eq!(provider, "failing");
                assert!(matches!(*source, ContainerError::NotInstantiable(_)));
            }
            other => panic!("Expected Provider error, got: {:?}", other.map(|_| ())),
        }
        assert!(!container.has_provider("failing"));
    }

    #[test]
    fn builder_registers_providers() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::builder()
            .provider(Counting { calls: calls.clone() })
            .build()
            .unwrap();

        assert!(container.provider("Counting").is_some());
        assert_eq!(container.provider_names().len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provider_values_lookup() {
        let values = ProviderValues::new().with("a", 1u8).with("a", 2u8);
        assert_eq!(*values.get::<u8>("a").unwrap().unwrap(), 2);
        assert!(values.get::<u8>("b").unwrap().is_none());
        assert!(values.get::<String>("a").is_err());
    }
}
