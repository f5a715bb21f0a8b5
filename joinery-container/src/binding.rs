//! Binding store: what each abstract identifier resolves to.
//!
//! A [`Binding`] maps an abstract identifier onto a [`Concrete`], either
//! another identifier or a [`Factory`], together with a [`Lifetime`].
//! Registration is last-writer-wins.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::container::Container;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::instance::Instance;
use crate::lifetime::Lifetime;
use crate::parameters::Parameters;

type FactoryFn = dyn Fn(&Container, &Parameters) -> Result<Instance> + Send + Sync;

/// A construction function that bypasses blueprint introspection.
///
/// It receives the container (to resolve its own dependencies) and the raw
/// parameters of the call, exactly as the caller passed them.
#[derive(Clone)]
pub struct Factory(Arc<FactoryFn>);

impl Factory {
    /// Wraps a factory returning a plain value.
    ///
    /// ```
    /// use joinery_container::binding::Factory;
    ///
    /// struct Clock { offset: i64 }
    /// let factory = Factory::new(|_, _| Ok(Clock { offset: 0 }));
    /// ```
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> Result<T> + Send + Sync + 'static,
    {
        Self(Arc::new(move |container: &Container, params: &Parameters| {
            Ok(Arc::new(factory(container, params)?) as Instance)
        }))
    }

    /// Wraps a factory that already produces a type-erased [`Instance`],
    /// for example one forwarded from another resolve.
    pub fn raw<F>(factory: F) -> Self
    where
        F: Fn(&Container, &Parameters) -> Result<Instance> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    #[inline]
    pub fn call(&self, container: &Container, params: &Parameters) -> Result<Instance> {
        (self.0)(container, params)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory(..)")
    }
}

/// What an abstract identifier is bound to.
#[derive(Debug, Clone)]
pub enum Concrete {
    /// Another identifier: built directly when it equals the abstract,
    /// otherwise resolved through one more hop.
    Type(Identifier),
    /// A construction function, always invoked directly.
    Factory(Factory),
}

impl Concrete {
    /// Whether `abstract_id` can be built without a further resolution hop.
    pub fn is_buildable_for(&self, abstract_id: &Identifier) -> bool {
        match self {
            Concrete::Type(concrete) => concrete == abstract_id,
            Concrete::Factory(_) => true,
        }
    }
}

impl From<&str> for Concrete {
    fn from(id: &str) -> Self {
        Concrete::Type(id.into())
    }
}

impl From<String> for Concrete {
    fn from(id: String) -> Self {
        Concrete::Type(id.into())
    }
}

impl From<Identifier> for Concrete {
    fn from(id: Identifier) -> Self {
        Concrete::Type(id)
    }
}

impl From<&Identifier> for Concrete {
    fn from(id: &Identifier) -> Self {
        Concrete::Type(id.clone())
    }
}

impl From<Factory> for Concrete {
    fn from(factory: Factory) -> Self {
        Concrete::Factory(factory)
    }
}

/// A registered binding.
#[derive(Debug, Clone)]
pub struct Binding {
    pub concrete: Concrete,
    pub lifetime: Lifetime,
}

/// Stores all bindings of a container.
#[derive(Debug, Default)]
pub(crate) struct BindingStore {
    bindings: DashMap<Identifier, Binding>,
}

impl BindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or overwrites the binding for `abstract_id`.
    pub fn bind(&self, abstract_id: Identifier, concrete: Concrete, lifetime: Lifetime) {
        match &concrete {
            Concrete::Type(target) => {
                debug!(abstract_id = %abstract_id, concrete = %target, %lifetime, "Registered binding")
            }
            Concrete::Factory(_) => {
                debug!(abstract_id = %abstract_id, %lifetime, "Registered factory binding")
            }
        }
        self.bindings.insert(abstract_id, Binding { concrete, lifetime });
    }

    pub fn get(&self, abstract_id: &str) -> Option<Binding> {
        self.bindings.get(abstract_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, abstract_id: &str) -> bool {
        self.bindings.contains_key(abstract_id)
    }

    /// The registered concrete and lifetime, or the abstract itself as a
    /// transient type when nothing is bound.
    pub fn concrete_for(&self, abstract_id: &Identifier) -> (Concrete, Lifetime) {
        match self.get(abstract_id) {
            Some(binding) => (binding.concrete, binding.lifetime),
            None => (Concrete::Type(abstract_id.clone()), Lifetime::Transient),
        }
    }

    pub fn identifiers(&self) -> Vec<Identifier> {
        self.bindings.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_factory() -> Factory {
        Factory::new(|_, _| Ok(42i32))
    }

    #[test]
    fn bind_and_get() {
        let store = BindingStore::new();
        store.bind("Cache".into(), "RedisCache".into(), Lifetime::Shared);

        let binding = store.get("Cache").unwrap();
        assert!(binding.lifetime.is_shared());
        assert!(matches!(binding.concrete, Concrete::Type(ref id) if id == "RedisCache"));
    }

    #[test]
    fn last_writer_wins() {
        let store = BindingStore::new();
        store.bind("Cache".into(), "RedisCache".into(), Lifetime::Shared);
        store.bind("Cache".into(), "MemoryCache".into(), Lifetime::Transient);

        let binding = store.get("Cache").unwrap();
        assert_eq!(binding.lifetime, Lifetime::Transient);
        assert!(matches!(binding.concrete, Concrete::Type(ref id) if id == "MemoryCache"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unbound_resolves_to_itself() {
        let store = BindingStore::new();
        let id = Identifier::from("Mailer");
        let (concrete, lifetime) = store.concrete_for(&id);

        assert!(concrete.is_buildable_for(&id));
        assert_eq!(lifetime, Lifetime::Transient);
    }

    #[test]
    fn raw_factory_forwards_instances() {
        let container = Container::new();
        let clock = container.instance("SystemClock", 5u64);
        container.singleton("Clock", Factory::raw(|c, _| c.resolve("SystemClock")));

        let resolved: Arc<u64> = container.make("Clock").unwrap();
        assert!(Arc::ptr_eq(&resolved, &clock));
    }

    #[test]
    fn buildable_rules() {
        let id = Identifier::from("Cache");
        assert!(Concrete::from("Cache").is_buildable_for(&id));
        assert!(!Concrete::from("RedisCache").is_buildable_for(&id));
        assert!(Concrete::from(dummy_factory()).is_buildable_for(&id));
    }
}
