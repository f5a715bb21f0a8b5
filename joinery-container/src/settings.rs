//! Container settings.
//!
//! Settings are plain data so an application can load them from its own
//! configuration source through serde and hand them to
//! [`ContainerBuilder::settings`](crate::container::ContainerBuilder::settings).

use serde::{Deserialize, Serialize};

use crate::lifetime::Lifetime;

/// Which resolved instances land in the instance cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Only instances of shared bindings are cached. Unbound and
    /// transient identifiers are rebuilt on every resolve.
    #[default]
    SharedOnly,

    /// Every successfully resolved abstract is cached, whatever its
    /// binding says.
    EveryResolve,
}

impl CachePolicy {
    /// Whether an instance resolved under `lifetime` should be cached.
    #[inline]
    pub fn should_cache(&self, lifetime: Lifetime) -> bool {
        match self {
            CachePolicy::SharedOnly => lifetime.is_shared(),
            CachePolicy::EveryResolve => true,
        }
    }
}

/// Tunables for a [`Container`](crate::container::Container).
///
/// # Examples
/// ```
/// use joinery_container::settings::{CachePolicy, ContainerSettings};
///
/// let settings = ContainerSettings::default();
/// assert_eq!(settings.cache_policy, CachePolicy::SharedOnly);
/// assert_eq!(settings.max_suggestions, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    pub cache_policy: CachePolicy,
    /// Upper bound on "did you mean" hints attached to
    /// `NotInstantiable` errors. Zero disables them.
    pub max_suggestions: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            cache_policy: CachePolicy::SharedOnly,
            max_suggestions: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_only_caches_shared() {
        assert!(CachePolicy::SharedOnly.should_cache(Lifetime::Shared));
        assert!(!CachePolicy::SharedOnly.should_cache(Lifetime::Transient));
    }

    #[test]
    fn every_resolve_caches_everything() {
        assert!(CachePolicy::EveryResolve.should_cache(Lifetime::Shared));
        assert!(CachePolicy::EveryResolve.should_cache(Lifetime::Transient));
    }

    #[test]
    fn deserialize_partial_settings() {
        let settings: ContainerSettings =
            serde_json::from_str(r#"{ "cache_policy": "every_resolve" }"#).unwrap();
        assert_eq!(settings.cache_policy, CachePolicy::EveryResolve);
        assert_eq!(settings.max_suggestions, 3);
    }

    #[test]
    fn deserialize_empty_settings() {
        let settings: ContainerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ContainerSettings::default());
    }
}
