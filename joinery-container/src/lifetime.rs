//! Binding lifetimes.
//!
//! A binding is either [`Lifetime::Shared`] (constructed once, then
//! served from the instance cache) or [`Lifetime::Transient`]
//! (constructed on every resolve).
use std::fmt;

use serde::{Deserialize, Serialize};

/// How long a resolved instance lives inside the container.
///
/// # Examples
/// ```
/// use joinery_container::lifetime::Lifetime;
///
/// assert_eq!(Lifetime::from_shared(true), Lifetime::Shared);
/// assert!(Lifetime::Shared > Lifetime::Transient);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// New instance on every resolve.
    #[default]
    Transient,

    /// One instance per container, created on first resolve and kept
    /// until the container is dropped or the instance is forgotten.
    Shared,
}

impl Lifetime {
    /// Maps the `shared` flag of `bind` onto a lifetime.
    #[inline]
    pub fn from_shared(shared: bool) -> Self {
        if shared { Lifetime::Shared } else { Lifetime::Transient }
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifetime::Shared)
    }
}

impl From<bool> for Lifetime {
    fn from(shared: bool) -> Self {
        Lifetime::from_shared(shared)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Shared => write!(f, "Shared"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_ordering() {
        assert!(Lifetime::Shared > Lifetime::Transient);
    }

    #[test]
    fn shared_flag() {
        assert!(Lifetime::from(true).is_shared());
        assert!(!Lifetime::from(false).is_shared());
        assert_eq!(Lifetime::default(), Lifetime::Transient);
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(format!("{}", Lifetime::Shared), "Shared");
        assert_eq!(format!("{}", Lifetime::Transient), "Transient");
    }
}
