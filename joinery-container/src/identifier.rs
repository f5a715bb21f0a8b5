//! Container identifiers.
//!
//! An [`Identifier`] names either an abstract contract or a concrete
//! type. Every store in the container is keyed by it.

use std::any::type_name;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use joinery_support::rendering::shorten_type_name;

/// A string key naming an abstract contract or a concrete type.
///
/// Cloning is cheap (the text lives behind an `Arc`), and lookups can be
/// done with a plain `&str` thanks to the [`Borrow`] impl.
///
/// # Examples
/// ```
/// use joinery_container::identifier::Identifier;
///
/// let id = Identifier::from("Logger");
/// assert_eq!(id.as_str(), "Logger");
///
/// struct UserService;
/// assert_eq!(Identifier::of::<UserService>().as_str(), "UserService");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    /// Creates an identifier from any string-like value.
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The identifier a Rust type registers under.
    ///
    /// Module paths are stripped, so `app::svc::Mailer` becomes `Mailer`
    /// and `Repo<app::User>` becomes `Repo<User>`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(shorten_type_name(type_name::<T>()))
    }

    /// The contextual key for an untyped parameter: `"$" + name`.
    ///
    /// ```
    /// use joinery_container::identifier::Identifier;
    ///
    /// assert_eq!(Identifier::variable("timeout").as_str(), "$timeout");
    /// ```
    pub fn variable(param_name: &str) -> Self {
        Self::new(format!("${param_name}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Identifier {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl From<&Identifier> for Identifier {
    fn from(id: &Identifier) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({:?})", &*self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
