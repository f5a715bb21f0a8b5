//! Caller-supplied constructor arguments.
//!
//! [`Parameters`] carries explicit values into a resolve or build call.
//! Values may be keyed by parameter name or by position; during a build
//! positional entries are re-keyed onto the declared parameter names, so
//! both spellings bind the same way.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::blueprint::Param;
use crate::error::Result;
use crate::identifier::Identifier;
use crate::instance::{Instance, downcast, instance};

/// Key of an explicit parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// Bound to the parameter with this name.
    Name(Identifier),
    /// Bound to the parameter at this position in the constructor.
    Position(usize),
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.into())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name.into())
    }
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Name(name) => write!(f, "${name}"),
            ParamKey::Position(position) => write!(f, "#{position}"),
        }
    }
}

/// Explicit values for a resolve or build call, in insertion order.
///
/// # Examples
/// ```
/// use joinery_container::parameters::Parameters;
///
/// let params = Parameters::new()
///     .with("name", String::from("reports"))
///     .at(1, 30u64);
///
/// assert_eq!(params.len(), 2);
/// assert_eq!(*params.get::<String>("name").unwrap().unwrap(), "reports");
/// ```
#[derive(Clone, Default)]
pub struct Parameters {
    entries: Vec<(ParamKey, Instance)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value under a name (or a position, via `usize`).
    pub fn with<T: Any + Send + Sync>(self, key: impl Into<ParamKey>, value: T) -> Self {
        self.with_instance(key, instance(value))
    }

    /// Adds a value bound to the constructor parameter at `position`.
    pub fn at<T: Any + Send + Sync>(self, position: usize, value: T) -> Self {
        self.with_instance(ParamKey::Position(position), instance(value))
    }

    /// Adds an already type-erased value.
    pub fn with_instance(mut self, key: impl Into<ParamKey>, value: Instance) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ParamKey, Instance)> {
        self.entries.iter()
    }

    /// Raw value stored under `name`; a later entry wins over an earlier one.
    pub fn get_instance(&self, name: &str) -> Option<&Instance> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| matches!(key, ParamKey::Name(n) if n == name))
            .map(|(_, value)| value)
    }

    /// Typed value stored under `name`.
    ///
    /// `Ok(None)` when absent, `Err` when present with another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        self.get_instance(name)
            .map(|value| downcast::<T>(&Identifier::variable(name), value.clone()))
            .transpose()
    }

    /// Typed value stored at `position`.
    pub fn position<T: Any + Send + Sync>(&self, position: usize) -> Result<Option<Arc<T>>> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| *key == ParamKey::Position(position))
            .map(|(_, value)| downcast::<T>(&Identifier::new(format!("#{position}")), value.clone()))
            .transpose()
    }

    /// Re-keys every entry by parameter name.
    ///
    /// Positional entries take the name of the declared parameter at that
    /// position and override a named entry for the same parameter. A
    /// position past the end of `params` matches nothing and is dropped.
    pub(crate) fn keyed_by_name(&self, params: &[Param]) -> HashMap<Identifier, Instance> {
        let mut keyed = HashMap::with_capacity(self.entries.len());

        for (key, value) in &self.entries {
            if let ParamKey::Name(name) = key {
                keyed.insert(name.clone(), value.clone());
            }
        }

        for (key, value) in &self.entries {
            if let ParamKey::Position(position) = key {
                match params.get(*position) {
                    Some(param) => {
                        keyed.insert(param.name().clone(), value.clone());
                    }
                    None => trace!(position, "Dropping positional parameter past the constructor arity"),
                }
            }
        }

        keyed
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(key, _)| key))
            .finish()
    }
}
