//! Type-erased instances.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::error::{ContainerError, Result};
use crate::identifier::Identifier;

/// A fully constructed object, as stored and handed out by the container.
///
/// Two resolves of the same shared abstract return clones of one `Arc`,
/// so identity can be checked with [`Arc::ptr_eq`].
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Wraps a value into an [`Instance`].
#[inline]
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Downcasts an instance to `Arc<T>`.
///
/// `identifier` only feeds the error message.
pub fn downcast<T: Any + Send + Sync>(identifier: &Identifier, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            identifier: identifier.clone(),
            expected: type_name::<T>(),
        })
}
