//! Process-wide container handle.
//!
//! Prefer passing `&Container` (or `Arc<Container>`) explicitly. For code
//! that needs a global accessor, one container can be installed here and
//! torn down again; nothing is installed implicitly.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::container::Container;

static CURRENT: Lazy<RwLock<Option<Arc<Container>>>> = Lazy::new(|| RwLock::new(None));

/// Installs `container` as the process-wide container, returning the one
/// it replaces.
///
/// # Examples
/// ```
/// use joinery_container::{Container, global};
/// use std::sync::Arc;
///
/// let container = Arc::new(Container::new());
/// global::install(container.clone());
/// assert!(Arc::ptr_eq(&global::current().unwrap(), &container));
/// global::teardown();
/// assert!(global::current().is_none());
/// ```
pub fn install(container: Arc<Container>) -> Option<Arc<Container>> {
    debug!("Installing global container");
    CURRENT.write().replace(container)
}

/// The installed container, if any.
pub fn current() -> Option<Arc<Container>> {
    CURRENT.read().clone()
}

/// Removes the installed container and returns it.
pub fn teardown() -> Option<Arc<Container>> {
    debug!("Tearing down global container");
    CURRENT.write().take()
}
