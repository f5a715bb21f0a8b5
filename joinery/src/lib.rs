//! # joinery
//!
//! A runtime dependency-resolution container: ask for an identifier, get a
//! fully wired object graph back. Types declare their constructor
//! parameters in a [`Blueprint`] (by hand, or with `#[derive(Injectable)]`),
//! and the container resolves each parameter from bindings, contextual
//! overrides, defaults or further resolution.
//!
//! # Examples
//! ```rust
//! use joinery::prelude::*;
//! use std::sync::Arc;
//!
//! struct Logger {
//!     id: u32,
//! }
//!
//! #[derive(Injectable)]
//! struct Service {
//!     logger: Arc<Logger>,
//!     #[inject(default = 30)]
//!     timeout: u64,
//! }
//!
//! let container = Container::new();
//! container.bind_factory("Logger", |_, _| Ok(Logger { id: 1 }), true);
//! container.define_type::<Service>();
//!
//! let service: Arc<Service> = container.make("Service").unwrap();
//! assert_eq!(service.logger.id, 1);
//! assert_eq!(service.timeout, 30);
//! ```

pub use joinery_container::*;
pub use joinery_derive::*;
pub use joinery_support as support;

/// Container types plus the `Injectable` derive.
pub mod prelude {
    pub use joinery_container::prelude::*;
    pub use joinery_derive::Injectable;
}
