//! Derive macros for joinery.
//!
//! Re-exported by the `joinery` crate; depend on that instead.

pub use joinery_macros::Injectable;
