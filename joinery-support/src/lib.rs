//! # Joinery Support
//!
//! Text helpers shared by the joinery crates.
//!
//! This crate provides:
//! - Rendering of build chains for diagnostics
//! - Shortening of Rust type names into container identifiers
//! - "Did you mean?" suggestions for unknown identifiers

pub mod rendering;
