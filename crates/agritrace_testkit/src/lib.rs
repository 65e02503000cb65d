//! # AgriTrace Testkit
//!
//! Test utilities for AgriTrace.
//!
//! This crate provides:
//! - Test fixtures: contracts over in-memory or temporary file ledgers with a
//!   manual clock, plus record builders
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use agritrace_testkit::prelude::*;
//!
//! let chain = TestChain::memory();
//! chain.create_product(product("P1", "F1")).unwrap();
//! assert!(chain.product_exists("P1").unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
