//! # FlexDB Testkit
//!
//! Test utilities for FlexDB.
//!
//! This crate provides:
//! - A pool fixture over a temporary directory
//! - Sample record schemas with nested mappings and computed fields
//! - Property-based generators for operation sequences
//! - An integration harness that tracks expected state
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flexdb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_pool() {
//!     with_temp_pool(|pool| {
//!         let persons = pool.collection::<Person>();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod schemas;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::schemas::*;
    pub use flexdb_core::{Args, Pool, Record, RecordExt, RecordId};
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use schemas::*;
