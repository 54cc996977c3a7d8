//! # FlexDB Core
//!
//! Embedded, file-backed object store for FlexDB.
//!
//! This crate provides:
//! - One file per record in a directory per collection
//! - A per-collection journal of pending commits that lets warm processes
//!   rebuild their snapshot incrementally instead of rescanning
//! - Typed records with default-filled, unknown-key-tolerant loading
//! - An in-memory query engine: dotted-path predicates, joins, sorting,
//!   deduplication and pagination
//!
//! ## Usage
//!
//! ```rust,ignore
//! use flexdb_core::{Pool, RecordExt};
//!
//! let pool = Pool::open("data");
//! let persons = pool.collection::<Person>();
//!
//! let mut person = persons.create();
//! person.name = "Alice".into();
//! person.commit()?;
//!
//! let mut select = persons.select()?;
//! let alices = select.field("name").prefix("al", false);
//! select.filter([alices]);
//! ```
//!
//! ## Concurrency
//!
//! All I/O is synchronous. Within a process, operations on one collection
//! are serialized by its handle. Across processes nothing is coordinated:
//! use a single writer per collection directory.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod collection;
mod config;
mod dir;
mod error;
mod journal;
mod pool;
mod query;
mod record;
mod store;
mod types;

pub use cache::{Snapshot, SnapshotCache};
pub use collection::{Collection, CollectionHandle, RebuildPath};
pub use config::{CollectionOptions, Config, DEFAULT_DIR_MODE};
pub use dir::CollectionDir;
pub use error::{CoreError, CoreResult};
pub use flexdb_codec::{Map, Value};
pub use journal::{Commit, CommitOp, Journal};
pub use pool::Pool;
pub use query::{JoinedRow, PageButton, Paginate, Row, Select, Statement};
pub use record::{resolve, Args, Attr, Record, RecordExt, RecordMeta, Resolve};
pub use store::ObjectStore;
pub use types::{RecordId, Uniqid};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
