//! Collections.
//!
//! [`CollectionHandle`] owns the files, journal and snapshot rebuild of
//! one collection directory. [`Collection<T>`] is the typed view records
//! are created, loaded and queried through.

mod handle;
mod typed;

pub use handle::{CollectionHandle, RebuildPath};
pub use typed::Collection;
