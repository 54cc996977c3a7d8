//! Core type definitions for FlexDB.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Identifier of a record within its collection.
///
/// Ids are strictly increasing within a collection and never reused, even
/// after the record holding one is deleted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Creates a new record ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns the next record ID.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the stable identity string of the record holding this id.
    ///
    /// Derived deterministically from the id (UUIDv5 in the OID namespace),
    /// so the same id always yields the same identity.
    #[must_use]
    pub fn identity(self) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.0.to_string().as_bytes()).to_string()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Stable identity of a collection.
///
/// A UUIDv5 (OID namespace) of the collection's resolved directory path.
/// Two handles opened on the same directory share a `Uniqid`, and with it
/// their snapshot cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uniqid(Uuid);

impl Uniqid {
    /// Derives the identity of the collection stored at `path`.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            path.to_string_lossy().as_bytes(),
        ))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Uniqid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
