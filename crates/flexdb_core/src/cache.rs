//! Process-wide snapshot cache.
//!
//! Holds the last rebuilt snapshot of every collection, keyed by the
//! collection's [`Uniqid`]. Entries are replaced wholesale by each rebuild
//! and never evicted. Callers that mutate an entry do so on a copy.

use crate::types::{RecordId, Uniqid};
use flexdb_codec::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// All records of a collection, keyed and ordered by id.
pub type Snapshot = BTreeMap<RecordId, Value>;

/// Cache of collection snapshots.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    entries: RwLock<HashMap<Uniqid, Arc<Snapshot>>>,
}

impl SnapshotCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached snapshot of a collection.
    #[must_use]
    pub fn get(&self, uniqid: &Uniqid) -> Option<Arc<Snapshot>> {
        self.entries.read().get(uniqid).cloned()
    }

    /// Stores a snapshot, replacing the previous one.
    pub fn insert(&self, uniqid: Uniqid, items: Snapshot) -> Arc<Snapshot> {
        let items = Arc::new(items);
        self.entries.write().insert(uniqid, Arc::clone(&items));
        items
    }

    /// Drops the cached snapshot of a collection.
    pub fn remove(&self, uniqid: &Uniqid) -> Option<Arc<Snapshot>> {
        self.entries.write().remove(uniqid)
    }

    /// Returns whether a collection has a cached snapshot.
    #[must_use]
    pub fn contains(&self, uniqid: &Uniqid) -> bool {
        self.entries.read().contains_key(uniqid)
    }

    /// Returns the number of cached collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
