//! The pool: registry of open collections.
//!
//! A [`Pool`] owns the configuration, one [`CollectionHandle`] per
//! collection directory, and the snapshot cache those handles share.
//! Several pools may coexist (one per data root, or one per test); they
//! share nothing.

use crate::cache::SnapshotCache;
use crate::collection::{Collection, CollectionHandle};
use crate::config::{CollectionOptions, Config};
use crate::error::{CoreError, CoreResult};
use crate::record::Record;
use crate::types::Uniqid;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Registry of collection handles over one data root.
#[derive(Debug)]
pub struct Pool {
    config: Config,
    cache: Arc<SnapshotCache>,
    handles: RwLock<HashMap<Uniqid, Arc<CollectionHandle>>>,
}

impl Pool {
    /// Creates a pool with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cache: Arc::new(SnapshotCache::new()),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a pool over `root` with default settings.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(Config::new(root))
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared snapshot cache.
    #[must_use]
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Returns the typed collection `T` lives in by default.
    #[must_use]
    pub fn collection<T: Record>(&self) -> Collection<T> {
        self.collection_at(T::COLLECTION)
    }

    /// Returns a typed collection stored under `name`.
    ///
    /// Lets one record type live in several collections, such as one per
    /// day under `logs/<date>`.
    #[must_use]
    pub fn collection_at<T: Record>(&self, name: &str) -> Collection<T> {
        let options = CollectionOptions::new()
            .min_id(T::MIN_ID)
            .max_size(T::MAX_SIZE);
        Collection::new(self.open_handle(name, options, short_type_name::<T>()))
    }

    /// Returns the handle of collection `name`, opening it if needed.
    ///
    /// The first open of a directory fixes its options and classname;
    /// later opens of the same directory return the existing handle.
    #[must_use]
    pub fn open_handle(
        &self,
        name: &str,
        options: CollectionOptions,
        classname: &str,
    ) -> Arc<CollectionHandle> {
        let uniqid = Uniqid::for_path(&self.config.collection_path(name));
        if let Some(handle) = self.handles.read().get(&uniqid) {
            return Arc::clone(handle);
        }

        let mut handles = self.handles.write();
        let handle = handles.entry(uniqid).or_insert_with(|| {
            tracing::debug!(collection = name, %uniqid, "opening collection");
            Arc::new(CollectionHandle::open(
                &self.config,
                name,
                options,
                classname,
                Arc::clone(&self.cache),
            ))
        });
        Arc::clone(handle)
    }

    /// Looks up an open handle by identity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CollectionNotRegistered`] if no handle with
    /// that identity was opened on this pool.
    pub fn handle(&self, uniqid: Uniqid) -> CoreResult<Arc<CollectionHandle>> {
        self.handles
            .read()
            .get(&uniqid)
            .cloned()
            .ok_or(CoreError::CollectionNotRegistered { uniqid })
    }

    /// Returns every open handle, ordered by name.
    #[must_use]
    pub fn handles(&self) -> Vec<Arc<CollectionHandle>> {
        let mut handles: Vec<_> = self.handles.read().values().cloned().collect();
        handles.sort_by(|a, b| a.name().cmp(b.name()));
        handles
    }
}

/// Last path segment of a type name, without generic parameters.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
