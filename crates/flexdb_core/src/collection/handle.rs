//! Untyped collection handle.

use crate::cache::{Snapshot, SnapshotCache};
use crate::config::{CollectionOptions, Config};
use crate::dir::CollectionDir;
use crate::error::CoreResult;
use crate::journal::{Commit, CommitOp, Journal};
use crate::store::ObjectStore;
use crate::types::{RecordId, Uniqid};
use flexdb_codec::Value;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which strategy a snapshot rebuild used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPath {
    /// No pending commits and a snapshot file on disk: the snapshot was
    /// served from the cache or the file without touching record files.
    Cold,
    /// Pending commits were replayed onto the cached snapshot.
    Incremental,
    /// Every record file was read.
    FullScan,
}

impl fmt::Display for RebuildPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cold => "cold",
            Self::Incremental => "incremental",
            Self::FullScan => "full-scan",
        };
        f.write_str(name)
    }
}

/// State guarded by the handle's lock.
#[derive(Debug)]
struct HandleState {
    journal: Journal,
    /// Highest id handed out by this process, committed or not.
    last_reserved: Option<RecordId>,
}

/// Metadata and storage of one collection.
///
/// A handle owns the collection's directory layout, journal and options.
/// Saves, deletes and rebuilds on the same handle are serialized by an
/// internal lock, so concurrent callers never interleave journal updates.
/// Handles are shared through [`Pool`](crate::Pool), one per directory.
pub struct CollectionHandle {
    name: String,
    uniqid: Uniqid,
    options: CollectionOptions,
    store: ObjectStore,
    create_if_missing: bool,
    persist_snapshot: bool,
    cache: Arc<SnapshotCache>,
    state: Mutex<HandleState>,
}

impl CollectionHandle {
    /// Opens the handle of collection `name` and loads its journal.
    #[must_use]
    pub fn open(
        config: &Config,
        name: &str,
        options: CollectionOptions,
        classname: &str,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        let dir = CollectionDir::new(&config.root, name, config.dir_mode);
        let uniqid = Uniqid::for_path(dir.path());
        let mut journal = Journal::new(dir.journal_path(), classname, options.min_id);
        journal.load();

        Self {
            name: name.to_string(),
            uniqid,
            options,
            store: ObjectStore::new(dir),
            create_if_missing: config.create_if_missing,
            persist_snapshot: config.persist_snapshot,
            cache,
            state: Mutex::new(HandleState {
                journal,
                last_reserved: None,
            }),
        }
    }

    /// Returns the collection name, relative to the pool root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection identity.
    #[must_use]
    pub const fn uniqid(&self) -> Uniqid {
        self.uniqid
    }

    /// Returns the collection options.
    #[must_use]
    pub const fn options(&self) -> CollectionOptions {
        self.options
    }

    /// Returns the collection directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.dir().path()
    }

    /// Returns the directory layout.
    #[must_use]
    pub const fn dir(&self) -> &CollectionDir {
        self.store.dir()
    }

    /// Returns the name of the record type stored here.
    #[must_use]
    pub fn classname(&self) -> String {
        self.state.lock().journal.classname().to_string()
    }

    /// Returns the record count as last seen by this handle.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.state.lock().journal.count()
    }

    /// Returns the next id recorded in the journal.
    #[must_use]
    pub fn next_id(&self) -> RecordId {
        self.state.lock().journal.next_id()
    }

    /// Returns the commits pending since the last rebuild.
    #[must_use]
    pub fn pending_commits(&self) -> Vec<Commit> {
        self.state.lock().journal.commits().to_vec()
    }

    /// Returns whether commits are pending since the last rebuild.
    #[must_use]
    pub fn has_commits(&self) -> bool {
        self.state.lock().journal.has_commits()
    }

    /// Returns a copy of the journal as last seen by this handle.
    #[must_use]
    pub fn journal(&self) -> Journal {
        self.state.lock().journal.clone()
    }

    /// Reloads the journal from disk. Returns `false` if there was none.
    pub fn reload(&self) -> bool {
        self.state.lock().journal.load()
    }

    /// Hands out a fresh record id.
    ///
    /// The id is at least the journal's next id and strictly greater than
    /// any id this handle handed out before, so two records created before
    /// either is committed never share an id. Ids that already have a file
    /// are skipped.
    pub fn reserve_id(&self) -> RecordId {
        let mut state = self.state.lock();
        state.journal.load();
        let mut id = state.journal.next_id();
        if let Some(last) = state.last_reserved {
            id = id.max(last.next());
        }
        while self.store.exists(id) {
            id = id.next();
        }
        state.last_reserved = Some(id);
        id
    }

    /// Returns the path of the file holding record `id`.
    #[must_use]
    pub fn path_to_object(&self, id: RecordId) -> PathBuf {
        self.store.dir().object_path(id)
    }

    /// Returns whether record `id` has a file.
    #[must_use]
    pub fn exists(&self, id: RecordId) -> bool {
        self.store.exists(id)
    }

    /// Reads the stored mapping of record `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn load_object(&self, id: RecordId) -> CoreResult<Option<Value>> {
        self.store.read_object(id)
    }

    /// Writes record `id` and journals the insert or update.
    ///
    /// Returns `Ok(false)` if the collection is full, or if its directory
    /// is missing and may not be created. Nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn save_object(&self, id: RecordId, doc: &Value) -> CoreResult<bool> {
        let mut state = self.state.lock();
        let journal = &mut state.journal;
        journal.load();

        if !self.store.dir().exists() {
            if !self.create_if_missing {
                tracing::debug!(collection = %self.name, "collection directory missing, not saving");
                return Ok(false);
            }
            self.store.dir().ensure()?;
        }

        if self.options.is_full(journal.count()) {
            tracing::info!(
                collection = %self.name,
                max_size = self.options.max_size,
                "collection is full, refusing record {id}"
            );
            return Ok(false);
        }

        let updated = self.store.exists(id);
        self.store.write_object(id, doc)?;
        if updated {
            journal.record_update(id);
        } else {
            journal.record_insert(id);
        }
        journal.save()
    }

    /// Removes record `id` and journals the delete.
    ///
    /// Returns `Ok(false)` if the record has no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn delete_object(&self, id: RecordId) -> CoreResult<bool> {
        let mut state = self.state.lock();
        let journal = &mut state.journal;
        journal.load();

        if !self.store.remove_object(id)? {
            return Ok(false);
        }
        journal.record_delete(id);
        journal.save()
    }

    /// Returns the current snapshot of every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a snapshot
    /// or journal cannot be written.
    pub fn load_all(&self) -> CoreResult<Arc<Snapshot>> {
        self.load_all_traced().map(|(items, _)| items)
    }

    /// Like [`load_all`](Self::load_all), also reporting the strategy used.
    ///
    /// # Errors
    ///
    /// See [`load_all`](Self::load_all).
    pub fn load_all_traced(&self) -> CoreResult<(Arc<Snapshot>, RebuildPath)> {
        self.rebuild_with(false)
    }

    /// Rebuilds the snapshot from the record files, ignoring the cache,
    /// the snapshot file and any pending commits.
    ///
    /// # Errors
    ///
    /// See [`load_all`](Self::load_all).
    pub fn rebuild(&self) -> CoreResult<Arc<Snapshot>> {
        self.rebuild_with(true).map(|(items, _)| items)
    }

    fn rebuild_with(&self, force_scan: bool) -> CoreResult<(Arc<Snapshot>, RebuildPath)> {
        let mut state = self.state.lock();
        let journal = &mut state.journal;
        journal.load();

        let cached = self.cache.get(&self.uniqid);
        let pending = journal.commits().to_vec();

        if !force_scan && pending.is_empty() && self.store.has_snapshot() {
            if let Some(items) = cached {
                tracing::debug!(collection = %self.name, path = %RebuildPath::Cold, "snapshot served from cache");
                self.settle_next_id(journal, &items)?;
                return Ok((items, RebuildPath::Cold));
            }
            match self.store.read_snapshot() {
                Ok(Some(items)) => {
                    tracing::debug!(collection = %self.name, path = %RebuildPath::Cold, "snapshot loaded from file");
                    self.settle_next_id(journal, &items)?;
                    return Ok((self.cache.insert(self.uniqid, items), RebuildPath::Cold));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(collection = %self.name, error = %e, "snapshot file unreadable, rescanning");
                }
            }
        }

        let (items, path) = match cached {
            Some(base) if !force_scan && !pending.is_empty() => {
                (self.replay(&base, &pending), RebuildPath::Incremental)
            }
            _ => (self.store.scan()?, RebuildPath::FullScan),
        };
        tracing::debug!(
            collection = %self.name,
            path = %path,
            records = items.len(),
            replayed = pending.len(),
            "snapshot rebuilt"
        );

        if self.persist_snapshot {
            self.store.write_snapshot(&items)?;
        }
        journal.reset(items.len() as u64);
        if let Some(&last) = items.keys().next_back() {
            journal.raise_next_id(last);
        }
        journal.save()?;

        Ok((self.cache.insert(self.uniqid, items), path))
    }

    /// Moves the journal's next id past every id in `items`, saving the
    /// journal if it changed. A lost journal restarts its counter at the
    /// id floor while record files above it still exist.
    fn settle_next_id(&self, journal: &mut Journal, items: &Snapshot) -> CoreResult<()> {
        let Some(&last) = items.keys().next_back() else {
            return Ok(());
        };
        if journal.raise_next_id(last) {
            tracing::info!(collection = %self.name, next_id = %journal.next_id(), "journal counter behind stored records, raised");
            journal.save()?;
        }
        Ok(())
    }

    /// Applies pending commits, in order, to a copy of `base`.
    ///
    /// Entries are read as [`ObjectStore::read_entry`] reads them for a
    /// full scan. An insert or update whose file has since vanished or no
    /// longer decodes to a mapping removes the entry, matching what a full
    /// scan would produce.
    fn replay(&self, base: &Snapshot, pending: &[Commit]) -> Snapshot {
        let mut items = base.clone();
        for commit in pending {
            match commit.op {
                CommitOp::Deleted => {
                    items.remove(&commit.id);
                }
                CommitOp::Inserted | CommitOp::Updated => match self.store.read_entry(commit.id) {
                    Ok(Some(doc)) => {
                        items.insert(commit.id, doc);
                    }
                    Ok(None) => {
                        items.remove(&commit.id);
                    }
                    Err(e) => {
                        tracing::warn!(collection = %self.name, id = %commit.id, error = %e, "unreadable record file, skipping");
                        items.remove(&commit.id);
                    }
                },
            }
        }
        items
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.name)
            .field("uniqid", &self.uniqid)
            .field("options", &self.options)
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        write!(
            f,
            "Collection(name={:?}, classname={:?}, min_id={}, max_size={}, {})",
            self.name,
            state.journal.classname(),
            self.options.min_id,
            self.options.max_size,
            state.journal
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn open(temp: &TempDir, options: CollectionOptions) -> CollectionHandle {
        CollectionHandle::open(
            &Config::new(temp.path()),
            "persons",
            options,
            "Person",
            Arc::new(SnapshotCache::new()),
        )
    }

    fn insert(handle: &CollectionHandle, name: &str) -> RecordId {
        let id = handle.reserve_id();
        let doc = json!({"id": id.as_i64(), "name": name});
        assert!(handle.save_object(id, &doc).unwrap());
        id
    }

    #[test]
    fn reserve_skips_uncommitted_ids() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());

        let a = handle.reserve_id();
        let b = handle.reserve_id();
        assert_eq!(a, RecordId::new(1));
        assert_eq!(b, RecordId::new(2));
    }

    #[test]
    fn ids_respect_floor() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new().min_id(10_000));
        assert_eq!(insert(&handle, "a"), RecordId::new(10_001));
        assert_eq!(insert(&handle, "b"), RecordId::new(10_002));
    }

    #[test]
    fn save_creates_directory_and_journals() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        assert!(!handle.dir().exists());

        let id = insert(&handle, "Alice");
        assert!(handle.dir().exists());
        assert!(handle.path_to_object(id).is_file());
        assert!(handle.has_commits());
        assert_eq!(handle.count(), 1);
        assert_eq!(handle.next_id(), id.next());
        assert_eq!(
            handle.pending_commits(),
            vec![Commit::new(CommitOp::Inserted, id)]
        );

        // Saving again is an update
        assert!(handle.save_object(id, &json!({"id": 1, "name": "Bob"})).unwrap());
        assert_eq!(handle.count(), 1);
        assert_eq!(handle.pending_commits()[1], Commit::new(CommitOp::Updated, id));
    }

    #[test]
    fn save_refused_without_directory() {
        let temp = tempdir().unwrap();
        let handle = CollectionHandle::open(
            &Config::new(temp.path()).create_if_missing(false),
            "persons",
            CollectionOptions::new(),
            "Person",
            Arc::new(SnapshotCache::new()),
        );
        let id = handle.reserve_id();
        assert!(!handle.save_object(id, &json!({"id": 1})).unwrap());
        assert!(!handle.dir().exists());
    }

    #[test]
    fn capacity_is_enforced() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new().max_size(2));
        insert(&handle, "a");
        insert(&handle, "b");

        let id = handle.reserve_id();
        assert!(!handle.save_object(id, &json!({"id": id.as_i64()})).unwrap());
        assert!(!handle.exists(id));
        assert_eq!(handle.count(), 2);
    }

    #[test]
    fn delete_missing_record() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        let id = insert(&handle, "a");

        assert!(handle.delete_object(id).unwrap());
        assert!(!handle.delete_object(id).unwrap());
        assert_eq!(handle.count(), 0);
    }

    #[test]
    fn rebuild_paths() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        insert(&handle, "a");
        insert(&handle, "b");

        // Nothing cached yet: full scan, snapshot persisted, journal cleared
        let (items, path) = handle.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::FullScan);
        assert_eq!(items.len(), 2);
        assert!(handle.dir().snapshot_path().is_file());
        assert!(handle.pending_commits().is_empty());

        // No commits since: cold
        let (_, path) = handle.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::Cold);

        // Commits on a warm cache: incremental
        let c = insert(&handle, "c");
        handle.delete_object(RecordId::new(1)).unwrap();
        let (items, path) = handle.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::Incremental);
        let ids: Vec<_> = items.keys().copied().collect();
        assert_eq!(ids, vec![RecordId::new(2), c]);
        assert_eq!(handle.count(), 2);
    }

    #[test]
    fn cold_start_reads_snapshot_file() {
        let temp = tempdir().unwrap();
        let first = open(&temp, CollectionOptions::new());
        insert(&first, "a");
        first.load_all().unwrap();

        // A new handle with its own cache, as a fresh process would have
        let second = open(&temp, CollectionOptions::new());
        let (items, path) = second.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::Cold);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn commits_without_cache_rescan() {
        let temp = tempdir().unwrap();
        let first = open(&temp, CollectionOptions::new());
        insert(&first, "a");
        first.load_all().unwrap();
        insert(&first, "b");

        let second = open(&temp, CollectionOptions::new());
        let (items, path) = second.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::FullScan);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn replay_drops_vanished_files() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        insert(&handle, "a");
        handle.load_all().unwrap();

        let b = insert(&handle, "b");
        fs::remove_file(handle.dir().object_path(b)).unwrap();

        let (items, path) = handle.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::Incremental);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_scan() {
        let temp = tempdir().unwrap();
        let first = open(&temp, CollectionOptions::new());
        insert(&first, "a");
        first.load_all().unwrap();
        fs::write(first.dir().snapshot_path(), b"\x00garbage").unwrap();

        let second = open(&temp, CollectionOptions::new());
        let (items, path) = second.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::FullScan);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn forced_rebuild_rescans() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        insert(&handle, "a");
        handle.load_all().unwrap();

        // A file dropped in behind the engine's back
        let stray = RecordId::new(99);
        ObjectStore::new(handle.dir().clone())
            .write_object(stray, &json!({"id": 99}))
            .unwrap();

        assert_eq!(handle.load_all().unwrap().len(), 1);
        assert_eq!(handle.rebuild().unwrap().len(), 2);
    }

    #[test]
    fn lost_journal_counter_is_raised_by_a_scan() {
        let temp = tempdir().unwrap();
        let first = open(&temp, CollectionOptions::new());
        for name in ["a", "b", "c"] {
            insert(&first, name);
        }
        fs::write(first.dir().journal_path(), b"garbage").unwrap();

        let second = open(&temp, CollectionOptions::new());
        assert_eq!(second.next_id(), RecordId::new(1));
        let (items, path) = second.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::FullScan);
        assert_eq!(items.len(), 3);
        assert_eq!(second.next_id(), RecordId::new(4));
        assert_eq!(insert(&second, "d"), RecordId::new(4));
        assert_eq!(second.count(), 4);
    }

    #[test]
    fn lost_journal_counter_is_raised_on_cold_load() {
        let temp = tempdir().unwrap();
        let first = open(&temp, CollectionOptions::new());
        insert(&first, "a");
        insert(&first, "b");
        first.load_all().unwrap();
        fs::remove_file(first.dir().journal_path()).unwrap();

        let second = open(&temp, CollectionOptions::new());
        let (_, path) = second.load_all_traced().unwrap();
        assert_eq!(path, RebuildPath::Cold);
        assert_eq!(second.next_id(), RecordId::new(3));

        let mut reloaded = Journal::new(second.dir().journal_path(), "", 0);
        assert!(reloaded.load());
        assert_eq!(reloaded.next_id(), RecordId::new(3));
    }

    #[test]
    fn reserve_skips_ids_with_files() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        insert(&handle, "a");
        // Written behind the journal's back
        ObjectStore::new(handle.dir().clone())
            .write_object(RecordId::new(2), &json!({"id": 2}))
            .unwrap();

        assert_eq!(handle.next_id(), RecordId::new(2));
        assert_eq!(handle.reserve_id(), RecordId::new(3));
    }

    #[test]
    fn replay_matches_scan_for_renamed_files() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new());
        insert(&handle, "a");
        handle.load_all().unwrap();

        // A mapping whose stored id disagrees with its file name
        assert!(handle.save_object(RecordId::new(2), &json!({"id": 7, "name": "b"})).unwrap());
        let replayed = handle.load_all().unwrap();
        let scanned = handle.rebuild().unwrap();
        assert_eq!(replayed, scanned);
        assert_eq!(scanned[&RecordId::new(2)]["id"], json!(2));
    }

    #[test]
    fn display() {
        let temp = tempdir().unwrap();
        let handle = open(&temp, CollectionOptions::new().max_size(100));
        assert_eq!(
            handle.to_string(),
            "Collection(name=\"persons\", classname=\"Person\", min_id=0, max_size=100, \
             Journal(count=0, next_id=1, pending=0))"
        );
    }
}
