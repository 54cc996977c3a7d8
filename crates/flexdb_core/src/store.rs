//! Record files and snapshot files.
//!
//! Each record is one CBOR-encoded plain mapping in `<id>.object`. The
//! snapshot file holds every record at the time of the last rebuild as a
//! single CBOR map from id to mapping.

use crate::cache::Snapshot;
use crate::dir::CollectionDir;
use crate::error::{CoreError, CoreResult};
use crate::types::RecordId;
use flexdb_codec::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads and writes the files of one collection directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    dir: CollectionDir,
}

impl ObjectStore {
    /// Creates a store over `dir`.
    #[must_use]
    pub const fn new(dir: CollectionDir) -> Self {
        Self { dir }
    }

    /// Returns the directory layout.
    #[must_use]
    pub const fn dir(&self) -> &CollectionDir {
        &self.dir
    }

    /// Returns whether record `id` has a file.
    #[must_use]
    pub fn exists(&self, id: RecordId) -> bool {
        self.dir.object_path(id).is_file()
    }

    /// Reads record `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn read_object(&self, id: RecordId) -> CoreResult<Option<Value>> {
        read_document(&self.dir.object_path(id))
    }

    /// Writes record `id`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_object(&self, id: RecordId, doc: &Value) -> CoreResult<()> {
        fs::write(self.dir.object_path(id), flexdb_codec::to_cbor(doc)?)?;
        Ok(())
    }

    /// Removes record `id`. Returns `false` if there was no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove_object(&self, id: RecordId) -> CoreResult<bool> {
        match fs::remove_file(self.dir.object_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns whether a snapshot file exists.
    #[must_use]
    pub fn has_snapshot(&self) -> bool {
        self.dir.snapshot_path().is_file()
    }

    /// Reads the snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn read_snapshot(&self) -> CoreResult<Option<Snapshot>> {
        match fs::read(self.dir.snapshot_path()) {
            Ok(bytes) => Ok(Some(flexdb_codec::from_cbor(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the snapshot file. Returns `false` if the directory is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_snapshot(&self, items: &Snapshot) -> CoreResult<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        fs::write(self.dir.snapshot_path(), flexdb_codec::to_cbor(items)?)?;
        Ok(true)
    }

    /// Reads record `id` as a snapshot entry.
    ///
    /// An entry is keyed by its file, so its `id` is set to the file's id
    /// whatever the mapping stored. Returns `None` if the file is missing
    /// or does not hold a mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn read_entry(&self, id: RecordId) -> CoreResult<Option<Value>> {
        let Some(mut doc) = self.read_object(id)? else {
            return Ok(None);
        };
        let Some(map) = doc.as_object_mut() else {
            tracing::warn!(
                path = %self.dir.object_path(id).display(),
                "record file does not hold a mapping, skipping"
            );
            return Ok(None);
        };
        map.insert("id".to_string(), id.as_i64().into());
        Ok(Some(doc))
    }

    /// Reads every record file in the directory.
    ///
    /// Entries are keyed by file name, as [`read_entry`](Self::read_entry)
    /// keys them. Files whose name is not an id, that cannot be read, that
    /// fail to decode, or that do not hold a mapping are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory itself cannot be listed.
    pub fn scan(&self) -> CoreResult<Snapshot> {
        let mut items = Snapshot::new();

        for path in self.dir.object_files()? {
            let Some(id) = CollectionDir::parse_object_id(&path) else {
                tracing::warn!(path = %path.display(), "record file name is not an id, skipping");
                continue;
            };
            match self.read_entry(id) {
                Ok(Some(doc)) => {
                    items.insert(id, doc);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable record file, skipping");
                }
            }
        }

        Ok(items)
    }
}

fn read_document(path: &Path) -> CoreResult<Option<Value>> {
    match fs::read(path) {
        Ok(bytes) => flexdb_codec::from_cbor(&bytes)
            .map(Some)
            .map_err(CoreError::from),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn store() -> (TempDir, ObjectStore) {
        let temp = tempdir().unwrap();
        let dir = CollectionDir::new(temp.path(), "persons", 0o777);
        dir.ensure().unwrap();
        (temp, ObjectStore::new(dir))
    }

    #[test]
    fn object_write_read_remove() {
        let (_temp, store) = store();
        let id = RecordId::new(1);
        let doc = json!({"id": 1, "name": "Alice"});

        assert!(!store.exists(id));
        assert_eq!(store.read_object(id).unwrap(), None);

        store.write_object(id, &doc).unwrap();
        assert!(store.exists(id));
        assert_eq!(store.read_object(id).unwrap(), Some(doc));

        assert!(store.remove_object(id).unwrap());
        assert!(!store.remove_object(id).unwrap());
    }

    #[test]
    fn snapshot_round_trip() {
        let (_temp, store) = store();
        assert!(!store.has_snapshot());
        assert_eq!(store.read_snapshot().unwrap(), None);

        let mut items = Snapshot::new();
        items.insert(RecordId::new(1), json!({"id": 1}));
        items.insert(RecordId::new(3), json!({"id": 3}));
        assert!(store.write_snapshot(&items).unwrap());

        assert!(store.has_snapshot());
        assert_eq!(store.read_snapshot().unwrap(), Some(items));
    }

    #[test]
    fn scan_skips_bad_files() {
        let (_temp, store) = store();
        store
            .write_object(RecordId::new(1), &json!({"id": 1, "name": "a"}))
            .unwrap();
        store
            .write_object(RecordId::new(2), &json!(["not", "a", "mapping"]))
            .unwrap();
        fs::write(store.dir().object_path(RecordId::new(3)), b"\xff\xff").unwrap();
        store
            .write_object(RecordId::new(4), &json!({"name": "no id"}))
            .unwrap();

        let items = store.scan().unwrap();
        let ids: Vec<_> = items.keys().copied().collect();
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(4)]);
    }

    #[test]
    fn scan_keys_by_file_name() {
        let (_temp, store) = store();
        store
            .write_object(RecordId::new(9), &json!({"id": 12, "name": "moved"}))
            .unwrap();
        fs::write(store.dir().path().join("stray.object"), b"").unwrap();

        let items = store.scan().unwrap();
        let ids: Vec<_> = items.keys().copied().collect();
        assert_eq!(ids, vec![RecordId::new(9)]);
        assert_eq!(items[&RecordId::new(9)], json!({"id": 9, "name": "moved"}));
        assert_eq!(
            store.read_entry(RecordId::new(9)).unwrap().as_ref(),
            Some(&items[&RecordId::new(9)])
        );
    }

    #[test]
    fn read_entry_skips_non_mappings() {
        let (_temp, store) = store();
        store.write_object(RecordId::new(1), &json!([1, 2])).unwrap();
        assert_eq!(store.read_entry(RecordId::new(1)).unwrap(), None);
        assert_eq!(store.read_entry(RecordId::new(2)).unwrap(), None);
    }

    #[test]
    fn snapshot_write_without_directory() {
        let temp = tempdir().unwrap();
        let store = ObjectStore::new(CollectionDir::new(temp.path(), "gone", 0o777));
        assert!(!store.write_snapshot(&Snapshot::new()).unwrap());
        assert!(store.scan().unwrap().is_empty());
    }
}
