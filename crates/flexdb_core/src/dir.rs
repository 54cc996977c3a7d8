//! Collection directory management.
//!
//! Every collection is a directory under the pool root:
//!
//! ```text
//! <root>/<name>/
//! ├─ 1.object              # One file per record, named by id
//! ├─ 2.object
//! ├─ <basename>.journal    # Count, next id and pending commits
//! └─ <basename>.select     # Snapshot of every record, keyed by id
//! ```
//!
//! `<basename>` is the last path component of the collection name, so a
//! collection named `logs/20240101` keeps `20240101.journal` inside
//! `<root>/logs/20240101/`.

use crate::error::CoreResult;
use crate::types::RecordId;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of record files.
const OBJECT_EXTENSION: &str = "object";
/// Extension of the journal file.
const JOURNAL_EXTENSION: &str = "journal";
/// Extension of the snapshot file.
const SNAPSHOT_EXTENSION: &str = "select";

/// File system layout of one collection.
#[derive(Debug, Clone)]
pub struct CollectionDir {
    /// Directory holding the collection's files.
    path: PathBuf,
    /// Last component of the collection name.
    basename: String,
    /// Permission bits for the directory when the engine creates it.
    mode: u32,
}

impl CollectionDir {
    /// Describes the directory of collection `name` under `root`.
    ///
    /// Nothing is touched on disk.
    #[must_use]
    pub fn new(root: &Path, name: &str, mode: u32) -> Self {
        let path = root.join(name);
        let basename = path
            .file_name()
            .map_or_else(|| name.to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            path,
            basename,
            mode,
        }
    }

    /// Returns the path to the collection directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the last component of the collection name.
    #[must_use]
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Returns whether the directory exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Returns the path of the file holding record `id`.
    #[must_use]
    pub fn object_path(&self, id: RecordId) -> PathBuf {
        self.path.join(format!("{id}.{OBJECT_EXTENSION}"))
    }

    /// Returns the path of the journal file.
    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.path
            .join(format!("{}.{JOURNAL_EXTENSION}", self.basename))
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.path
            .join(format!("{}.{SNAPSHOT_EXTENSION}", self.basename))
    }

    /// Creates the directory (and its parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure(&self) -> CoreResult<()> {
        if self.exists() {
            return Ok(());
        }
        self.create()
    }

    #[cfg(unix)]
    fn create(&self) -> CoreResult<()> {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

        fs::DirBuilder::new()
            .recursive(true)
            .mode(self.mode)
            .create(&self.path)?;
        // The builder's mode is filtered through the process umask.
        fs::set_permissions(&self.path, fs::Permissions::from_mode(self.mode))?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn create(&self) -> CoreResult<()> {
        let _ = self.mode;
        fs::create_dir_all(&self.path)?;
        Ok(())
    }

    /// Lists the record files in the directory, ordered by id.
    ///
    /// Files whose name is not an id come first, ordered by path.
    ///
    /// A missing directory has no record files.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn object_files(&self) -> CoreResult<Vec<PathBuf>> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let path = entry?.path();
            let is_object = path
                .extension()
                .is_some_and(|ext| ext == OBJECT_EXTENSION);
            if is_object && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by_cached_key(|path| (Self::parse_object_id(path), path.clone()));
        Ok(files)
    }

    /// Parses the record id out of a record file name.
    #[must_use]
    pub fn parse_object_id(path: &Path) -> Option<RecordId> {
        path.file_stem()?
            .to_str()?
            .parse::<i64>()
            .ok()
            .map(RecordId::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout() {
        let dir = CollectionDir::new(Path::new("/data"), "logs/20240101", 0o777);
        assert_eq!(dir.path(), Path::new("/data/logs/20240101"));
        assert_eq!(dir.basename(), "20240101");
        assert_eq!(
            dir.journal_path(),
            PathBuf::from("/data/logs/20240101/20240101.journal")
        );
        assert_eq!(
            dir.snapshot_path(),
            PathBuf::from("/data/logs/20240101/20240101.select")
        );
        assert_eq!(
            dir.object_path(RecordId::new(42)),
            PathBuf::from("/data/logs/20240101/42.object")
        );
    }

    #[test]
    fn ensure_creates_nested_directory() {
        let temp = tempdir().unwrap();
        let dir = CollectionDir::new(temp.path(), "logs/20240101", 0o777);

        assert!(!dir.exists());
        dir.ensure().unwrap();
        assert!(dir.exists());

        // Idempotent
        dir.ensure().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn ensure_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let dir = CollectionDir::new(temp.path(), "persons", 0o750);
        dir.ensure().unwrap();

        let mode = fs::metadata(dir.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn object_files_skip_other_files() {
        let temp = tempdir().unwrap();
        let dir = CollectionDir::new(temp.path(), "persons", 0o777);
        dir.ensure().unwrap();

        fs::write(dir.object_path(RecordId::new(10)), b"").unwrap();
        fs::write(dir.object_path(RecordId::new(2)), b"").unwrap();
        fs::write(dir.object_path(RecordId::new(1)), b"").unwrap();
        fs::write(dir.journal_path(), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = dir.object_files().unwrap();
        let ids: Vec<_> = files
            .iter()
            .filter_map(|p| CollectionDir::parse_object_id(p))
            .collect();
        assert_eq!(ids, vec![RecordId::new(1), RecordId::new(2), RecordId::new(10)]);
    }

    #[test]
    fn missing_directory_has_no_objects() {
        let temp = tempdir().unwrap();
        let dir = CollectionDir::new(temp.path(), "nothing", 0o777);
        assert!(dir.object_files().unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_non_numeric_stems() {
        assert_eq!(CollectionDir::parse_object_id(Path::new("abc.object")), None);
        assert_eq!(
            CollectionDir::parse_object_id(Path::new("/x/17.object")),
            Some(RecordId::new(17))
        );
    }
}
