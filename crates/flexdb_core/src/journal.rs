//! Per-collection journal.
//!
//! The journal is a small CBOR file next to the record files. It tracks
//! the record count, the next id to hand out, and the commits made since
//! the last snapshot rebuild. Those pending commits are what lets a warm
//! process rebuild its snapshot by replaying a few files instead of
//! rescanning the whole directory.

use crate::error::CoreResult;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Kind of change a commit made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitOp {
    /// A record file was created.
    Inserted,
    /// An existing record file was overwritten.
    Updated,
    /// A record file was removed.
    Deleted,
}

impl fmt::Display for CommitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inserted => "INSERTED",
            Self::Updated => "UPDATED",
            Self::Deleted => "DELETED",
        };
        f.write_str(name)
    }
}

/// One pending change, in commit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// What happened.
    pub op: CommitOp,
    /// Which record it happened to.
    pub id: RecordId,
}

impl Commit {
    /// Creates a commit.
    #[must_use]
    pub const fn new(op: CommitOp, id: RecordId) -> Self {
        Self { op, id }
    }
}

/// On-disk form of the journal.
#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    count: u64,
    next_id: RecordId,
    classname: String,
    commits: Vec<Commit>,
}

/// In-memory journal of one collection.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    classname: String,
    first_id: RecordId,
    count: u64,
    next_id: RecordId,
    commits: Vec<Commit>,
}

impl Journal {
    /// Creates an empty journal stored at `path`.
    ///
    /// `min_id` is the id floor: the first id handed out is `min_id + 1`.
    #[must_use]
    pub fn new(path: PathBuf, classname: impl Into<String>, min_id: i64) -> Self {
        let first_id = RecordId::new(min_id).next();
        Self {
            path,
            classname: classname.into(),
            first_id,
            count: 0,
            next_id: first_id,
            commits: Vec::new(),
        }
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the name of the record type the collection stores.
    #[must_use]
    pub fn classname(&self) -> &str {
        &self.classname
    }

    /// Returns the number of records the journal believes exist.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Returns the next id to hand out.
    #[must_use]
    pub const fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Returns the commits made since the last rebuild.
    #[must_use]
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Returns whether any commits are pending.
    #[must_use]
    pub fn has_commits(&self) -> bool {
        !self.commits.is_empty()
    }

    /// Reloads the journal from disk.
    ///
    /// Returns `true` if the file was read. A missing or unreadable file
    /// resets the journal to its empty state and returns `false`; the
    /// directory scan on the next rebuild recovers the real contents.
    pub fn load(&mut self) -> bool {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "cannot read journal");
                }
                self.reset_to_empty();
                return false;
            }
        };

        match flexdb_codec::from_cbor::<JournalFile>(&bytes) {
            Ok(file) => {
                self.count = file.count;
                self.next_id = file.next_id.max(self.first_id);
                self.commits = file.commits;
                if !file.classname.is_empty() {
                    self.classname = file.classname;
                }
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "journal is corrupt, ignoring it");
                self.reset_to_empty();
                false
            }
        }
    }

    /// Writes the journal to disk.
    ///
    /// Returns `Ok(false)` without writing when the collection directory
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn save(&self) -> CoreResult<bool> {
        if !self.path.parent().is_some_and(Path::is_dir) {
            return Ok(false);
        }
        let file = JournalFile {
            count: self.count,
            next_id: self.next_id,
            classname: self.classname.clone(),
            commits: self.commits.clone(),
        };
        fs::write(&self.path, flexdb_codec::to_cbor(&file)?)?;
        Ok(true)
    }

    /// Appends a commit without touching the count or next id.
    pub fn append(&mut self, op: CommitOp, id: RecordId) {
        self.commits.push(Commit::new(op, id));
    }

    /// Records the creation of record `id`.
    pub fn record_insert(&mut self, id: RecordId) {
        self.count += 1;
        self.next_id = self.next_id.next().max(id.next());
        self.append(CommitOp::Inserted, id);
    }

    /// Records an overwrite of record `id`.
    pub fn record_update(&mut self, id: RecordId) {
        self.append(CommitOp::Updated, id);
    }

    /// Records the removal of record `id`.
    pub fn record_delete(&mut self, id: RecordId) {
        self.count = self.count.saturating_sub(1);
        self.append(CommitOp::Deleted, id);
    }

    /// Clears pending commits after a rebuild produced `count` records.
    pub fn reset(&mut self, count: u64) {
        self.count = count;
        self.commits.clear();
    }

    /// Moves the next id past `id` if it is not already.
    ///
    /// Returns `true` if the next id changed. Used after a rebuild, when the
    /// journal may have been lost while records above its counter exist.
    pub fn raise_next_id(&mut self, id: RecordId) -> bool {
        let floor = id.next();
        if self.next_id >= floor {
            return false;
        }
        self.next_id = floor;
        true
    }

    fn reset_to_empty(&mut self) {
        self.count = 0;
        self.next_id = self.first_id;
        self.commits.clear();
    }
}

impl fmt::Display for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Journal(count={}, next_id={}, pending={})",
            self.count,
            self.next_id,
            self.commits.len()
        )
    }
}
