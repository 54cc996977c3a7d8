//! Pool and collection configuration.

use std::path::{Path, PathBuf};

/// Default permission bits for collection directories.
///
/// Directories are world-writable unless configured otherwise, so that
/// several users sharing a data root can all write to it.
pub const DEFAULT_DIR_MODE: u32 = 0o777;

/// Configuration for a [`Pool`](crate::Pool).
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory; collection names are resolved relative to it.
    pub root: PathBuf,

    /// Permission bits applied to collection directories the engine creates.
    /// Only honored on unix.
    pub dir_mode: u32,

    /// Whether `save` may create a missing collection directory.
    pub create_if_missing: bool,

    /// Whether a rebuild writes the `.select` snapshot file.
    pub persist_snapshot: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dir_mode: DEFAULT_DIR_MODE,
            create_if_missing: true,
            persist_snapshot: true,
        }
    }
}

impl Config {
    /// Creates a configuration rooted at `root` with default values.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the root directory.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the permission bits for created directories.
    #[must_use]
    pub const fn dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Sets whether missing collection directories are created on save.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether rebuilds persist the snapshot file.
    #[must_use]
    pub const fn persist_snapshot(mut self, value: bool) -> Self {
        self.persist_snapshot = value;
        self
    }

    /// Resolves a collection name to its directory.
    #[must_use]
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(Path::new(name))
    }
}

/// Per-collection options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Id floor: the first id handed out is `min_id + 1`.
    pub min_id: i64,

    /// Capacity bound. Zero or negative means unbounded.
    pub max_size: i64,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            min_id: 0,
            max_size: -1,
        }
    }
}

impl CollectionOptions {
    /// Creates unbounded options with an id floor of zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id floor.
    #[must_use]
    pub const fn min_id(mut self, min_id: i64) -> Self {
        self.min_id = min_id;
        self
    }

    /// Sets the capacity bound.
    #[must_use]
    pub const fn max_size(mut self, max_size: i64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Returns whether a collection holding `count` records is full.
    #[must_use]
    pub fn is_full(&self, count: u64) -> bool {
        self.max_size > 0 && i128::from(count) >= i128::from(self.max_size)
    }
}
