//! Test fixtures and pool helpers.
//!
//! Provides convenience functions for setting up pools over temporary
//! directories and common test scenarios.

use flexdb_core::{Config, Pool};
use std::path::Path;
use tempfile::TempDir;

/// A pool over a temporary directory, removed on drop.
pub struct TestPool {
    /// The pool instance.
    pub pool: Pool,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestPool {
    /// Creates a pool with the default configuration.
    pub fn new() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a pool whose configuration is adjusted by `configure`.
    ///
    /// The root is always the temporary directory.
    pub fn with_config<F>(configure: F) -> Self
    where
        F: FnOnce(Config) -> Config,
    {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = configure(Config::new(temp_dir.path())).root(temp_dir.path());
        Self {
            pool: Pool::new(config),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the pool root.
    pub fn path(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Opens a second, independent pool over the same directory.
    ///
    /// It shares no handles or cache with this one, the way a freshly
    /// started process would see the files.
    pub fn reopen(&self) -> Pool {
        Pool::new(self.pool.config().clone())
    }
}

impl Default for TestPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestPool {
    type Target = Pool;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}

/// Runs a test with a temporary pool.
///
/// # Example
///
/// ```rust,ignore
/// use flexdb_testkit::{with_temp_pool, Person};
///
/// #[test]
/// fn my_test() {
///     with_temp_pool(|pool| {
///         let persons = pool.collection::<Person>();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_pool<F, R>(f: F) -> R
where
    F: FnOnce(&Pool) -> R,
{
    let test_pool = TestPool::new();
    f(&test_pool.pool)
}

/// Runs a test with a temporary pool and its root directory.
pub fn with_temp_dir_pool<F, R>(f: F) -> R
where
    F: FnOnce(&Pool, &Path) -> R,
{
    let test_pool = TestPool::new();
    f(&test_pool.pool, test_pool.path())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use crate::schemas::{Contact, Log, Person};
    use flexdb_core::{RecordExt, RecordId};

    /// Names used by [`populated_persons`], cycled.
    pub const NAMES: [&str; 6] = [
        "Juan Green",
        "Juan Mann",
        "Mary Alvarez",
        "Alice Moreau",
        "albert Stone",
        "Bob Ward",
    ];

    /// Creates a pool holding `count` persons.
    ///
    /// Person `i` (from zero) is named after `NAMES[i % 6]`, suffixed with
    /// `i` past the first round, born in `1990 + i`, with mail
    /// `person{i}@example.com`.
    pub fn populated_persons(count: usize) -> TestPool {
        let test_pool = TestPool::new();
        let persons = test_pool.collection::<Person>();

        for i in 0..count {
            let mut person = persons.create();
            person.name = if i < NAMES.len() {
                NAMES[i].to_string()
            } else {
                format!("{} {i}", NAMES[i % NAMES.len()])
            };
            person.birth_year = 1990 + i64::try_from(i).expect("index fits i64");
            person.contact = Contact {
                mail: format!("person{i}@example.com"),
            };
            assert!(person.commit().expect("Failed to commit person"));
        }

        test_pool
    }

    /// Creates logs 1, 2 and 3, then deletes log 2.
    ///
    /// Returns the pool and the ids of the three logs.
    pub fn deleted_middle() -> (TestPool, Vec<RecordId>) {
        let test_pool = TestPool::new();
        let logs = test_pool.collection::<Log>();

        let mut ids = Vec::new();
        for kind in ["boot", "login", "logout"] {
            let mut log = logs.create();
            log.kind = kind.to_string();
            assert!(log.commit().expect("Failed to commit log"));
            ids.push(log.id());
        }
        assert!(logs.delete(ids[1]).expect("Failed to delete log"));

        (test_pool, ids)
    }
}
