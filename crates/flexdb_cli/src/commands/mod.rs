//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod rebuild;
pub mod verify;

use flexdb_codec::CodecError;
use flexdb_core::{CollectionHandle, CollectionOptions, CoreError, Pool, RecordId};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The collection directory does not exist.
    #[error("no collection found at {}", path.display())]
    CollectionNotFound {
        /// Directory that was looked for.
        path: PathBuf,
    },

    /// The requested record has no file.
    #[error("record {id} not found")]
    RecordNotFound {
        /// Requested id.
        id: RecordId,
    },

    /// Verification found problems.
    #[error("verification failed with {issues} issue(s)")]
    VerificationFailed {
        /// Number of problems.
        issues: usize,
    },

    /// Engine error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Rendering error.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// JSON output error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Opens the handle of an existing collection.
///
/// The record type is unknown here, so the handle takes its classname
/// from the journal and uses default options.
pub fn open_collection(pool: &Pool, name: &str) -> CliResult<Arc<CollectionHandle>> {
    let handle = pool.open_handle(name, CollectionOptions::new(), "");
    if !handle.dir().exists() {
        return Err(CliError::CollectionNotFound {
            path: handle.path().to_path_buf(),
        });
    }
    Ok(handle)
}


#[cfg(test)]
mod tests {
    use super::*;
    use flexdb_core::Config;
    use tempfile::TempDir;

    #[test]
    fn test_missing_collection() {
        let temp = TempDir::new().unwrap();
        let pool = Pool::new(Config::new(temp.path()));
        assert!(matches!(
            open_collection(&pool, "nothing"),
            Err(CliError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn test_classname_comes_from_journal() {
        let (temp, _pool, _handle) = testing::seeded();
        let pool = Pool::new(Config::new(temp.path()));
        let handle = open_collection(&pool, "notes").unwrap();
        assert_eq!(handle.classname(), "Note");
        assert_eq!(handle.count(), 2);
    }
}
