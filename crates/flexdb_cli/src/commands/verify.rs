//! Verify command implementation.

use super::{open_collection, CliError, CliResult};
use flexdb_core::{CollectionDir, CollectionHandle, Pool};
use std::path::PathBuf;

/// A record file that could not be used.
#[derive(Debug)]
pub struct BadFile {
    /// Offending file.
    pub path: PathBuf,
    /// What is wrong with it.
    pub reason: String,
}

/// Verification result.
#[derive(Debug)]
pub struct VerifyResult {
    /// Record count according to the journal.
    pub journal_count: u64,
    /// Number of record files checked.
    pub files_checked: usize,
    /// Number of files holding a readable mapping.
    pub readable: usize,
    /// Files that failed to decode or do not hold a mapping.
    pub bad_files: Vec<BadFile>,
}

impl VerifyResult {
    fn issues(&self) -> usize {
        let count_mismatch = self.journal_count != self.readable as u64;
        self.bad_files.len() + usize::from(count_mismatch)
    }

    fn is_ok(&self) -> bool {
        self.issues() == 0
    }
}

/// Compares the journal count with the record files actually present.
pub fn verify(handle: &CollectionHandle) -> CliResult<VerifyResult> {
    handle.reload();
    let journal = handle.journal();
    let files = handle.dir().object_files()?;

    let mut result = VerifyResult {
        journal_count: journal.count(),
        files_checked: files.len(),
        readable: 0,
        bad_files: Vec::new(),
    };

    for path in files {
        let Some(id) = CollectionDir::parse_object_id(&path) else {
            result.bad_files.push(BadFile {
                path,
                reason: "file name is not a record id".to_string(),
            });
            continue;
        };

        let reason = match handle.load_object(id) {
            Ok(Some(doc)) if doc.is_object() => {
                result.readable += 1;
                continue;
            }
            Ok(Some(_)) => "does not hold a mapping".to_string(),
            Ok(None) => "disappeared during verification".to_string(),
            Err(e) => e.to_string(),
        };
        tracing::debug!(path = %path.display(), %reason, "bad record file");
        result.bad_files.push(BadFile { path, reason });
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(pool: &Pool, name: &str) -> CliResult<()> {
    let handle = open_collection(pool, name)?;
    println!("Verifying collection {name:?} at {}", handle.path().display());
    println!();

    let result = verify(&handle)?;
    print_result(&result);

    println!();
    if result.is_ok() {
        println!("✓ Collection verification passed");
        Ok(())
    } else {
        println!("✗ Collection verification failed");
        Err(CliError::VerificationFailed {
            issues: result.issues(),
        })
    }
}

fn print_result(result: &VerifyResult) {
    println!("  Journal count:  {}", result.journal_count);
    println!("  Files checked:  {}", result.files_checked);
    println!("  Readable:       {}", result.readable);

    if result.journal_count != result.readable as u64 {
        println!(
            "  ! journal counts {} records but {} are readable; run `rebuild` to resync",
            result.journal_count, result.readable
        );
    }
    for bad in &result.bad_files {
        println!("  ! {}: {}", bad.path.display(), bad.reason);
    }
}
