//! Rebuild command implementation.

use super::{open_collection, CliResult};
use flexdb_core::{CollectionHandle, Pool};
use std::time::{Duration, Instant};

/// Rebuild result.
#[derive(Debug)]
pub struct RebuildResult {
    /// Journal count before the rebuild.
    pub count_before: u64,
    /// Commits discarded by the rebuild.
    pub pending_before: usize,
    /// Records found by the rescan.
    pub records: usize,
    /// Time spent rescanning.
    pub elapsed: Duration,
}

/// Rescans every record file, then rewrites the snapshot and journal.
pub fn rebuild(handle: &CollectionHandle) -> CliResult<RebuildResult> {
    handle.reload();
    let count_before = handle.count();
    let pending_before = handle.pending_commits().len();

    let start = Instant::now();
    let items = handle.rebuild()?;
    let elapsed = start.elapsed();

    tracing::info!(
        collection = handle.name(),
        records = items.len(),
        "collection rebuilt"
    );
    Ok(RebuildResult {
        count_before,
        pending_before,
        records: items.len(),
        elapsed,
    })
}

/// Runs the rebuild command.
pub fn run(pool: &Pool, name: &str) -> CliResult<()> {
    let handle = open_collection(pool, name)?;
    let result = rebuild(&handle)?;

    println!("Rebuilt {name:?} in {:?}", result.elapsed);
    println!(
        "  Records:   {} (journal said {})",
        result.records, result.count_before
    );
    println!("  Discarded: {} pending commit(s)", result.pending_before);
    println!("  {}", handle);
    Ok(())
}
