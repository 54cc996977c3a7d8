//! Inspect command implementation.

use super::{open_collection, CliResult};
use flexdb_core::{CollectionHandle, Commit, Pool};
use serde::Serialize;

/// Collection inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Collection name.
    pub collection: String,
    /// Collection directory.
    pub path: String,
    /// Record type recorded in the journal.
    pub classname: String,
    /// Record count according to the journal.
    pub count: u64,
    /// Next id the collection will hand out.
    pub next_id: i64,
    /// Number of record files on disk.
    pub object_files: usize,
    /// Whether a snapshot file exists.
    pub has_snapshot: bool,
    /// Commits not yet folded into the snapshot, oldest first.
    pub pending: Vec<Commit>,
}

/// Gathers the journal header and pending commits of a collection.
pub fn inspect(handle: &CollectionHandle) -> CliResult<InspectResult> {
    handle.reload();
    let journal = handle.journal();
    Ok(InspectResult {
        collection: handle.name().to_string(),
        path: handle.path().display().to_string(),
        classname: journal.classname().to_string(),
        count: journal.count(),
        next_id: journal.next_id().as_i64(),
        object_files: handle.dir().object_files()?.len(),
        has_snapshot: handle.dir().snapshot_path().is_file(),
        pending: journal.commits().to_vec(),
    })
}

/// Runs the inspect command.
pub fn run(pool: &Pool, name: &str, format: &str) -> CliResult<()> {
    let handle = open_collection(pool, name)?;
    let result = inspect(&handle)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("FlexDB Collection Inspection");
    println!("============================");
    println!();
    println!("Collection: {}", result.collection);
    println!("Path:       {}", result.path);
    println!("Classname:  {}", display_or_dash(&result.classname));
    println!();
    println!("Journal:");
    println!("  Count:        {}", result.count);
    println!("  Next id:      {}", result.next_id);
    println!("  Record files: {}", result.object_files);
    println!(
        "  Snapshot:     {}",
        if result.has_snapshot { "present" } else { "missing" }
    );
    println!();

    if result.pending.is_empty() {
        println!("No pending commits.");
        return;
    }
    println!("Pending commits ({}):", result.pending.len());
    for commit in &result.pending {
        println!("  {:<8} {}", commit.op.to_string(), commit.id);
    }
}

fn display_or_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use flexdb_core::{CommitOp, RecordId};

    #[test]
    fn test_inspect_reports_pending_commits() {
        let (_temp, _pool, handle) = testing::seeded();
        handle.delete_object(RecordId::new(1)).unwrap();

        let result = inspect(&handle).unwrap();
        assert_eq!(result.classname, "Note");
        assert_eq!(result.count, 1);
        assert_eq!(result.next_id, 3);
        assert_eq!(result.object_files, 1);
        assert!(!result.has_snapshot);
        let ops: Vec<CommitOp> = result.pending.iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![CommitOp::Inserted, CommitOp::Inserted, CommitOp::Deleted]
        );
    }

    #[test]
    fn test_inspect_json_shape() {
        let (_temp, _pool, handle) = testing::seeded();
        handle.load_all().unwrap();

        let result = inspect(&handle).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["has_snapshot"], true);
        assert_eq!(json["pending"], serde_json::json!([]));
    }

    #[test]
    fn test_pending_commit_serializes_op_name() {
        let (_temp, _pool, handle) = testing::seeded();
        let result = inspect(&handle).unwrap();
        let json = serde_json::to_value(&result.pending[0]).unwrap();
        assert_eq!(json, serde_json::json!({"op": "INSERTED", "id": 1}));
    }
}
