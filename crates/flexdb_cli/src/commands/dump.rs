//! Dump command implementation.

use super::{open_collection, CliError, CliResult};
use flexdb_core::{Pool, RecordId, Value};

/// Collects the stored mappings to print, in id order.
///
/// With `id`, only that record; otherwise every record in the current
/// snapshot.
pub fn collect(pool: &Pool, name: &str, id: Option<i64>) -> CliResult<Vec<Value>> {
    let handle = open_collection(pool, name)?;

    if let Some(id) = id {
        let id = RecordId::new(id);
        let doc = handle
            .load_object(id)?
            .ok_or(CliError::RecordNotFound { id })?;
        return Ok(vec![doc]);
    }

    let items = handle.load_all()?;
    Ok(items.values().cloned().collect())
}

/// Runs the dump command.
pub fn run(pool: &Pool, name: &str, id: Option<i64>, compact: bool) -> CliResult<()> {
    for doc in collect(pool, name, id)? {
        if compact {
            println!("{doc}");
        } else {
            println!("{}", flexdb_codec::to_json_pretty(&doc)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use serde_json::json;

    #[test]
    fn test_dump_all_in_id_order() {
        let (_temp, pool, _handle) = testing::seeded();
        let docs = collect(&pool, "notes", None).unwrap();
        assert_eq!(
            docs,
            vec![
                json!({"id": 1, "text": "first"}),
                json!({"id": 2, "text": "second"})
            ]
        );
    }

    #[test]
    fn test_dump_one() {
        let (_temp, pool, _handle) = testing::seeded();
        let docs = collect(&pool, "notes", Some(2)).unwrap();
        assert_eq!(docs, vec![json!({"id": 2, "text": "second"})]);

        assert!(matches!(
            collect(&pool, "notes", Some(7)),
            Err(CliError::RecordNotFound { .. })
        ));
    }
}
