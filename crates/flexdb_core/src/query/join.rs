//! Joins between selects.

use super::row::{JoinedRow, Row};
use super::select::{keyed_rows, Select};
use crate::error::CoreResult;
use crate::record::Record;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

impl<T: Record> Select<T> {
    /// Attaches rows of `other` under `name`.
    ///
    /// Every left row is keyed by the value at `on` and matched with the
    /// right row whose value at `using` has the same key. An empty path
    /// keys by id. Left rows without a match get a null join; right rows
    /// without a match are dropped. Left rows sharing a key collapse into
    /// one, keeping the last.
    pub fn left_join<U: Record>(
        &mut self,
        name: &str,
        other: &Select<U>,
        using: &str,
        on: &str,
    ) -> &mut Self {
        let right = right_index(other, using);
        self.items = keyed_rows(&self.items, on)
            .into_iter()
            .map(|(key, _, mut row)| {
                row.set_join(name, right.get(&key).cloned());
                row
            })
            .collect();
        self
    }

    /// Like [`left_join`](Self::left_join), then also appends a row for
    /// every right row no left row matched.
    ///
    /// Those extra rows come from a fresh, unfiltered select of this
    /// collection, looked up by the same key, so a right row can bring in
    /// a left row the current filters had removed. Right rows with no
    /// counterpart in the collection at all are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the fresh select cannot be built.
    pub fn union_join<U: Record>(
        &mut self,
        name: &str,
        other: &Select<U>,
        using: &str,
        on: &str,
    ) -> CoreResult<&mut Self> {
        let right_rows = keyed_rows(&other.items, using);
        self.left_join(name, other, using, on);

        let matched: HashSet<String> = keyed_rows(&self.items, on)
            .into_iter()
            .map(|(key, _, _)| key)
            .collect();
        let fresh = Select::<T>::from_handle(Arc::clone(&self.handle))?;
        let fresh: HashMap<String, Row<T>> = keyed_rows(&fresh.items, on)
            .into_iter()
            .map(|(key, _, row)| (key, row))
            .collect();

        for (key, _, right) in right_rows {
            if matched.contains(&key) {
                continue;
            }
            if let Some(row) = fresh.get(&key) {
                let mut row = row.clone();
                row.set_join(name, Some(Arc::new(right) as Arc<dyn JoinedRow>));
                self.items.push(row);
            }
        }
        Ok(self)
    }
}

fn right_index<U: Record>(other: &Select<U>, using: &str) -> HashMap<String, Arc<dyn JoinedRow>> {
    keyed_rows(&other.items, using)
        .into_iter()
        .map(|(key, _, row)| (key, Arc::new(row) as Arc<dyn JoinedRow>))
        .collect()
}
