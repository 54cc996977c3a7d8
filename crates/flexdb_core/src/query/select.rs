//! The `Select` query builder.

use super::paginate::{plan, Paginate};
use super::row::Row;
use super::statement::Statement;
use crate::collection::CollectionHandle;
use crate::error::CoreResult;
use crate::record::{Record, RecordExt};
use crate::types::RecordId;
use flexdb_codec::value::{key_of, sort_cmp};
use flexdb_codec::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// An ordered, in-memory working set of records.
///
/// A select starts with every record of a collection, in id order, and is
/// narrowed, reordered, sliced and joined by chaining operations on it.
/// Predicates come from [`field`](Self::field) and are combined with
/// [`filter`](Self::filter):
///
/// ```rust,ignore
/// let mut select = persons.select()?;
/// let banned = select.field("is_banned").is_true();
/// let french = select.field("location.country").eq("France");
/// select.filter([banned, french]);     // banned OR french
/// select.sort("name", false);
/// let page = select.paginate(1, 10, 5);
/// ```
pub struct Select<T: Record> {
    pub(crate) handle: Arc<CollectionHandle>,
    pub(crate) items: Vec<Row<T>>,
}

impl<T: Record> Select<T> {
    /// Starts a query over every record of the collection behind `handle`.
    ///
    /// Stored mappings that do not fit `T` are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rebuilt.
    pub fn from_handle(handle: Arc<CollectionHandle>) -> CoreResult<Self> {
        let snapshot = handle.load_all()?;
        let mut items = Vec::with_capacity(snapshot.len());
        for (id, doc) in snapshot.iter() {
            let mut record = T::default();
            record.meta_mut().bind(&handle);
            match record.load(doc) {
                Ok(()) => items.push(Row::new(record)),
                Err(e) => {
                    tracing::warn!(collection = %handle.name(), %id, error = %e, "record does not fit its type, skipping");
                }
            }
        }
        Ok(Self { handle, items })
    }

    /// Returns the collection handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<CollectionHandle> {
        &self.handle
    }

    /// Starts a predicate on the value at `path` in each current row.
    ///
    /// The predicate sees the rows as they are now; calling it yields the
    /// matching rows, to be passed to [`filter`](Self::filter).
    #[must_use]
    pub fn field(&self, path: &str) -> Statement<'_, T> {
        Statement::new(&self.items, path)
    }

    /// Keeps the rows present in any of the given result lists.
    ///
    /// Rows from one call are OR-ed: the new set is the union of the
    /// lists, deduplicated by record identity, in first-seen order.
    /// Successive calls AND together because each one only sees the rows
    /// the previous one kept.
    pub fn filter<I>(&mut self, results: I) -> &mut Self
    where
        I: IntoIterator<Item = Vec<Row<T>>>,
    {
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for rows in results {
            for row in rows {
                if seen.insert(row.key()) {
                    items.push(row);
                }
            }
        }
        self.items = items;
        self
    }

    /// Orders rows by the value at `path`.
    ///
    /// The sort is stable; ties keep their current order in both
    /// directions.
    pub fn sort(&mut self, path: &str, desc: bool) -> &mut Self {
        let mut keyed: Vec<(Value, Row<T>)> = self
            .items
            .drain(..)
            .map(|row| (row.prop(path), row))
            .collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ord = sort_cmp(a, b);
            if desc {
                ord.reverse()
            } else {
                ord
            }
        });
        self.items = keyed.into_iter().map(|(_, row)| row).collect();
        self
    }

    /// Keeps the rows of page `current` and describes the page markers.
    ///
    /// `current` is 1-based and clamped to the last page. When `current`
    /// or `per_page` is not positive, or there are no rows, every row is
    /// kept and no markers are returned. The returned count is the number
    /// of rows before slicing.
    pub fn paginate(&mut self, current: i64, per_page: i64, nb_buttons: i64) -> Paginate {
        let count = self.items.len();
        let Some(plan) = plan(count, current, per_page, nb_buttons) else {
            return Paginate {
                count,
                buttons: Vec::new(),
            };
        };
        self.items = self.items.drain(plan.rows).collect();
        Paginate {
            count,
            buttons: plan.buttons,
        }
    }

    /// Keeps the first row of each distinct combination of values at
    /// `paths`.
    pub fn distinct(&mut self, paths: &[&str]) -> &mut Self {
        let mut seen = HashSet::new();
        self.items.retain(|row| {
            let key: Vec<String> = paths.iter().map(|p| key_of(&row.prop(p))).collect();
            seen.insert(key)
        });
        self
    }

    /// Applies `f` to every row in place.
    pub fn map<F>(&mut self, mut f: F) -> &mut Self
    where
        F: FnMut(&mut Row<T>),
    {
        for row in &mut self.items {
            f(row);
        }
        self
    }

    /// Drops every row.
    pub fn empty(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    /// Returns the ids of the rows, in order.
    #[must_use]
    pub fn compact(&self) -> Vec<RecordId> {
        self.items.iter().map(Row::key).collect()
    }

    /// Returns the value at `path` in each row, in order.
    #[must_use]
    pub fn compact_by(&self, path: &str) -> Vec<Value> {
        self.items.iter().map(|row| row.prop(path)).collect()
    }

    /// Returns the rows keyed by id, in order.
    #[must_use]
    pub fn compact_dict(&self) -> Vec<(RecordId, Row<T>)> {
        self.items
            .iter()
            .map(|row| (row.key(), row.clone()))
            .collect()
    }

    /// Returns the rows keyed by the value at `path`.
    ///
    /// One entry per distinct value, at the position the value first
    /// appeared, holding the last row that had it.
    #[must_use]
    pub fn compact_dict_by(&self, path: &str) -> Vec<(Value, Row<T>)> {
        keyed_rows(&self.items, path)
            .into_iter()
            .map(|(_, value, row)| (value, row))
            .collect()
    }

    /// Returns the row with id `id`.
    #[must_use]
    pub fn find(&self, id: RecordId) -> Option<&Row<T>> {
        self.items.iter().find(|row| row.key() == id)
    }

    /// Returns the first row.
    #[must_use]
    pub fn fetch_one(&self) -> Option<&Row<T>> {
        self.items.first()
    }

    /// Returns every row.
    #[must_use]
    pub fn fetch_all(&self) -> &[Row<T>] {
        &self.items
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row<T>> {
        self.items.iter()
    }

    /// Takes the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row<T>> {
        self.items
    }

    /// Takes the records, dropping joined rows.
    #[must_use]
    pub fn into_records(self) -> Vec<T> {
        self.items.into_iter().map(Row::into_record).collect()
    }
}

/// Groups rows by the value at `path`; an empty path keys by id.
///
/// Returns `(key, value, row)` triples: one per distinct key, at the
/// position the key first appeared, holding the last row with that key.
pub(crate) fn keyed_rows<T: Record>(rows: &[Row<T>], path: &str) -> Vec<(String, Value, Row<T>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, Value, Row<T>)> = Vec::new();
    for row in rows {
        let value = if path.is_empty() {
            Value::from(row.key().as_i64())
        } else {
            row.prop(path)
        };
        let key = key_of(&value);
        match index.get(&key) {
            Some(&at) => out[at] = (key, value, row.clone()),
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, value, row.clone()));
            }
        }
    }
    out
}

impl<T: Record> Clone for Select<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            items: self.items.clone(),
        }
    }
}

impl<T: Record> fmt::Debug for Select<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("collection", &self.handle.name())
            .field("rows", &self.items.len())
            .finish()
    }
}

impl<'a, T: Record> IntoIterator for &'a Select<T> {
    type Item = &'a Row<T>;
    type IntoIter = std::slice::Iter<'a, Row<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Record> IntoIterator for Select<T> {
    type Item = Row<T>;
    type IntoIter = std::vec::IntoIter<Row<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
