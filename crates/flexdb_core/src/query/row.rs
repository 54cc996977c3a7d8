//! Query rows.

use crate::record::{record_attr, resolve, Args, Attr, Record, RecordExt, Resolve};
use crate::error::CoreResult;
use crate::types::RecordId;
use flexdb_codec::Value;
use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

/// A row joined onto another row, of any record type.
pub trait JoinedRow: Resolve + Send + Sync + 'static {
    /// Returns the row as `Any`, for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Returns the row as a path-resolution target.
    fn as_resolve(&self) -> &dyn Resolve;
}

/// One record in a query, plus the rows joined onto it.
///
/// Derefs to the record. Joined rows are reachable by name through path
/// resolution (`profile.location.country`) and through
/// [`joined`](Self::joined).
///
/// The record's dumped mapping is computed on the first path lookup and
/// reused by later ones; mutable access to the record discards it.
#[derive(Clone)]
pub struct Row<T: Record> {
    record: T,
    joins: Vec<(String, Option<Arc<dyn JoinedRow>>)>,
    doc: OnceLock<Option<Value>>,
}

impl<T: Record> Row<T> {
    /// Wraps a record.
    #[must_use]
    pub fn new(record: T) -> Self {
        Self {
            record,
            joins: Vec::new(),
            doc: OnceLock::new(),
        }
    }

    /// Returns the record.
    #[must_use]
    pub fn record(&self) -> &T {
        &self.record
    }

    /// Unwraps the record, dropping joined rows.
    #[must_use]
    pub fn into_record(self) -> T {
        self.record
    }

    /// Resolves a dotted path against the row, following joins.
    #[must_use]
    pub fn prop(&self, path: &str) -> Value {
        self.prop_with(path, &Args::None)
    }

    /// Resolves a dotted path, passing `args` to a terminal computed field.
    #[must_use]
    pub fn prop_with(&self, path: &str, args: &Args) -> Value {
        resolve(self, path, args)
    }

    /// Returns the row, joined rows included, as compact JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Returns the row as JSON indented by four spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(flexdb_codec::to_json_pretty(&self.to_value())?)
    }

    /// Returns the row joined under `name`, if it exists and holds a `U`.
    #[must_use]
    pub fn joined<U: Record>(&self, name: &str) -> Option<&Row<U>> {
        self.join_slot(name)?
            .as_ref()?
            .as_any()
            .downcast_ref::<Row<U>>()
    }

    /// Returns whether a join named `name` was performed on this row,
    /// matched or not.
    #[must_use]
    pub fn has_join(&self, name: &str) -> bool {
        self.join_slot(name).is_some()
    }

    /// Returns the names of the joins performed on this row.
    pub fn join_names(&self) -> impl Iterator<Item = &str> {
        self.joins.iter().map(|(name, _)| name.as_str())
    }

    /// Sets the row joined under `name`; `None` records an unmatched join.
    pub fn set_join(&mut self, name: &str, row: Option<Arc<dyn JoinedRow>>) {
        match self.joins.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = row,
            None => self.joins.push((name.to_string(), row)),
        }
    }

    fn join_slot(&self, name: &str) -> Option<&Option<Arc<dyn JoinedRow>>> {
        self.joins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn key(&self) -> RecordId {
        self.record.id()
    }

    fn doc(&self) -> Option<&Value> {
        self.doc.get_or_init(|| self.record.dump().ok()).as_ref()
    }
}

impl<T: Record> Deref for Row<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.record
    }
}

impl<T: Record> DerefMut for Row<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.doc.take();
        &mut self.record
    }
}

impl<T: Record> Resolve for Row<T> {
    fn attr(&self, name: &str, args: &Args) -> Attr<'_> {
        match self.join_slot(name) {
            Some(Some(row)) => Attr::Object(row.as_resolve()),
            Some(None) => Attr::Value(Value::Null),
            None => record_attr(&self.record, name, args, |name| {
                self.doc().and_then(|doc| doc.get(name)).cloned()
            }),
        }
    }

    fn to_value(&self) -> Value {
        let mut doc = self.doc().cloned().unwrap_or(Value::Null);
        if let Some(map) = doc.as_object_mut() {
            for (name, row) in &self.joins {
                let value = row.as_ref().map_or(Value::Null, |r| r.to_value());
                map.insert(name.clone(), value);
            }
        }
        doc
    }
}

impl<T: Record> JoinedRow for Row<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_resolve(&self) -> &dyn Resolve {
        self
    }
}

impl<T: Record> fmt::Debug for Row<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joins: Vec<(&str, bool)> = self
            .joins
            .iter()
            .map(|(name, row)| (name.as_str(), row.is_some()))
            .collect();
        f.debug_struct("Row")
            .field("record", &self.record)
            .field("joins", &joins)
            .finish()
    }
}
