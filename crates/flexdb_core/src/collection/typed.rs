//! Typed collection implementation.

use super::CollectionHandle;
use crate::cache::Snapshot;
use crate::error::CoreResult;
use crate::query::Select;
use crate::record::{Record, RecordExt};
use crate::types::{RecordId, Uniqid};
use flexdb_codec::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed view of a collection.
///
/// `Collection<T>` creates, loads, commits and deletes records of type
/// `T` and starts queries over them. It is a cheap, cloneable wrapper
/// around the shared [`CollectionHandle`].
///
/// # Example
///
/// ```rust,ignore
/// let persons = pool.collection::<Person>();
///
/// let mut alice = persons.create();
/// alice.name = "Alice".into();
/// alice.commit()?;
///
/// let found = persons.load(alice.id())?;
/// let adults = persons.select()?.field("age").ge(18);
/// ```
pub struct Collection<T: Record> {
    handle: Arc<CollectionHandle>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> Collection<T> {
    /// Wraps a handle.
    #[must_use]
    pub fn new(handle: Arc<CollectionHandle>) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<CollectionHandle> {
        &self.handle
    }

    /// Returns the collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Returns the collection identity.
    #[must_use]
    pub fn uniqid(&self) -> Uniqid {
        self.handle.uniqid()
    }

    /// Returns the record count as last seen by the handle.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.handle.count()
    }

    /// Creates a new record with default values and a fresh id.
    ///
    /// Nothing is written until the record is committed.
    #[must_use]
    pub fn create(&self) -> T {
        let mut record = T::default();
        self.bind(&mut record);
        record.meta_mut().assign(self.handle.reserve_id());
        record
    }

    /// Attaches a record to this collection without changing its id.
    pub fn bind(&self, record: &mut T) {
        record.meta_mut().bind(&self.handle);
    }

    /// Builds a bound record from a stored mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping has the wrong shape for `T`.
    pub fn hydrate(&self, doc: &Value) -> CoreResult<T> {
        let mut record = T::default();
        self.bind(&mut record);
        record.load(doc)?;
        Ok(record)
    }

    /// Loads record `id`. Returns `None` if it has no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not fit `T`.
    pub fn load(&self, id: RecordId) -> CoreResult<Option<T>> {
        match self.handle.load_object(id)? {
            Some(doc) => self.hydrate(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Persists a record under this collection.
    ///
    /// Returns `Ok(false)` if the collection refused it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be dumped or written.
    pub fn commit(&self, record: &T) -> CoreResult<bool> {
        self.handle.save_object(record.id(), &record.dump()?)
    }

    /// Deletes record `id`. Returns `Ok(false)` if it has no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn delete(&self, id: RecordId) -> CoreResult<bool> {
        self.handle.delete_object(id)
    }

    /// Returns whether record `id` has a file.
    #[must_use]
    pub fn exists(&self, id: RecordId) -> bool {
        self.handle.exists(id)
    }

    /// Returns the current snapshot of stored mappings.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rebuilt.
    pub fn load_all(&self) -> CoreResult<Arc<Snapshot>> {
        self.handle.load_all()
    }

    /// Starts a query over every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rebuilt.
    pub fn select(&self) -> CoreResult<Select<T>> {
        Select::from_handle(Arc::clone(&self.handle))
    }

    /// Loads every record, in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rebuilt. Records that do
    /// not fit `T` are skipped.
    pub fn scan_all(&self) -> CoreResult<Vec<T>> {
        Ok(self.select()?.into_records())
    }
}

impl<T: Record> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.handle))
    }
}

impl<T: Record> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.handle.name())
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Record> fmt::Display for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.handle, f)
    }
}
