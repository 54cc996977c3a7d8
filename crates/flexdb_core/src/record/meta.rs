//! Identity and binding carried by every record.

use crate::collection::CollectionHandle;
use crate::error::{CoreError, CoreResult};
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};

/// The engine-managed part of a record.
///
/// Embed it in a record struct with `#[serde(flatten)]` so that `id` and
/// `uniqid` appear in the record's dumped mapping:
///
/// ```
/// use flexdb_core::RecordMeta;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// #[serde(default)]
/// struct Contact {
///     #[serde(flatten)]
///     meta: RecordMeta,
///     mail: String,
/// }
/// ```
///
/// The binding to the collection handle is never serialized. It is a weak
/// reference: a record outliving its pool cannot keep the pool's handles
/// alive, and reports [`CoreError::RecordUnbound`] when asked to persist.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordMeta {
    id: RecordId,
    uniqid: String,
    #[serde(skip)]
    handle: Option<Weak<CollectionHandle>>,
}

impl RecordMeta {
    /// Returns the record id.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the record identity string.
    #[must_use]
    pub fn uniqid(&self) -> &str {
        &self.uniqid
    }

    /// Returns whether the record is attached to a collection handle.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the collection handle, if it is still alive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordUnbound`] if the record was never bound
    /// or its pool has been dropped.
    pub fn handle(&self) -> CoreResult<Arc<CollectionHandle>> {
        self.handle
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(CoreError::RecordUnbound { id: self.id })
    }

    /// Assigns an id and the identity derived from it.
    pub(crate) fn assign(&mut self, id: RecordId) {
        self.id = id;
        self.uniqid = id.identity();
    }

    /// Attaches the record to a collection handle.
    pub(crate) fn bind(&mut self, handle: &Arc<CollectionHandle>) {
        self.handle = Some(Arc::downgrade(handle));
    }

    pub(crate) fn binding(&self) -> Option<Weak<CollectionHandle>> {
        self.handle.clone()
    }

    pub(crate) fn set_binding(&mut self, handle: Option<Weak<CollectionHandle>>) {
        self.handle = handle;
    }
}

impl PartialEq for RecordMeta {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.uniqid == other.uniqid
    }
}

impl fmt::Debug for RecordMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMeta")
            .field("id", &self.id)
            .field("uniqid", &self.uniqid)
            .field("bound", &self.is_bound())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_by_default() {
        let meta = RecordMeta::default();
        assert!(!meta.is_bound());
        assert!(matches!(
            meta.handle(),
            Err(CoreError::RecordUnbound { id }) if id == RecordId::new(0)
        ));
    }

    #[test]
    fn assign_derives_identity() {
        let mut meta = RecordMeta::default();
        meta.assign(RecordId::new(3));
        assert_eq!(meta.id(), RecordId::new(3));
        assert_eq!(meta.uniqid(), RecordId::new(3).identity());
    }

    #[test]
    fn binding_is_not_serialized() {
        let mut meta = RecordMeta::default();
        meta.assign(RecordId::new(1));
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "uniqid": RecordId::new(1).identity()})
        );
    }
}
