//! Records: user types stored one per file.
//!
//! A record is any struct that serializes to a mapping, has a `Default`
//! (the constructor defaults absent keys fall back to), and embeds a
//! [`RecordMeta`]. Implement [`Record`] for it; every persistence and
//! navigation operation then comes from the blanket [`RecordExt`].
//!
//! ```
//! use flexdb_core::{Args, Record, RecordExt, RecordMeta, Value};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Person {
//!     #[serde(flatten)]
//!     meta: RecordMeta,
//!     name: String,
//!     birth_year: i64,
//! }
//!
//! impl Record for Person {
//!     const COLLECTION: &'static str = "persons";
//!     const MIN_ID: i64 = 10_000;
//!
//!     fn meta(&self) -> &RecordMeta { &self.meta }
//!     fn meta_mut(&mut self) -> &mut RecordMeta { &mut self.meta }
//!
//!     fn call(&self, name: &str, args: &Args) -> Option<Value> {
//!         match name {
//!             "age_in" => {
//!                 let year = args.at(0)?.as_i64()?;
//!                 Some((year - self.birth_year).into())
//!             }
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let mut person = Person::default();
//! person.birth_year = 1990;
//! assert_eq!(person.prop_with("age_in", &Args::positional([2020])), Value::from(30));
//! ```

mod meta;
mod path;

pub use meta::RecordMeta;
pub use path::{resolve, Args, Attr, Resolve};

use crate::collection::CollectionHandle;
use crate::error::CoreResult;
use crate::query::Select;
use crate::types::RecordId;
use flexdb_codec::value::merge;
use flexdb_codec::{CodecError, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// A user type stored in a collection.
pub trait Record: Serialize + DeserializeOwned + Default + Clone + Debug + Send + Sync + 'static {
    /// Default collection name, relative to the pool root.
    const COLLECTION: &'static str;

    /// Id floor: ids start at `MIN_ID + 1`.
    const MIN_ID: i64 = 0;

    /// Capacity bound. Zero or negative means unbounded.
    const MAX_SIZE: i64 = -1;

    /// Returns the embedded metadata.
    fn meta(&self) -> &RecordMeta;

    /// Returns the embedded metadata mutably.
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Evaluates a computed field.
    ///
    /// Called by path resolution for names that are not stored keys.
    /// Return `None` for names the type does not compute.
    fn call(&self, _name: &str, _args: &Args) -> Option<Value> {
        None
    }

    /// Returns the owned record stored under `name`.
    ///
    /// Path resolution continues into the returned record instead of its
    /// dumped mapping, so its computed fields stay reachable
    /// (`photo.file_name`). Return `None` for plain fields.
    fn child(&self, _name: &str) -> Option<&dyn Resolve> {
        None
    }
}

/// Operations available on every [`Record`].
///
/// Implemented for all records; not meant to be implemented by hand.
pub trait RecordExt: Record {
    /// Returns the record id.
    fn id(&self) -> RecordId {
        self.meta().id()
    }

    /// Returns the record identity string.
    fn uniqid(&self) -> &str {
        self.meta().uniqid()
    }

    /// Returns the collection handle the record is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordUnbound`](crate::CoreError::RecordUnbound)
    /// if the record is unbound or its pool was dropped.
    fn handle(&self) -> CoreResult<Arc<CollectionHandle>> {
        self.meta().handle()
    }

    /// Returns the record as a plain mapping.
    ///
    /// Nested records dump recursively; the result always carries `id`
    /// and `uniqid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the type does not serialize to a mapping.
    fn dump(&self) -> CoreResult<Value> {
        let mut doc = flexdb_codec::to_value(self)?;
        let Some(map) = doc.as_object_mut() else {
            return Err(CodecError::unexpected_shape("record does not serialize to a mapping").into());
        };
        map.insert("id".to_string(), self.id().as_i64().into());
        map.insert("uniqid".to_string(), self.uniqid().into());
        Ok(doc)
    }

    /// Overlays a plain mapping onto the record.
    ///
    /// Keys present in `doc` replace the record's values, keys absent keep
    /// them, and keys the record does not know are ignored. Nested
    /// mappings merge into nested records field by field.
    ///
    /// # Errors
    ///
    /// Returns an error if a value in `doc` has the wrong shape for its
    /// field; the record is left unchanged.
    fn load(&mut self, doc: &Value) -> CoreResult<()> {
        let mut merged = self.dump()?;
        merge(&mut merged, doc);
        let id = merged.get("id").and_then(Value::as_i64).map(RecordId::new);

        let mut next: Self = flexdb_codec::from_value(merged)?;
        next.meta_mut().set_binding(self.meta().binding());
        if let Some(id) = id {
            next.meta_mut().assign(id);
        }
        *self = next;
        Ok(())
    }

    /// Builds a fresh record of the same type, bound to the same
    /// collection, optionally loaded from `doc`.
    ///
    /// A bound record without an `id` in `doc` gets a newly reserved id.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    fn clone_with(&self, doc: Option<&Value>) -> CoreResult<Self> {
        let mut fresh = Self::default();
        fresh.meta_mut().set_binding(self.meta().binding());
        if let Some(doc) = doc {
            fresh.load(doc)?;
        }
        let has_id = doc.is_some_and(|d| d.get("id").is_some_and(Value::is_i64));
        if !has_id {
            if let Ok(handle) = self.handle() {
                fresh.meta_mut().assign(handle.reserve_id());
            }
        }
        Ok(fresh)
    }

    /// Persists the record.
    ///
    /// Returns `Ok(false)` if the collection refused it (full, or its
    /// directory is missing and may not be created).
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unbound or a file cannot be
    /// written.
    fn commit(&self) -> CoreResult<bool> {
        let handle = self.handle()?;
        handle.save_object(self.id(), &self.dump()?)
    }

    /// Removes the record's file. Returns `Ok(false)` if there was none.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unbound or the file cannot be
    /// removed.
    fn delete(&self) -> CoreResult<bool> {
        self.handle()?.delete_object(self.id())
    }

    /// Starts a query over the record's collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is unbound or the snapshot cannot be
    /// rebuilt.
    fn select(&self) -> CoreResult<Select<Self>> {
        Select::from_handle(self.handle()?)
    }

    /// Resolves a dotted path against the record.
    fn prop(&self, path: &str) -> Value {
        self.prop_with(path, &Args::None)
    }

    /// Resolves a dotted path, passing `args` to a terminal computed field.
    fn prop_with(&self, path: &str, args: &Args) -> Value {
        resolve(self, path, args)
    }

    /// Returns the record as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be dumped.
    fn to_json(&self) -> CoreResult<String> {
        Ok(self.dump()?.to_string())
    }

    /// Returns the record as JSON indented by four spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be dumped.
    fn to_json_pretty(&self) -> CoreResult<String> {
        Ok(flexdb_codec::to_json_pretty(&self.dump()?)?)
    }
}

impl<T: Record> RecordExt for T {}

/// Looks one attribute up on a record: owned child records first, then
/// the stored key `stored` finds, then computed fields.
pub(crate) fn record_attr<'a, T, F>(record: &'a T, name: &str, args: &Args, stored: F) -> Attr<'a>
where
    T: Record,
    F: FnOnce(&str) -> Option<Value>,
{
    if let Some(child) = record.child(name) {
        return Attr::Object(child);
    }
    if let Some(value) = stored(name) {
        return Attr::Value(value);
    }
    record.call(name, args).map_or(Attr::Missing, Attr::Value)
}

impl<T: Record> Resolve for T {
    fn attr(&self, name: &str, args: &Args) -> Attr<'_> {
        record_attr(self, name, args, |name| {
            self.dump()
                .ok()
                .and_then(|mut doc| doc.get_mut(name).map(Value::take))
        })
    }

    fn to_value(&self) -> Value {
        self.dump().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Location {
        city: String,
        country: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Person {
        #[serde(flatten)]
        meta: RecordMeta,
        name: String,
        birth_year: i64,
        location: Location,
        interests: Vec<i64>,
    }

    impl Default for Person {
        fn default() -> Self {
            Self {
                meta: RecordMeta::default(),
                name: "???".to_string(),
                birth_year: 0,
                location: Location::default(),
                interests: Vec::new(),
            }
        }
    }

    impl Record for Person {
        const COLLECTION: &'static str = "persons";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }

        fn call(&self, name: &str, args: &Args) -> Option<Value> {
            match name {
                "age" => {
                    let year = args.at(0).and_then(Value::as_i64).unwrap_or(2024);
                    Some(json!(year - self.birth_year))
                }
                _ => None,
            }
        }
    }

    #[test]
    fn dump_carries_identity() {
        let mut person = Person::default();
        person.meta.assign(RecordId::new(5));
        let doc = person.dump().unwrap();
        assert_eq!(doc["id"], json!(5));
        assert_eq!(doc["uniqid"], json!(RecordId::new(5).identity()));
        assert_eq!(doc["name"], json!("???"));
        assert_eq!(doc["location"], json!({"city": "", "country": ""}));
    }

    #[test]
    fn load_keeps_absent_keys_and_ignores_unknown() {
        let mut person = Person::default();
        person.birth_year = 1980;
        person
            .load(&json!({
                "id": 12,
                "location": {"country": "France"},
                "unknown": true,
            }))
            .unwrap();

        assert_eq!(person.id(), RecordId::new(12));
        assert_eq!(person.uniqid(), RecordId::new(12).identity());
        assert_eq!(person.name, "???");
        assert_eq!(person.birth_year, 1980);
        assert_eq!(person.location.country, "France");
        assert_eq!(person.location.city, "");
    }

    #[test]
    fn load_rejects_wrong_shape() {
        let mut person = Person::default();
        assert!(person.load(&json!({"birth_year": "nineteen"})).is_err());
        assert_eq!(person, Person::default());
    }

    #[test]
    fn dump_load_round_trip() {
        let mut person = Person::default();
        person.meta.assign(RecordId::new(1));
        person.name = "Alice".to_string();
        person.interests = vec![2, 6];

        let mut back = Person::default();
        back.load(&person.dump().unwrap()).unwrap();
        assert_eq!(back, person);
    }

    #[test]
    fn unbound_record_cannot_commit() {
        let person = Person::default();
        assert!(matches!(
            person.commit(),
            Err(crate::CoreError::RecordUnbound { .. })
        ));
        assert!(person.delete().is_err());
        assert!(person.select().is_err());
    }

    #[test]
    fn clone_with_unbound() {
        let person = Person::default();
        let copy = person.clone_with(Some(&json!({"name": "Bob"}))).unwrap();
        assert_eq!(copy.name, "Bob");
        assert_eq!(copy.id(), RecordId::new(0));
    }

    #[test]
    fn props() {
        let mut person = Person::default();
        person.birth_year = 2000;
        person.location.country = "France".to_string();

        assert_eq!(person.prop("location.country"), json!("France"));
        assert_eq!(person.prop("location.city.name"), json!(""));
        assert_eq!(person.prop("missing"), Value::Null);
        assert_eq!(person.prop("age"), json!(24));
        assert_eq!(person.prop_with("age", &Args::positional([2010])), json!(10));
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Badge {
        #[serde(flatten)]
        meta: RecordMeta,
        code: String,
    }

    impl Record for Badge {
        const COLLECTION: &'static str = "badges";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }

        fn call(&self, name: &str, _args: &Args) -> Option<Value> {
            match name {
                "shout" => Some(json!(self.code.to_uppercase())),
                _ => None,
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Member {
        #[serde(flatten)]
        meta: RecordMeta,
        badge: Badge,
    }

    impl Record for Member {
        const COLLECTION: &'static str = "members";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }

        fn child(&self, name: &str) -> Option<&dyn Resolve> {
            match name {
                "badge" => Some(&self.badge),
                _ => None,
            }
        }
    }

    #[test]
    fn paths_reach_computed_fields_of_child_records() {
        let mut member = Member::default();
        member.badge.meta.assign(RecordId::new(3));
        member.badge.code = "vip".to_string();

        assert_eq!(member.prop("badge.shout"), json!("VIP"));
        assert_eq!(member.prop("badge.code"), json!("vip"));
        assert_eq!(member.prop("badge.missing"), Value::Null);
        // The child resolves to the same mapping the parent dumps
        assert_eq!(member.prop("badge"), member.dump().unwrap()["badge"]);
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        let mut person = Person::default();
        person.meta.assign(RecordId::new(1));
        let text = person.to_json_pretty().unwrap();
        assert!(text.contains("\n    \"name\": \"???\""));
        let compact = person.to_json().unwrap();
        assert!(!compact.contains('\n'));
    }
}
