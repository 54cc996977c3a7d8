//! Integration test helpers.
//!
//! Provides a harness that applies operations to a collection while
//! tracking what it should contain, then checks every read path agrees.

use crate::fixtures::TestPool;
use crate::generators::{Operation, PersonDraft};
use crate::schemas::Person;
use flexdb_core::{Collection, RecordExt, RecordId};
use std::collections::BTreeMap;

/// A test harness for integration testing.
pub struct IntegrationHarness {
    /// The pool instance.
    pub pool: TestPool,
    /// Persons collection under test.
    persons: Collection<Person>,
    /// Expected contents, keyed by id.
    expected: BTreeMap<RecordId, PersonDraft>,
    /// Every id ever committed, in commit order.
    issued: Vec<RecordId>,
}

impl IntegrationHarness {
    /// Creates a new integration harness over a temporary pool.
    pub fn new() -> Self {
        let pool = TestPool::new();
        let persons = pool.collection::<Person>();
        Self {
            pool,
            persons,
            expected: BTreeMap::new(),
            issued: Vec::new(),
        }
    }

    /// Returns the collection under test.
    pub fn persons(&self) -> &Collection<Person> {
        &self.persons
    }

    /// Creates and commits a person and tracks it for later verification.
    pub fn insert(&mut self, draft: &PersonDraft) -> RecordId {
        let mut person = self.persons.create();
        draft.apply(&mut person);
        assert!(
            person.commit().expect("Failed to commit person"),
            "Insert refused"
        );

        let id = person.id();
        if let Some(last) = self.issued.last() {
            assert!(id > *last, "Id {id} issued after {last}");
        }
        self.issued.push(id);
        self.expected.insert(id, draft.clone());
        id
    }

    /// Overwrites a tracked person.
    pub fn update(&mut self, id: RecordId, draft: &PersonDraft) {
        let mut person = self
            .persons
            .load(id)
            .expect("Failed to load person")
            .expect("Tracked person missing");
        draft.apply(&mut person);
        assert!(person.commit().expect("Failed to commit person"));
        self.expected.insert(id, draft.clone());
    }

    /// Deletes a person and updates tracking.
    pub fn delete(&mut self, id: RecordId) {
        let existed = self.expected.remove(&id).is_some();
        let deleted = self.persons.delete(id).expect("Failed to delete person");
        assert_eq!(deleted, existed, "Delete of {id} reported {deleted}");
        assert!(!self.persons.exists(id));
    }

    /// Applies one generated operation.
    pub fn apply(&mut self, operation: &Operation) {
        match operation {
            Operation::Insert(draft) => {
                self.insert(draft);
            }
            Operation::Update { index, draft } => {
                if let Some(id) = self.pick(*index) {
                    self.update(id, draft);
                }
            }
            Operation::Delete { index } => {
                if let Some(id) = self.pick(*index) {
                    self.delete(id);
                }
            }
            Operation::LoadAll => {
                self.persons.load_all().expect("Failed to load all");
            }
        }
    }

    fn pick(&self, index: usize) -> Option<RecordId> {
        if self.expected.is_empty() {
            return None;
        }
        self.expected.keys().nth(index % self.expected.len()).copied()
    }

    /// Verifies every tracked person through each read path.
    ///
    /// Checks single loads, the snapshot, a forced full rescan, and a
    /// fresh pool reading the same directory.
    pub fn verify_all(&self) {
        for (id, draft) in &self.expected {
            let person = self
                .persons
                .load(*id)
                .expect("Failed to load person")
                .expect("Tracked person missing");
            assert!(draft.matches(&person), "Person {id} mismatch: {person:?}");
        }

        let warm = self.persons.load_all().expect("Failed to load all");
        let ids: Vec<RecordId> = warm.keys().copied().collect();
        let expected: Vec<RecordId> = self.expected.keys().copied().collect();
        assert_eq!(ids, expected, "Snapshot ids mismatch");

        let scanned = self.persons.handle().rebuild().expect("Failed to rebuild");
        assert_eq!(*warm, *scanned, "Snapshot differs from a full scan");

        let reopened = self.pool.reopen();
        let cold = reopened
            .collection::<Person>()
            .load_all()
            .expect("Failed to load all from a fresh pool");
        assert_eq!(*cold, *scanned, "Fresh pool sees different records");

        assert_eq!(self.persons.count(), self.expected.len() as u64);
    }

    /// Returns the count of tracked persons.
    pub fn tracked_count(&self) -> usize {
        self.expected.len()
    }

    /// Returns the tracked ids, in order.
    pub fn tracked_ids(&self) -> Vec<RecordId> {
        self.expected.keys().copied().collect()
    }
}

impl Default for IntegrationHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> PersonDraft {
        PersonDraft {
            name: name.to_string(),
            birth_year: 2000,
            mail: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[test]
    fn test_integration_harness() {
        let mut harness = IntegrationHarness::new();
        let first = harness.insert(&draft("Ann"));
        let second = harness.insert(&draft("Ben"));
        assert_eq!(harness.tracked_count(), 2);

        harness.update(first, &draft("Anna"));
        harness.delete(second);
        harness.verify_all();
        assert_eq!(harness.tracked_ids(), vec![first]);
    }

    #[test]
    fn test_ops_on_empty_collection_are_noops() {
        let mut harness = IntegrationHarness::new();
        harness.apply(&Operation::Delete { index: 3 });
        harness.apply(&Operation::Update {
            index: 0,
            draft: draft("Ghost"),
        });
        harness.apply(&Operation::LoadAll);
        harness.verify_all();
        assert_eq!(harness.tracked_count(), 0);
    }
}
