//! Property-based test generators using proptest.
//!
//! Provides strategies for record contents, collection names and
//! sequences of collection operations.

use crate::schemas::{Contact, Person};
use proptest::prelude::*;

/// Field values for a [`Person`], independent of any collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonDraft {
    /// Full name.
    pub name: String,
    /// Year of birth.
    pub birth_year: i64,
    /// Mail address.
    pub mail: String,
}

impl PersonDraft {
    /// Writes the draft into `person`, leaving its identity alone.
    pub fn apply(&self, person: &mut Person) {
        person.name.clone_from(&self.name);
        person.birth_year = self.birth_year;
        person.contact = Contact {
            mail: self.mail.clone(),
        };
    }

    /// Returns whether `person` holds exactly the draft's values.
    pub fn matches(&self, person: &Person) -> bool {
        person.name == self.name
            && person.birth_year == self.birth_year
            && person.contact.mail == self.mail
    }
}

/// Strategy for generating person names, sometimes lower-cased.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][a-z]{0,9}( [A-Z][a-z]{1,9})?").expect("Invalid regex")
}

/// Strategy for generating mail addresses.
pub fn mail_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9.]{0,11}@(example|mail)\\.(com|org)")
        .expect("Invalid regex")
}

/// Strategy for generating person drafts.
pub fn person_strategy() -> impl Strategy<Value = PersonDraft> {
    (name_strategy(), 1900i64..2025, mail_strategy()).prop_map(|(name, birth_year, mail)| {
        PersonDraft {
            name,
            birth_year,
            mail,
        }
    })
}

/// Strategy for generating collection names, nested one level at most.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}(/[a-z0-9_]{1,8})?").expect("Invalid regex")
}

/// One step applied to a collection of persons.
///
/// Indices pick among the records alive when the step runs, modulo their
/// number; steps that pick from an empty collection do nothing.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Create and commit a new person.
    Insert(PersonDraft),
    /// Overwrite an existing person.
    Update {
        /// Which live record.
        index: usize,
        /// New values.
        draft: PersonDraft,
    },
    /// Delete an existing person.
    Delete {
        /// Which live record.
        index: usize,
    },
    /// Read the whole collection back, settling pending commits.
    LoadAll,
}

/// Strategy for generating operations, weighted towards inserts.
pub fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => person_strategy().prop_map(Operation::Insert),
        2 => (any::<usize>(), person_strategy())
            .prop_map(|(index, draft)| Operation::Update { index, draft }),
        2 => any::<usize>().prop_map(|index| Operation::Delete { index }),
        1 => Just(Operation::LoadAll),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation_strategy(), min_ops..max_ops)
}

/// Proptest configuration for tests that touch the filesystem.
///
/// Every case creates a directory and writes files, so the case count is
/// kept small.
#[must_use]
pub fn filesystem_config() -> ProptestConfig {
    ProptestConfig {
        cases: 32,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}
