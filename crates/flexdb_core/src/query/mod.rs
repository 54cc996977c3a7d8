//! In-memory query engine.
//!
//! A [`Select`] loads every record of a collection and narrows the set
//! with predicates built from dotted field paths. Results of one
//! [`Select::filter`] call are OR-ed; successive calls AND.

mod join;
mod paginate;
mod row;
mod select;
mod statement;

pub use paginate::{PageButton, Paginate};
pub use row::{JoinedRow, Row};
pub use select::Select;
pub use statement::Statement;
