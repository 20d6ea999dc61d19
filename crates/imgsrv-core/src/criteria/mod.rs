//! Typed query specifications and sparse column assignments
//!
//! [`SelectCriteria`] is a conjunctive predicate tree built fluently and
//! typed by an entity's field enum. [`UpdateColumns`] is the sparse bag of
//! assignments used for inserts and updates.

mod columns;
mod predicate;
mod select;

pub use columns::UpdateColumns;
pub use predicate::{CompareOp, Predicate, SortDirection, SortKey, Subquery};
pub use select::SelectCriteria;
