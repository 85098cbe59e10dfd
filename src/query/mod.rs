//! Query model shared by logical and physical requests
//!
//! A [`LogicalQuery`] names caller-visible credential fields. The rewrite
//! stage produces the same structures over physical storage fields.

mod logical;
mod predicate;
mod sort;

pub use logical::{LogicalQuery, Pagination};
pub use predicate::{BoolPredicate, Predicate};
pub use sort::{NestedSort, NumericType, SortMode, SortOrder, SortSpec, DOC_FIELD};
