//! Logical to physical rewriting
//!
//! # Flow
//!
//! 1. Predicate rewriting: translate leaf fields, conjoin scoping clauses
//! 2. Sort rewriting: translate sort fields, keep every modifier
//! 3. Computed field policy: decide from the union of touched fields
//!
//! Each stage reports the logical fields it saw through an explicit
//! [`TouchedFields`] accumulator; nothing is shared between requests.

mod computed;
mod predicate;
mod sort;
mod touched;

pub use computed::{ComputedFieldDeclaration, ComputedFieldPolicy, DefaultValueScript};
pub use predicate::{
    CredentialPredicateBuilder, DocumentTypeFilter, OwnerFields, PredicateBuilder,
    PredicateRewriter,
};
pub use sort::SortRewriter;
pub use touched::TouchedFields;
