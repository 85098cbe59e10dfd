//! Field name mapping for credential queries
//!
//! Callers query credentials through logical field names. Some of them are
//! stored under a different physical name, some are synthesized at query time.
//!
//! # Invariants
//!
//! - Translation is total: unmapped names pass through unchanged
//! - Translation is not chained: a translated name is never translated again
//! - The mapping table is immutable once built and shared read-only

mod translator;

pub use translator::{FieldMapping, FieldNameTranslator, PrefixRule};
