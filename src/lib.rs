//! credquery - logical to physical query translation for credential search
//!
//! Callers query credentials in stable logical field names. This crate
//! rewrites those queries against the physical document layout of the
//! credential index, adds the mandatory scoping restrictions, and
//! synthesizes a computed field for documents that predate it.

pub mod cli;
pub mod config;
pub mod error;
pub mod mapping;
pub mod observability;
pub mod query;
pub mod request;
pub mod rewrite;
pub mod search;

pub use config::{Config, ConfigError, ConfigResult};
pub use error::{QueryError, QueryResult};
pub use mapping::{FieldMapping, FieldNameTranslator};
pub use query::{LogicalQuery, Pagination, Predicate, SortSpec};
pub use request::{PhysicalRequest, RequestAssembler};
pub use search::{
    CallerIdentity, ExecutorError, IdentityResolver, QueryService, SearchExecutor,
    SearchResponse,
};
