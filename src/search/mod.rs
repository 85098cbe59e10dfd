//! Search execution boundary
//!
//! The query service is the one operation exposed to callers. The executor
//! and identity resolver are collaborators reached through narrow traits;
//! their failures are propagated unchanged, with no retries here.

mod executor;
mod identity;
mod memory;
mod service;

pub use executor::{ExecutorError, ExecutorResult, SearchExecutor, SearchHit, SearchResponse};
pub use identity::{CallerIdentity, IdentityResolver, StaticIdentityResolver};
pub use memory::{MemorySearchExecutor, StoredDocument, DEFAULT_PAGE_SIZE};
pub use service::{QueryService, DEFAULT_INDEX};
