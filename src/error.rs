//! Query translation errors
//!
//! Error codes:
//! - CREDQ_QUERY_INVALID (REJECT)
//! - CREDQ_SORT_UNSUPPORTED (REJECT)
//! - CREDQ_IDENTITY_MISSING (REJECT)
//! - CREDQ_SEARCH_FAILED (propagated from the executor)
//!
//! Everything except executor failures is detected before a request is dispatched.

use thiserror::Error;

use crate::search::ExecutorError;

/// Result type for translation and search operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors surfaced by the query translation layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Predicate uses an operator or field the credential schema does not support
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Nested sort requested on a field whose name gets translated
    #[error("nested sorting is not supported for field [{field}]")]
    UnsupportedSort {
        /// Logical field the sort was requested on
        field: String,
    },

    /// Owner scoping requested without a resolvable caller
    #[error("restricting results to the current owner requires an authenticated caller")]
    MissingIdentity,

    /// Failure reported by the search executor, passed through unchanged
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl QueryError {
    /// Create an invalid query error
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery(reason.into())
    }

    /// Create an unsupported sort error
    pub fn unsupported_sort(field: impl Into<String>) -> Self {
        Self::UnsupportedSort {
            field: field.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "CREDQ_QUERY_INVALID",
            Self::UnsupportedSort { .. } => "CREDQ_SORT_UNSUPPORTED",
            Self::MissingIdentity => "CREDQ_IDENTITY_MISSING",
            Self::Executor(_) => "CREDQ_SEARCH_FAILED",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidQuery(_) => 400,
            Self::UnsupportedSort { .. } => 400,
            Self::MissingIdentity => 401,
            Self::Executor(e) => e.status_code(),
        }
    }

    /// Caller errors are rejected before anything is dispatched
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
