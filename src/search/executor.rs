//! Search executor interface

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::request::PhysicalRequest;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Failures reported by a search executor
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutorError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),

    #[error("search timed out: {0}")]
    Timeout(String),

    /// The backend refused the request as executable
    #[error("search rejected by backend: {0}")]
    Rejected(String),
}

impl ExecutorError {
    pub fn status_code(&self) -> u16 {
        match self {
            ExecutorError::Unavailable(_) => 503,
            ExecutorError::Timeout(_) => 504,
            ExecutorError::Rejected(_) => 500,
        }
    }
}

/// One matching credential document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    /// Sort-key tuple; feed the last hit's tuple back as `search_after`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Value>,
}

/// A page of hits plus the exact number of matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub total: u64,
}

/// Executes physical requests against the search backend
pub trait SearchExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: &'a PhysicalRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutorResult<SearchResponse>> + Send + 'a>>;
}
