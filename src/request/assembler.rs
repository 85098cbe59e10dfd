//! Request assembler

use serde::Serialize;
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::query::{Pagination, Predicate, SortSpec};
use crate::rewrite::ComputedFieldDeclaration;

/// Executable search request against the physical schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalRequest {
    /// Target index alias
    pub index: String,
    pub query: Predicate,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed_field: Option<ComputedFieldDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,
    fetch_source: bool,
    version: bool,
    track_total_hits: bool,
}

impl PhysicalRequest {
    /// Always true: hits carry their full stored document
    pub fn fetch_source(&self) -> bool {
        self.fetch_source
    }

    /// Always false: hits carry no version metadata
    pub fn version(&self) -> bool {
        self.version
    }

    /// Always true: the total hit count is exact
    pub fn track_total_hits(&self) -> bool {
        self.track_total_hits
    }
}

/// Composes rewritten parts into a [`PhysicalRequest`]
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    index: String,
}

impl RequestAssembler {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Builds the request.
    ///
    /// A search-after cursor cannot be combined with a non-zero offset: the
    /// cursor already positions the page.
    pub fn assemble(
        &self,
        predicate: Predicate,
        sort: Vec<SortSpec>,
        computed_field: Option<ComputedFieldDeclaration>,
        pagination: Pagination,
    ) -> QueryResult<PhysicalRequest> {
        if let (Some(from), Some(_)) = (pagination.from, &pagination.search_after) {
            if from > 0 {
                return Err(QueryError::invalid_query(format!(
                    "[from] must be 0 or absent when [search_after] is used, got {}",
                    from
                )));
            }
        }

        Ok(PhysicalRequest {
            index: self.index.clone(),
            query: predicate,
            sort,
            computed_field,
            from: pagination.from,
            size: pagination.size,
            search_after: pagination.search_after,
            fetch_source: true,
            version: false,
            track_total_hits: true,
        })
    }
}
