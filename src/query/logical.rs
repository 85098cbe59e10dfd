//! Caller-facing credential query

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::predicate::Predicate;
use super::sort::SortSpec;

/// Page selection: an offset window, a search-after cursor, or neither
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Sort-key tuple of the last hit of the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,
}

impl Pagination {
    /// Offset window of `size` hits starting at `from`
    pub fn offset(from: u32, size: u32) -> Self {
        Self {
            from: Some(from),
            size: Some(size),
            search_after: None,
        }
    }

    /// Page after the given sort-key tuple
    pub fn cursor(values: Vec<Value>) -> Self {
        Self {
            from: None,
            size: None,
            search_after: Some(values),
        }
    }

    /// Set the page size
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
}

/// A credential query as submitted by a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalQuery {
    /// Predicate over logical fields; absent means match everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Restrict results to credentials owned by the caller
    #[serde(default)]
    pub owner: bool,
}

impl LogicalQuery {
    /// Create a query matching every credential
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the predicate
    pub fn with_query(mut self, query: Predicate) -> Self {
        self.query = Some(query);
        self
    }

    /// Append a sort key
    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    /// Set the page selection
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Restrict results to the caller's own credentials
    pub fn owned_by_caller(mut self) -> Self {
        self.owner = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_body() {
        let q: LogicalQuery = serde_json::from_value(json!({
            "query": {"term": {"field": "name", "value": "ci"}},
            "sort": [{"field": "created", "order": "desc"}],
            "size": 20,
            "search_after": [17, "doc-9"],
            "owner": true
        }))
        .unwrap();

        assert!(q.owner);
        assert_eq!(q.sort.len(), 1);
        assert_eq!(q.pagination.size, Some(20));
        assert_eq!(q.pagination.from, None);
        assert_eq!(q.pagination.search_after, Some(vec![json!(17), json!("doc-9")]));
    }

    #[test]
    fn test_empty_body() {
        let q: LogicalQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(q, LogicalQuery::new());
    }
}
