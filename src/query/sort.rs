//! Sort specifications

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::predicate::Predicate;

/// Sentinel field that sorts by index order
pub const DOC_FIELD: &str = "_doc";

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// How a multi-valued field collapses to one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Min,
    Max,
    Sum,
    Avg,
    Median,
}

/// Numeric type the sort values are cast to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericType {
    Long,
    Double,
    Date,
    DateNanos,
}

/// Sort by a field inside nested objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedSort {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Box<Predicate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_children: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<NestedSort>>,
}

impl NestedSort {
    /// Create a nested sort over `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filter: None,
            max_children: None,
            nested: None,
        }
    }
}

/// One sort key with all of its modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
    /// `"_last"`, `"_first"` or a literal substitute value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmapped_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SortMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_type: Option<NumericType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<NestedSort>,
}

impl SortSpec {
    /// Create a sort key with no modifiers
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
            missing: None,
            unmapped_type: None,
            mode: None,
            numeric_type: None,
            format: None,
            nested: None,
        }
    }

    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    /// Index order
    pub fn doc() -> Self {
        Self::asc(DOC_FIELD)
    }

    /// Set the value used for documents without the field
    pub fn with_missing(mut self, missing: impl Into<Value>) -> Self {
        self.missing = Some(missing.into());
        self
    }

    /// Set the type assumed where the field is unmapped
    pub fn with_unmapped_type(mut self, ty: impl Into<String>) -> Self {
        self.unmapped_type = Some(ty.into());
        self
    }

    /// Set how multi-valued fields collapse to one sort value
    pub fn with_mode(mut self, mode: SortMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the numeric type the values are cast to
    pub fn with_numeric_type(mut self, numeric_type: NumericType) -> Self {
        self.numeric_type = Some(numeric_type);
        self
    }

    /// Set the date format of sort values
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sort on a field inside nested objects
    pub fn with_nested(mut self, nested: NestedSort) -> Self {
        self.nested = Some(nested);
        self
    }

    /// Returns true for the `_doc` sentinel
    pub fn is_doc_order(&self) -> bool {
        self.field == DOC_FIELD
    }
}
