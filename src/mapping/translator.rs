//! Logical to physical field name translation

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Rewrites every logical name starting with `logical` so it starts with `physical`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub logical: String,
    pub physical: String,
}

impl PrefixRule {
    pub fn new(logical: impl Into<String>, physical: impl Into<String>) -> Self {
        Self {
            logical: logical.into(),
            physical: physical.into(),
        }
    }

    fn apply(&self, name: &str) -> Option<String> {
        name.strip_prefix(&self.logical)
            .map(|rest| format!("{}{}", self.physical, rest))
    }
}

/// Immutable logical → physical field table
///
/// Exact entries are consulted first, then prefix rules in registration order.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    exact: HashMap<String, String>,
    prefixes: Vec<PrefixRule>,
}

impl FieldMapping {
    /// Creates an empty mapping (every name translates to itself)
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock credential field table
    pub fn credentials() -> Self {
        Self::new()
            .with_field("created", "creation_date")
            .with_field("expires", "expiration_date")
            .with_field("invalidated", "api_key_invalidated")
            .with_field("invalidation", "invalidation_date")
            .with_field("username", "creator.principal")
            .with_field("realm_name", "creator.realm")
            .with_field("kind", "runtime_key_kind")
            .with_prefix("metadata.", "metadata_flattened.")
    }

    /// Registers an exact mapping
    pub fn with_field(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        self.exact.insert(logical.into(), physical.into());
        self
    }

    /// Registers a prefix rule
    pub fn with_prefix(mut self, logical: impl Into<String>, physical: impl Into<String>) -> Self {
        self.prefixes.push(PrefixRule::new(logical, physical));
        self
    }

    fn lookup(&self, logical: &str) -> Option<String> {
        if let Some(physical) = self.exact.get(logical) {
            return Some(physical.clone());
        }
        self.prefixes.iter().find_map(|rule| rule.apply(logical))
    }
}

/// Translates logical field names through a shared [`FieldMapping`]
///
/// Cloning is cheap; every clone reads the same table.
#[derive(Debug, Clone)]
pub struct FieldNameTranslator {
    mapping: Arc<FieldMapping>,
}

impl FieldNameTranslator {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping: Arc::new(mapping),
        }
    }

    /// Returns the physical name for `logical`, or `logical` itself if unmapped
    pub fn translate(&self, logical: &str) -> String {
        self.mapping
            .lookup(logical)
            .unwrap_or_else(|| logical.to_string())
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }
}

impl Default for FieldNameTranslator {
    fn default() -> Self {
        Self::new(FieldMapping::credentials())
    }
}
