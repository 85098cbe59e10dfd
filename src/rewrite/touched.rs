//! Accumulator for logical field references

use std::collections::BTreeSet;

/// Logical field names referenced while rewriting one request
///
/// Owned by a single request and dropped once the physical request is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedFields {
    names: BTreeSet<String>,
}

impl TouchedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a logical field reference
    pub fn record(&mut self, logical: &str) {
        if !self.names.contains(logical) {
            self.names.insert(logical.to_string());
        }
    }

    pub fn contains(&self, logical: &str) -> bool {
        self.names.contains(logical)
    }

    /// Folds another accumulator into this one
    pub fn merge(&mut self, other: TouchedFields) {
        self.names.extend(other.names);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
