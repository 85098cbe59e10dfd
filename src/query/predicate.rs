//! Structured predicate tree
//!
//! The same tree shape is used for logical queries (caller field names) and
//! physical queries (storage field names). Serialized in the familiar
//! externally tagged form, e.g. `{"term": {"field": "name", "value": "k1"}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node of a boolean query tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every document
    MatchAll {},
    /// Exact value match
    Term { field: String, value: Value },
    /// Matches any of the given values
    Terms { field: String, values: Vec<Value> },
    /// Bounded comparison; absent bounds are open
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
    /// String prefix match
    Prefix { field: String, value: String },
    /// Glob match with `*` and `?`
    Wildcard { field: String, pattern: String },
    /// Field is present and not null
    Exists { field: String },
    /// Document id match
    Ids { values: Vec<String> },
    /// Full-text match on an analysed field
    Match { field: String, query: String },
    /// Boolean combination of sub-queries
    Bool(BoolPredicate),
}

/// Clauses of a boolean query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolPredicate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

impl BoolPredicate {
    /// Create an empty boolean query
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required, scoring clause
    pub fn must(mut self, clause: Predicate) -> Self {
        self.must.push(clause);
        self
    }

    /// Add a required, non-scoring clause
    pub fn filter(mut self, clause: Predicate) -> Self {
        self.filter.push(clause);
        self
    }

    /// Add an optional clause
    pub fn should(mut self, clause: Predicate) -> Self {
        self.should.push(clause);
        self
    }

    /// Add an excluding clause
    pub fn must_not(mut self, clause: Predicate) -> Self {
        self.must_not.push(clause);
        self
    }

    /// Require at least `n` should clauses
    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    /// All clauses, in must / filter / should / must_not order
    pub fn clauses(&self) -> impl Iterator<Item = &Predicate> {
        self.must
            .iter()
            .chain(&self.filter)
            .chain(&self.should)
            .chain(&self.must_not)
    }
}

impl Predicate {
    /// Create a match-all predicate
    pub fn match_all() -> Self {
        Predicate::MatchAll {}
    }

    /// Create an exact-value predicate
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a predicate matching any of `values`
    pub fn terms(field: impl Into<String>, values: Vec<Value>) -> Self {
        Predicate::Terms {
            field: field.into(),
            values,
        }
    }

    /// Range with no bounds; use [`Predicate::with_bound`] to close it
    pub fn range(field: impl Into<String>) -> Self {
        Predicate::Range {
            field: field.into(),
            gt: None,
            gte: None,
            lt: None,
            lte: None,
        }
    }

    /// Sets a range bound (`gt`, `gte`, `lt` or `lte`); no-op on other nodes
    pub fn with_bound(mut self, bound: &str, value: impl Into<Value>) -> Self {
        if let Predicate::Range { gt, gte, lt, lte, .. } = &mut self {
            let slot = match bound {
                "gt" => gt,
                "gte" => gte,
                "lt" => lt,
                "lte" => lte,
                _ => return self,
            };
            *slot = Some(value.into());
        }
        self
    }

    /// Create a string prefix predicate
    pub fn prefix(field: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Prefix {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a glob predicate (`*`, `?`)
    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Predicate::Wildcard {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Create a field presence predicate
    pub fn exists(field: impl Into<String>) -> Self {
        Predicate::Exists {
            field: field.into(),
        }
    }

    /// Create a document id predicate
    pub fn ids(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Predicate::Ids {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a full-text match predicate
    pub fn text_match(field: impl Into<String>, query: impl Into<String>) -> Self {
        Predicate::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    /// Returns the field this leaf refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Predicate::Term { field, .. }
            | Predicate::Terms { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::Prefix { field, .. }
            | Predicate::Wildcard { field, .. }
            | Predicate::Exists { field }
            | Predicate::Match { field, .. } => Some(field),
            Predicate::MatchAll {} | Predicate::Ids { .. } | Predicate::Bool(_) => None,
        }
    }

    /// Mutable access to the field this leaf refers to, if any
    pub fn field_mut(&mut self) -> Option<&mut String> {
        match self {
            Predicate::Term { field, .. }
            | Predicate::Terms { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::Prefix { field, .. }
            | Predicate::Wildcard { field, .. }
            | Predicate::Exists { field }
            | Predicate::Match { field, .. } => Some(field),
            Predicate::MatchAll {} | Predicate::Ids { .. } | Predicate::Bool(_) => None,
        }
    }

    /// Collects every leaf field name, depth first
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Bool(b) => b.clauses().for_each(|c| c.collect_fields(out)),
            leaf => out.extend(leaf.field()),
        }
    }
}

impl From<BoolPredicate> for Predicate {
    fn from(b: BoolPredicate) -> Self {
        Predicate::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let p = Predicate::term("name", "k1");
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"term": {"field": "name", "value": "k1"}})
        );
        assert_eq!(
            serde_json::to_value(Predicate::match_all()).unwrap(),
            json!({"match_all": {}})
        );
    }

    #[test]
    fn test_parse_nested_bool() {
        let p: Predicate = serde_json::from_value(json!({
            "bool": {
                "must": [{"prefix": {"field": "name", "value": "ci-"}}],
                "must_not": [{"term": {"field": "invalidated", "value": true}}]
            }
        }))
        .unwrap();

        match &p {
            Predicate::Bool(b) => {
                assert_eq!(b.must.len(), 1);
                assert_eq!(b.must_not.len(), 1);
                assert!(b.filter.is_empty());
            }
            other => panic!("expected bool, got {:?}", other),
        }
        assert_eq!(p.fields(), vec!["name", "invalidated"]);
    }

    #[test]
    fn test_range_bounds() {
        let p = Predicate::range("created")
            .with_bound("gte", 10)
            .with_bound("lt", 20)
            .with_bound("bogus", 0);
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({"range": {"field": "created", "gte": 10, "lt": 20}})
        );
    }

    #[test]
    fn test_field_accessors() {
        let mut p = Predicate::exists("expires");
        assert_eq!(p.field(), Some("expires"));
        *p.field_mut().unwrap() = "expiration_date".into();
        assert_eq!(p.field(), Some("expiration_date"));

        assert_eq!(Predicate::ids(["a"]).field(), None);
        assert_eq!(Predicate::match_all().field(), None);
    }
}
