//! In-memory search executor
//!
//! Evaluates physical requests over JSON documents held in memory. Backs the
//! CLI and the test suite; it follows the request contract of a real backend
//! closely enough to exercise translation end to end.
//!
//! # Execution Flow
//!
//! 1. Project the computed field, if declared
//! 2. Filter documents by the query
//! 3. Count matches (exact total)
//! 4. Sort by the sort keys (stable)
//! 5. Drop hits at or before the search-after cursor
//! 6. Apply from / size

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::executor::{ExecutorError, ExecutorResult, SearchExecutor, SearchHit, SearchResponse};
use crate::query::{BoolPredicate, Predicate, SortMode, SortOrder, SortSpec};
use crate::request::PhysicalRequest;
use crate::rewrite::ComputedFieldDeclaration;

/// Page size when the request sets none
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A stored credential document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub source: Value,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, source: Value) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Executes physical requests over an in-memory document list
#[derive(Debug, Clone, Default)]
pub struct MemorySearchExecutor {
    documents: Vec<StoredDocument>,
}

impl MemorySearchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<StoredDocument>) -> Self {
        Self { documents }
    }

    pub fn with_document(mut self, id: impl Into<String>, source: Value) -> Self {
        self.documents.push(StoredDocument::new(id, source));
        self
    }

    /// Runs a request synchronously
    pub fn search(&self, request: &PhysicalRequest) -> ExecutorResult<SearchResponse> {
        let computed = request.computed_field.as_ref();
        let patterns = Patterns::compile(&request.query)?;

        let mut matched = Vec::new();
        for (position, doc) in self.documents.iter().enumerate() {
            let view = DocumentView {
                position,
                doc,
                computed,
            };
            if matches(&view, &request.query, &patterns)? {
                matched.push(view);
            }
        }
        let total = matched.len() as u64;

        let mut keyed: Vec<_> = matched
            .into_iter()
            .map(|view| {
                let keys = sort_keys(&view, &request.sort);
                (view, keys)
            })
            .collect();
        keyed.sort_by(|a, b| compare_tuples(&a.1, &b.1, &request.sort));

        if let Some(cursor) = &request.search_after {
            if cursor.is_empty() {
                return Err(ExecutorError::Rejected(
                    "[search_after] must contain at least one sort value".to_string(),
                ));
            }
            if cursor.len() != request.sort.len() {
                return Err(ExecutorError::Rejected(format!(
                    "[search_after] has {} values but there are {} sort keys",
                    cursor.len(),
                    request.sort.len()
                )));
            }
            let after: Vec<SortKey> = cursor.iter().map(SortKey::from_cursor).collect();
            keyed.retain(|(_, keys)| compare_tuples(keys, &after, &request.sort) == Ordering::Greater);
        }

        let from = request.from.unwrap_or(0) as usize;
        let size = request.size.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        let hits = keyed
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(view, keys)| SearchHit {
                id: view.doc.id.clone(),
                source: request.fetch_source().then(|| view.doc.source.clone()),
                sort: keys.into_iter().map(SortKey::into_value).collect(),
            })
            .collect();

        Ok(SearchResponse { hits, total })
    }
}

impl SearchExecutor for MemorySearchExecutor {
    fn execute<'a>(
        &'a self,
        request: &'a PhysicalRequest,
    ) -> Pin<Box<dyn Future<Output = ExecutorResult<SearchResponse>> + Send + 'a>> {
        Box::pin(async move { self.search(request) })
    }
}

/// A stored document as seen by one request
struct DocumentView<'a> {
    position: usize,
    doc: &'a StoredDocument,
    computed: Option<&'a ComputedFieldDeclaration>,
}

impl DocumentView<'_> {
    /// Non-null values of `field`; arrays are flattened one level
    fn values(&self, field: &str) -> Vec<Value> {
        let raw = match self.computed {
            Some(decl) if decl.physical_name == field => {
                Some(decl.script.evaluate(lookup(&self.doc.source, &decl.script.field)))
            }
            _ if field == "_id" => Some(Value::String(self.doc.id.clone())),
            _ => lookup(&self.doc.source, field).cloned(),
        };

        match raw {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.into_iter().filter(|v| !v.is_null()).collect(),
            Some(v) => vec![v],
        }
    }
}

/// Resolves a dotted path; a literal dotted key takes precedence
fn lookup<'v>(source: &'v Value, path: &str) -> Option<&'v Value> {
    if let Some(v) = source.get(path) {
        return Some(v);
    }
    path.split('.').try_fold(source, |current, segment| current.get(segment))
}

// =============================================================================
// Filtering
// =============================================================================

/// Wildcard patterns of one request, compiled before any document is visited
struct Patterns {
    compiled: HashMap<String, Regex>,
}

impl Patterns {
    fn compile(query: &Predicate) -> ExecutorResult<Self> {
        let mut patterns = Patterns {
            compiled: HashMap::new(),
        };
        patterns.collect(query)?;
        Ok(patterns)
    }

    fn collect(&mut self, predicate: &Predicate) -> ExecutorResult<()> {
        match predicate {
            Predicate::Wildcard { pattern, .. } if !self.compiled.contains_key(pattern) => {
                let re = glob_regex(pattern)?;
                self.compiled.insert(pattern.clone(), re);
            }
            Predicate::Bool(b) => {
                for clause in b.clauses() {
                    self.collect(clause)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn get(&self, pattern: &str) -> ExecutorResult<&Regex> {
        self.compiled.get(pattern).ok_or_else(|| {
            ExecutorError::Rejected(format!("wildcard pattern [{}] was not compiled", pattern))
        })
    }
}

fn matches(
    view: &DocumentView<'_>,
    predicate: &Predicate,
    patterns: &Patterns,
) -> ExecutorResult<bool> {
    let matched = match predicate {
        Predicate::MatchAll {} => true,
        Predicate::Term { field, value } => view.values(field).iter().any(|v| v == value),
        Predicate::Terms { field, values } => {
            view.values(field).iter().any(|v| values.contains(v))
        }
        Predicate::Range {
            field,
            gt,
            gte,
            lt,
            lte,
        } => view.values(field).iter().any(|v| {
            in_range(v, gt.as_ref(), |o| o == Ordering::Greater)
                && in_range(v, gte.as_ref(), |o| o != Ordering::Less)
                && in_range(v, lt.as_ref(), |o| o == Ordering::Less)
                && in_range(v, lte.as_ref(), |o| o != Ordering::Greater)
        }),
        Predicate::Prefix { field, value } => view
            .values(field)
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.starts_with(value.as_str()))),
        Predicate::Wildcard { field, pattern } => {
            let re = patterns.get(pattern)?;
            view.values(field)
                .iter()
                .any(|v| v.as_str().is_some_and(|s| re.is_match(s)))
        }
        Predicate::Exists { field } => !view.values(field).is_empty(),
        Predicate::Ids { values } => values.contains(&view.doc.id),
        Predicate::Match { field, .. } => {
            return Err(ExecutorError::Rejected(format!(
                "full-text match on [{}] is not supported",
                field
            )))
        }
        Predicate::Bool(b) => matches_bool(view, b, patterns)?,
    };
    Ok(matched)
}

fn matches_bool(
    view: &DocumentView<'_>,
    b: &BoolPredicate,
    patterns: &Patterns,
) -> ExecutorResult<bool> {
    for clause in b.must.iter().chain(&b.filter) {
        if !matches(view, clause, patterns)? {
            return Ok(false);
        }
    }
    for clause in &b.must_not {
        if matches(view, clause, patterns)? {
            return Ok(false);
        }
    }

    // Should clauses only gate the match when nothing else is required
    let only_should = b.must.is_empty() && b.filter.is_empty() && !b.should.is_empty();
    let required = b
        .minimum_should_match
        .unwrap_or(if only_should { 1 } else { 0 });

    let mut satisfied = 0u32;
    for clause in &b.should {
        if matches(view, clause, patterns)? {
            satisfied += 1;
        }
    }
    Ok(satisfied >= required)
}

/// True when there is no bound, or `value` compares to it as `accept` requires
fn in_range(value: &Value, bound: Option<&Value>, accept: fn(Ordering) -> bool) -> bool {
    match bound {
        None => true,
        Some(b) => comparable(value, b) && accept(compare_values(value, b)),
    }
}

fn comparable(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_))
    )
}

fn glob_regex(pattern: &str) -> ExecutorResult<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?s)^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| {
        ExecutorError::Rejected(format!("invalid wildcard pattern [{}]: {}", pattern, e))
    })
}

// =============================================================================
// Sorting
// =============================================================================

#[derive(Debug, Clone)]
enum SortKey {
    Present(Value),
    Missing,
}

impl SortKey {
    fn from_cursor(value: &Value) -> Self {
        if value.is_null() {
            SortKey::Missing
        } else {
            SortKey::Present(value.clone())
        }
    }

    fn into_value(self) -> Value {
        match self {
            SortKey::Present(v) => v,
            SortKey::Missing => Value::Null,
        }
    }
}

fn sort_keys(view: &DocumentView<'_>, specs: &[SortSpec]) -> Vec<SortKey> {
    specs.iter().map(|spec| sort_key(view, spec)).collect()
}

fn sort_key(view: &DocumentView<'_>, spec: &SortSpec) -> SortKey {
    if spec.is_doc_order() {
        return SortKey::Present(Value::from(view.position as u64));
    }

    let values = view.values(&spec.field);
    if values.is_empty() {
        return match &spec.missing {
            Some(Value::String(s)) if s == "_first" || s == "_last" => SortKey::Missing,
            Some(literal) => SortKey::Present(literal.clone()),
            None => SortKey::Missing,
        };
    }

    let mode = spec.mode.unwrap_or(match spec.order {
        SortOrder::Asc => SortMode::Min,
        SortOrder::Desc => SortMode::Max,
    });
    SortKey::Present(collapse(values, mode))
}

/// Reduces a multi-valued field to one sort value
fn collapse(mut values: Vec<Value>, mode: SortMode) -> Value {
    if values.len() == 1 {
        return values.remove(0);
    }

    let numbers: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
    match (mode, numbers) {
        (SortMode::Sum, Some(n)) => number(n.iter().sum()),
        (SortMode::Avg, Some(n)) => number(n.iter().sum::<f64>() / n.len() as f64),
        (SortMode::Median, Some(mut n)) => {
            n.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            let mid = n.len() / 2;
            if n.len() % 2 == 0 {
                number((n[mid - 1] + n[mid]) / 2.0)
            } else {
                number(n[mid])
            }
        }
        (SortMode::Max, _) => values
            .into_iter()
            .max_by(|a, b| compare_values(a, b))
            .unwrap_or(Value::Null),
        _ => values
            .into_iter()
            .min_by(|a, b| compare_values(a, b))
            .unwrap_or(Value::Null),
    }
}

fn number(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn compare_tuples(a: &[SortKey], b: &[SortKey], specs: &[SortSpec]) -> Ordering {
    a.iter()
        .zip(b)
        .zip(specs)
        .map(|((ka, kb), spec)| compare_keys(ka, kb, spec))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn compare_keys(a: &SortKey, b: &SortKey, spec: &SortSpec) -> Ordering {
    let missing_first = spec.missing.as_ref().and_then(Value::as_str) == Some("_first");
    match (a, b) {
        (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
        (SortKey::Missing, SortKey::Present(_)) => {
            if missing_first {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (SortKey::Present(_), SortKey::Missing) => {
            if missing_first {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (SortKey::Present(x), SortKey::Present(y)) => match spec.order {
            SortOrder::Asc => compare_values(x, y),
            SortOrder::Desc => compare_values(x, y).reverse(),
        },
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
fn compare_values(a: &Value, b: &Value) -> Ordering {
    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let xf = x.as_f64().unwrap_or(0.0);
            let yf = y.as_f64().unwrap_or(0.0);
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_order(a).cmp(&type_order(b)),
    }
}
