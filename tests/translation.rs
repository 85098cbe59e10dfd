//! Translation Tests
//!
//! Logical queries rewritten into physical requests, without execution:
//! - Field names translate inside predicates and sort keys
//! - The computed field is declared iff its logical name is referenced
//! - Scoping clauses are added by the layer, never by the caller
//! - Pagination passes through, cursor included

use credquery::mapping::FieldNameTranslator;
use credquery::query::{BoolPredicate, LogicalQuery, Pagination, Predicate, SortOrder, SortSpec};
use credquery::search::{CallerIdentity, MemorySearchExecutor, QueryService, StaticIdentityResolver};
use credquery::QueryError;
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn service() -> QueryService {
    QueryService::new(
        FieldNameTranslator::default(),
        Arc::new(MemorySearchExecutor::new()),
        Arc::new(StaticIdentityResolver::anonymous()),
    )
}

fn alice() -> CallerIdentity {
    CallerIdentity::new("alice", "native")
}

// =============================================================================
// Sort Translation
// =============================================================================

#[test]
fn test_sort_created_then_doc_order() {
    let query = LogicalQuery::new()
        .with_sort(SortSpec::desc("created"))
        .with_sort(SortSpec::doc());

    let req = service().translate(&query, None).unwrap();

    assert_eq!(req.sort.len(), 2);
    assert_eq!(req.sort[0].field, "creation_date");
    assert_eq!(req.sort[0].order, SortOrder::Desc);
    assert_eq!(req.sort[1].field, "_doc");
    assert!(req.computed_field.is_none());
}

#[test]
fn test_sort_on_unmapped_field_is_untouched() {
    let spec = SortSpec::asc("name").with_missing(json!("_last"));
    let query = LogicalQuery::new().with_sort(spec.clone());

    let req = service().translate(&query, None).unwrap();

    assert_eq!(req.sort, vec![spec]);
}

#[test]
fn test_sort_on_metadata_uses_flattened_prefix() {
    let query = LogicalQuery::new().with_sort(SortSpec::asc("metadata.env"));

    let req = service().translate(&query, None).unwrap();

    assert_eq!(req.sort[0].field, "metadata_flattened.env");
}

// =============================================================================
// Computed Field Policy
// =============================================================================

/// A query that never mentions the computed field carries no declaration.
#[test]
fn test_status_filter_has_no_computed_field() {
    let query = LogicalQuery::new().with_query(Predicate::term("invalidated", false));

    let req = service().translate(&query, None).unwrap();

    assert!(req.computed_field.is_none());
}

#[test]
fn test_sort_on_kind_declares_computed_field() {
    let query = LogicalQuery::new().with_sort(SortSpec::asc("kind"));

    let req = service().translate(&query, None).unwrap();

    let wire = serde_json::to_value(&req).unwrap();
    assert_eq!(
        wire["computed_field"]["script"]["source"],
        "emit(field('kind').get(\"rest\"));"
    );

    let decl = req.computed_field.expect("computed field declared");
    assert_eq!(decl.physical_name, "runtime_key_kind");
    assert_eq!(decl.value_type, "keyword");
    assert_eq!(req.sort[0].field, "runtime_key_kind");
}

#[test]
fn test_kind_deep_in_bool_declares_computed_field() {
    let logical = Predicate::from(
        BoolPredicate::new()
            .filter(Predicate::exists("name"))
            .should(
                BoolPredicate::new()
                    .must_not(Predicate::term("kind", "cross_cluster"))
                    .into(),
            ),
    );
    let query = LogicalQuery::new().with_query(logical);

    let req = service().translate(&query, None).unwrap();

    assert!(req.computed_field.is_some());
}

// =============================================================================
// Scoping
// =============================================================================

#[test]
fn test_document_type_filter_is_always_present() {
    let req = service().translate(&LogicalQuery::new(), None).unwrap();

    let wire = serde_json::to_value(&req.query).unwrap();
    assert_eq!(
        wire,
        json!({"bool": {
            "must": [{"match_all": {}}],
            "filter": [{"term": {"field": "doc_type", "value": "api_key"}}]
        }})
    );
}

#[test]
fn test_owner_scope_adds_principal_and_realm() {
    let query = LogicalQuery::new().with_query(Predicate::prefix("name", "ci-"));

    let req = service().translate(&query, Some(&alice())).unwrap();

    let filters = match &req.query {
        Predicate::Bool(b) => &b.filter,
        other => panic!("expected bool, got {:?}", other),
    };
    assert!(filters.contains(&Predicate::term("creator.principal", "alice")));
    assert!(filters.contains(&Predicate::term("creator.realm", "native")));
}

#[test]
fn test_caller_cannot_query_document_type() {
    let query = LogicalQuery::new().with_query(Predicate::term("doc_type", "role"));

    let err = service().translate(&query, None).unwrap_err();

    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

/// Sorting on the document-type field would reveal the always-on filter.
#[test]
fn test_caller_cannot_sort_on_document_type() {
    let query = LogicalQuery::new().with_sort(SortSpec::asc("doc_type"));

    let err = service().translate(&query, None).unwrap_err();

    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

#[test]
fn test_full_text_match_rejected() {
    let query = LogicalQuery::new().with_query(Predicate::text_match("name", "ci key"));

    let err = service().translate(&query, None).unwrap_err();

    assert_eq!(err.code(), "CREDQ_QUERY_INVALID");
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn test_cursor_passes_through_without_offset() {
    let query = LogicalQuery::new()
        .with_sort(SortSpec::desc("created"))
        .with_sort(SortSpec::asc("name"))
        .with_pagination(Pagination::cursor(vec![json!(17), json!("doc-9")]));

    let req = service().translate(&query, None).unwrap();

    assert_eq!(req.search_after, Some(vec![json!(17), json!("doc-9")]));
    assert_eq!(req.from, None);
    assert_eq!(req.size, None);
}

#[test]
fn test_cursor_with_offset_rejected() {
    let mut pagination = Pagination::cursor(vec![json!(17)]);
    pagination.from = Some(20);
    let query = LogicalQuery::new()
        .with_sort(SortSpec::desc("created"))
        .with_pagination(pagination);

    let err = service().translate(&query, None).unwrap_err();

    assert!(matches!(err, QueryError::InvalidQuery(_)));
}

#[test]
fn test_request_always_fetches_source_and_counts_hits() {
    let req = service()
        .translate(&LogicalQuery::new().with_pagination(Pagination::offset(10, 5)), None)
        .unwrap();

    assert!(req.fetch_source());
    assert!(!req.version());
    assert!(req.track_total_hits());
    assert_eq!((req.from, req.size), (Some(10), Some(5)));
}

// =============================================================================
// Logical Query Wire Format
// =============================================================================

#[test]
fn test_logical_query_from_json() {
    let query: LogicalQuery = serde_json::from_value(json!({
        "query": {"bool": {"filter": [{"term": {"field": "username", "value": "alice"}}]}},
        "sort": [{"field": "expires", "order": "desc"}],
        "size": 25
    }))
    .unwrap();

    let req = service().translate(&query, None).unwrap();
    let wire = serde_json::to_value(&req).unwrap();

    assert_eq!(wire["index"], ".security");
    assert_eq!(wire["sort"][0]["field"], "expiration_date");
    assert_eq!(
        wire["query"]["bool"]["must"][0]["bool"]["filter"][0]["term"]["field"],
        "creator.principal"
    );
    assert_eq!(wire["size"], 25);
}
