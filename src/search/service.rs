//! Credential query service
//!
//! The single entry point of the translation layer.
//!
//! # Flow (strict order)
//!
//! 1. Resolve the caller when owner scoping is requested
//! 2. Rewrite the predicate (translation + scoping)
//! 3. Rewrite the sort list
//! 4. Decide the computed field from every touched logical field
//! 5. Assemble the physical request
//! 6. Dispatch to the executor
//!
//! Steps 1-5 never suspend and fail before anything is dispatched.

use std::sync::Arc;

use uuid::Uuid;

use super::executor::{SearchExecutor, SearchResponse};
use super::identity::{CallerIdentity, IdentityResolver};
use crate::error::{QueryError, QueryResult};
use crate::mapping::FieldNameTranslator;
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::query::{LogicalQuery, Predicate};
use crate::request::{PhysicalRequest, RequestAssembler};
use crate::rewrite::{
    ComputedFieldPolicy, CredentialPredicateBuilder, DocumentTypeFilter, PredicateBuilder,
    PredicateRewriter, SortRewriter,
};

/// Default index alias holding credential documents
pub const DEFAULT_INDEX: &str = ".security";

/// Translates logical credential queries and executes them
pub struct QueryService {
    translator: FieldNameTranslator,
    builder: Arc<dyn PredicateBuilder>,
    computed: ComputedFieldPolicy,
    assembler: RequestAssembler,
    executor: Arc<dyn SearchExecutor>,
    identity: Arc<dyn IdentityResolver>,
    metrics: Arc<MetricsRegistry>,
}

impl QueryService {
    /// Service with the stock credential schema: document-type filter on,
    /// `kind` as the computed field, results from [`DEFAULT_INDEX`].
    pub fn new(
        translator: FieldNameTranslator,
        executor: Arc<dyn SearchExecutor>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        let builder = CredentialPredicateBuilder::new(translator.clone())
            .with_document_type(DocumentTypeFilter::default());
        Self {
            translator,
            builder: Arc::new(builder),
            computed: ComputedFieldPolicy::credentials(),
            assembler: RequestAssembler::new(DEFAULT_INDEX),
            executor,
            identity,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn with_builder(mut self, builder: Arc<dyn PredicateBuilder>) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_computed_policy(mut self, policy: ComputedFieldPolicy) -> Self {
        self.computed = policy;
        self
    }

    pub fn with_assembler(mut self, assembler: RequestAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Rewrites a logical query into a physical request without executing it.
    ///
    /// `scope` is the identity to restrict results to; callers decide it,
    /// the query itself never can.
    pub fn translate(
        &self,
        query: &LogicalQuery,
        scope: Option<&CallerIdentity>,
    ) -> QueryResult<PhysicalRequest> {
        let match_all = Predicate::match_all();
        let logical = query.query.as_ref().unwrap_or(&match_all);

        let (predicate, mut touched) =
            PredicateRewriter::new(self.builder.as_ref()).rewrite(logical, scope)?;
        let (sort, sort_touched) = SortRewriter::new(&self.translator)
            .with_reserved_field(self.builder.reserved_field())
            .rewrite(&query.sort)?;
        touched.merge(sort_touched);

        let computed = self.computed.decide(&touched);
        self.assembler
            .assemble(predicate, sort, computed, query.pagination.clone())
    }

    /// Translates `query` for the current caller and executes it
    pub async fn translate_and_execute(&self, query: &LogicalQuery) -> QueryResult<SearchResponse> {
        let request_id = Uuid::new_v4().to_string();

        let request = match self.translate_for_caller(query) {
            Ok(request) => request,
            Err(e) => {
                self.metrics.increment_rejected();
                let reason = e.to_string();
                log_event(
                    Event::QueryRejected,
                    &[
                        ("code", e.code()),
                        ("reason", reason.as_str()),
                        ("request_id", request_id.as_str()),
                    ],
                );
                return Err(e);
            }
        };

        self.metrics.increment_translated();
        let sort_keys = request.sort.len().to_string();
        log_event(
            Event::QueryTranslated,
            &[
                ("index", self.assembler.index()),
                ("owner", if query.owner { "true" } else { "false" }),
                ("request_id", request_id.as_str()),
                ("sort_keys", sort_keys.as_str()),
            ],
        );
        if let Some(decl) = &request.computed_field {
            self.metrics.increment_computed_fields();
            log_event(
                Event::ComputedFieldAttached,
                &[
                    ("field", decl.physical_name.as_str()),
                    ("request_id", request_id.as_str()),
                    ("sentinel", self.computed.sentinel()),
                ],
            );
        }

        match self.executor.execute(&request).await {
            Ok(response) => {
                self.metrics.increment_searches();
                let total = response.total.to_string();
                let hits = response.hits.len().to_string();
                log_event(
                    Event::SearchCompleted,
                    &[
                        ("hits", hits.as_str()),
                        ("request_id", request_id.as_str()),
                        ("total", total.as_str()),
                    ],
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.increment_search_failures();
                let reason = e.to_string();
                log_event(
                    Event::SearchFailed,
                    &[
                        ("reason", reason.as_str()),
                        ("request_id", request_id.as_str()),
                    ],
                );
                Err(QueryError::from(e))
            }
        }
    }

    /// Translates `query`, scoping it to the resolved caller when it asks
    /// for owned credentials only
    pub fn translate_for_caller(&self, query: &LogicalQuery) -> QueryResult<PhysicalRequest> {
        let scope = if query.owner {
            Some(self.identity.resolve().ok_or(QueryError::MissingIdentity)?)
        } else {
            None
        };
        self.translate(query, scope.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Pagination, SortSpec};
    use crate::search::{MemorySearchExecutor, StaticIdentityResolver};
    use serde_json::json;

    fn service(identity: StaticIdentityResolver) -> QueryService {
        let executor = MemorySearchExecutor::new()
            .with_document(
                "k1",
                json!({"doc_type": "api_key", "name": "a", "creation_date": 2,
                       "creator": {"principal": "alice", "realm": "native"}}),
            )
            .with_document(
                "k2",
                json!({"doc_type": "api_key", "name": "b", "creation_date": 1,
                       "creator": {"principal": "bob", "realm": "native"}}),
            )
            .with_document("r1", json!({"doc_type": "role", "name": "a"}));
        QueryService::new(
            FieldNameTranslator::default(),
            Arc::new(executor),
            Arc::new(identity),
        )
    }

    #[test]
    fn test_translate_combines_stages() {
        let svc = service(StaticIdentityResolver::anonymous());
        let query = LogicalQuery::new()
            .with_query(Predicate::term("name", "a"))
            .with_sort(SortSpec::asc("kind"))
            .with_pagination(Pagination::offset(0, 5));

        let req = svc.translate(&query, None).unwrap();

        assert_eq!(req.sort[0].field, "runtime_key_kind");
        assert!(req.computed_field.is_some());
        assert_eq!(req.index, DEFAULT_INDEX);
        assert_eq!(req.size, Some(5));
    }

    #[tokio::test]
    async fn test_document_type_filter_hides_other_documents() {
        let svc = service(StaticIdentityResolver::anonymous());
        let query = LogicalQuery::new().with_query(Predicate::term("name", "a"));

        let resp = svc.translate_and_execute(&query).await.unwrap();

        assert_eq!(resp.total, 1);
        assert_eq!(resp.hits[0].id, "k1");
    }

    #[tokio::test]
    async fn test_owner_scope_requires_identity() {
        let svc = service(StaticIdentityResolver::anonymous());
        let query = LogicalQuery::new().owned_by_caller();

        let err = svc.translate_and_execute(&query).await.unwrap_err();

        assert_eq!(err, QueryError::MissingIdentity);
        assert_eq!(svc.metrics().snapshot().queries_rejected, 1);
        assert_eq!(svc.metrics().snapshot().searches_executed, 0);
    }

    #[tokio::test]
    async fn test_owner_scope_restricts_results() {
        let svc = service(StaticIdentityResolver::authenticated(CallerIdentity::new(
            "bob", "native",
        )));
        let query = LogicalQuery::new().owned_by_caller();

        let resp = svc.translate_and_execute(&query).await.unwrap();

        assert_eq!(resp.total, 1);
        assert_eq!(resp.hits[0].id, "k2");
    }

    #[tokio::test]
    async fn test_identity_ignored_without_owner_flag() {
        let svc = service(StaticIdentityResolver::authenticated(CallerIdentity::new(
            "bob", "native",
        )));

        let resp = svc.translate_and_execute(&LogicalQuery::new()).await.unwrap();

        assert_eq!(resp.total, 2);
    }
}
