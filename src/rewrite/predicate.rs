//! Predicate rewriting
//!
//! Field references are translated leaf by leaf. Every visited leaf records
//! its logical name, whether or not translation changed it, because the
//! computed-field decision depends on what the caller referenced.
//!
//! Owner scoping and the document-type restriction are conjoined here and
//! never derived from the caller's tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::touched::TouchedFields;
use crate::error::{QueryError, QueryResult};
use crate::mapping::FieldNameTranslator;
use crate::query::{BoolPredicate, Predicate};
use crate::search::CallerIdentity;

/// Builds a physical predicate from a logical one
pub trait PredicateBuilder: Send + Sync {
    /// Translates `logical`, recording every referenced logical field into
    /// `touched`, and conjoins an owner clause when `scope` is given.
    fn build(
        &self,
        logical: &Predicate,
        touched: &mut TouchedFields,
        scope: Option<&CallerIdentity>,
    ) -> QueryResult<Predicate>;

    /// Field the builder filters on itself and callers may not reference
    fn reserved_field(&self) -> Option<&str> {
        None
    }
}

/// Always-on restriction to one document type in a shared index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTypeFilter {
    pub field: String,
    pub value: Value,
}

impl DocumentTypeFilter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl Default for DocumentTypeFilter {
    fn default() -> Self {
        Self::new("doc_type", "api_key")
    }
}

/// Physical fields identifying the owner of a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerFields {
    pub principal: String,
    pub realm: String,
}

impl Default for OwnerFields {
    fn default() -> Self {
        Self {
            principal: "creator.principal".to_string(),
            realm: "creator.realm".to_string(),
        }
    }
}

/// Predicate builder for the credential schema
#[derive(Debug, Clone)]
pub struct CredentialPredicateBuilder {
    translator: FieldNameTranslator,
    document_type: Option<DocumentTypeFilter>,
    owner_fields: OwnerFields,
}

impl CredentialPredicateBuilder {
    /// Builder with no document-type restriction and default owner fields
    pub fn new(translator: FieldNameTranslator) -> Self {
        Self {
            translator,
            document_type: None,
            owner_fields: OwnerFields::default(),
        }
    }

    pub fn with_document_type(mut self, filter: DocumentTypeFilter) -> Self {
        self.document_type = Some(filter);
        self
    }

    pub fn with_owner_fields(mut self, owner_fields: OwnerFields) -> Self {
        self.owner_fields = owner_fields;
        self
    }

    fn rewrite_node(
        &self,
        node: &Predicate,
        touched: &mut TouchedFields,
    ) -> QueryResult<Predicate> {
        match node {
            Predicate::Match { field, .. } => Err(QueryError::invalid_query(format!(
                "full-text [match] queries are not supported, found on field [{}]",
                field
            ))),
            Predicate::Bool(b) => Ok(Predicate::Bool(BoolPredicate {
                must: self.rewrite_all(&b.must, touched)?,
                filter: self.rewrite_all(&b.filter, touched)?,
                should: self.rewrite_all(&b.should, touched)?,
                must_not: self.rewrite_all(&b.must_not, touched)?,
                minimum_should_match: b.minimum_should_match,
            })),
            leaf => {
                let mut out = leaf.clone();
                if let Some(field) = out.field_mut() {
                    touched.record(field);
                    let physical = self.translator.translate(field);
                    check_not_reserved(self.reserved_field(), field, &physical)?;
                    *field = physical;
                }
                Ok(out)
            }
        }
    }

    fn rewrite_all(
        &self,
        nodes: &[Predicate],
        touched: &mut TouchedFields,
    ) -> QueryResult<Vec<Predicate>> {
        nodes
            .iter()
            .map(|n| self.rewrite_node(n, touched))
            .collect()
    }
}

/// The document-type discriminator is not queryable by callers, by either name
pub(crate) fn check_not_reserved(
    reserved: Option<&str>,
    logical: &str,
    physical: &str,
) -> QueryResult<()> {
    match reserved {
        Some(field) if field == logical || field == physical => Err(QueryError::invalid_query(
            format!("field [{}] is not allowed in queries", logical),
        )),
        _ => Ok(()),
    }
}

impl PredicateBuilder for CredentialPredicateBuilder {
    fn reserved_field(&self) -> Option<&str> {
        self.document_type.as_ref().map(|dt| dt.field.as_str())
    }

    fn build(
        &self,
        logical: &Predicate,
        touched: &mut TouchedFields,
        scope: Option<&CallerIdentity>,
    ) -> QueryResult<Predicate> {
        let rewritten = self.rewrite_node(logical, touched)?;

        let mut clauses = Vec::new();
        if let Some(dt) = &self.document_type {
            clauses.push(Predicate::term(dt.field.clone(), dt.value.clone()));
        }
        if let Some(identity) = scope {
            clauses.push(Predicate::term(
                self.owner_fields.principal.clone(),
                identity.principal.clone(),
            ));
            clauses.push(Predicate::term(
                self.owner_fields.realm.clone(),
                identity.realm.clone(),
            ));
        }

        if clauses.is_empty() {
            return Ok(rewritten);
        }

        Ok(BoolPredicate {
            must: vec![rewritten],
            filter: clauses,
            ..BoolPredicate::default()
        }
        .into())
    }
}

/// Rewrites a logical predicate tree through a [`PredicateBuilder`]
pub struct PredicateRewriter<'a> {
    builder: &'a dyn PredicateBuilder,
}

impl<'a> PredicateRewriter<'a> {
    pub fn new(builder: &'a dyn PredicateBuilder) -> Self {
        Self { builder }
    }

    /// Returns the physical predicate and the logical fields it referenced
    pub fn rewrite(
        &self,
        logical: &Predicate,
        scope: Option<&CallerIdentity>,
    ) -> QueryResult<(Predicate, TouchedFields)> {
        let mut touched = TouchedFields::new();
        let physical = self.builder.build(logical, &mut touched, scope)?;
        Ok((physical, touched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldMapping;
    use serde_json::json;

    fn builder() -> CredentialPredicateBuilder {
        CredentialPredicateBuilder::new(FieldNameTranslator::default())
    }

    fn alice() -> CallerIdentity {
        CallerIdentity::new("alice", "native")
    }

    #[test]
    fn test_unmapped_leaf_keeps_shape() {
        let builder = CredentialPredicateBuilder::new(FieldNameTranslator::new(FieldMapping::new()));
        let rewriter = PredicateRewriter::new(&builder);
        let logical = Predicate::term("kind", "x");

        let (physical, touched) = rewriter.rewrite(&logical, None).unwrap();

        assert_eq!(physical, logical);
        assert!(touched.contains("kind"));
    }

    #[test]
    fn test_leaves_are_translated_in_every_clause() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);
        let logical: Predicate = BoolPredicate::new()
            .must(Predicate::range("created").with_bound("gte", 100))
            .filter(Predicate::term("username", "bob"))
            .should(Predicate::prefix("metadata.team", "core"))
            .must_not(Predicate::exists("invalidation"))
            .into();

        let (physical, touched) = rewriter.rewrite(&logical, None).unwrap();

        assert_eq!(
            physical.fields(),
            vec![
                "creation_date",
                "creator.principal",
                "metadata_flattened.team",
                "invalidation_date"
            ]
        );
        assert_eq!(
            touched.iter().collect::<Vec<_>>(),
            vec!["created", "invalidation", "metadata.team", "username"]
        );
    }

    #[test]
    fn test_identity_translation_still_recorded() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);

        let (_, touched) = rewriter
            .rewrite(&Predicate::term("name", "ci-key"), None)
            .unwrap();

        assert!(touched.contains("name"));
    }

    #[test]
    fn test_scope_adds_owner_clauses() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);
        let identity = alice();

        let (physical, _) = rewriter
            .rewrite(&Predicate::term("name", "k"), Some(&identity))
            .unwrap();

        let expected: Predicate = BoolPredicate::new()
            .must(Predicate::term("name", "k"))
            .filter(Predicate::term("creator.principal", "alice"))
            .filter(Predicate::term("creator.realm", "native"))
            .into();
        assert_eq!(physical, expected);
    }

    #[test]
    fn test_scope_clauses_are_not_touched_fields() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);
        let identity = alice();

        let (_, touched) = rewriter
            .rewrite(&Predicate::match_all(), Some(&identity))
            .unwrap();

        assert!(touched.is_empty());
    }

    #[test]
    fn test_document_type_filter_always_applied() {
        let builder = builder().with_document_type(DocumentTypeFilter::default());
        let rewriter = PredicateRewriter::new(&builder);

        let (physical, _) = rewriter.rewrite(&Predicate::match_all(), None).unwrap();

        match physical {
            Predicate::Bool(b) => {
                assert_eq!(b.must, vec![Predicate::match_all()]);
                assert_eq!(b.filter, vec![Predicate::term("doc_type", json!("api_key"))]);
            }
            other => panic!("expected bool, got {:?}", other),
        }
    }

    #[test]
    fn test_document_type_field_is_reserved() {
        let builder = builder().with_document_type(DocumentTypeFilter::default());
        let rewriter = PredicateRewriter::new(&builder);
        let logical: Predicate = BoolPredicate::new()
            .should(Predicate::term("doc_type", "role"))
            .into();

        let err = rewriter.rewrite(&logical, None).unwrap_err();
        assert_eq!(err.code(), "CREDQ_QUERY_INVALID");
    }

    #[test]
    fn test_full_text_match_rejected() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);
        let logical: Predicate = BoolPredicate::new()
            .must(Predicate::text_match("name", "ci key"))
            .into();

        let err = rewriter.rewrite(&logical, None).unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery(_)));
    }

    #[test]
    fn test_ids_leaf_untouched() {
        let builder = builder();
        let rewriter = PredicateRewriter::new(&builder);
        let logical = Predicate::ids(["k1", "k2"]);

        let (physical, touched) = rewriter.rewrite(&logical, None).unwrap();

        assert_eq!(physical, logical);
        assert!(touched.is_empty());
    }
}
