//! Sort clause rewriting
//!
//! Order and length of the sort list are preserved. A sort key whose field is
//! unchanged by translation is passed through as-is, nested sort included.
//! A sort key whose field is renamed is rebuilt modifier by modifier; nested
//! sort cannot follow a rename because its path is resolved against the
//! physical schema, so that combination is rejected.

use super::predicate::check_not_reserved;
use super::touched::TouchedFields;
use crate::error::{QueryError, QueryResult};
use crate::mapping::FieldNameTranslator;
use crate::query::SortSpec;

/// Rewrites logical sort specifications into physical ones
pub struct SortRewriter<'a> {
    translator: &'a FieldNameTranslator,
    reserved: Option<&'a str>,
}

impl<'a> SortRewriter<'a> {
    /// Create a rewriter with no reserved field
    pub fn new(translator: &'a FieldNameTranslator) -> Self {
        Self {
            translator,
            reserved: None,
        }
    }

    /// Reject sort keys on `field`, by logical or physical name
    pub fn with_reserved_field(mut self, field: Option<&'a str>) -> Self {
        self.reserved = field;
        self
    }

    /// Returns the physical sort list and the logical fields it referenced
    pub fn rewrite(&self, specs: &[SortSpec]) -> QueryResult<(Vec<SortSpec>, TouchedFields)> {
        let mut touched = TouchedFields::new();
        let physical = specs
            .iter()
            .map(|spec| self.rewrite_one(spec, &mut touched))
            .collect::<QueryResult<Vec<_>>>()?;
        Ok((physical, touched))
    }

    fn rewrite_one(&self, spec: &SortSpec, touched: &mut TouchedFields) -> QueryResult<SortSpec> {
        if spec.is_doc_order() {
            return Ok(spec.clone());
        }

        let physical = self.translator.translate(&spec.field);
        check_not_reserved(self.reserved, &spec.field, &physical)?;
        touched.record(&spec.field);

        if physical == spec.field {
            return Ok(spec.clone());
        }

        if spec.nested.is_some() {
            return Err(QueryError::unsupported_sort(&spec.field));
        }

        let mut translated = SortSpec::new(physical, spec.order);
        translated.missing = spec.missing.clone();
        translated.unmapped_type = spec.unmapped_type.clone();
        if let Some(mode) = spec.mode {
            translated.mode = Some(mode);
        }
        if let Some(numeric_type) = spec.numeric_type {
            translated.numeric_type = Some(numeric_type);
        }
        if let Some(format) = &spec.format {
            translated.format = Some(format.clone());
        }
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::FieldMapping;
    use crate::query::{NestedSort, NumericType, SortMode};

    fn translator() -> FieldNameTranslator {
        FieldNameTranslator::new(FieldMapping::new().with_field("created", "creation_date"))
    }

    #[test]
    fn test_created_then_doc() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator);
        let specs = vec![
            SortSpec::desc("created").with_missing("_last"),
            SortSpec::doc(),
        ];

        let (physical, touched) = rewriter.rewrite(&specs).unwrap();

        assert_eq!(
            physical,
            vec![
                SortSpec::desc("creation_date").with_missing("_last"),
                SortSpec::doc(),
            ]
        );
        assert_eq!(touched.iter().collect::<Vec<_>>(), vec!["created"]);
    }

    #[test]
    fn test_doc_order_not_recorded() {
        let translator = FieldNameTranslator::new(FieldMapping::new().with_field("_doc", "x"));
        let rewriter = SortRewriter::new(&translator);

        let (physical, touched) = rewriter.rewrite(&[SortSpec::doc()]).unwrap();

        assert_eq!(physical, vec![SortSpec::doc()]);
        assert!(touched.is_empty());
    }

    #[test]
    fn test_every_modifier_survives_rename() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator);
        let spec = SortSpec::asc("created")
            .with_missing("_first")
            .with_unmapped_type("date")
            .with_mode(SortMode::Min)
            .with_numeric_type(NumericType::DateNanos)
            .with_format("epoch_millis");

        let (physical, _) = rewriter.rewrite(std::slice::from_ref(&spec)).unwrap();

        let expected = SortSpec {
            field: "creation_date".into(),
            ..spec
        };
        assert_eq!(physical, vec![expected]);
    }

    #[test]
    fn test_reserved_field_rejected() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator).with_reserved_field(Some("doc_type"));

        let err = rewriter.rewrite(&[SortSpec::asc("doc_type")]).unwrap_err();

        assert!(matches!(err, QueryError::InvalidQuery(_)));
        assert!(rewriter.rewrite(&[SortSpec::asc("created")]).is_ok());
    }

    #[test]
    fn test_nested_on_untranslated_field_passes_through() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator);
        let spec = SortSpec::asc("role_descriptors.name").with_nested(NestedSort::new("role_descriptors"));

        let (physical, touched) = rewriter.rewrite(std::slice::from_ref(&spec)).unwrap();

        assert_eq!(physical, vec![spec]);
        assert!(touched.contains("role_descriptors.name"));
    }

    #[test]
    fn test_nested_on_translated_field_rejected() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator);
        let specs = vec![
            SortSpec::asc("name"),
            SortSpec::asc("created").with_nested(NestedSort::new("creator")),
        ];

        let err = rewriter.rewrite(&specs).unwrap_err();

        assert_eq!(err, QueryError::unsupported_sort("created"));
    }

    #[test]
    fn test_order_and_length_preserved() {
        let translator = FieldNameTranslator::default();
        let rewriter = SortRewriter::new(&translator);
        let specs = vec![
            SortSpec::asc("name"),
            SortSpec::desc("expires"),
            SortSpec::doc(),
            SortSpec::asc("kind"),
            SortSpec::desc("metadata.env"),
        ];

        let (physical, _) = rewriter.rewrite(&specs).unwrap();

        let fields: Vec<_> = physical.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "expiration_date",
                "_doc",
                "runtime_key_kind",
                "metadata_flattened.env"
            ]
        );
        let orders: Vec<_> = physical.iter().map(|s| s.order).collect();
        let expected: Vec<_> = specs.iter().map(|s| s.order).collect();
        assert_eq!(orders, expected);
    }

    #[test]
    fn test_empty_sort_list() {
        let translator = translator();
        let rewriter = SortRewriter::new(&translator);

        let (physical, touched) = rewriter.rewrite(&[]).unwrap();

        assert!(physical.is_empty());
        assert!(touched.is_empty());
    }
}
