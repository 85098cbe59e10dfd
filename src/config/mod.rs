//! Configuration for the translation layer
//!
//! Loaded once at process start from a JSON file. Every key is optional;
//! an empty object yields the stock credential schema.

mod errors;

pub use errors::{ConfigError, ConfigResult};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mapping::{FieldMapping, FieldNameTranslator, PrefixRule};
use crate::observability::{log_event, Event};
use crate::request::RequestAssembler;
use crate::rewrite::{
    ComputedFieldDeclaration, ComputedFieldPolicy, CredentialPredicateBuilder,
    DefaultValueScript, DocumentTypeFilter, OwnerFields,
};
use crate::search::{IdentityResolver, QueryService, SearchExecutor, DEFAULT_INDEX};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Index alias the physical requests target
    #[serde(default = "default_index")]
    pub index: String,

    /// Always-on document-type restriction; `null` disables it
    #[serde(default = "default_document_type")]
    pub document_type: Option<DocumentTypeFilter>,

    /// Physical fields used for owner scoping
    #[serde(default)]
    pub owner: OwnerFields,

    /// Exact logical → physical field names
    #[serde(default = "default_field_mappings")]
    pub field_mappings: BTreeMap<String, String>,

    /// Prefix rules, applied in order after exact names
    #[serde(default = "default_prefix_mappings")]
    pub prefix_mappings: Vec<PrefixRule>,

    #[serde(default)]
    pub computed_field: ComputedFieldConfig,
}

/// The field synthesized for documents that predate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedFieldConfig {
    /// Logical name whose reference triggers the computed field
    pub logical_name: String,
    /// Name of the runtime field on the physical request
    pub physical_name: String,
    #[serde(default = "default_value_type")]
    pub value_type: String,
    /// Stored field the runtime value is read from
    pub source_field: String,
    /// Value for documents without `source_field`
    pub default_value: Value,
}

impl Default for ComputedFieldConfig {
    fn default() -> Self {
        Self {
            logical_name: "kind".to_string(),
            physical_name: "runtime_key_kind".to_string(),
            value_type: default_value_type(),
            source_field: "kind".to_string(),
            default_value: Value::from("rest"),
        }
    }
}

fn default_index() -> String {
    DEFAULT_INDEX.to_string()
}

fn default_document_type() -> Option<DocumentTypeFilter> {
    Some(DocumentTypeFilter::default())
}

fn default_value_type() -> String {
    "keyword".to_string()
}

fn default_field_mappings() -> BTreeMap<String, String> {
    [
        ("created", "creation_date"),
        ("expires", "expiration_date"),
        ("invalidated", "api_key_invalidated"),
        ("invalidation", "invalidation_date"),
        ("username", "creator.principal"),
        ("realm_name", "creator.realm"),
        ("kind", "runtime_key_kind"),
    ]
    .into_iter()
    .map(|(l, p)| (l.to_string(), p.to_string()))
    .collect()
}

fn default_prefix_mappings() -> Vec<PrefixRule> {
    vec![PrefixRule::new("metadata.", "metadata_flattened.")]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: default_index(),
            document_type: default_document_type(),
            owner: OwnerFields::default(),
            field_mappings: default_field_mappings(),
            prefix_mappings: default_prefix_mappings(),
            computed_field: ComputedFieldConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        let shown = path.display().to_string();
        log_event(Event::ConfigLoaded, &[("path", shown.as_str())]);
        Ok(config)
    }

    /// Parses and validates configuration JSON
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that cannot translate consistently
    pub fn validate(&self) -> ConfigResult<()> {
        if self.index.trim().is_empty() {
            return Err(ConfigError::invalid("index must not be empty"));
        }

        if let Some((logical, _)) = self.field_mappings.iter().find(|(_, p)| p.is_empty()) {
            return Err(ConfigError::invalid(format!(
                "field mapping for [{}] has an empty physical name",
                logical
            )));
        }

        if let Some(rule) = self.prefix_mappings.iter().find(|r| r.logical.is_empty()) {
            return Err(ConfigError::invalid(format!(
                "prefix mapping to [{}] has an empty logical prefix",
                rule.physical
            )));
        }

        let computed = &self.computed_field;
        let translated = self.translator().translate(&computed.logical_name);
        if translated != computed.physical_name {
            return Err(ConfigError::invalid(format!(
                "computed field [{}] must map to [{}], but maps to [{}]",
                computed.logical_name, computed.physical_name, translated
            )));
        }

        if let Some(dt) = &self.document_type {
            if self.field_mappings.contains_key(&dt.field) {
                return Err(ConfigError::invalid(format!(
                    "document type field [{}] must not be a logical field",
                    dt.field
                )));
            }
        }

        Ok(())
    }

    pub fn field_mapping(&self) -> FieldMapping {
        let mapping = self
            .field_mappings
            .iter()
            .fold(FieldMapping::new(), |m, (l, p)| m.with_field(l, p));
        self.prefix_mappings
            .iter()
            .fold(mapping, |m, r| m.with_prefix(&r.logical, &r.physical))
    }

    pub fn translator(&self) -> FieldNameTranslator {
        FieldNameTranslator::new(self.field_mapping())
    }

    pub fn computed_policy(&self) -> ComputedFieldPolicy {
        let c = &self.computed_field;
        ComputedFieldPolicy::new(
            &c.logical_name,
            ComputedFieldDeclaration::new(
                &c.physical_name,
                &c.value_type,
                DefaultValueScript::new(&c.source_field, c.default_value.clone()),
            ),
        )
    }

    pub fn predicate_builder(&self, translator: FieldNameTranslator) -> CredentialPredicateBuilder {
        let builder =
            CredentialPredicateBuilder::new(translator).with_owner_fields(self.owner.clone());
        match &self.document_type {
            Some(dt) => builder.with_document_type(dt.clone()),
            None => builder,
        }
    }

    /// Builds a query service wired to the given collaborators
    pub fn service(
        &self,
        executor: Arc<dyn SearchExecutor>,
        identity: Arc<dyn IdentityResolver>,
    ) -> QueryService {
        let translator = self.translator();
        let builder = self.predicate_builder(translator.clone());
        QueryService::new(translator, executor, identity)
            .with_builder(Arc::new(builder))
            .with_computed_policy(self.computed_policy())
            .with_assembler(RequestAssembler::new(&self.index))
    }
}
