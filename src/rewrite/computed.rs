//! Computed field policy
//!
//! Credentials created before the `kind` attribute existed have no stored
//! value for it. Queries that reference `kind` get a runtime field emitting
//! the stored value or the implicit default; all other queries skip it.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::touched::TouchedFields;

/// Emit the stored `field`, or `default` when the document lacks it
///
/// Serialized with the rendered runtime `source` alongside its parts; the
/// parts let an executor evaluate the script without a script engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefaultValueScript {
    pub field: String,
    pub default: Value,
}

impl DefaultValueScript {
    pub fn new(field: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            default: default.into(),
        }
    }

    /// Runtime source text, e.g. `emit(field('kind').get("rest"));`
    pub fn source(&self) -> String {
        let field = self
            .field
            .replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace('"', "\\\"");
        format!("emit(field('{}').get({}));", field, self.default)
    }

    /// Value the field takes for a given stored document
    pub fn evaluate(&self, stored: Option<&Value>) -> Value {
        match stored {
            Some(v) if !v.is_null() => v.clone(),
            _ => self.default.clone(),
        }
    }
}

impl Serialize for DefaultValueScript {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DefaultValueScript", 3)?;
        state.serialize_field("source", &self.source())?;
        state.serialize_field("field", &self.field)?;
        state.serialize_field("default", &self.default)?;
        state.end()
    }
}

/// A field synthesized at query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedFieldDeclaration {
    #[serde(rename = "name")]
    pub physical_name: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub script: DefaultValueScript,
}

impl ComputedFieldDeclaration {
    pub fn new(
        physical_name: impl Into<String>,
        value_type: impl Into<String>,
        script: DefaultValueScript,
    ) -> Self {
        Self {
            physical_name: physical_name.into(),
            value_type: value_type.into(),
            script,
        }
    }
}

/// Attaches the computed field only when its logical name was referenced
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedFieldPolicy {
    sentinel: String,
    declaration: ComputedFieldDeclaration,
}

impl ComputedFieldPolicy {
    pub fn new(sentinel: impl Into<String>, declaration: ComputedFieldDeclaration) -> Self {
        Self {
            sentinel: sentinel.into(),
            declaration,
        }
    }

    /// `kind` backed by `runtime_key_kind`, defaulting to `"rest"`
    pub fn credentials() -> Self {
        Self::new(
            "kind",
            ComputedFieldDeclaration::new(
                "runtime_key_kind",
                "keyword",
                DefaultValueScript::new("kind", "rest"),
            ),
        )
    }

    /// Logical field name that triggers the declaration
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn decide(&self, touched: &TouchedFields) -> Option<ComputedFieldDeclaration> {
        touched
            .contains(&self.sentinel)
            .then(|| self.declaration.clone())
    }
}

impl Default for ComputedFieldPolicy {
    fn default() -> Self {
        Self::credentials()
    }
}
