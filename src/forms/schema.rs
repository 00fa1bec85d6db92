use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema document is not valid JSON: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("schema has no sections")]
    Empty,

    #[error("duplicate field key: {0}")]
    DuplicateField(String),

    #[error("field {field} depends on unknown field {key}")]
    UnknownDependency { field: String, key: String },

    #[error("field {field} has an invalid pattern: {source}")]
    BadPattern {
        field: String,
        source: regex::Error,
    },
}

/// Visibility predicate on another field's current value. Recomputed on
/// every form-data change; a hidden field is excluded from validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldCondition {
    Equals { key: String, value: Value },
    OneOf { key: String, one_of: Vec<Value> },
    NotOneOf { key: String, not_one_of: Vec<Value> },
}

impl FieldCondition {
    pub fn key(&self) -> &str {
        match self {
            FieldCondition::Equals { key, .. }
            | FieldCondition::OneOf { key, .. }
            | FieldCondition::NotOneOf { key, .. } => key,
        }
    }

    pub fn evaluate(&self, data: &HashMap<String, Value>) -> bool {
        let current = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);
        match self {
            FieldCondition::Equals { key, value } => current(key) == *value,
            FieldCondition::OneOf { key, one_of } => one_of.contains(&current(key)),
            FieldCondition::NotOneOf { key, not_one_of } => !not_one_of.contains(&current(key)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    /// Open type name dispatched through the validator registry; unknown
    /// types fall back to plain text handling.
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub depends_on: Option<FieldCondition>,
    #[serde(default)]
    pub default: Option<Value>,
}

fn default_field_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

/// Declarative description of the employment-contract form: ordered
/// sections of typed fields with validation rules and visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub title: Option<String>,
    pub sections: Vec<FormSection>,
}

impl FormSchema {
    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let schema: FormSchema = serde_json::from_str(raw)?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FormField> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields().find(|f| f.key == key)
    }

    /// Structural checks; the engine refuses to render a schema that fails
    /// here rather than guessing.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut keys = HashSet::new();
        for field in self.fields() {
            if !keys.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateField(field.key.clone()));
            }
        }

        for field in self.fields() {
            if let Some(cond) = &field.depends_on {
                if !keys.contains(cond.key()) {
                    return Err(SchemaError::UnknownDependency {
                        field: field.key.clone(),
                        key: cond.key().to_string(),
                    });
                }
            }
            if let Some(pattern) = &field.pattern {
                if let Err(source) = regex::Regex::new(pattern) {
                    return Err(SchemaError::BadPattern {
                        field: field.key.clone(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }
}
