use crate::forms::schema::{FormField, FormSchema, SchemaError};
use crate::forms::validators::{is_empty_value, ValidatorRegistry};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("form has {0} validation error(s)")]
    ValidationFailed(usize),
}

/// One entry of the field-change audit trail shipped with the submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub values: HashMap<String, Value>,
    pub changes: Vec<FieldChange>,
}

/// Schema-driven form state: field values, conditional visibility, live
/// validation errors and the change audit log. Rendering is the caller's
/// concern; this owns everything the render needs to ask.
pub struct FormEngine {
    schema: FormSchema,
    registry: ValidatorRegistry,
    values: HashMap<String, Value>,
    errors: BTreeMap<String, String>,
    changes: Vec<FieldChange>,
}

impl FormEngine {
    /// Refuses invalid schemas outright rather than rendering a guess.
    pub fn new(schema: FormSchema) -> Result<Self, FormError> {
        Self::with_registry(schema, ValidatorRegistry::with_defaults())
    }

    pub fn with_registry(
        schema: FormSchema,
        registry: ValidatorRegistry,
    ) -> Result<Self, FormError> {
        schema.validate()?;

        let mut values = HashMap::new();
        for field in schema.fields() {
            let initial = field.default.clone().unwrap_or(Value::Null);
            values.insert(field.key.clone(), initial);
        }

        let mut engine = Self {
            schema,
            registry,
            values,
            errors: BTreeMap::new(),
            changes: Vec::new(),
        };
        engine.revalidate();
        Ok(engine)
    }

    /// Seed values (e.g. a draft restored from the key-value store) without
    /// polluting the change log.
    pub fn seed(&mut self, draft: &HashMap<String, Value>) {
        for (key, value) in draft {
            if self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
        self.revalidate();
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Live validation errors for currently visible fields.
    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    /// A field is rendered (and validated) only when its `depends_on`
    /// condition holds against current form data.
    pub fn is_visible(&self, key: &str) -> bool {
        match self.schema.field(key) {
            Some(field) => match &field.depends_on {
                Some(cond) => cond.evaluate(&self.values),
                None => true,
            },
            None => false,
        }
    }

    /// Record an edit, append it to the audit trail, and revalidate.
    pub fn set_value(&mut self, key: &str, value: Value) -> Result<(), FormError> {
        if !self.values.contains_key(key) {
            return Err(FormError::UnknownField(key.to_string()));
        }
        let old_value = self.values.insert(key.to_string(), value.clone()).unwrap();
        self.changes.push(FieldChange {
            field: key.to_string(),
            old_value,
            new_value: value,
            changed_at: Utc::now(),
        });
        self.revalidate();
        Ok(())
    }

    /// Authoritative validation pass; on success hands over the full form
    /// data (hidden fields included) plus the audit trail. On failure the
    /// engine is untouched and `errors()` carries the summary.
    pub fn submit(&mut self) -> Result<FormSubmission, FormError> {
        self.revalidate();
        if !self.errors.is_empty() {
            tracing::debug!("form submit blocked by {} error(s)", self.errors.len());
            return Err(FormError::ValidationFailed(self.errors.len()));
        }
        Ok(FormSubmission {
            values: self.values.clone(),
            changes: self.changes.clone(),
        })
    }

    fn revalidate(&mut self) {
        self.errors.clear();
        let fields: Vec<FormField> = self.schema.fields().cloned().collect();
        for field in &fields {
            if !self.is_visible(&field.key) {
                continue;
            }
            if let Some(message) = self.validate_field(field) {
                self.errors.insert(field.key.clone(), message);
            }
        }
    }

    fn validate_field(&self, field: &FormField) -> Option<String> {
        let value = self.values.get(&field.key).cloned().unwrap_or(Value::Null);

        if is_empty_value(&value) {
            if field.required {
                return Some(format!("{} is required", field.label));
            }
            return None;
        }

        if let Some(pattern) = &field.pattern {
            if let Some(text) = value.as_str() {
                if !compiled(pattern).is_match(text) {
                    return Some(format!("{} has an invalid format", field.label));
                }
            }
        }

        self.registry.validate(field, &value)
    }
}

/// Schema patterns are validated once at load; compile lazily and cache so
/// revalidation on every keystroke does not re-parse them.
fn compiled(pattern: &str) -> Regex {
    static CACHE: Lazy<Mutex<HashMap<String, Regex>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));
    let mut cache = CACHE.lock().unwrap();
    cache
        .entry(pattern.to_string())
        .or_insert_with(|| Regex::new(pattern).unwrap())
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contract_schema() -> FormSchema {
        FormSchema::from_json(
            r#"{
              "title": "Employment Contract",
              "sections": [
                {
                  "id": "personal",
                  "title": "Personal Particulars",
                  "fields": [
                    {"key": "full_name", "label": "Full name", "type": "text", "required": true},
                    {"key": "nationality", "label": "Nationality", "type": "select", "required": true,
                     "options": ["Malaysian", "Non-Malaysian"], "default": "Malaysian"},
                    {"key": "nric", "label": "NRIC number", "type": "national_id", "required": true,
                     "depends_on": {"key": "nationality", "value": "Malaysian"}},
                    {"key": "passport", "label": "Passport number", "type": "text", "required": true,
                     "depends_on": {"key": "nationality", "value": "Non-Malaysian"}}
                  ]
                },
                {
                  "id": "payroll",
                  "title": "Payroll",
                  "fields": [
                    {"key": "bank_name", "label": "Bank", "type": "bank", "required": true},
                    {"key": "phone", "label": "Mobile number", "type": "phone", "required": true},
                    {"key": "basic_salary", "label": "Basic salary (MYR)", "type": "number",
                     "required": true, "min": 1500.0, "max": 100000.0}
                  ]
                }
              ]
            }"#,
        )
        .unwrap()
    }

    fn filled_engine() -> FormEngine {
        let mut engine = FormEngine::new(contract_schema()).unwrap();
        engine.set_value("full_name", json!("Aisyah binti Rahman")).unwrap();
        engine.set_value("nric", json!("880514-10-1234")).unwrap();
        engine.set_value("bank_name", json!("Maybank")).unwrap();
        engine.set_value("phone", json!("+60 12-345 6789")).unwrap();
        engine.set_value("basic_salary", json!(4200)).unwrap();
        engine
    }

    #[test]
    fn test_defaults_seed_values() {
        let engine = FormEngine::new(contract_schema()).unwrap();
        assert_eq!(engine.value("nationality"), Some(&json!("Malaysian")));
        // NRIC visible for Malaysians, passport hidden.
        assert!(engine.is_visible("nric"));
        assert!(!engine.is_visible("passport"));
    }

    #[test]
    fn test_live_errors_track_edits() {
        let mut engine = FormEngine::new(contract_schema()).unwrap();
        assert!(engine.errors().contains_key("full_name"));
        engine.set_value("full_name", json!("Aisyah binti Rahman")).unwrap();
        assert!(!engine.errors().contains_key("full_name"));

        engine.set_value("phone", json!("12345")).unwrap();
        assert!(engine.errors().contains_key("phone"));
    }

    #[test]
    fn test_hidden_field_value_does_not_block_submission() {
        let mut engine = filled_engine();
        // Enter a passport while Non-Malaysian, then switch back: the stale
        // passport value is hidden and must be excluded from validation.
        engine.set_value("nationality", json!("Non-Malaysian")).unwrap();
        engine.set_value("passport", json!("A1234567")).unwrap();
        assert!(!engine.is_visible("nric"));
        engine.set_value("nationality", json!("Malaysian")).unwrap();
        assert!(!engine.is_visible("passport"));

        let submission = engine.submit().unwrap();
        // Full form data ships, including the now-hidden field.
        assert_eq!(submission.values.get("passport"), Some(&json!("A1234567")));
    }

    #[test]
    fn test_hidden_required_field_not_validated() {
        let mut engine = filled_engine();
        // nric left empty would fail, but for Non-Malaysians it is hidden.
        engine.set_value("nric", json!(null)).unwrap();
        engine.set_value("nationality", json!("Non-Malaysian")).unwrap();
        engine.set_value("passport", json!("A1234567")).unwrap();
        assert!(!engine.errors().contains_key("nric"));
        assert!(engine.submit().is_ok());
    }

    #[test]
    fn test_submit_blocked_until_valid() {
        let mut engine = FormEngine::new(contract_schema()).unwrap();
        match engine.submit() {
            Err(FormError::ValidationFailed(n)) => assert!(n >= 4),
            other => panic!("expected ValidationFailed, got {:?}", other.err()),
        }
        // Rejection mutates nothing: values and audit log intact.
        assert_eq!(engine.value("nationality"), Some(&json!("Malaysian")));
        assert!(engine.changes().is_empty());
    }

    #[test]
    fn test_change_log_records_every_edit() {
        let mut engine = filled_engine();
        engine.set_value("basic_salary", json!(4500)).unwrap();
        let submission = engine.submit().unwrap();

        let salary_changes: Vec<_> = submission
            .changes
            .iter()
            .filter(|c| c.field == "basic_salary")
            .collect();
        assert_eq!(salary_changes.len(), 2);
        assert_eq!(salary_changes[0].old_value, json!(null));
        assert_eq!(salary_changes[0].new_value, json!(4200));
        assert_eq!(salary_changes[1].old_value, json!(4200));
        assert_eq!(salary_changes[1].new_value, json!(4500));
    }

    #[test]
    fn test_seed_skips_change_log() {
        let mut engine = FormEngine::new(contract_schema()).unwrap();
        let draft = HashMap::from([
            ("full_name".to_string(), json!("Aisyah binti Rahman")),
            ("stray_key".to_string(), json!("ignored")),
        ]);
        engine.seed(&draft);
        assert_eq!(engine.value("full_name"), Some(&json!("Aisyah binti Rahman")));
        assert!(engine.value("stray_key").is_none());
        assert!(engine.changes().is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut engine = FormEngine::new(contract_schema()).unwrap();
        assert!(matches!(
            engine.set_value("no_such_field", json!(1)),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn test_pattern_rule_applies() {
        let schema = FormSchema::from_json(
            r#"{"sections": [{"id": "s", "title": "S", "fields": [
                {"key": "code", "label": "Code", "required": true, "pattern": "^EMP-\\d{4}$"}
            ]}]}"#,
        )
        .unwrap();
        let mut engine = FormEngine::new(schema).unwrap();
        engine.set_value("code", json!("EMP-0042")).unwrap();
        assert!(engine.errors().is_empty());
        engine.set_value("code", json!("0042")).unwrap();
        assert!(engine.errors().contains_key("code"));
    }
}
