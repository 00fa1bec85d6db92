//! Built-in field validators and the type-name dispatch table.
//!
//! Each validator returns `Some(message)` on failure; validation outcomes
//! are data handed back to the caller, never errors thrown through the
//! engine. Unknown field types fall back to plain text handling so a schema
//! can carry widget types this crate has never heard of.

use crate::forms::schema::FormField;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Malaysian NRIC: YYMMDD-PB-###G.
static NRIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{6}-\d{2}-\d{4}$").unwrap());

/// Banks accepted on the payroll form. Input is matched fuzzily so common
/// spacing/casing variants ("may bank") still resolve.
pub const KNOWN_BANKS: &[&str] = &[
    "Maybank",
    "CIMB Bank",
    "Public Bank",
    "RHB Bank",
    "Hong Leong Bank",
    "AmBank",
    "Bank Islam",
    "Bank Rakyat",
    "Bank Simpanan Nasional",
    "Affin Bank",
    "Alliance Bank",
    "OCBC Bank",
    "HSBC Bank",
    "Standard Chartered",
    "UOB Bank",
];

const BANK_SIMILARITY_THRESHOLD: f64 = 0.85;

pub type FieldValidator = Box<dyn Fn(&FormField, &Value) -> Option<String> + Send + Sync>;

/// Lookup table from schema `type` name to a validation strategy. Callers
/// may register overrides or entirely new widget types.
pub struct ValidatorRegistry {
    validators: HashMap<String, FieldValidator>,
}

impl ValidatorRegistry {
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            validators: HashMap::new(),
        };
        registry.register("email", validate_email);
        registry.register("phone", validate_phone);
        registry.register("number", validate_number);
        registry.register("bank", validate_bank);
        registry.register("national_id", validate_national_id);
        registry.register("select", validate_select);
        registry
    }

    pub fn register<F>(&mut self, type_name: &str, validator: F)
    where
        F: Fn(&FormField, &Value) -> Option<String> + Send + Sync + 'static,
    {
        self.validators
            .insert(type_name.to_string(), Box::new(validator));
    }

    /// Dispatch on the field's type name; types without a registered
    /// validator (text, checkbox, date, custom widgets) get no type check
    /// beyond the engine's required/pattern rules.
    pub fn validate(&self, field: &FormField, value: &Value) -> Option<String> {
        self.validators
            .get(field.field_type.as_str())
            .and_then(|v| v(field, value))
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Empty values never reach the type validators (the engine's required
/// check owns those), so a non-string here is a genuine type mismatch.
fn expect_text<'a>(field: &FormField, value: &'a Value) -> Result<&'a str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("{} must be text", field.label))
}

fn validate_email(field: &FormField, value: &Value) -> Option<String> {
    let text = match expect_text(field, value) {
        Ok(t) => t,
        Err(msg) => return Some(msg),
    };
    if EMAIL_RE.is_match(text.trim()) {
        None
    } else {
        Some(format!("{} must be a valid email address", field.label))
    }
}

/// Allowed characters: digits, `+ - ( )` and spaces; 7-15 digits once
/// separators are stripped.
fn validate_phone(field: &FormField, value: &Value) -> Option<String> {
    let text = match expect_text(field, value) {
        Ok(t) => t,
        Err(msg) => return Some(msg),
    };
    let allowed = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '));
    if !allowed {
        return Some(format!("{} contains invalid characters", field.label));
    }
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    if (7..=15).contains(&digits) {
        None
    } else {
        Some(format!("{} must have 7-15 digits", field.label))
    }
}

fn validate_number(field: &FormField, value: &Value) -> Option<String> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(number) = number else {
        return Some(format!("{} must be a number", field.label));
    };
    if let Some(min) = field.min {
        if number < min {
            return Some(format!("{} must be at least {}", field.label, min));
        }
    }
    if let Some(max) = field.max {
        if number > max {
            return Some(format!("{} must be at most {}", field.label, max));
        }
    }
    None
}

fn validate_bank(field: &FormField, value: &Value) -> Option<String> {
    let text = match expect_text(field, value) {
        Ok(t) => t,
        Err(msg) => return Some(msg),
    };
    let (best, score) = best_bank_match(text);
    if score >= BANK_SIMILARITY_THRESHOLD {
        None
    } else {
        Some(format!(
            "{} is not a recognised bank (closest match: {best})",
            field.label
        ))
    }
}

fn validate_national_id(field: &FormField, value: &Value) -> Option<String> {
    let text = match expect_text(field, value) {
        Ok(t) => t,
        Err(msg) => return Some(msg),
    };
    if NRIC_RE.is_match(text.trim()) {
        None
    } else {
        Some(format!(
            "{} must match the NRIC format 000000-00-0000",
            field.label
        ))
    }
}

fn validate_select(field: &FormField, value: &Value) -> Option<String> {
    let Some(options) = &field.options else {
        return None;
    };
    let text = match expect_text(field, value) {
        Ok(t) => t,
        Err(msg) => return Some(msg),
    };
    if options.iter().any(|o| o == text) {
        None
    } else {
        Some(format!("{} must be one of the listed options", field.label))
    }
}

/// Best Jaro-Winkler match over the known-bank list, compared on
/// normalized names (lowercase, alphanumerics only).
pub fn best_bank_match(input: &str) -> (&'static str, f64) {
    let needle = normalize(input);
    let mut best = (KNOWN_BANKS[0], 0.0_f64);
    for bank in KNOWN_BANKS {
        let score = strsim::jaro_winkler(&needle, &normalize(bank));
        if score > best.1 {
            best = (bank, score);
        }
    }
    best
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
