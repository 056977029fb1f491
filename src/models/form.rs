//! Form binding helpers shared by the renewal and admin forms

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult, FieldErrors};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_DATE: &str = "Enter a valid date.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Parse a submitted date.
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY` and `MM/DD/YY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('/') {
        let year_digits = raw.rsplit('/').next().map(str::len).unwrap_or(0);
        let format = if year_digits == 2 { "%m/%d/%y" } else { "%m/%d/%Y" };
        NaiveDate::parse_from_str(raw, format).ok()
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}

/// Treat blank strings as missing values
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Clean a required date field, recording errors under `field`
pub fn clean_required_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some(raw) => clean_date(errors, field, raw),
    }
}

/// Clean an optional date field; a missing value is `Ok(None)`
pub fn clean_optional_date(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    value.and_then(|raw| clean_date(errors, field, raw))
}

fn clean_date(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.add(field, INVALID_DATE);
    }
    parsed
}

/// Keep only the keys a form declares; everything else is dropped silently.
pub fn whitelist(fields: &[&str], mut payload: Map<String, Value>) -> Map<String, Value> {
    payload.retain(|key, _| fields.contains(&key.as_str()));
    payload
}

/// Whitelist a submitted payload and deserialize it into a raw form.
///
/// A payload whose kept values have the wrong JSON shape fails as a whole
/// with a non-field (`__all__`) error.
pub fn bind<T: DeserializeOwned>(fields: &[&str], payload: Map<String, Value>) -> AppResult<T> {
    let kept = whitelist(fields, payload);
    serde_json::from_value(Value::Object(kept)).map_err(|e| {
        AppError::Validation(FieldErrors::single("__all__", format!("Malformed form: {}", e)))
    })
}

/// One selectable option of a choice field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Choice {
    pub value: i32,
    pub label: String,
}

/// A form as presented to the client: declared fields, current values,
/// choice lists and field errors.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormView {
    /// Editable fields, in display order
    pub fields: Vec<String>,
    /// Initial (or submitted) values keyed by field name
    #[schema(value_type = Object)]
    pub values: Map<String, Value>,
    /// Options for choice fields, keyed by field name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[schema(value_type = Object)]
    pub choices: BTreeMap<String, Vec<Choice>>,
    /// Field-level errors of the last submission
    pub errors: FieldErrors,
}

impl FormView {
    pub fn new(fields: &[&str], values: Map<String, Value>) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            values,
            choices: BTreeMap::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn with_choices(mut self, field: &str, choices: Vec<Choice>) -> Self {
        self.choices.insert(field.to_string(), choices);
        self
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}
