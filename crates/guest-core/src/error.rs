//! Guest and country errors.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::ValidationErrors;

/// Field name to human-readable messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Record a message against a field, dropping any earlier ones.
    pub fn replace(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), vec![message.into()]);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for a field, empty if none.
    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, failures) in errors.field_errors() {
            for failure in failures.iter() {
                let message = failure
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid ({}).", field, failure.code));
                fields.add(field.to_string(), message);
            }
        }
        fields
    }
}

/// Guest repository errors.
#[derive(Debug, Error)]
pub enum GuestError {
    #[error("The given data was invalid")]
    Validation(FieldErrors),

    #[error("Guest not found: {0}")]
    NotFound(u64),

    #[error("Cannot find country by phone number: {0}")]
    UnresolvedCountry(String),

    #[error("Guest id space exhausted")]
    IdsExhausted,
}

impl From<FieldErrors> for GuestError {
    fn from(errors: FieldErrors) -> Self {
        GuestError::Validation(errors)
    }
}

/// Country directory errors.
#[derive(Debug, Error)]
pub enum CountryError {
    #[error("No country with dial code {0}")]
    NotFound(String),

    #[error("Invalid country dataset: {0}")]
    Dataset(String),
}

impl From<serde_json::Error> for CountryError {
    fn from(e: serde_json::Error) -> Self {
        CountryError::Dataset(format!("JSON error: {}", e))
    }
}

impl From<std::io::Error> for CountryError {
    fn from(e: std::io::Error) -> Self {
        CountryError::Dataset(e.to_string())
    }
}
