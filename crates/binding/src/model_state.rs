//! Per request accumulator of binding values, errors and validation state.

use crate::options::ErrorLimit;
use crate::value::is_under_prefix;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ValidationState {
    #[default]
    Unvalidated,
    Invalid,
    Valid,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelStateEntry {
    raw_value: Vec<String>,
    attempted_value: Option<String>,
    errors: Vec<ModelError>,
    validation_state: ValidationState,
}

impl ModelStateEntry {
    pub fn raw_value(&self) -> &[String] {
        &self.raw_value
    }

    pub fn attempted_value(&self) -> Option<&str> {
        self.attempted_value.as_deref()
    }

    pub fn errors(&self) -> &[ModelError] {
        &self.errors
    }

    pub fn validation_state(&self) -> ValidationState {
        self.validation_state
    }
}

/// Field errors as the invocation layer reports them: key to messages.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Field key to [`ModelStateEntry`], with a cap on the number of recorded errors.
///
/// Once the cap is reached further errors are dropped, recorded errors stay and binding carries
/// on for the remaining fields.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    entries: BTreeMap<String, ModelStateEntry>,
    error_count: usize,
    max_allowed_errors: ErrorLimit,
    has_reached_max_errors: bool,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_allowed_errors(max_allowed_errors: ErrorLimit) -> Self {
        Self { max_allowed_errors, ..Self::default() }
    }

    pub fn max_allowed_errors(&self) -> ErrorLimit {
        self.max_allowed_errors
    }

    pub fn set_max_allowed_errors(&mut self, max_allowed_errors: ErrorLimit) {
        self.max_allowed_errors = max_allowed_errors;
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_reached_max_errors(&self) -> bool {
        self.has_reached_max_errors
    }

    /// Records an error for `key`, returns false if the error cap dropped it.
    pub fn try_add_model_error(&mut self, key: &str, message: impl Into<String>) -> bool {
        if !self.max_allowed_errors.allows(self.error_count) {
            if !self.has_reached_max_errors {
                warn!(limit = ?self.max_allowed_errors, key, "model error limit reached, dropping further errors");
                self.has_reached_max_errors = true;
            }
            return false;
        }

        self.error_count += 1;
        let entry = self.entries.entry(key.to_owned()).or_default();
        entry.errors.push(ModelError::new(message));
        entry.validation_state = ValidationState::Invalid;
        true
    }

    /// Records the raw values a binder read for `key`.
    pub fn set_model_value(&mut self, key: &str, raw_value: Vec<String>, attempted_value: impl Into<String>) {
        let entry = self.entries.entry(key.to_owned()).or_default();
        entry.raw_value = raw_value;
        entry.attempted_value = Some(attempted_value.into());
    }

    /// Marks `key` valid unless an error has already been recorded for it.
    pub fn mark_field_valid(&mut self, key: &str) {
        let entry = self.entries.entry(key.to_owned()).or_default();
        if entry.validation_state != ValidationState::Invalid {
            entry.validation_state = ValidationState::Valid;
        }
    }

    pub fn mark_field_skipped(&mut self, key: &str) {
        let entry = self.entries.entry(key.to_owned()).or_default();
        if entry.validation_state != ValidationState::Invalid {
            entry.validation_state = ValidationState::Skipped;
        }
    }

    pub fn get(&self, key: &str) -> Option<&ModelStateEntry> {
        self.entries.get(key)
    }

    pub fn errors(&self, key: &str) -> &[ModelError] {
        self.entries.get(key).map_or(&[], |entry| entry.errors.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns true if any entry is `prefix` or below it.
    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.entries.keys().any(|key| is_under_prefix(key, prefix))
    }

    /// Aggregated state of `prefix` and every entry below it.
    pub fn get_field_validation_state(&self, prefix: &str) -> ValidationState {
        let mut states = self.entries.iter().filter(|(key, _)| is_under_prefix(key, prefix)).map(|(_, e)| e.validation_state);

        let Some(first) = states.next() else {
            return ValidationState::Unvalidated;
        };
        states.fold(first, combine)
    }

    /// Returns true if no recorded field is invalid.
    pub fn is_valid(&self) -> bool {
        self.entries.values().all(|entry| entry.validation_state != ValidationState::Invalid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelStateEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn error_map(&self) -> ErrorMap {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.errors.is_empty())
            .map(|(key, entry)| (key.clone(), entry.errors.iter().map(|e| e.message.clone()).collect()))
            .collect()
    }
}

fn combine(current: ValidationState, next: ValidationState) -> ValidationState {
    use ValidationState::{Invalid, Skipped, Unvalidated, Valid};
    match (current, next) {
        (Invalid, _) | (_, Invalid) => Invalid,
        (Unvalidated, _) | (_, Unvalidated) => Unvalidated,
        (Skipped, Skipped) => Skipped,
        _ => Valid,
    }
}

impl Serialize for ModelState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.error_map().serialize(serializer)
    }
}
