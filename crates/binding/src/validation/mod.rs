//! Validation of bound models.
//!
//! A [`ValidatorProvider`] turns the validation attributes of a field into [`ModelValidator`]s, the
//! [`ObjectModelValidator`] walks a bound model and records what they report in the
//! [`ModelState`](crate::ModelState).

mod explorer;
mod object_validator;

pub use explorer::ModelExplorer;
pub use explorer::ModelExplorerChild;
pub use object_validator::DefaultObjectValidator;
pub use object_validator::ObjectModelValidator;

use crate::metadata::FieldMetadata;
use crate::Attribute;
use serde_json::Value;
use std::sync::Arc;

/// What a [`ModelValidator`] inspects.
#[derive(Debug, Clone, Copy)]
pub struct ModelValidationContext<'a> {
    pub metadata: &'a FieldMetadata,
    /// The bound value, `None` when nothing was bound at this node.
    pub model: Option<&'a Value>,
    pub key: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub message: String,
}

impl ValidationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

pub trait ModelValidator: Send + Sync {
    fn validate(&self, context: &ModelValidationContext<'_>) -> Vec<ValidationFailure>;
}

pub trait ValidatorProvider: Send + Sync {
    fn validators_for(&self, metadata: &FieldMetadata) -> Vec<Arc<dyn ModelValidator>>;
}

/// Maps [`Attribute::Required`], [`Attribute::Range`] and [`Attribute::StringLength`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidatorProvider;

impl ValidatorProvider for DefaultValidatorProvider {
    fn validators_for(&self, metadata: &FieldMetadata) -> Vec<Arc<dyn ModelValidator>> {
        metadata
            .validator_attributes()
            .iter()
            .filter_map(|attribute| -> Option<Arc<dyn ModelValidator>> {
                match *attribute {
                    Attribute::Required => Some(Arc::new(RequiredValidator)),
                    Attribute::Range { min, max } => Some(Arc::new(RangeValidator { min, max })),
                    Attribute::StringLength { min, max } => Some(Arc::new(StringLengthValidator { min, max })),
                    _ => None,
                }
            })
            .collect()
    }
}

/// Fails on a missing value, `null` or a blank string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl ModelValidator for RequiredValidator {
    fn validate(&self, context: &ModelValidationContext<'_>) -> Vec<ValidationFailure> {
        let missing = match context.model {
            None | Some(Value::Null) => true,
            Some(Value::String(value)) => value.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            vec![ValidationFailure::new(format!("The {} field is required.", context.metadata.display_name()))]
        } else {
            vec![]
        }
    }
}

/// Inclusive numeric range, values that are absent or not numbers are left to other validators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeValidator {
    pub min: f64,
    pub max: f64,
}

impl ModelValidator for RangeValidator {
    fn validate(&self, context: &ModelValidationContext<'_>) -> Vec<ValidationFailure> {
        let number = match context.model {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(value)) => value.trim().parse::<f64>().ok(),
            _ => None,
        };
        match number {
            Some(number) if number < self.min || number > self.max => vec![ValidationFailure::new(format!(
                "The field {} must be between {} and {}.",
                context.metadata.display_name(),
                self.min,
                self.max
            ))],
            _ => vec![],
        }
    }
}

/// Length in characters of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLengthValidator {
    pub min: usize,
    pub max: usize,
}

impl ModelValidator for StringLengthValidator {
    fn validate(&self, context: &ModelValidationContext<'_>) -> Vec<ValidationFailure> {
        let Some(Value::String(value)) = context.model else {
            return vec![];
        };
        let length = value.chars().count();
        if (self.min..=self.max).contains(&length) {
            return vec![];
        }

        let display_name = context.metadata.display_name();
        let message = if self.min == 0 {
            format!("The field {display_name} must be a string with a maximum length of {}.", self.max)
        } else {
            format!(
                "The field {display_name} must be a string with a minimum length of {} and a maximum length of {}.",
                self.min, self.max
            )
        };
        vec![ValidationFailure::new(message)]
    }
}
