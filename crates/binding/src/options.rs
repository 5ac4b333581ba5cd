//! Binding configuration.
//!
//! [`BindingOptions`] can be assembled with its builder or deserialized by the host
//! application from any serde format:
//!
//! ```
//! use micro_binding::{BindingOptions, ErrorLimit};
//!
//! let options: BindingOptions = serde_json::from_str(r#"{ "max_model_validation_errors": 16 }"#).unwrap();
//! assert_eq!(options.max_model_validation_errors(), ErrorLimit::Max(16));
//!
//! let options = BindingOptions::builder().max_model_validation_errors(ErrorLimit::Unlimited).build();
//! assert_eq!(options.max_model_validation_errors(), ErrorLimit::Unlimited);
//! ```

use serde::{Deserialize, Serialize};

/// The default cap on recorded model errors.
pub const DEFAULT_MAX_MODEL_VALIDATION_ERRORS: usize = 200;

/// Upper bound on the number of errors a [`ModelState`](crate::ModelState) records.
///
/// `Max(0)` records nothing. `Unlimited` must be chosen explicitly, it is serialized as the
/// string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ErrorLimitRepr", into = "ErrorLimitRepr")]
pub enum ErrorLimit {
    Unlimited,
    Max(usize),
}

impl ErrorLimit {
    /// Returns true if one more error may be recorded when `count` errors are already recorded.
    #[inline]
    pub fn allows(self, count: usize) -> bool {
        match self {
            ErrorLimit::Unlimited => true,
            ErrorLimit::Max(max) => count < max,
        }
    }
}

impl Default for ErrorLimit {
    fn default() -> Self {
        ErrorLimit::Max(DEFAULT_MAX_MODEL_VALIDATION_ERRORS)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum ErrorLimitRepr {
    Max(usize),
    Keyword(ErrorLimitKeyword),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ErrorLimitKeyword {
    Unlimited,
}

impl From<ErrorLimitRepr> for ErrorLimit {
    fn from(repr: ErrorLimitRepr) -> Self {
        match repr {
            ErrorLimitRepr::Max(max) => ErrorLimit::Max(max),
            ErrorLimitRepr::Keyword(ErrorLimitKeyword::Unlimited) => ErrorLimit::Unlimited,
        }
    }
}

impl From<ErrorLimit> for ErrorLimitRepr {
    fn from(limit: ErrorLimit) -> Self {
        match limit {
            ErrorLimit::Max(max) => ErrorLimitRepr::Max(max),
            ErrorLimit::Unlimited => ErrorLimitRepr::Keyword(ErrorLimitKeyword::Unlimited),
        }
    }
}

/// Options consumed by the [`DefaultControllerArgumentBinder`](crate::DefaultControllerArgumentBinder).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    max_model_validation_errors: ErrorLimit,
}

impl BindingOptions {
    pub fn builder() -> BindingOptionsBuilder {
        BindingOptionsBuilder::new()
    }

    pub fn max_model_validation_errors(&self) -> ErrorLimit {
        self.max_model_validation_errors
    }
}

#[derive(Debug)]
pub struct BindingOptionsBuilder {
    options: BindingOptions,
}

impl BindingOptionsBuilder {
    fn new() -> Self {
        Self { options: BindingOptions::default() }
    }

    pub fn max_model_validation_errors(mut self, limit: ErrorLimit) -> Self {
        self.options.max_model_validation_errors = limit;
        self
    }

    pub fn build(self) -> BindingOptions {
        self.options
    }
}
