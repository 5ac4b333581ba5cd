use std::error::Error;
use thiserror::Error;

/// Boxed error produced by a request body stream.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Contract errors raised while binding.
///
/// These describe a wiring defect (a wrong descriptor, a member that does not exist, a broken
/// body stream), never bad user input. Bad user input is recorded in
/// [`ModelState`](crate::ModelState) and binding continues.
#[derive(Error, Debug)]
pub enum BindingError {
    #[error("action descriptor '{display_name}' must be based on a controller action")]
    ActionDescriptorMismatch { display_name: String },

    #[error("type '{type_name}' has no member named '{member}'")]
    MemberNotFound { type_name: String, member: String },

    #[error("method '{method}' declares parameter '{parameter}' {count} times")]
    AmbiguousParameter { method: String, parameter: String, count: usize },

    #[error("can not construct a default instance of '{type_name}': {reason}")]
    Construction { type_name: String, reason: String },

    #[error("read request body error: {source}")]
    Body {
        #[source]
        source: BoxError,
    },

    #[error("argument '{name}' can not be converted: {source}")]
    Conversion {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BindingError {
    pub fn action_descriptor_mismatch<S: ToString>(display_name: S) -> Self {
        Self::ActionDescriptorMismatch { display_name: display_name.to_string() }
    }

    pub fn member_not_found<T: ToString, M: ToString>(type_name: T, member: M) -> Self {
        Self::MemberNotFound { type_name: type_name.to_string(), member: member.to_string() }
    }

    pub fn ambiguous_parameter<M: ToString, P: ToString>(method: M, parameter: P, count: usize) -> Self {
        Self::AmbiguousParameter { method: method.to_string(), parameter: parameter.to_string(), count }
    }

    pub fn construction<T: ToString, R: ToString>(type_name: T, reason: R) -> Self {
        Self::Construction { type_name: type_name.to_string(), reason: reason.to_string() }
    }

    pub fn body<E: Into<BoxError>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }

    pub fn conversion<S: ToString>(name: S, source: serde_json::Error) -> Self {
        Self::Conversion { name: name.to_string(), source }
    }
}
