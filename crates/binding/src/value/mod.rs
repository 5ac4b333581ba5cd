//! Value providers: a uniform key to raw values lookup over request data.
//!
//! Keys are qualified names such as `order.Items[0].Sku` and compare ASCII case insensitively.
//! A key is under the prefix `p` when it equals `p` or continues `p` with `.` or `[`, the empty
//! prefix contains every key.

mod providers;

pub use providers::CompositeValueProvider;
pub use providers::NameValueProvider;

use crate::details::BindingSource;

/// Raw values found under one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueProviderResult {
    values: Vec<String>,
}

impl ValueProviderResult {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn single(value: impl Into<String>) -> Self {
        Self { values: vec![value.into()] }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// The values as the user sent them, comma joined.
    pub fn attempted_value(&self) -> String {
        self.values.join(",")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ValueProvider: Send + Sync {
    /// Returns true if any key is under `prefix`.
    fn contains_prefix(&self, prefix: &str) -> bool;

    fn get_value(&self, key: &str) -> Option<ValueProviderResult>;

    /// The request data source this provider reads, `None` when it spans several.
    fn source(&self) -> Option<BindingSource>;
}

/// Returns true if `key` is `prefix` or a member or element below it.
pub(crate) fn is_under_prefix(key: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if key.len() < prefix.len() || !key.is_char_boundary(prefix.len()) {
        return false;
    }

    let (head, rest) = key.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix) && matches!(rest.as_bytes().first(), None | Some(b'.' | b'['))
}
