//! Assigning bound values onto a live instance by field name.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// A destination that accepts values by field name.
///
/// Returns false when `name` is unknown or `value` does not fit the field, the caller skips it.
pub trait SetNamedField: Send {
    fn set_named_field(&mut self, name: &str, value: &Value) -> bool;
}

type Setter<T> = Box<dyn Fn(&mut T, &Value) -> bool + Send + Sync>;

/// A registration table of typed setters for `T`, matched ASCII case insensitively.
///
/// ```
/// use micro_binding::{NamedFieldSetters, SetNamedField};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Controller {
///     current_user: String,
/// }
///
/// let setters = NamedFieldSetters::new().field("CurrentUser", |c: &mut Controller, v: String| c.current_user = v);
/// let mut controller = Controller::default();
/// assert!(setters.bind(&mut controller).set_named_field("currentuser", &json!("ann")));
/// assert_eq!(controller.current_user, "ann");
/// ```
pub struct NamedFieldSetters<T> {
    setters: Vec<(String, Setter<T>)>,
}

impl<T> NamedFieldSetters<T> {
    pub fn new() -> Self {
        Self { setters: vec![] }
    }

    pub fn field<V, F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let setter: Setter<T> = Box::new(move |target, value| match V::deserialize(value) {
            Ok(value) => {
                set(target, value);
                true
            }
            Err(_) => false,
        });
        self.setters.push((name.into(), setter));
        self
    }

    pub fn apply(&self, target: &mut T, name: &str, value: &Value) -> bool {
        self.setters
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .is_some_and(|(_, setter)| setter(target, value))
    }

    /// Pairs the table with an instance.
    pub fn bind<'a>(&'a self, target: &'a mut T) -> NamedFields<'a, T> {
        NamedFields { setters: self, target }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.setters.iter().map(|(name, _)| name.as_str())
    }
}

impl<T> Default for NamedFieldSetters<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for NamedFieldSetters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// A [`NamedFieldSetters`] table bound to one instance.
pub struct NamedFields<'a, T> {
    setters: &'a NamedFieldSetters<T>,
    target: &'a mut T,
}

impl<T: Send> SetNamedField for NamedFields<'_, T> {
    fn set_named_field(&mut self, name: &str, value: &Value) -> bool {
        self.setters.apply(self.target, name, value)
    }
}

impl<T> fmt::Debug for NamedFields<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFields").field("setters", self.setters).finish_non_exhaustive()
    }
}

/// Applies every value in `values` that `target` accepts, returns the names that were applied.
pub fn apply_named_fields(target: &mut dyn SetNamedField, values: &BTreeMap<String, Value>) -> Vec<String> {
    let mut applied = vec![];
    for (name, value) in values {
        if target.set_named_field(name, value) {
            applied.push(name.clone());
        } else {
            trace!(name = %name, "no writable field accepted the value");
        }
    }
    debug!(applied = applied.len(), skipped = values.len() - applied.len(), "named fields applied");
    applied
}

#[cfg(test)]
mod tests {
    use super::{apply_named_fields, NamedFieldSetters, SetNamedField};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    #[derive(Debug, Default)]
    struct Controller {
        current_user: String,
        page_size: u32,
    }

    fn setters() -> NamedFieldSetters<Controller> {
        NamedFieldSetters::new()
            .field("CurrentUser", |c: &mut Controller, v: String| c.current_user = v)
            .field("PageSize", |c: &mut Controller, v: u32| c.page_size = v)
    }

    #[test]
    fn test_case_insensitive_match() {
        let setters = setters();
        let mut controller = Controller::default();
        assert!(setters.bind(&mut controller).set_named_field("PAGESIZE", &json!(25)));
        assert_eq!(controller.page_size, 25);
    }

    #[test]
    fn test_unmatched_and_mistyped_values_are_skipped() {
        let setters = setters();
        let mut controller = Controller::default();
        let values: BTreeMap<String, Value> = [
            ("CurrentUser".to_owned(), json!("ann")),
            ("PageSize".to_owned(), json!("many")),
            ("Unknown".to_owned(), json!(1)),
        ]
        .into_iter()
        .collect();

        let applied = apply_named_fields(&mut setters.bind(&mut controller), &values);
        assert_eq!(applied, ["CurrentUser"]);
        assert_eq!(controller.current_user, "ann");
        assert_eq!(controller.page_size, 0);
    }

    #[test]
    fn test_names() {
        assert_eq!(setters().names().collect::<Vec<_>>(), ["CurrentUser", "PageSize"]);
    }
}
