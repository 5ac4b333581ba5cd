use crate::details::BindingSource;
use crate::value::{is_under_prefix, ValueProvider, ValueProviderResult};
use http::{HeaderMap, Uri};
use matchit::Params;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

/// A [`ValueProvider`] over name/value pairs of one request data source.
///
/// Repeated names accumulate values, `?id=1&id=2` yields both under `id`.
#[derive(Debug, Clone)]
pub struct NameValueProvider {
    source: BindingSource,
    // keyed by the ascii lowercased name
    values: BTreeMap<String, Vec<String>>,
}

impl NameValueProvider {
    pub fn new(source: BindingSource) -> Self {
        Self { source, values: BTreeMap::new() }
    }

    pub fn from_pairs<K, V>(source: BindingSource, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut provider = Self::new(source);
        for (key, value) in pairs {
            provider.insert(key.as_ref(), value);
        }
        provider
    }

    /// Values of the url query string.
    pub fn query_string(uri: &Uri) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs = match uri.query() {
            Some(query) => serde_urlencoded::from_str::<Vec<(String, String)>>(query)?,
            None => vec![],
        };
        Ok(Self::from_pairs(BindingSource::Query, pairs))
    }

    /// Values of an `application/x-www-form-urlencoded` body.
    pub fn form(body: &[u8]) -> Result<Self, serde_urlencoded::de::Error> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)?;
        Ok(Self::from_pairs(BindingSource::Form, pairs))
    }

    /// Values matched from the route template.
    pub fn route(params: &Params<'_, '_>) -> Self {
        Self::from_pairs(BindingSource::Route, params.iter())
    }

    /// Header values, values that are not visible ascii are skipped.
    pub fn headers(headers: &HeaderMap) -> Self {
        let pairs = headers.iter().filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value)));
        Self::from_pairs(BindingSource::Header, pairs)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.entry(key.to_ascii_lowercase()).or_default().push(value.into());
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueProvider for NameValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return !self.values.is_empty();
        }

        // keys sharing the prefix are adjacent in the sorted map
        let prefix = prefix.to_ascii_lowercase();
        self.values
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix.as_str()))
            .any(|(key, _)| is_under_prefix(key, &prefix))
    }

    fn get_value(&self, key: &str) -> Option<ValueProviderResult> {
        self.values.get(&key.to_ascii_lowercase()).map(|values| ValueProviderResult::new(values.clone()))
    }

    fn source(&self) -> Option<BindingSource> {
        Some(self.source)
    }
}

/// Tries a list of value providers in order.
#[derive(Clone, Default)]
pub struct CompositeValueProvider {
    providers: Vec<Arc<dyn ValueProvider>>,
}

impl CompositeValueProvider {
    pub fn new() -> Self {
        Self { providers: vec![] }
    }

    pub fn with<P: ValueProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn push(&mut self, provider: Arc<dyn ValueProvider>) {
        self.providers.push(provider);
    }

    /// The providers reading `source`, in the same order.
    pub fn filter(&self, source: BindingSource) -> Self {
        let providers =
            self.providers.iter().filter(|provider| provider.source() == Some(source)).map(Arc::clone).collect();
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl ValueProvider for CompositeValueProvider {
    fn contains_prefix(&self, prefix: &str) -> bool {
        self.providers.iter().any(|provider| provider.contains_prefix(prefix))
    }

    fn get_value(&self, key: &str) -> Option<ValueProviderResult> {
        self.providers.iter().find_map(|provider| provider.get_value(key))
    }

    fn source(&self) -> Option<BindingSource> {
        None
    }
}

impl fmt::Debug for CompositeValueProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.providers.iter().map(|provider| provider.source()).collect::<Vec<_>>();
        f.debug_struct("CompositeValueProvider").field("sources", &sources).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{CompositeValueProvider, NameValueProvider};
    use crate::details::BindingSource;
    use crate::value::ValueProvider;
    use http::{HeaderMap, HeaderValue, Uri};

    #[test]
    fn test_query_string() {
        let uri: Uri = "/orders?order.Id=7&ids=1&ids=2&name=hello%20world".parse().unwrap();
        let provider = NameValueProvider::query_string(&uri).unwrap();

        assert!(provider.contains_prefix("order"));
        assert!(provider.contains_prefix("ORDER.id"));
        assert!(!provider.contains_prefix("ord"));
        assert_eq!(provider.get_value("order.id").unwrap().first_value(), Some("7"));
        assert_eq!(provider.get_value("ids").unwrap().values(), ["1", "2"]);
        assert_eq!(provider.get_value("name").unwrap().first_value(), Some("hello world"));
        assert_eq!(provider.get_value("missing"), None);
    }

    #[test]
    fn test_no_query_string() {
        let uri: Uri = "/orders".parse().unwrap();
        let provider = NameValueProvider::query_string(&uri).unwrap();
        assert!(provider.is_empty());
        assert!(!provider.contains_prefix(""));
    }

    #[test]
    fn test_prefix_skips_sibling_names() {
        let provider = NameValueProvider::new(BindingSource::Form).with("order_id", "1").with("orders[0]", "2");
        assert!(!provider.contains_prefix("order"));
        assert!(provider.contains_prefix("orders"));
        assert!(provider.contains_prefix(""));
    }

    #[test]
    fn test_form_body() {
        let provider = NameValueProvider::form(b"kv.Key=a&kv.Value=5").unwrap();
        assert_eq!(provider.source(), Some(BindingSource::Form));
        assert!(provider.contains_prefix("kv"));
        assert_eq!(provider.get_value("kv.Value").unwrap().first_value(), Some("5"));
    }

    #[test]
    fn test_route_params() {
        let mut router = matchit::Router::new();
        router.insert("/orders/{id}", ()).unwrap();
        let matched = router.at("/orders/42").unwrap();

        let provider = NameValueProvider::route(&matched.params);
        assert_eq!(provider.source(), Some(BindingSource::Route));
        assert_eq!(provider.get_value("id").unwrap().first_value(), Some("42"));
    }

    #[test]
    fn test_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Tenant", HeaderValue::from_static("acme"));
        headers.append("accept", HeaderValue::from_static("text/html"));
        headers.append("accept", HeaderValue::from_static("application/json"));

        let provider = NameValueProvider::headers(&headers);
        assert_eq!(provider.get_value("x-tenant").unwrap().first_value(), Some("acme"));
        assert_eq!(provider.get_value("Accept").unwrap().len(), 2);
    }

    #[test]
    fn test_composite_order_and_filter() {
        let composite = CompositeValueProvider::new()
            .with(NameValueProvider::new(BindingSource::Route).with("id", "1"))
            .with(NameValueProvider::new(BindingSource::Query).with("id", "2").with("page", "3"));

        assert_eq!(composite.get_value("id").unwrap().first_value(), Some("1"));
        assert_eq!(composite.source(), None);

        let query = composite.filter(BindingSource::Query);
        assert_eq!(query.len(), 1);
        assert_eq!(query.get_value("id").unwrap().first_value(), Some("2"));
        assert!(composite.filter(BindingSource::Header).is_empty());
        assert!(!composite.filter(BindingSource::Header).contains_prefix(""));
    }
}
