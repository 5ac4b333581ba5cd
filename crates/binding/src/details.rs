//! Attributes and the metadata details composer.
//!
//! A field's raw attribute list is turned into resolved binding, display and validation details by
//! a chain of [`MetadataDetailsProvider`]s. Providers run in registration order, a later provider
//! overrides a detail only when it sets it.

use crate::metadata::MetadataIdentity;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Where a value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingSource {
    Query,
    Route,
    Form,
    Header,
    Body,
}

impl BindingSource {
    /// Greedy sources bind a field as a whole rather than from prefixed keys.
    pub fn is_greedy(self) -> bool {
        matches!(self, BindingSource::Header | BindingSource::Body)
    }
}

/// Action or member level binder declaration, e.g. "from query, named `q`".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BinderMetadata {
    pub name: Option<String>,
    pub source: Option<BindingSource>,
}

impl BinderMetadata {
    pub fn from_source(source: BindingSource) -> Self {
        Self { name: None, source: Some(source) }
    }

    pub fn from_query() -> Self {
        Self::from_source(BindingSource::Query)
    }

    pub fn from_route() -> Self {
        Self::from_source(BindingSource::Route)
    }

    pub fn from_form() -> Self {
        Self::from_source(BindingSource::Form)
    }

    pub fn from_header() -> Self {
        Self::from_source(BindingSource::Header)
    }

    pub fn from_body() -> Self {
        Self::from_source(BindingSource::Body)
    }

    /// Only overrides the name the field is bound under.
    pub fn model_name(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), source: None }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A custom attribute carried by a field or a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Binder(BinderMetadata),
    /// The field is excluded from binding.
    BindNever,
    /// Missing data for the field is a model error.
    BindRequired,
    DisplayName(String),
    Required,
    Range { min: f64, max: f64 },
    StringLength { min: usize, max: usize },
    Custom { name: String, value: String },
}

impl Attribute {
    pub fn is_validation(&self) -> bool {
        matches!(self, Attribute::Required | Attribute::Range { .. } | Attribute::StringLength { .. })
    }
}

// bounds hash by their bit pattern
impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Attribute::Binder(binder_metadata) => binder_metadata.hash(state),
            Attribute::BindNever | Attribute::BindRequired | Attribute::Required => {}
            Attribute::DisplayName(name) => name.hash(state),
            Attribute::Range { min, max } => {
                min.to_bits().hash(state);
                max.to_bits().hash(state);
            }
            Attribute::StringLength { min, max } => {
                min.hash(state);
                max.hash(state);
            }
            Attribute::Custom { name, value } => {
                name.hash(state);
                value.hash(state);
            }
        }
    }
}

impl From<BinderMetadata> for Attribute {
    fn from(binder_metadata: BinderMetadata) -> Self {
        Attribute::Binder(binder_metadata)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingBehavior {
    Optional,
    Never,
    Required,
}

/// Resolved binding policy of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingMetadata {
    pub binding_source: Option<BindingSource>,
    pub binder_model_name: Option<String>,
    pub binding_behavior: Option<BindingBehavior>,
}

impl BindingMetadata {
    /// Overrides the details `later` sets, keeps the others.
    pub fn merge(&mut self, later: BindingMetadata) {
        if later.binding_source.is_some() {
            self.binding_source = later.binding_source;
        }
        if later.binder_model_name.is_some() {
            self.binder_model_name = later.binder_model_name;
        }
        if later.binding_behavior.is_some() {
            self.binding_behavior = later.binding_behavior;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayMetadata {
    pub display_name: Option<String>,
}

impl DisplayMetadata {
    pub fn merge(&mut self, later: DisplayMetadata) {
        if later.display_name.is_some() {
            self.display_name = later.display_name;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationMetadata {
    pub validator_attributes: Vec<Attribute>,
}

impl ValidationMetadata {
    pub fn merge(&mut self, later: ValidationMetadata) {
        self.validator_attributes.extend(later.validator_attributes);
    }
}

/// What a [`MetadataDetailsProvider`] inspects.
#[derive(Debug, Clone, Copy)]
pub struct DetailsContext<'a> {
    pub key: &'a MetadataIdentity,
    pub attributes: &'a [Attribute],
}

pub trait MetadataDetailsProvider: Send + Sync {
    fn binding_metadata(&self, _context: &DetailsContext<'_>) -> BindingMetadata {
        BindingMetadata::default()
    }

    fn display_metadata(&self, _context: &DetailsContext<'_>) -> DisplayMetadata {
        DisplayMetadata::default()
    }

    fn validation_metadata(&self, _context: &DetailsContext<'_>) -> ValidationMetadata {
        ValidationMetadata::default()
    }
}

/// Reads [`Attribute::Binder`], [`Attribute::BindNever`] and [`Attribute::BindRequired`].
///
/// The first attribute that declares a detail wins, action level binder metadata is placed first
/// in the list so it takes precedence over the member's own attributes. Empty names are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinderAttributeProvider;

impl MetadataDetailsProvider for BinderAttributeProvider {
    fn binding_metadata(&self, context: &DetailsContext<'_>) -> BindingMetadata {
        let binders = || {
            context.attributes.iter().filter_map(|attribute| match attribute {
                Attribute::Binder(binder) => Some(binder),
                _ => None,
            })
        };

        let binder_model_name = binders().filter_map(|binder| binder.name.as_deref()).find(|name| !name.is_empty());
        let binding_source = binders().find_map(|binder| binder.source);
        let binding_behavior = context.attributes.iter().find_map(|attribute| match attribute {
            Attribute::BindNever => Some(BindingBehavior::Never),
            Attribute::BindRequired => Some(BindingBehavior::Required),
            _ => None,
        });

        BindingMetadata { binding_source, binder_model_name: binder_model_name.map(str::to_owned), binding_behavior }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayNameProvider;

impl MetadataDetailsProvider for DisplayNameProvider {
    fn display_metadata(&self, context: &DetailsContext<'_>) -> DisplayMetadata {
        let display_name = context.attributes.iter().find_map(|attribute| match attribute {
            Attribute::DisplayName(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        });
        DisplayMetadata { display_name }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationAttributeProvider;

impl MetadataDetailsProvider for ValidationAttributeProvider {
    fn validation_metadata(&self, context: &DetailsContext<'_>) -> ValidationMetadata {
        let validator_attributes = context.attributes.iter().filter(|a| a.is_validation()).cloned().collect();
        ValidationMetadata { validator_attributes }
    }
}

/// Binding, display and validation details resolved for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDetails {
    pub binding: BindingMetadata,
    pub display: DisplayMetadata,
    pub validation: ValidationMetadata,
}

/// Runs every registered [`MetadataDetailsProvider`] in order and merges what they return.
pub struct CompositeMetadataDetailsProvider {
    providers: Vec<Box<dyn MetadataDetailsProvider>>,
}

impl CompositeMetadataDetailsProvider {
    pub fn builder() -> CompositeMetadataDetailsProviderBuilder {
        CompositeMetadataDetailsProviderBuilder::new()
    }

    pub fn get_binding_metadata(&self, key: &MetadataIdentity, attributes: &[Attribute]) -> BindingMetadata {
        let context = DetailsContext { key, attributes };
        let mut binding = BindingMetadata::default();
        for provider in &self.providers {
            binding.merge(provider.binding_metadata(&context));
        }
        binding
    }

    pub fn resolve(&self, key: &MetadataIdentity, attributes: &[Attribute]) -> ResolvedDetails {
        let context = DetailsContext { key, attributes };
        let mut details = ResolvedDetails::default();
        for provider in &self.providers {
            details.binding.merge(provider.binding_metadata(&context));
            details.display.merge(provider.display_metadata(&context));
            details.validation.merge(provider.validation_metadata(&context));
        }
        details
    }
}

impl Default for CompositeMetadataDetailsProvider {
    fn default() -> Self {
        Self::builder()
            .add_last(BinderAttributeProvider)
            .add_last(DisplayNameProvider)
            .add_last(ValidationAttributeProvider)
            .build()
    }
}

impl std::fmt::Debug for CompositeMetadataDetailsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMetadataDetailsProvider").field("providers", &self.providers.len()).finish()
    }
}

pub struct CompositeMetadataDetailsProviderBuilder {
    providers: Vec<Box<dyn MetadataDetailsProvider>>,
}

impl CompositeMetadataDetailsProviderBuilder {
    fn new() -> Self {
        Self { providers: vec![] }
    }

    pub fn add_last<P: MetadataDetailsProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn add_first<P: MetadataDetailsProvider + 'static>(mut self, provider: P) -> Self {
        self.providers.insert(0, Box::new(provider));
        self
    }

    pub fn build(self) -> CompositeMetadataDetailsProvider {
        CompositeMetadataDetailsProvider { providers: self.providers }
    }
}

impl std::fmt::Debug for CompositeMetadataDetailsProviderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeMetadataDetailsProviderBuilder").field("providers", &self.providers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> MetadataIdentity {
        MetadataIdentity::for_parameter("Save", "order")
    }

    #[test]
    fn test_explicit_name_overrides() {
        let provider = CompositeMetadataDetailsProvider::default();
        let attributes = [Attribute::Binder(BinderMetadata::from_query().named("foo"))];
        let binding = provider.get_binding_metadata(&key(), &attributes);
        assert_eq!(binding.binder_model_name.as_deref(), Some("foo"));
        assert_eq!(binding.binding_source, Some(BindingSource::Query));
    }

    #[test]
    fn test_empty_name_is_ignored() {
        let provider = CompositeMetadataDetailsProvider::default();
        let attributes = [Attribute::Binder(BinderMetadata::model_name("")), Attribute::Binder(BinderMetadata::model_name("bar"))];
        let binding = provider.get_binding_metadata(&key(), &attributes);
        assert_eq!(binding.binder_model_name.as_deref(), Some("bar"));
    }

    #[test]
    fn test_first_declaration_wins() {
        let provider = CompositeMetadataDetailsProvider::default();
        let attributes =
            [Attribute::Binder(BinderMetadata::from_route()), Attribute::Binder(BinderMetadata::from_form().named("x"))];
        let binding = provider.get_binding_metadata(&key(), &attributes);
        assert_eq!(binding.binding_source, Some(BindingSource::Route));
        assert_eq!(binding.binder_model_name.as_deref(), Some("x"));
    }

    struct SourceOnly(BindingSource);

    impl MetadataDetailsProvider for SourceOnly {
        fn binding_metadata(&self, _context: &DetailsContext<'_>) -> BindingMetadata {
            BindingMetadata { binding_source: Some(self.0), ..BindingMetadata::default() }
        }
    }

    #[test]
    fn test_later_provider_keeps_unset_details() {
        let provider = CompositeMetadataDetailsProvider::builder()
            .add_last(BinderAttributeProvider)
            .add_last(SourceOnly(BindingSource::Header))
            .build();
        let attributes = [Attribute::Binder(BinderMetadata::from_query().named("q")), Attribute::BindRequired];
        let binding = provider.get_binding_metadata(&key(), &attributes);

        assert_eq!(binding.binding_source, Some(BindingSource::Header));
        assert_eq!(binding.binder_model_name.as_deref(), Some("q"));
        assert_eq!(binding.binding_behavior, Some(BindingBehavior::Required));
    }

    #[test]
    fn test_resolve_collects_display_and_validation() {
        let provider = CompositeMetadataDetailsProvider::default();
        let attributes = [
            Attribute::DisplayName("Order number".into()),
            Attribute::Required,
            Attribute::Custom { name: "audit".into(), value: "yes".into() },
            Attribute::Range { min: 1.0, max: 10.0 },
        ];
        let details = provider.resolve(&key(), &attributes);

        assert_eq!(details.display.display_name.as_deref(), Some("Order number"));
        assert_eq!(details.validation.validator_attributes, vec![Attribute::Required, Attribute::Range { min: 1.0, max: 10.0 }]);
        assert_eq!(details.binding, BindingMetadata::default());
    }
}
