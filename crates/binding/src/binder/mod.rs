//! Model binders and the context they bind in.
//!
//! A [`ModelBinder`] answers one question for one field: can I bind it, and if so with what. The
//! answer is `Ok(None)` when the binder does not apply, the dispatcher then asks the next one.
//! `Ok(Some(result))` ends the search even when `result` is not set. `Err` is reserved for
//! [`BindingError`], a defect in the wiring rather than in the request.

mod body;
mod collection;
mod complex;
mod composite;
mod header;
mod key_value;
mod nullable;
mod simple;

pub use body::BodyModelBinder;
pub use body::RequestBody;
pub use collection::CollectionModelBinder;
pub use collection::DictionaryModelBinder;
pub use complex::ComplexModelDto;
pub use complex::ComplexObjectModelBinder;
pub use composite::CompositeModelBinder;
pub use composite::CompositeModelBinderBuilder;
pub use header::HeaderModelBinder;
pub use key_value::KeyValuePairModelBinder;
pub use nullable::NullableModelBinder;
pub use simple::SimpleTypeModelBinder;

use crate::error::BindingError;
use crate::metadata::{FieldMetadata, MetadataProvider};
use crate::model_state::ModelState;
use crate::validation::{DefaultValidatorProvider, ValidatorProvider};
use crate::value::CompositeValueProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

#[async_trait]
pub trait ModelBinder: Send + Sync {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError>;
}

/// The outcome of binding one field.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingResult {
    model: Option<Value>,
    key: String,
    is_model_set: bool,
    is_empty_model: bool,
}

impl BindingResult {
    pub fn success(key: impl Into<String>, model: Value) -> Self {
        Self { model: Some(model), key: key.into(), is_model_set: true, is_empty_model: false }
    }

    /// A set result for a default instance no value was applied to.
    pub fn empty_model(key: impl Into<String>, model: Value) -> Self {
        Self { model: Some(model), key: key.into(), is_model_set: true, is_empty_model: true }
    }

    pub fn failed(key: impl Into<String>) -> Self {
        Self { model: None, key: key.into(), is_model_set: false, is_empty_model: false }
    }

    pub fn model(&self) -> Option<&Value> {
        self.model.as_ref()
    }

    pub fn into_model(self) -> Option<Value> {
        self.model
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_model_set(&self) -> bool {
        self.is_model_set
    }

    pub fn is_empty_model(&self) -> bool {
        self.is_empty_model
    }
}

/// State shared by every field bound in one pass.
pub struct OperationBindingContext {
    model_binder: Arc<dyn ModelBinder>,
    metadata_provider: Arc<dyn MetadataProvider>,
    validator_provider: Arc<dyn ValidatorProvider>,
    value_provider: CompositeValueProvider,
    body: Option<RequestBody>,
}

impl OperationBindingContext {
    /// A context using the default binder chain and validators.
    pub fn new(metadata_provider: Arc<dyn MetadataProvider>, value_provider: CompositeValueProvider) -> Self {
        Self {
            model_binder: Arc::new(CompositeModelBinder::default()),
            metadata_provider,
            validator_provider: Arc::new(DefaultValidatorProvider),
            value_provider,
            body: None,
        }
    }

    pub fn with_model_binder(mut self, model_binder: Arc<dyn ModelBinder>) -> Self {
        self.model_binder = model_binder;
        self
    }

    pub fn with_validator_provider(mut self, validator_provider: Arc<dyn ValidatorProvider>) -> Self {
        self.validator_provider = validator_provider;
        self
    }

    pub fn with_body(mut self, body: Option<RequestBody>) -> Self {
        self.body = body;
        self
    }

    /// The entry of the binder chain, binders recurse through it for nested fields.
    pub fn model_binder(&self) -> &Arc<dyn ModelBinder> {
        &self.model_binder
    }

    pub fn metadata_provider(&self) -> &Arc<dyn MetadataProvider> {
        &self.metadata_provider
    }

    pub fn validator_provider(&self) -> &Arc<dyn ValidatorProvider> {
        &self.validator_provider
    }

    /// Every value provider of the request, unrestricted.
    pub fn value_provider(&self) -> &CompositeValueProvider {
        &self.value_provider
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

impl fmt::Debug for OperationBindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationBindingContext")
            .field("value_provider", &self.value_provider)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// What a binder sees of the field it is asked to bind.
///
/// Child contexts reborrow the [`ModelState`] of their parent, so they never outlive the call that
/// created them.
pub struct BindingContext<'a> {
    operation: &'a OperationBindingContext,
    model_state: &'a mut ModelState,
    metadata: Arc<FieldMetadata>,
    model_name: String,
    value_provider: CompositeValueProvider,
    fallback_to_empty_prefix: bool,
    is_top_level: bool,
}

impl<'a> BindingContext<'a> {
    /// The context of a parameter or a bound property.
    ///
    /// The field binds under its explicit binder name when it has one, else under `default_name`.
    /// Only fields without an explicit name may fall back to the empty prefix.
    pub fn root(
        operation: &'a OperationBindingContext,
        model_state: &'a mut ModelState,
        metadata: Arc<FieldMetadata>,
        default_name: &str,
    ) -> Self {
        let explicit_name = metadata.binder_model_name().map(str::to_owned);
        let value_provider = restrict(operation, &metadata, operation.value_provider());
        Self {
            operation,
            model_state,
            fallback_to_empty_prefix: explicit_name.is_none(),
            model_name: explicit_name.unwrap_or_else(|| default_name.to_owned()),
            metadata,
            value_provider,
            is_top_level: true,
        }
    }

    /// The context of a property, element or pair side under this one.
    pub fn child(&mut self, model_name: String, metadata: Arc<FieldMetadata>) -> BindingContext<'_> {
        let value_provider = restrict(self.operation, &metadata, &self.value_provider);
        BindingContext {
            operation: self.operation,
            model_state: &mut *self.model_state,
            metadata,
            model_name,
            value_provider,
            fallback_to_empty_prefix: false,
            is_top_level: false,
        }
    }

    /// The same field under the same name, seen through different metadata.
    pub fn nested(&mut self, metadata: Arc<FieldMetadata>) -> BindingContext<'_> {
        BindingContext {
            operation: self.operation,
            model_state: &mut *self.model_state,
            metadata,
            model_name: self.model_name.clone(),
            value_provider: self.value_provider.clone(),
            fallback_to_empty_prefix: false,
            is_top_level: self.is_top_level,
        }
    }

    /// The same field under another name.
    pub fn with_model_name(&mut self, model_name: String, fallback_to_empty_prefix: bool) -> BindingContext<'_> {
        BindingContext {
            operation: self.operation,
            model_state: &mut *self.model_state,
            metadata: Arc::clone(&self.metadata),
            model_name,
            value_provider: self.value_provider.clone(),
            fallback_to_empty_prefix,
            is_top_level: self.is_top_level,
        }
    }

    pub fn operation(&self) -> &'a OperationBindingContext {
        self.operation
    }

    pub fn metadata(&self) -> &Arc<FieldMetadata> {
        &self.metadata
    }

    /// The qualified name the field binds under, e.g. `order.Lines[0].Sku`.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn value_provider(&self) -> &CompositeValueProvider {
        &self.value_provider
    }

    pub fn model_state(&self) -> &ModelState {
        &*self.model_state
    }

    pub fn model_state_mut(&mut self) -> &mut ModelState {
        &mut *self.model_state
    }

    pub fn fallback_to_empty_prefix(&self) -> bool {
        self.fallback_to_empty_prefix
    }

    pub fn is_top_level(&self) -> bool {
        self.is_top_level
    }
}

impl fmt::Debug for BindingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("model_name", &self.model_name)
            .field("metadata", &self.metadata.identity())
            .field("fallback_to_empty_prefix", &self.fallback_to_empty_prefix)
            .field("is_top_level", &self.is_top_level)
            .finish_non_exhaustive()
    }
}

// a field with an explicit source only sees the providers of that source
fn restrict(
    operation: &OperationBindingContext,
    metadata: &FieldMetadata,
    inherited: &CompositeValueProvider,
) -> CompositeValueProvider {
    match metadata.binding_source() {
        Some(source) => operation.value_provider().filter(source),
        None => inherited.clone(),
    }
}

/// `prefix.name`, or the bare name when there is no prefix.
pub fn create_property_model_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else if name.is_empty() {
        prefix.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

/// `prefix[index]`.
pub fn create_index_model_name(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}
