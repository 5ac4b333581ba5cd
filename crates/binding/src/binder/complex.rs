use crate::binder::{create_property_model_name, BindingContext, BindingResult, ModelBinder};
use crate::error::BindingError;
use crate::metadata::{FieldMetadata, MetadataIdentity};
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per property results of one complex object bind.
#[derive(Debug, Clone)]
pub struct ComplexModelDto {
    property_metadata: Vec<Arc<FieldMetadata>>,
    results: HashMap<MetadataIdentity, BindingResult>,
}

impl ComplexModelDto {
    pub fn new(property_metadata: Vec<Arc<FieldMetadata>>) -> Self {
        Self { property_metadata, results: HashMap::new() }
    }

    pub fn property_metadata(&self) -> &[Arc<FieldMetadata>] {
        &self.property_metadata
    }

    pub fn result(&self, property: &FieldMetadata) -> Option<&BindingResult> {
        self.results.get(property.identity())
    }

    pub fn insert(&mut self, property: &FieldMetadata, result: BindingResult) {
        self.results.insert(property.identity().clone(), result);
    }

    pub fn has_set_result(&self) -> bool {
        self.results.values().any(BindingResult::is_model_set)
    }
}

/// Binds complex types property by property, the last binder of the default chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexObjectModelBinder;

impl ComplexObjectModelBinder {
    /// Decides whether there is anything to bind.
    ///
    /// A top level model bound under the empty prefix is always created, a nested one only when
    /// the request has data under its prefix or one of its properties reads a greedy source.
    fn can_create_model(context: &BindingContext<'_>, properties: &[Arc<FieldMetadata>]) -> bool {
        if context.is_top_level() && context.model_name().is_empty() {
            return true;
        }
        if context.value_provider().contains_prefix(context.model_name()) {
            return true;
        }
        properties.iter().any(|property| property.binding_source().is_some_and(|source| source.is_greedy()))
    }

    async fn bind_properties(
        context: &mut BindingContext<'_>,
        properties: Vec<Arc<FieldMetadata>>,
    ) -> Result<ComplexModelDto, BindingError> {
        let operation = context.operation();
        let mut dto = ComplexModelDto::new(properties);

        for property in dto.property_metadata.clone() {
            if !property.is_binding_allowed() || property.is_read_only() {
                continue;
            }
            let Some(field_name) = property.binder_model_name().or(property.name()).map(str::to_owned) else {
                continue;
            };

            let model_name = create_property_model_name(context.model_name(), &field_name);
            trace!(model_name = %model_name, "binding property");
            let mut child = context.child(model_name.clone(), Arc::clone(&property));
            let result = operation.model_binder().bind_model(&mut child).await?;
            drop(child);
            let result = result.unwrap_or_else(|| BindingResult::failed(model_name.as_str()));

            if !result.is_model_set() && property.is_binding_required() {
                let message = format!("A value for the '{field_name}' property was not provided.");
                context.model_state_mut().try_add_model_error(&model_name, message);
            }
            dto.insert(&property, result);
        }

        Ok(dto)
    }
}

#[async_trait]
impl ModelBinder for ComplexObjectModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let model_type = Arc::clone(context.metadata().model_type());
        let Some(shape) = model_type.complex_shape() else {
            return Ok(None);
        };
        if !shape.is_constructible() {
            trace!(model_type = model_type.name(), "type has no default instance");
            return Ok(None);
        }

        let properties = context.operation().metadata_provider().get_metadata_for_properties(model_type.type_ref());
        if !Self::can_create_model(context, &properties) {
            return Ok(None);
        }

        let key = context.model_name().to_owned();
        let dto = Self::bind_properties(context, properties).await?;
        if !dto.has_set_result() && !(context.is_top_level() && key.is_empty()) {
            debug!(model_name = %key, model_type = model_type.name(), "no property was bound");
            return Ok(Some(BindingResult::failed(key)));
        }

        let model = match shape.construct() {
            Some(Ok(model)) => model,
            Some(Err(e)) => return Err(BindingError::construction(model_type.name(), e)),
            None => return Err(BindingError::construction(model_type.name(), "type has no default instance")),
        };
        let Value::Object(mut object) = model else {
            return Err(BindingError::construction(model_type.name(), "default instance is not an object"));
        };

        let mut applied = false;
        for property in dto.property_metadata() {
            let (Some(name), Some(result)) = (property.name(), dto.result(property)) else {
                continue;
            };
            if let Some(value) = result.model().filter(|_| result.is_model_set()) {
                object.insert(name.to_owned(), value.clone());
                applied = true;
            }
        }

        debug!(model_name = %key, model_type = model_type.name(), "complex model bound");
        let model = Value::Object(object);
        Ok(Some(if applied { BindingResult::success(key, model) } else { BindingResult::empty_model(key, model) }))
    }
}
