use crate::binder::{BindingContext, BindingResult, ModelBinder};
use crate::error::BindingError;
use crate::metadata::TypeKind;
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Binds `Option<T>` fields.
///
/// An empty raw value of a scalar `T` binds to `null`, everything else is bound as `T` under the
/// same name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableModelBinder;

#[async_trait]
impl ModelBinder for NullableModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let TypeKind::Nullable(inner) = context.metadata().model_type().kind() else {
            return Ok(None);
        };

        let operation = context.operation();
        let inner = operation.metadata_provider().get_metadata(*inner);
        if inner.simple_kind().is_some() {
            if let Some(result) = context.value_provider().get_value(context.model_name()) {
                if result.first_value().is_none_or(|raw| raw.trim().is_empty()) {
                    let key = context.model_name().to_owned();
                    context.model_state_mut().set_model_value(&key, result.values().to_vec(), result.attempted_value());
                    return Ok(Some(BindingResult::success(key, Value::Null)));
                }
            }
        }

        let metadata = Arc::new(context.metadata().with_model_type(inner));
        operation.model_binder().bind_model(&mut context.nested(metadata)).await
    }
}
