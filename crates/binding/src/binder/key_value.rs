use crate::binder::{create_property_model_name, BindingContext, BindingResult, ModelBinder};
use crate::error::BindingError;
use crate::metadata::{TypeKind, TypeRef};
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::{json, Value};

const MISSING_PAIR_SIDE: &str = "Both a key and a value must be present.";

/// Binds `KeyValuePair<K, V>` fields from `<name>.Key` and `<name>.Value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValuePairModelBinder;

#[async_trait]
impl ModelBinder for KeyValuePairModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let TypeKind::KeyValuePair { key, value } = *context.metadata().model_type().kind() else {
            return Ok(None);
        };
        if !context.model_name().is_empty() && !context.value_provider().contains_prefix(context.model_name()) {
            return Ok(None);
        }

        let name = context.model_name().to_owned();
        let result = match bind_pair(context, &name, key, value).await? {
            Some((key, value)) => BindingResult::success(name, json!({ "Key": key, "Value": value })),
            None => BindingResult::failed(name),
        };
        Ok(Some(result))
    }
}

/// Binds the two sides of the pair under `name`.
///
/// When exactly one side binds, the missing side gets a model error. The pair is bound only when
/// both sides are.
pub(crate) async fn bind_pair(
    context: &mut BindingContext<'_>,
    name: &str,
    key_type: TypeRef,
    value_type: TypeRef,
) -> Result<Option<(Value, Value)>, BindingError> {
    let key_name = create_property_model_name(name, "Key");
    let value_name = create_property_model_name(name, "Value");
    let key = bind_side(context, key_name.clone(), key_type).await?;
    let value = bind_side(context, value_name.clone(), value_type).await?;

    match (key, value) {
        (Some(key), Some(value)) => Ok(Some((key, value))),
        (Some(_), None) => {
            context.model_state_mut().try_add_model_error(&value_name, MISSING_PAIR_SIDE);
            Ok(None)
        }
        (None, Some(_)) => {
            context.model_state_mut().try_add_model_error(&key_name, MISSING_PAIR_SIDE);
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

async fn bind_side(
    context: &mut BindingContext<'_>,
    name: String,
    model_type: TypeRef,
) -> Result<Option<Value>, BindingError> {
    let operation = context.operation();
    let metadata = operation.metadata_provider().get_metadata_for_type(model_type);
    let result = operation.model_binder().bind_model(&mut context.child(name, metadata)).await?;
    Ok(result.filter(BindingResult::is_model_set).and_then(BindingResult::into_model))
}

#[cfg(test)]
mod tests {
    use super::KeyValuePairModelBinder;
    use crate::binder::test_support::operation;
    use crate::binder::{BindingContext, BindingResult, ModelBinder};
    use crate::metadata::{KeyValuePair, MetadataProvider, TypeRef};
    use crate::model_state::ModelState;
    use serde_json::json;

    async fn bind(pairs: &[(&str, &str)], model_state: &mut ModelState) -> Option<BindingResult> {
        let operation = operation(pairs);
        let metadata = operation.metadata_provider().get_metadata_for_type(TypeRef::of::<KeyValuePair<String, i32>>());
        let mut context = BindingContext::root(&operation, model_state, metadata, "kv");
        KeyValuePairModelBinder.bind_model(&mut context).await.unwrap()
    }

    #[tokio::test]
    async fn test_binds_both_sides() {
        let mut model_state = ModelState::new();
        let result = bind(&[("kv.Key", "a"), ("kv.Value", "5")], &mut model_state).await;
        assert_eq!(result, Some(BindingResult::success("kv", json!({ "Key": "a", "Value": 5 }))));
        assert!(model_state.is_valid());
    }

    #[tokio::test]
    async fn test_missing_key_is_model_error() {
        let mut model_state = ModelState::new();
        let result = bind(&[("kv.Value", "5")], &mut model_state).await;
        assert_eq!(result, Some(BindingResult::failed("kv")));
        assert_eq!(model_state.error_count(), 1);
        assert_eq!(model_state.errors("kv.Key")[0].message, "Both a key and a value must be present.");
    }

    #[tokio::test]
    async fn test_missing_value_is_model_error() {
        let mut model_state = ModelState::new();
        bind(&[("kv.Key", "a")], &mut model_state).await;
        assert_eq!(model_state.errors("kv.Value")[0].message, "Both a key and a value must be present.");
    }

    #[tokio::test]
    async fn test_no_data_under_prefix_is_not_applicable() {
        let mut model_state = ModelState::new();
        assert_eq!(bind(&[("other", "1")], &mut model_state).await, None);
        assert_eq!(model_state.error_count(), 0);
    }

    #[tokio::test]
    async fn test_prefix_without_sides_is_unset_without_errors() {
        let mut model_state = ModelState::new();
        assert_eq!(bind(&[("kv.Other", "1")], &mut model_state).await, Some(BindingResult::failed("kv")));
        assert_eq!(model_state.error_count(), 0);
    }
}
