use crate::binder::key_value::bind_pair;
use crate::binder::simple::{conversion_error, convert};
use crate::binder::{create_index_model_name, BindingContext, BindingResult, ModelBinder};
use crate::error::BindingError;
use crate::metadata::TypeKind;
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::trace;

/// Binds `Vec<T>` fields.
///
/// Repeated raw values under the field name bind a collection of scalars, `?ids=1&ids=2`. Anything
/// else binds element by element from `name[0]`, `name[1]` and so on, stopping at the first index
/// that has no data or does not bind.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionModelBinder;

#[async_trait]
impl ModelBinder for CollectionModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let TypeKind::Collection(element) = *context.metadata().model_type().kind() else {
            return Ok(None);
        };
        if !context.value_provider().contains_prefix(context.model_name()) {
            return Ok(None);
        }

        let operation = context.operation();
        let name = context.model_name().to_owned();
        let element = operation.metadata_provider().get_metadata_for_type(element);

        if let Some(kind) = element.model_type().simple_kind() {
            if let Some(result) = context.value_provider().get_value(&name) {
                context.model_state_mut().set_model_value(&name, result.values().to_vec(), result.attempted_value());

                let mut elements = Vec::with_capacity(result.len());
                for raw in result.values() {
                    match convert(raw, kind) {
                        Some(model) => elements.push(model),
                        None => {
                            let message = conversion_error(raw, element.display_name());
                            context.model_state_mut().try_add_model_error(&name, message);
                        }
                    }
                }
                return Ok(Some(BindingResult::success(name, Value::Array(elements))));
            }
        }

        let mut elements = vec![];
        for index in 0.. {
            let element_name = create_index_model_name(&name, index);
            if !context.value_provider().contains_prefix(&element_name) {
                break;
            }

            trace!(model_name = %element_name, "binding collection element");
            let mut child = context.child(element_name, Arc::clone(&element));
            match operation.model_binder().bind_model(&mut child).await? {
                Some(result) if result.is_model_set() => elements.push(result.into_model().unwrap_or(Value::Null)),
                _ => break,
            }
        }

        Ok(Some(BindingResult::success(name, Value::Array(elements))))
    }
}

/// Binds `HashMap<K, V>` and `BTreeMap<K, V>` fields from indexed pairs, `name[0].Key` and
/// `name[0].Value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryModelBinder;

#[async_trait]
impl ModelBinder for DictionaryModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let TypeKind::Dictionary { key: key_type, value: value_type } = *context.metadata().model_type().kind() else {
            return Ok(None);
        };
        if !context.value_provider().contains_prefix(context.model_name()) {
            return Ok(None);
        }

        let name = context.model_name().to_owned();
        let mut entries = Map::new();
        for index in 0.. {
            let entry_name = create_index_model_name(&name, index);
            if !context.value_provider().contains_prefix(&entry_name) {
                break;
            }

            trace!(model_name = %entry_name, "binding dictionary entry");
            let Some((key, value)) = bind_pair(context, &entry_name, key_type, value_type).await? else {
                break;
            };
            entries.insert(key_string(key), value);
        }

        Ok(Some(BindingResult::success(name, Value::Object(entries))))
    }
}

fn key_string(key: Value) -> String {
    match key {
        Value::String(key) => key,
        other => other.to_string(),
    }
}
