use crate::binder::simple::{conversion_error, convert};
use crate::binder::{BindingContext, BindingResult, ModelBinder};
use crate::details::BindingSource;
use crate::error::BindingError;
use crate::metadata::{SimpleKind, TypeKind};
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Binds a field marked as coming from a header.
///
/// The header name is the explicit binder name or the field name, never prefixed by the container.
/// Scalars take the first value, collections of scalars take every comma separated value.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderModelBinder;

enum Shape {
    Scalar(SimpleKind),
    List(SimpleKind),
}

#[async_trait]
impl ModelBinder for HeaderModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let metadata = context.metadata();
        if metadata.binding_source() != Some(BindingSource::Header) {
            return Ok(None);
        }

        let shape = match metadata.model_type().kind() {
            TypeKind::Simple(kind) => Shape::Scalar(*kind),
            TypeKind::Collection(element) => {
                let element = context.operation().metadata_provider().get_metadata(*element);
                match element.simple_kind() {
                    Some(kind) => Shape::List(kind),
                    None => return Ok(None),
                }
            }
            _ => return Ok(None),
        };

        let key = context.model_name().to_owned();
        let header_name = metadata.binder_model_name().or(metadata.name()).unwrap_or(key.as_str()).to_owned();
        let display_name = metadata.display_name().to_owned();

        let Some(result) = context.value_provider().get_value(&header_name) else {
            debug!(header = %header_name, "header is missing");
            return Ok(Some(BindingResult::failed(key)));
        };
        context.model_state_mut().set_model_value(&key, result.values().to_vec(), result.attempted_value());

        let model = match shape {
            Shape::Scalar(kind) => {
                let raw = result.first_value().unwrap_or_default();
                convert(raw, kind).ok_or_else(|| raw.to_owned())
            }
            Shape::List(kind) => result
                .values()
                .iter()
                .flat_map(|value| value.split(','))
                .map(str::trim)
                .filter(|raw| !raw.is_empty())
                .map(|raw| convert(raw, kind).ok_or_else(|| raw.to_owned()))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
        };

        match model {
            Ok(model) => Ok(Some(BindingResult::success(key, model))),
            Err(raw) => {
                context.model_state_mut().try_add_model_error(&key, conversion_error(&raw, &display_name));
                Ok(Some(BindingResult::failed(key)))
            }
        }
    }
}
