use crate::binder::{BindingContext, BindingResult, ModelBinder};
use crate::error::BindingError;
use crate::metadata::SimpleKind;
use crate::value::ValueProvider;
use async_trait::async_trait;
use serde_json::{Number, Value};

/// Converts the first raw value under the model name to a scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTypeModelBinder;

#[async_trait]
impl ModelBinder for SimpleTypeModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        let Some(kind) = context.metadata().model_type().simple_kind() else {
            return Ok(None);
        };
        let Some(result) = context.value_provider().get_value(context.model_name()) else {
            return Ok(None);
        };

        let key = context.model_name().to_owned();
        let raw = result.first_value().unwrap_or_default().to_owned();
        context.model_state_mut().set_model_value(&key, result.values().to_vec(), result.attempted_value());

        match convert(&raw, kind) {
            Some(model) => Ok(Some(BindingResult::success(key, model))),
            None => {
                let message = conversion_error(&raw, context.metadata().display_name());
                context.model_state_mut().try_add_model_error(&key, message);
                Ok(Some(BindingResult::failed(key)))
            }
        }
    }
}

/// Converts one raw value, `None` if it is not a valid `kind`.
pub(crate) fn convert(raw: &str, kind: SimpleKind) -> Option<Value> {
    let trimmed = raw.trim();
    match kind {
        SimpleKind::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Some(Value::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        SimpleKind::Signed { min, max } => {
            trimmed.parse::<i64>().ok().filter(|value| (min..=max).contains(value)).map(Value::from)
        }
        SimpleKind::Unsigned { max } => trimmed.parse::<u64>().ok().filter(|value| *value <= max).map(Value::from),
        SimpleKind::Float { max } => trimmed
            .parse::<f64>()
            .ok()
            .filter(|value| value.abs() <= max)
            .and_then(Number::from_f64)
            .map(Value::Number),
        SimpleKind::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(Value::String(c.to_string())),
                _ => None,
            }
        }
        SimpleKind::String => Some(Value::String(raw.to_owned())),
    }
}

pub(crate) fn conversion_error(raw: &str, display_name: &str) -> String {
    if raw.is_empty() {
        "The value '' is invalid.".to_owned()
    } else {
        format!("The value '{raw}' is not valid for {display_name}.")
    }
}
