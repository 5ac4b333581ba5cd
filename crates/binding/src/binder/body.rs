use crate::binder::simple::convert;
use crate::binder::{BindingContext, BindingResult, ModelBinder};
use crate::details::BindingSource;
use crate::error::{BindingError, BoxError};
use crate::metadata::{MetadataProvider, SimpleKind, TypeKind, TypeMetadata};
use async_trait::async_trait;
use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use mime::Mime;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

const EMPTY_BODY: &str = "A non-empty request body is required.";

/// The request body, shared by every binder of one request and readable once.
#[derive(Clone)]
pub struct RequestBody {
    content_type: Option<Mime>,
    inner: Arc<Mutex<Option<UnsyncBoxBody<Bytes, BoxError>>>>,
}

impl RequestBody {
    pub fn new<B>(content_type: Option<Mime>, body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let body = UnsyncBoxBody::new(body.map_err(Into::into));
        Self { content_type, inner: Arc::new(Mutex::new(Some(body))) }
    }

    pub fn from_bytes(content_type: Option<Mime>, bytes: impl Into<Bytes>) -> Self {
        Self::new(content_type, Full::new(bytes.into()))
    }

    /// An `application/json` body.
    pub fn json(bytes: impl Into<Bytes>) -> Self {
        Self::from_bytes(Some(mime::APPLICATION_JSON), bytes)
    }

    pub fn content_type(&self) -> Option<&Mime> {
        self.content_type.as_ref()
    }

    pub async fn can_consume(&self) -> bool {
        let guard = self.inner.lock().await;
        guard.is_some()
    }

    /// Reads the whole body, `None` if it was already consumed.
    pub async fn take_bytes(&self) -> Result<Option<Bytes>, BindingError> {
        let body = {
            let mut guard = self.inner.lock().await;
            guard.take()
        };
        let Some(body) = body else {
            return Ok(None);
        };

        let collected = body.collect().await.map_err(BindingError::body)?;
        Ok(Some(collected.to_bytes()))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").field("content_type", &self.content_type).finish_non_exhaustive()
    }
}

fn is_json(content_type: &Mime) -> bool {
    content_type.type_() == mime::APPLICATION
        && (content_type.subtype() == mime::JSON || content_type.suffix() == Some(mime::JSON))
}

/// Binds a field marked as coming from the body by parsing the body as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyModelBinder;

#[async_trait]
impl ModelBinder for BodyModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        if context.metadata().binding_source() != Some(BindingSource::Body) {
            return Ok(None);
        }

        let key = context.model_name().to_owned();
        let Some(body) = context.operation().body() else {
            context.model_state_mut().try_add_model_error(&key, EMPTY_BODY);
            return Ok(Some(BindingResult::failed(key)));
        };

        let content_type = body.content_type().map(ToString::to_string).unwrap_or_default();
        if !body.content_type().is_some_and(is_json) {
            debug!(content_type = %content_type, "body is not json");
            let message = format!("Unsupported content type '{content_type}'.");
            context.model_state_mut().try_add_model_error(&key, message);
            return Ok(Some(BindingResult::failed(key)));
        }

        let bytes = match body.take_bytes().await? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                context.model_state_mut().try_add_model_error(&key, EMPTY_BODY);
                return Ok(Some(BindingResult::failed(key)));
            }
        };

        let model: Value = match serde_json::from_slice(&bytes) {
            Ok(model) => model,
            Err(e) => {
                debug!(cause = %e, "body is not valid json");
                context.model_state_mut().try_add_model_error(&key, e.to_string());
                return Ok(Some(BindingResult::failed(key)));
            }
        };

        let provider = context.operation().metadata_provider().as_ref();
        if let Some(mismatch) = find_mismatch(provider, context.metadata().model_type(), &model, "$".to_owned()) {
            debug!(path = %mismatch.path, model_type = %mismatch.type_name, "body does not fit the model type");
            let message =
                format!("The JSON value could not be converted to {}. Path: {}.", mismatch.type_name, mismatch.path);
            context.model_state_mut().try_add_model_error(&key, message);
            return Ok(Some(BindingResult::failed(key)));
        }

        Ok(Some(BindingResult::success(key, model)))
    }
}

/// Where a body value does not fit the declared type.
#[derive(Debug, PartialEq, Eq)]
struct Mismatch {
    path: String,
    type_name: String,
}

impl Mismatch {
    fn at(path: String, model_type: &TypeMetadata) -> Self {
        Self { path, type_name: model_type.name().to_owned() }
    }
}

/// Walks `model` along `model_type` and returns the first node that would not deserialize.
///
/// Absent properties are accepted, the default instance supplies them.
fn find_mismatch(
    provider: &dyn MetadataProvider,
    model_type: &TypeMetadata,
    model: &Value,
    path: String,
) -> Option<Mismatch> {
    match (model_type.kind(), model) {
        (TypeKind::Simple(kind), _) => (!fits_simple(*kind, model)).then(|| Mismatch::at(path, model_type)),
        (TypeKind::Nullable(_), Value::Null) => None,
        (TypeKind::Nullable(inner), _) => find_mismatch(provider, &provider.get_metadata(*inner), model, path),
        (TypeKind::Collection(element), Value::Array(elements)) => {
            let element = provider.get_metadata(*element);
            elements
                .iter()
                .enumerate()
                .find_map(|(index, value)| find_mismatch(provider, &element, value, format!("{path}[{index}]")))
        }
        (TypeKind::KeyValuePair { key, value }, Value::Object(object)) => {
            [("Key", *key), ("Value", *value)].into_iter().find_map(|(side, side_type)| {
                let side_type = provider.get_metadata(side_type);
                let side_path = format!("{path}.{side}");
                match object.get(side) {
                    Some(side_value) => find_mismatch(provider, &side_type, side_value, side_path),
                    None => Some(Mismatch::at(side_path, &side_type)),
                }
            })
        }
        (TypeKind::Dictionary { key, value }, Value::Object(entries)) => {
            let key_type = provider.get_metadata(*key);
            let value_type = provider.get_metadata(*value);
            entries.iter().find_map(|(entry, entry_value)| {
                let entry_path = format!("{path}.{entry}");
                if key_type.simple_kind().is_some_and(|kind| convert(entry, kind).is_none()) {
                    return Some(Mismatch::at(entry_path, &key_type));
                }
                find_mismatch(provider, &value_type, entry_value, entry_path)
            })
        }
        (TypeKind::Complex(shape), Value::Object(object)) => shape.properties().iter().find_map(|property| {
            let property_value = object.get(property.name())?;
            let property_path = format!("{path}.{}", property.name());
            find_mismatch(provider, &provider.get_metadata(property.model_type()), property_value, property_path)
        }),
        _ => Some(Mismatch::at(path, model_type)),
    }
}

fn fits_simple(kind: SimpleKind, model: &Value) -> bool {
    match kind {
        SimpleKind::Bool => model.is_boolean(),
        SimpleKind::Signed { min, max } => model.as_i64().is_some_and(|value| (min..=max).contains(&value)),
        SimpleKind::Unsigned { max } => model.as_u64().is_some_and(|value| value <= max),
        SimpleKind::Float { max } => model.as_f64().is_some_and(|value| value.abs() <= max),
        SimpleKind::Char => model.as_str().is_some_and(|value| value.chars().count() == 1),
        SimpleKind::String => model.is_string(),
    }
}
