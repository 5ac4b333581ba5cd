use crate::binder::{
    BindingContext, BindingResult, BodyModelBinder, CollectionModelBinder, ComplexObjectModelBinder,
    DictionaryModelBinder, HeaderModelBinder, KeyValuePairModelBinder, ModelBinder, NullableModelBinder,
    SimpleTypeModelBinder,
};
use crate::error::BindingError;
use async_trait::async_trait;
use std::fmt;
use tracing::{debug, trace};

/// Asks its binders in order and returns the first result.
///
/// When no binder applies to a named field whose context allows it, the field is tried once more
/// under the empty prefix, so `?Id=7` binds an `order` parameter as well as `?order.Id=7` does.
pub struct CompositeModelBinder {
    binders: Vec<Box<dyn ModelBinder>>,
}

impl CompositeModelBinder {
    pub fn builder() -> CompositeModelBinderBuilder {
        CompositeModelBinderBuilder::new()
    }

    async fn try_binders(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        for binder in &self.binders {
            if let Some(result) = binder.bind_model(context).await? {
                debug!(model_name = %context.model_name(), is_model_set = result.is_model_set(), "model binder produced a result");
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ModelBinder for CompositeModelBinder {
    async fn bind_model(&self, context: &mut BindingContext<'_>) -> Result<Option<BindingResult>, BindingError> {
        trace!(model_name = %context.model_name(), model_type = context.metadata().model_type().name(), "binding model");
        if let Some(result) = self.try_binders(context).await? {
            return Ok(Some(result));
        }

        if context.model_name().is_empty() || !context.fallback_to_empty_prefix() {
            return Ok(None);
        }

        debug!(model_name = %context.model_name(), "no value under prefix, falling back to the empty prefix");
        let mut fallback = context.with_model_name(String::new(), false);
        self.try_binders(&mut fallback).await
    }
}

/// The built-in chain: greedy sources first, then leaf types, generic wrappers and finally the
/// complex object binder.
impl Default for CompositeModelBinder {
    fn default() -> Self {
        Self::builder()
            .add_last(HeaderModelBinder)
            .add_last(BodyModelBinder)
            .add_last(SimpleTypeModelBinder)
            .add_last(NullableModelBinder)
            .add_last(KeyValuePairModelBinder)
            .add_last(CollectionModelBinder)
            .add_last(DictionaryModelBinder)
            .add_last(ComplexObjectModelBinder)
            .build()
    }
}

impl fmt::Debug for CompositeModelBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeModelBinder").field("binders", &self.binders.len()).finish()
    }
}

pub struct CompositeModelBinderBuilder {
    binders: Vec<Box<dyn ModelBinder>>,
}

impl CompositeModelBinderBuilder {
    fn new() -> Self {
        Self { binders: vec![] }
    }

    pub fn add_last<B: ModelBinder + 'static>(mut self, binder: B) -> Self {
        self.binders.push(Box::new(binder));
        self
    }

    pub fn add_first<B: ModelBinder + 'static>(mut self, binder: B) -> Self {
        self.binders.insert(0, Box::new(binder));
        self
    }

    pub fn build(self) -> CompositeModelBinder {
        CompositeModelBinder { binders: self.binders }
    }
}

impl fmt::Debug for CompositeModelBinderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeModelBinderBuilder").field("binders", &self.binders.len()).finish()
    }
}
