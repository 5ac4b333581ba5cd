//! Binding the arguments of a controller action.
//!
//! [`DefaultControllerArgumentBinder`] binds in two independent passes: the bindable properties of
//! the controller first, applied onto the live controller through [`SetNamedField`], then the
//! action parameters. Each pass builds one [`OperationBindingContext`] and binds its fields one at
//! a time in declared order. Fields that bind are validated and collected, the others only leave
//! their errors in the [`ModelState`].

use crate::binder::{BindingContext, BindingResult, CompositeModelBinder, ModelBinder, OperationBindingContext, RequestBody};
use crate::details::{BinderMetadata, CompositeMetadataDetailsProvider};
use crate::error::BindingError;
use crate::metadata::{DefaultMetadataProvider, FieldMetadata, MetadataProvider, MethodDescriptor, TypeRef};
use crate::model_state::ModelState;
use crate::named_field::{apply_named_fields, SetNamedField};
use crate::options::BindingOptions;
use crate::validation::{DefaultObjectValidator, DefaultValidatorProvider, ObjectModelValidator, ValidatorProvider};
use crate::value::CompositeValueProvider;
use crate::Attribute;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Describes the action being invoked.
pub trait ActionDescriptor: Send + Sync + fmt::Debug {
    fn display_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// A field to bind, with the binder declaration the routing layer attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    binder_metadata: Option<BinderMetadata>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), binder_metadata: None }
    }

    pub fn with_binder_metadata(mut self, binder_metadata: BinderMetadata) -> Self {
        self.binder_metadata = Some(binder_metadata);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binder_metadata(&self) -> Option<&BinderMetadata> {
        self.binder_metadata.as_ref()
    }
}

/// An action implemented by a method on a controller type.
#[derive(Debug, Clone)]
pub struct ControllerActionDescriptor {
    display_name: String,
    method: MethodDescriptor,
    parameters: Vec<ParameterDescriptor>,
    bound_properties: Vec<ParameterDescriptor>,
}

impl ControllerActionDescriptor {
    /// Describes `method`, one parameter descriptor per declared parameter.
    pub fn new(method: MethodDescriptor) -> Self {
        let display_name = format!("{}.{}", method.declaring_type().type_name(), method.name());
        let parameters = method.parameters().iter().map(|parameter| ParameterDescriptor::new(parameter.name())).collect();
        Self { display_name, method, parameters, bound_properties: vec![] }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Adds a controller property bound before the parameters.
    pub fn bound_property(mut self, property: ParameterDescriptor) -> Self {
        self.bound_properties.push(property);
        self
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn bound_properties(&self) -> &[ParameterDescriptor] {
        &self.bound_properties
    }

    pub fn controller_type(&self) -> TypeRef {
        self.method.declaring_type()
    }
}

impl ActionDescriptor for ControllerActionDescriptor {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The action being invoked and the model state of its request.
#[derive(Debug, Clone)]
pub struct ActionContext {
    action_descriptor: Arc<dyn ActionDescriptor>,
    model_state: ModelState,
}

impl ActionContext {
    pub fn new(action_descriptor: Arc<dyn ActionDescriptor>) -> Self {
        Self { action_descriptor, model_state: ModelState::new() }
    }

    pub fn action_descriptor(&self) -> &Arc<dyn ActionDescriptor> {
        &self.action_descriptor
    }

    pub fn model_state(&self) -> &ModelState {
        &self.model_state
    }

    pub fn model_state_mut(&mut self) -> &mut ModelState {
        &mut self.model_state
    }

    pub fn into_model_state(self) -> ModelState {
        self.model_state
    }
}

/// The request scoped resources binders read from.
#[derive(Clone)]
pub struct ActionBindingContext {
    model_binder: Arc<dyn ModelBinder>,
    value_provider: CompositeValueProvider,
    validator_provider: Arc<dyn ValidatorProvider>,
    body: Option<RequestBody>,
}

impl ActionBindingContext {
    /// Binds with the default binder chain and validators.
    pub fn new(value_provider: CompositeValueProvider) -> Self {
        Self {
            model_binder: Arc::new(CompositeModelBinder::default()),
            value_provider,
            validator_provider: Arc::new(DefaultValidatorProvider),
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

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn value_provider(&self) -> &CompositeValueProvider {
        &self.value_provider
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

impl fmt::Debug for ActionBindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBindingContext")
            .field("value_provider", &self.value_provider)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Bound arguments by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionArguments {
    values: BTreeMap<String, Value>,
}

impl ActionArguments {
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The argument converted to `T`, `None` when it was not bound.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, BindingError> {
        self.values
            .get(name)
            .map(|value| T::deserialize(value).map_err(|e| BindingError::conversion(name, e)))
            .transpose()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

pub struct DefaultControllerArgumentBinder {
    metadata_provider: Arc<dyn MetadataProvider>,
    details_provider: Arc<CompositeMetadataDetailsProvider>,
    object_validator: Arc<dyn ObjectModelValidator>,
    options: BindingOptions,
}

impl DefaultControllerArgumentBinder {
    pub fn builder() -> DefaultControllerArgumentBinderBuilder {
        DefaultControllerArgumentBinderBuilder::new()
    }

    pub fn options(&self) -> &BindingOptions {
        &self.options
    }

    /// Binds the controller properties onto `controller`, then the action parameters.
    ///
    /// Bad request data never fails the call, it is recorded in the model state of
    /// `action_context`. An `Err` means the action or its metadata is wired wrong.
    pub async fn bind_arguments(
        &self,
        action_context: &mut ActionContext,
        binding: &ActionBindingContext,
        controller: Option<&mut dyn SetNamedField>,
    ) -> Result<ActionArguments, BindingError> {
        let descriptor = Arc::clone(&action_context.action_descriptor);
        let Some(action) = descriptor.as_any().downcast_ref::<ControllerActionDescriptor>() else {
            return Err(BindingError::action_descriptor_mismatch(descriptor.display_name()));
        };
        let model_state = &mut action_context.model_state;

        if !action.bound_properties().is_empty() {
            let fields = action
                .bound_properties()
                .iter()
                .map(|property| {
                    let metadata = self.metadata_provider.get_metadata_for_property(action.controller_type(), property.name())?;
                    Ok((property.name().to_owned(), self.compose(metadata, property.binder_metadata())))
                })
                .collect::<Result<Vec<_>, BindingError>>()?;

            let values = self.bind_fields(fields, model_state, binding).await?;
            match controller {
                Some(controller) => {
                    apply_named_fields(controller, &values);
                }
                None => debug!(action = action.display_name(), "no controller to apply bound properties to"),
            }
        }

        let fields = action
            .parameters()
            .iter()
            .map(|parameter| {
                let metadata = self.metadata_provider.get_metadata_for_parameter(action.method(), parameter.name())?;
                Ok((parameter.name().to_owned(), self.compose(metadata, parameter.binder_metadata())))
            })
            .collect::<Result<Vec<_>, BindingError>>()?;
        let values = self.bind_fields(fields, model_state, binding).await?;

        debug!(
            action = action.display_name(),
            arguments = values.len(),
            errors = model_state.error_count(),
            is_valid = model_state.is_valid(),
            "action arguments bound"
        );
        Ok(ActionArguments { values })
    }

    // the descriptor's declaration overrides what the field's own attributes say
    fn compose(&self, metadata: Arc<FieldMetadata>, binder_metadata: Option<&BinderMetadata>) -> Arc<FieldMetadata> {
        let Some(binder_metadata) = binder_metadata else {
            return metadata;
        };

        let attributes = std::iter::once(Attribute::Binder(binder_metadata.clone()))
            .chain(metadata.attributes().iter().cloned())
            .collect::<Vec<_>>();
        let binding = self.details_provider.get_binding_metadata(metadata.identity(), &attributes);
        Arc::new(metadata.with_binding_metadata(binding))
    }

    async fn bind_fields(
        &self,
        fields: Vec<(String, Arc<FieldMetadata>)>,
        model_state: &mut ModelState,
        binding: &ActionBindingContext,
    ) -> Result<BTreeMap<String, Value>, BindingError> {
        let operation = OperationBindingContext::new(Arc::clone(&self.metadata_provider), binding.value_provider.clone())
            .with_model_binder(Arc::clone(&binding.model_binder))
            .with_validator_provider(Arc::clone(&binding.validator_provider))
            .with_body(binding.body.clone());
        model_state.set_max_allowed_errors(self.options.max_model_validation_errors());

        let mut values = BTreeMap::new();
        for (name, metadata) in fields {
            let result = {
                let mut context = BindingContext::root(&operation, model_state, Arc::clone(&metadata), &name);
                operation.model_binder().bind_model(&mut context).await?
            };

            let Some(result) = result.filter(BindingResult::is_model_set) else {
                trace!(name = %name, "field was not bound");
                continue;
            };

            self.object_validator.validate(
                model_state,
                operation.validator_provider().as_ref(),
                result.key(),
                &metadata,
                result.model(),
            );
            values.insert(name, result.into_model().unwrap_or(Value::Null));
        }

        Ok(values)
    }
}

impl Default for DefaultControllerArgumentBinder {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for DefaultControllerArgumentBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultControllerArgumentBinder").field("options", &self.options).finish_non_exhaustive()
    }
}

pub struct DefaultControllerArgumentBinderBuilder {
    metadata_provider: Option<Arc<dyn MetadataProvider>>,
    details_provider: Option<Arc<CompositeMetadataDetailsProvider>>,
    object_validator: Option<Arc<dyn ObjectModelValidator>>,
    options: BindingOptions,
}

impl DefaultControllerArgumentBinderBuilder {
    fn new() -> Self {
        Self { metadata_provider: None, details_provider: None, object_validator: None, options: BindingOptions::default() }
    }

    /// Defaults to [`DefaultMetadataProvider::global`].
    pub fn metadata_provider(mut self, metadata_provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata_provider = Some(metadata_provider);
        self
    }

    /// Composes descriptor level binder declarations. Defaults to the providers of the global
    /// metadata provider.
    pub fn details_provider(mut self, details_provider: Arc<CompositeMetadataDetailsProvider>) -> Self {
        self.details_provider = Some(details_provider);
        self
    }

    pub fn object_validator(mut self, object_validator: Arc<dyn ObjectModelValidator>) -> Self {
        self.object_validator = Some(object_validator);
        self
    }

    pub fn options(mut self, options: BindingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> DefaultControllerArgumentBinder {
        let global = DefaultMetadataProvider::global();
        let details_provider = self.details_provider.unwrap_or_else(|| Arc::clone(global.details()));
        let metadata_provider = self.metadata_provider.unwrap_or(global);
        let object_validator = self
            .object_validator
            .unwrap_or_else(|| Arc::new(DefaultObjectValidator::new(Arc::clone(&metadata_provider))));

        DefaultControllerArgumentBinder { metadata_provider, details_provider, object_validator, options: self.options }
    }
}

impl fmt::Debug for DefaultControllerArgumentBinderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultControllerArgumentBinderBuilder").field("options", &self.options).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ActionArguments, ActionBindingContext, ActionContext, ActionDescriptor, ControllerActionDescriptor,
        DefaultControllerArgumentBinder, ParameterDescriptor,
    };
    use crate::binder::RequestBody;
    use crate::details::{BinderMetadata, BindingSource};
    use crate::error::BindingError;
    use crate::metadata::{Describe, KeyValuePair, MethodDescriptor, ParameterInfo, TypeDescriptor, TypeRef};
    use crate::named_field::NamedFieldSetters;
    use crate::options::{BindingOptions, ErrorLimit};
    use crate::value::{CompositeValueProvider, MockValueProvider, NameValueProvider, ValueProviderResult};
    use crate::Attribute;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::any::Any;
    use std::sync::Arc;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    #[derive(Debug, Default)]
    struct OrdersController {
        current_user: String,
    }

    impl Describe for OrdersController {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("OrdersController")
                .property_with::<String>("CurrentUser", [BinderMetadata::from_header().named("x-user").into()])
                .build()
        }
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Order {
        id: i32,
        sku: String,
    }

    impl Describe for Order {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("Order")
                .constructible::<Order>()
                .property::<i32>("Id")
                .property_with::<String>("Sku", [Attribute::StringLength { min: 0, max: 8 }])
                .build()
        }
    }

    fn query(pairs: &[(&str, &str)]) -> ActionBindingContext {
        let query = NameValueProvider::from_pairs(BindingSource::Query, pairs.iter().copied());
        ActionBindingContext::new(CompositeValueProvider::new().with(query))
    }

    fn action(method: MethodDescriptor) -> ActionContext {
        ActionContext::new(Arc::new(ControllerActionDescriptor::new(method)))
    }

    fn method(name: &str) -> MethodDescriptor {
        MethodDescriptor::new(TypeRef::of::<OrdersController>(), name)
    }

    async fn bind(action_context: &mut ActionContext, binding: &ActionBindingContext) -> ActionArguments {
        DefaultControllerArgumentBinder::default().bind_arguments(action_context, binding, None).await.unwrap()
    }

    #[tokio::test]
    async fn test_binds_simple_parameter() {
        let mut action_context = action(method("get").parameter(ParameterInfo::new("id", TypeRef::of::<i32>())));
        let arguments = bind(&mut action_context, &query(&[("id", "42")])).await;

        assert_eq!(arguments.get::<i32>("id").unwrap(), Some(42));
        assert_eq!(serde_json::to_value(&arguments).unwrap(), json!({ "id": 42 }));
        assert!(action_context.model_state().is_valid());
    }

    #[tokio::test]
    async fn test_binds_partial_complex_parameter() {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).with_test_writer().finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut action_context = action(method("update").parameter(ParameterInfo::new("order", TypeRef::of::<Order>())));
        let arguments = bind(&mut action_context, &query(&[("order.Id", "7")])).await;

        assert_eq!(arguments.get::<Order>("order").unwrap(), Some(Order { id: 7, sku: String::new() }));
        let model_state = action_context.model_state();
        assert!(model_state.is_valid());
        assert!(model_state.errors("order.Sku").is_empty());
    }

    #[tokio::test]
    async fn test_half_bound_pair_is_not_an_argument() {
        let mut action_context =
            action(method("tag").parameter(ParameterInfo::new("kv", TypeRef::of::<KeyValuePair<String, i32>>())));
        let arguments = bind(&mut action_context, &query(&[("kv.Value", "5")])).await;

        assert!(!arguments.contains("kv"));
        assert_eq!(action_context.model_state().errors("kv.Key")[0].message, "Both a key and a value must be present.");
        assert_eq!(action_context.model_state().error_count(), 1);
    }

    #[tokio::test]
    async fn test_error_cap_drops_errors_and_binds_every_field() {
        let method = method("page")
            .parameter(ParameterInfo::new("a", TypeRef::of::<i32>()))
            .parameter(ParameterInfo::new("b", TypeRef::of::<i32>()))
            .parameter(ParameterInfo::new("c", TypeRef::of::<i32>()))
            .parameter(ParameterInfo::new("d", TypeRef::of::<i32>()));
        let mut action_context = action(method);
        let binder = DefaultControllerArgumentBinder::builder()
            .options(BindingOptions::builder().max_model_validation_errors(ErrorLimit::Max(2)).build())
            .build();

        let binding = query(&[("a", "x"), ("b", "x"), ("c", "x"), ("d", "4")]);
        let arguments = binder.bind_arguments(&mut action_context, &binding, None).await.unwrap();

        let model_state = action_context.model_state();
        assert_eq!(model_state.error_count(), 2);
        assert!(model_state.has_reached_max_errors());
        assert!(model_state.errors("c").is_empty());
        assert_eq!(arguments.get::<i32>("d").unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_explicit_name_overrides_parameter_name() {
        let method = method("count").parameter(ParameterInfo::new("count", TypeRef::of::<i32>()));
        let descriptor = ControllerActionDescriptor::new(method)
            .with_parameters(vec![ParameterDescriptor::new("count").with_binder_metadata(BinderMetadata::model_name("foo"))]);
        let mut action_context = ActionContext::new(Arc::new(descriptor));

        let arguments = bind(&mut action_context, &query(&[("count", "9"), ("foo", "3")])).await;
        assert_eq!(arguments.get::<i32>("count").unwrap(), Some(3));

        let mut action_context = ActionContext::new(Arc::clone(action_context.action_descriptor()));
        let arguments = bind(&mut action_context, &query(&[("count", "9")])).await;
        assert!(arguments.is_empty());
    }

    #[tokio::test]
    async fn test_root_composite_without_data_is_default_instance() {
        let mut action_context = action(method("create").parameter(ParameterInfo::new("order", TypeRef::of::<Order>())));
        let arguments = bind(&mut action_context, &query(&[])).await;

        assert_eq!(arguments.get::<Order>("order").unwrap(), Some(Order::default()));
        assert!(action_context.model_state().is_valid());
    }

    #[tokio::test]
    async fn test_bound_values_are_validated() {
        let mut action_context = action(method("update").parameter(ParameterInfo::new("order", TypeRef::of::<Order>())));
        let arguments = bind(&mut action_context, &query(&[("order.Sku", "much-too-long")])).await;

        assert!(arguments.contains("order"));
        assert_eq!(
            action_context.model_state().errors("order.Sku")[0].message,
            "The field Sku must be a string with a maximum length of 8."
        );
        assert!(!action_context.model_state().is_valid());
    }

    #[tokio::test]
    async fn test_rebinding_is_idempotent() {
        let mut provider = MockValueProvider::new();
        provider.expect_source().return_const(Some(BindingSource::Query));
        provider.expect_contains_prefix().returning(|prefix| prefix.is_empty() || prefix.eq_ignore_ascii_case("id"));
        provider
            .expect_get_value()
            .returning(|key| key.eq_ignore_ascii_case("id").then(|| ValueProviderResult::single("x")));
        let binding = ActionBindingContext::new(CompositeValueProvider::new().with(provider));
        let method = method("get").parameter(ParameterInfo::new("id", TypeRef::of::<i32>()));

        let mut first = action(method.clone());
        let mut second = action(method);
        assert_eq!(bind(&mut first, &binding).await, bind(&mut second, &binding).await);
        assert_eq!(first.model_state().error_map(), second.model_state().error_map());
        assert_eq!(first.model_state().errors("id")[0].message, "The value 'x' is not valid for id.");
    }

    #[tokio::test]
    async fn test_greedy_source_never_reads_other_providers() {
        let mut query = MockValueProvider::new();
        query.expect_source().return_const(Some(BindingSource::Query));
        query.expect_contains_prefix().never();
        query.expect_get_value().never();
        let headers = NameValueProvider::from_pairs(BindingSource::Header, [("tenant", "acme")]);
        let binding = ActionBindingContext::new(CompositeValueProvider::new().with(query).with(headers));

        let method = method("list")
            .parameter(ParameterInfo::new("tenant", TypeRef::of::<String>()).with_attribute(BinderMetadata::from_header()));
        let mut action_context = action(method);
        let arguments = bind(&mut action_context, &binding).await;
        assert_eq!(arguments.get::<String>("tenant").unwrap().as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_properties_are_applied_before_parameters() {
        let method = method("mine").parameter(ParameterInfo::new("order", TypeRef::of::<Order>()));
        let descriptor = ControllerActionDescriptor::new(method).bound_property(ParameterDescriptor::new("CurrentUser"));
        let mut action_context = ActionContext::new(Arc::new(descriptor));

        let query = NameValueProvider::from_pairs(BindingSource::Query, [("order.Id", "1")]);
        let headers = NameValueProvider::from_pairs(BindingSource::Header, [("X-User", "ann")]);
        let binding = ActionBindingContext::new(CompositeValueProvider::new().with(query).with(headers));

        let setters = NamedFieldSetters::new()
            .field("currentuser", |c: &mut OrdersController, v: String| c.current_user = v);
        let mut controller = OrdersController::default();
        let arguments = DefaultControllerArgumentBinder::default()
            .bind_arguments(&mut action_context, &binding, Some(&mut setters.bind(&mut controller)))
            .await
            .unwrap();

        assert_eq!(controller.current_user, "ann");
        assert!(!arguments.contains("CurrentUser"));
        assert_eq!(arguments.get::<Order>("order").unwrap().map(|order| order.id), Some(1));
    }

    #[tokio::test]
    async fn test_reads_json_body() {
        let method = method("import")
            .parameter(ParameterInfo::new("order", TypeRef::of::<Order>()).with_attribute(BinderMetadata::from_body()));
        let mut action_context = action(method);
        let binding = query(&[]).with_body(RequestBody::json(r#"{ "Id": 3, "Sku": "A-1" }"#));

        let arguments = bind(&mut action_context, &binding).await;
        assert_eq!(arguments.get::<Order>("order").unwrap(), Some(Order { id: 3, sku: "A-1".into() }));
    }

    #[tokio::test]
    async fn test_body_model_is_validated() {
        let method = method("receive")
            .parameter(ParameterInfo::new("item", TypeRef::of::<Order>()).with_attribute(BinderMetadata::from_body()));
        let mut action_context = action(method);
        let binding = query(&[]).with_body(RequestBody::json(r#"{ "Id": 1, "Sku": "much-too-long" }"#));

        let arguments = bind(&mut action_context, &binding).await;
        assert!(arguments.contains("item"));
        let model_state = action_context.model_state();
        assert_eq!(model_state.errors("item.Sku")[0].message, "The field Sku must be a string with a maximum length of 8.");
        assert!(!model_state.is_valid());
    }

    #[tokio::test]
    async fn test_body_of_wrong_shape_is_not_an_argument() {
        let method = method("bulk")
            .parameter(ParameterInfo::new("ids", TypeRef::of::<Vec<i32>>()).with_attribute(BinderMetadata::from_body()))
            .parameter(ParameterInfo::new("order", TypeRef::of::<Order>()));
        let mut action_context = action(method);
        let binding = query(&[("order.Id", "2")]).with_body(RequestBody::json(r#""hello""#));

        let arguments = bind(&mut action_context, &binding).await;
        assert!(!arguments.contains("ids"));
        assert_eq!(arguments.get::<Order>("order").unwrap().map(|order| order.id), Some(2));
        let model_state = action_context.model_state();
        assert_eq!(model_state.errors("ids").len(), 1);
        assert_eq!(model_state.error_count(), 1);
    }

    struct Opaque;

    impl Describe for Opaque {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("Opaque").property::<i32>("Id").build()
        }
    }

    #[tokio::test]
    async fn test_unconstructible_parameter_is_skipped() {
        let method = method("peek")
            .parameter(ParameterInfo::new("opaque", TypeRef::of::<Opaque>()))
            .parameter(ParameterInfo::new("id", TypeRef::of::<i32>()));
        let mut action_context = action(method);

        let arguments = bind(&mut action_context, &query(&[("id", "3")])).await;
        assert!(!arguments.contains("opaque"));
        assert_eq!(arguments.get::<i32>("id").unwrap(), Some(3));
        assert!(action_context.model_state().is_valid());
    }

    #[tokio::test]
    async fn test_same_method_name_with_other_parameter_type() {
        let numeric = method("lookup").parameter(ParameterInfo::new("id", TypeRef::of::<i32>()));
        let text = method("lookup").parameter(ParameterInfo::new("id", TypeRef::of::<String>()));

        let mut action_context = action(numeric);
        let arguments = bind(&mut action_context, &query(&[("id", "abc")])).await;
        assert!(arguments.is_empty());
        assert!(!action_context.model_state().is_valid());

        let mut action_context = action(text);
        let arguments = bind(&mut action_context, &query(&[("id", "abc")])).await;
        assert_eq!(arguments.get::<String>("id").unwrap().as_deref(), Some("abc"));
        assert!(action_context.model_state().is_valid());
    }

    #[derive(Debug)]
    struct PageDescriptor;

    impl ActionDescriptor for PageDescriptor {
        fn display_name(&self) -> &str {
            "Index.cshtml"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn test_contract_errors() {
        let binder = DefaultControllerArgumentBinder::default();
        let binding = query(&[]);

        let mut action_context = ActionContext::new(Arc::new(PageDescriptor));
        let result = binder.bind_arguments(&mut action_context, &binding, None).await;
        assert!(matches!(result, Err(BindingError::ActionDescriptorMismatch { .. })));

        let duplicated = method("dup")
            .parameter(ParameterInfo::new("id", TypeRef::of::<i32>()))
            .parameter(ParameterInfo::new("id", TypeRef::of::<String>()));
        let result = binder.bind_arguments(&mut action(duplicated), &binding, None).await;
        assert!(matches!(result, Err(BindingError::AmbiguousParameter { count: 2, .. })));

        let descriptor = ControllerActionDescriptor::new(method("get"))
            .with_parameters(vec![ParameterDescriptor::new("missing")]);
        let result = binder.bind_arguments(&mut ActionContext::new(Arc::new(descriptor)), &binding, None).await;
        assert!(matches!(result, Err(BindingError::MemberNotFound { .. })));
    }

    #[test]
    fn test_typed_argument_conversion_error() {
        let arguments = ActionArguments { values: [("id".to_owned(), json!("abc"))].into_iter().collect() };
        assert!(matches!(arguments.get::<i32>("id"), Err(BindingError::Conversion { .. })));
        assert_eq!(arguments.get::<i32>("other").unwrap(), None);
    }
}
