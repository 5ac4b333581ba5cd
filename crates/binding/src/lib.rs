//! An async model binding and validation pipeline.
//!
//! Request data is exposed through [`value::ValueProvider`]s as flat, qualified keys such as
//! `order.Lines[0].Sku`. [`DefaultControllerArgumentBinder`] resolves the metadata of every action
//! parameter, asks the [`binder::CompositeModelBinder`] chain to build a value for it, validates
//! what was bound and records every per field problem in a [`ModelState`]. The invocation layer
//! inspects the model state and decides how to answer the request.
//!
//! # Example
//!
//! ```
//! use micro_binding::details::BindingSource;
//! use micro_binding::metadata::{Describe, MethodDescriptor, ParameterInfo, TypeDescriptor, TypeRef};
//! use micro_binding::value::{CompositeValueProvider, NameValueProvider};
//! use micro_binding::{ActionBindingContext, ActionContext, ControllerActionDescriptor, DefaultControllerArgumentBinder};
//! use std::sync::Arc;
//!
//! struct Orders;
//!
//! impl Describe for Orders {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::complex("Orders").build()
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let method = MethodDescriptor::new(TypeRef::of::<Orders>(), "get").parameter(ParameterInfo::new("id", TypeRef::of::<u64>()));
//! let mut action_context = ActionContext::new(Arc::new(ControllerActionDescriptor::new(method)));
//!
//! let query = NameValueProvider::from_pairs(BindingSource::Query, [("id", "42")]);
//! let binding = ActionBindingContext::new(CompositeValueProvider::new().with(query));
//!
//! let binder = DefaultControllerArgumentBinder::default();
//! let arguments = binder.bind_arguments(&mut action_context, &binding, None).await.unwrap();
//! assert_eq!(arguments.get::<u64>("id").unwrap(), Some(42));
//! assert!(action_context.model_state().is_valid());
//! # });
//! ```

mod argument;
mod error;
mod model_state;
mod named_field;
mod options;

pub mod binder;
pub mod details;
pub mod metadata;
pub mod validation;
pub mod value;

pub use argument::ActionArguments;
pub use argument::ActionBindingContext;
pub use argument::ActionContext;
pub use argument::ActionDescriptor;
pub use argument::ControllerActionDescriptor;
pub use argument::DefaultControllerArgumentBinder;
pub use argument::DefaultControllerArgumentBinderBuilder;
pub use argument::ParameterDescriptor;
pub use details::Attribute;
pub use error::BindingError;
pub use error::BoxError;
pub use model_state::ErrorMap;
pub use model_state::ModelError;
pub use model_state::ModelState;
pub use model_state::ModelStateEntry;
pub use model_state::ValidationState;
pub use named_field::apply_named_fields;
pub use named_field::NamedFieldSetters;
pub use named_field::NamedFields;
pub use named_field::SetNamedField;
pub use options::BindingOptions;
pub use options::BindingOptionsBuilder;
pub use options::ErrorLimit;
pub use options::DEFAULT_MAX_MODEL_VALIDATION_ERRORS;
