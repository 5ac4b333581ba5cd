use crate::details::{BindingBehavior, BindingMetadata, BindingSource, ResolvedDetails};
use crate::metadata::{ComplexShape, SimpleKind, TypeDescriptor, TypeKind, TypeRef};
use crate::Attribute;
use std::sync::Arc;

/// Identifies what a piece of metadata describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetadataIdentity {
    Type { type_name: String },
    Property { container: String, name: String },
    Parameter { method: String, name: String },
}

impl MetadataIdentity {
    pub fn for_type(type_name: impl Into<String>) -> Self {
        Self::Type { type_name: type_name.into() }
    }

    pub fn for_property(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Property { container: container.into(), name: name.into() }
    }

    pub fn for_parameter(method: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Parameter { method: method.into(), name: name.into() }
    }

    /// The member name, `None` for a bare type.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Type { .. } => None,
            Self::Property { name, .. } | Self::Parameter { name, .. } => Some(name),
        }
    }
}

/// The resolved description of a type.
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    type_ref: TypeRef,
    descriptor: TypeDescriptor,
}

impl TypeMetadata {
    pub(crate) fn new(type_ref: TypeRef, descriptor: TypeDescriptor) -> Self {
        Self { type_ref, descriptor }
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn kind(&self) -> &TypeKind {
        self.descriptor.kind()
    }

    pub fn attributes(&self) -> &[Attribute] {
        self.descriptor.attributes()
    }

    pub fn simple_kind(&self) -> Option<SimpleKind> {
        match self.kind() {
            TypeKind::Simple(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn complex_shape(&self) -> Option<&ComplexShape> {
        match self.kind() {
            TypeKind::Complex(shape) => Some(shape),
            _ => None,
        }
    }
}

/// Everything known about one bindable unit: a parameter, a property or a bare type.
///
/// Immutable once resolved, shared through `Arc`.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    identity: MetadataIdentity,
    model_type: Arc<TypeMetadata>,
    details: ResolvedDetails,
    attributes: Vec<Attribute>,
    read_only: bool,
}

impl FieldMetadata {
    pub(crate) fn new(
        identity: MetadataIdentity,
        model_type: Arc<TypeMetadata>,
        details: ResolvedDetails,
        attributes: Vec<Attribute>,
        read_only: bool,
    ) -> Self {
        Self { identity, model_type, details, attributes, read_only }
    }

    pub fn identity(&self) -> &MetadataIdentity {
        &self.identity
    }

    /// The property or parameter name.
    pub fn name(&self) -> Option<&str> {
        self.identity.name()
    }

    pub fn model_type(&self) -> &Arc<TypeMetadata> {
        &self.model_type
    }

    pub fn binding_metadata(&self) -> &BindingMetadata {
        &self.details.binding
    }

    pub fn binder_model_name(&self) -> Option<&str> {
        self.details.binding.binder_model_name.as_deref()
    }

    pub fn binding_source(&self) -> Option<BindingSource> {
        self.details.binding.binding_source
    }

    pub fn is_binding_allowed(&self) -> bool {
        self.details.binding.binding_behavior != Some(BindingBehavior::Never)
    }

    pub fn is_binding_required(&self) -> bool {
        self.details.binding.binding_behavior == Some(BindingBehavior::Required)
    }

    /// Display name override, else the member name, else the type name.
    pub fn display_name(&self) -> &str {
        self.details
            .display
            .display_name
            .as_deref()
            .or_else(|| self.name())
            .unwrap_or_else(|| self.model_type.name())
    }

    pub fn validator_attributes(&self) -> &[Attribute] {
        &self.details.validation.validator_attributes
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Same field with a different resolved binding policy.
    pub fn with_binding_metadata(&self, binding: BindingMetadata) -> Self {
        let mut metadata = self.clone();
        metadata.details.binding = binding;
        metadata
    }

    /// Same field seen through a wrapper, e.g. `T` of an `Option<T>` field.
    pub fn with_model_type(&self, model_type: Arc<TypeMetadata>) -> Self {
        let mut metadata = self.clone();
        metadata.model_type = model_type;
        metadata
    }
}
