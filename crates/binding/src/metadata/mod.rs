//! Type descriptions and the metadata provider.
//!
//! Bindable types expose their shape through [`Describe`]. The description is lazy: properties
//! refer to their types through [`TypeRef`], so recursive types are fine and nothing is resolved
//! until a [`MetadataProvider`] is asked for it.
//!
//! # Example
//! ```
//! use micro_binding::metadata::{Describe, TypeDescriptor};
//! use micro_binding::Attribute;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(rename_all = "PascalCase")]
//! struct Order {
//!     id: i32,
//!     sku: String,
//!     lines: Vec<Order>,
//! }
//!
//! impl Describe for Order {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::complex("Order")
//!             .constructible::<Order>()
//!             .property::<i32>("Id")
//!             .property_with::<String>("Sku", [Attribute::Required])
//!             .property::<Vec<Order>>("Lines")
//!             .build()
//!     }
//! }
//! ```

mod builtin;
mod field;
mod provider;

pub use builtin::KeyValuePair;
pub use field::FieldMetadata;
pub use field::MetadataIdentity;
pub use field::TypeMetadata;
pub use provider::DefaultMetadataProvider;
pub use provider::MetadataProvider;
pub use provider::MethodDescriptor;
pub use provider::ParameterInfo;

use crate::Attribute;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Describes the bindable shape of a type.
pub trait Describe: 'static {
    fn describe() -> TypeDescriptor;
}

/// A lazily described type identity.
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    type_name: &'static str,
    describe: fn() -> TypeDescriptor,
}

impl TypeRef {
    pub fn of<T: Describe>() -> Self {
        Self { id: TypeId::of::<T>(), type_name: std::any::type_name::<T>(), describe: T::describe }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler provided type name, only meant for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn describe(&self) -> TypeDescriptor {
        (self.describe)()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.type_name).finish()
    }
}

/// Scalar types converted from a single raw string value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimpleKind {
    Bool,
    Signed { min: i64, max: i64 },
    Unsigned { max: u64 },
    /// `max` is the largest finite magnitude the target type holds.
    Float { max: f64 },
    Char,
    String,
}

/// The structural category of a type, it selects the binder that handles it.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Simple(SimpleKind),
    Nullable(TypeRef),
    Collection(TypeRef),
    KeyValuePair { key: TypeRef, value: TypeRef },
    Dictionary { key: TypeRef, value: TypeRef },
    Complex(ComplexShape),
}

/// A bindable property of a complex type.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    model_type: TypeRef,
    attributes: Vec<Attribute>,
    writable: bool,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> TypeRef {
        self.model_type
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

type Constructor = fn() -> Result<Value, serde_json::Error>;

/// Properties of a complex type plus the way to obtain its default instance.
#[derive(Debug, Clone, Default)]
pub struct ComplexShape {
    properties: Vec<PropertyDescriptor>,
    constructor: Option<Constructor>,
}

impl ComplexShape {
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }

    /// A type is constructible when it has a parameterless construction path.
    pub fn is_constructible(&self) -> bool {
        self.constructor.is_some()
    }

    /// Builds the default instance, `None` if the type is not constructible.
    pub fn construct(&self) -> Option<Result<Value, serde_json::Error>> {
        self.constructor.map(|constructor| constructor())
    }
}

/// The description [`Describe::describe`] returns.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    attributes: Vec<Attribute>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self { name: name.into(), kind, attributes: vec![] }
    }

    pub fn simple(name: impl Into<String>, kind: SimpleKind) -> Self {
        Self::new(name, TypeKind::Simple(kind))
    }

    pub fn complex(name: impl Into<String>) -> ComplexDescriptorBuilder {
        ComplexDescriptorBuilder::new(name.into())
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// Builder of [`TypeKind::Complex`] descriptors.
///
/// Property names are used both as the default binding name and as the member name in the
/// serialized model, so they must match the serde name of the field.
#[derive(Debug)]
pub struct ComplexDescriptorBuilder {
    name: String,
    shape: ComplexShape,
    attributes: Vec<Attribute>,
}

impl ComplexDescriptorBuilder {
    fn new(name: String) -> Self {
        Self { name, shape: ComplexShape::default(), attributes: vec![] }
    }

    /// Uses `T::default()` as the instance bound properties are applied onto.
    pub fn constructible<T: Default + Serialize>(mut self) -> Self {
        self.shape.constructor = Some(default_instance::<T>);
        self
    }

    pub fn property<T: Describe>(self, name: impl Into<String>) -> Self {
        self.property_with::<T>(name, [])
    }

    pub fn property_with<T: Describe>(
        mut self,
        name: impl Into<String>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        self.shape.properties.push(PropertyDescriptor {
            name: name.into(),
            model_type: TypeRef::of::<T>(),
            attributes: attributes.into_iter().collect(),
            writable: true,
        });
        self
    }

    /// Declares a property that is described but never bound.
    pub fn read_only<T: Describe>(mut self, name: impl Into<String>) -> Self {
        self.shape.properties.push(PropertyDescriptor {
            name: name.into(),
            model_type: TypeRef::of::<T>(),
            attributes: vec![],
            writable: false,
        });
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor { name: self.name, kind: TypeKind::Complex(self.shape), attributes: self.attributes }
    }
}

fn default_instance<T: Default + Serialize>() -> Result<Value, serde_json::Error> {
    serde_json::to_value(T::default())
}
