//! The metadata provider and its process wide cache.
//!
//! Metadata is a pure function of the [`Describe`](crate::metadata::Describe) implementations, so
//! [`DefaultMetadataProvider`] memoizes every lookup for the lifetime of the provider. The cache is
//! read mostly: lookups load an immutable snapshot, misses publish a new snapshot through
//! [`ArcSwap::rcu`].

use crate::details::CompositeMetadataDetailsProvider;
use crate::error::BindingError;
use crate::metadata::{FieldMetadata, MetadataIdentity, TypeMetadata, TypeRef};
use crate::Attribute;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::convert::Infallible;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

/// A declared parameter of an action method.
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    name: String,
    model_type: TypeRef,
    attributes: Vec<Attribute>,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, model_type: TypeRef) -> Self {
        Self { name: name.into(), model_type, attributes: vec![] }
    }

    pub fn with_attribute(mut self, attribute: impl Into<Attribute>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_type(&self) -> TypeRef {
        self.model_type
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

/// The shape of an action method: where it is declared and what it takes.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    declaring_type: TypeRef,
    name: String,
    parameters: Vec<ParameterInfo>,
}

impl MethodDescriptor {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>) -> Self {
        Self { declaring_type, name: name.into(), parameters: vec![] }
    }

    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn declaring_type(&self) -> TypeRef {
        self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }
}

pub trait MetadataProvider: Send + Sync {
    fn get_metadata(&self, model_type: TypeRef) -> Arc<TypeMetadata>;

    /// Metadata of a bare type, used for collection elements and pair sides.
    fn get_metadata_for_type(&self, model_type: TypeRef) -> Arc<FieldMetadata>;

    fn get_metadata_for_property(&self, container: TypeRef, name: &str) -> Result<Arc<FieldMetadata>, BindingError>;

    /// Metadata of every property of `container` in declared order, empty if it is not complex.
    fn get_metadata_for_properties(&self, container: TypeRef) -> Vec<Arc<FieldMetadata>>;

    fn get_metadata_for_parameter(
        &self,
        method: &MethodDescriptor,
        name: &str,
    ) -> Result<Arc<FieldMetadata>, BindingError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MetadataKey {
    Type(TypeId),
    Property(TypeId, String),
    // method descriptors are runtime values, the parameter's own shape is part of its identity
    Parameter { declaring_type: TypeId, method: String, name: String, model_type: TypeId, attributes: u64 },
}

impl MetadataKey {
    fn parameter(method: &MethodDescriptor, parameter: &ParameterInfo) -> Self {
        let mut hasher = DefaultHasher::new();
        parameter.attributes().hash(&mut hasher);
        Self::Parameter {
            declaring_type: method.declaring_type().id(),
            method: method.name().to_owned(),
            name: parameter.name().to_owned(),
            model_type: parameter.model_type().id(),
            attributes: hasher.finish(),
        }
    }
}

type Cache<K, V> = ArcSwap<HashMap<K, Arc<V>>>;

static GLOBAL_PROVIDER: Lazy<Arc<DefaultMetadataProvider>> = Lazy::new(|| Arc::new(DefaultMetadataProvider::new()));

/// Memoizing [`MetadataProvider`].
pub struct DefaultMetadataProvider {
    details: Arc<CompositeMetadataDetailsProvider>,
    types: Cache<TypeId, TypeMetadata>,
    fields: Cache<MetadataKey, FieldMetadata>,
}

impl DefaultMetadataProvider {
    pub fn new() -> Self {
        Self::with_details(Arc::new(CompositeMetadataDetailsProvider::default()))
    }

    pub fn with_details(details: Arc<CompositeMetadataDetailsProvider>) -> Self {
        Self {
            details,
            types: ArcSwap::from_pointee(HashMap::new()),
            fields: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Returns the process wide provider using the default details providers.
    pub fn global() -> Arc<DefaultMetadataProvider> {
        Arc::clone(&GLOBAL_PROVIDER)
    }

    pub fn details(&self) -> &Arc<CompositeMetadataDetailsProvider> {
        &self.details
    }

    fn create_field(
        &self,
        identity: MetadataIdentity,
        model_type: TypeRef,
        attributes: Vec<Attribute>,
        read_only: bool,
    ) -> Arc<FieldMetadata> {
        let model_type = self.get_metadata(model_type);
        let details = self.details.resolve(&identity, &attributes);
        Arc::new(FieldMetadata::new(identity, model_type, details, attributes, read_only))
    }
}

impl Default for DefaultMetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefaultMetadataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetadataProvider")
            .field("types", &self.types.load().len())
            .field("fields", &self.fields.load().len())
            .finish()
    }
}

fn cached<K, V, E, F>(cache: &Cache<K, V>, key: K, create: F) -> Result<Arc<V>, E>
where
    K: Clone + Eq + Hash,
    F: FnOnce() -> Result<Arc<V>, E>,
{
    if let Some(value) = cache.load().get(&key) {
        return Ok(Arc::clone(value));
    }

    let created = create()?;
    cache.rcu(|current| {
        let mut next = HashMap::clone(current);
        next.entry(key.clone()).or_insert_with(|| Arc::clone(&created));
        next
    });

    // a concurrent miss may have published first, hand out the winner
    Ok(cache.load().get(&key).map(Arc::clone).unwrap_or(created))
}

fn get_or_insert<K, V, F>(cache: &Cache<K, V>, key: K, create: F) -> Arc<V>
where
    K: Clone + Eq + Hash,
    F: FnOnce() -> Arc<V>,
{
    let Ok(value) = cached(cache, key, || Ok::<_, Infallible>(create()));
    value
}

impl MetadataProvider for DefaultMetadataProvider {
    fn get_metadata(&self, model_type: TypeRef) -> Arc<TypeMetadata> {
        get_or_insert(&self.types, model_type.id(), || Arc::new(TypeMetadata::new(model_type, model_type.describe())))
    }

    fn get_metadata_for_type(&self, model_type: TypeRef) -> Arc<FieldMetadata> {
        get_or_insert(&self.fields, MetadataKey::Type(model_type.id()), || {
            let type_metadata = self.get_metadata(model_type);
            let identity = MetadataIdentity::for_type(type_metadata.name());
            self.create_field(identity, model_type, type_metadata.attributes().to_vec(), false)
        })
    }

    fn get_metadata_for_property(&self, container: TypeRef, name: &str) -> Result<Arc<FieldMetadata>, BindingError> {
        cached(&self.fields, MetadataKey::Property(container.id(), name.to_owned()), || {
            let container_metadata = self.get_metadata(container);
            let property = container_metadata
                .complex_shape()
                .and_then(|shape| shape.property(name))
                .ok_or_else(|| BindingError::member_not_found(container_metadata.name(), name))?;

            // property attributes come first so they win over the attributes of the property type
            let property_type = self.get_metadata(property.model_type());
            let attributes =
                property.attributes().iter().chain(property_type.attributes()).cloned().collect::<Vec<_>>();
            let identity = MetadataIdentity::for_property(container_metadata.name(), name);
            Ok(self.create_field(identity, property.model_type(), attributes, !property.is_writable()))
        })
    }

    fn get_metadata_for_properties(&self, container: TypeRef) -> Vec<Arc<FieldMetadata>> {
        let container_metadata = self.get_metadata(container);
        let Some(shape) = container_metadata.complex_shape() else {
            return vec![];
        };

        shape
            .properties()
            .iter()
            .filter_map(|property| self.get_metadata_for_property(container, property.name()).ok())
            .collect()
    }

    fn get_metadata_for_parameter(
        &self,
        method: &MethodDescriptor,
        name: &str,
    ) -> Result<Arc<FieldMetadata>, BindingError> {
        let mut matched = method.parameters().iter().filter(|parameter| parameter.name() == name);
        let parameter = matched.next().ok_or_else(|| BindingError::member_not_found(method.name(), name))?;
        let duplicates = matched.count();
        if duplicates > 0 {
            return Err(BindingError::ambiguous_parameter(method.name(), name, duplicates + 1));
        }

        cached(&self.fields, MetadataKey::parameter(method, parameter), || {
            let identity = MetadataIdentity::for_parameter(method.name(), name);
            let parameter_type = self.get_metadata(parameter.model_type());
            let attributes =
                parameter.attributes().iter().chain(parameter_type.attributes()).cloned().collect::<Vec<_>>();
            Ok(self.create_field(identity, parameter.model_type(), attributes, false))
        })
    }
}
