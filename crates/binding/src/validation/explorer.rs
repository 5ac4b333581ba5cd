use crate::binder::{create_index_model_name, create_property_model_name};
use crate::metadata::{FieldMetadata, MetadataProvider, TypeKind};
use serde_json::Value;
use std::sync::Arc;

/// A read only view of a bound value together with its metadata.
#[derive(Clone)]
pub struct ModelExplorer<'a> {
    metadata: Arc<FieldMetadata>,
    model: Option<&'a Value>,
    provider: &'a dyn MetadataProvider,
}

/// A node below a [`ModelExplorer`] and the model state key it is recorded under.
#[derive(Debug, Clone)]
pub struct ModelExplorerChild<'a> {
    pub key: String,
    pub explorer: ModelExplorer<'a>,
}

impl<'a> ModelExplorer<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, metadata: Arc<FieldMetadata>, model: Option<&'a Value>) -> Self {
        Self { metadata, model, provider }
    }

    pub fn metadata(&self) -> &Arc<FieldMetadata> {
        &self.metadata
    }

    pub fn model(&self) -> Option<&'a Value> {
        self.model
    }

    /// The nodes below this one when it is recorded under `key`.
    ///
    /// Properties are read by member name and keyed by binding name, collection elements and
    /// dictionary entries are keyed by index and by key. `Option<T>` is looked through.
    pub fn children(&self, key: &str) -> Vec<ModelExplorerChild<'a>> {
        let Some(model) = self.model.filter(|model| !model.is_null()) else {
            return vec![];
        };

        match self.metadata.model_type().kind() {
            TypeKind::Simple(_) => vec![],
            TypeKind::Nullable(inner) => {
                let metadata = Arc::new(self.metadata.with_model_type(self.provider.get_metadata(*inner)));
                ModelExplorer::new(self.provider, metadata, Some(model)).children(key)
            }
            TypeKind::Complex(_) => self
                .provider
                .get_metadata_for_properties(self.metadata.model_type().type_ref())
                .into_iter()
                .filter_map(|property| {
                    let name = property.name()?.to_owned();
                    let key = create_property_model_name(key, property.binder_model_name().unwrap_or(name.as_str()));
                    let explorer = ModelExplorer::new(self.provider, property, model.get(&name));
                    Some(ModelExplorerChild { key, explorer })
                })
                .collect(),
            TypeKind::Collection(element) => {
                let Value::Array(elements) = model else {
                    return vec![];
                };
                let metadata = self.provider.get_metadata_for_type(*element);
                elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| ModelExplorerChild {
                        key: create_index_model_name(key, index),
                        explorer: ModelExplorer::new(self.provider, Arc::clone(&metadata), Some(element)),
                    })
                    .collect()
            }
            TypeKind::KeyValuePair { key: key_type, value: value_type } => [("Key", *key_type), ("Value", *value_type)]
                .into_iter()
                .map(|(side, model_type)| ModelExplorerChild {
                    key: create_property_model_name(key, side),
                    explorer: ModelExplorer::new(self.provider, self.provider.get_metadata_for_type(model_type), model.get(side)),
                })
                .collect(),
            TypeKind::Dictionary { value, .. } => {
                let Value::Object(entries) = model else {
                    return vec![];
                };
                let metadata = self.provider.get_metadata_for_type(*value);
                entries
                    .iter()
                    .map(|(entry, value)| ModelExplorerChild {
                        key: format!("{key}[{entry}]"),
                        explorer: ModelExplorer::new(self.provider, Arc::clone(&metadata), Some(value)),
                    })
                    .collect()
            }
        }
    }
}

impl std::fmt::Debug for ModelExplorer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelExplorer").field("metadata", self.metadata.identity()).field("model", &self.model).finish()
    }
}
