use crate::metadata::{FieldMetadata, MetadataProvider};
use crate::model_state::{ModelState, ValidationState};
use crate::validation::{ModelExplorer, ModelValidationContext, ValidatorProvider};
use crate::Attribute;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Validates a bound model and records the failures in the [`ModelState`].
pub trait ObjectModelValidator: Send + Sync {
    fn validate(
        &self,
        model_state: &mut ModelState,
        validator_provider: &dyn ValidatorProvider,
        key: &str,
        metadata: &Arc<FieldMetadata>,
        model: Option<&Value>,
    );
}

/// Walks the model depth first, children before their parent.
///
/// A nested node is visited only when binding recorded something under its key, it is required,
/// or it sits below a field read from a greedy source, which records nothing under nested keys.
/// Nodes without errors are marked valid, nothing is visited once the error cap is reached.
#[derive(Clone)]
pub struct DefaultObjectValidator {
    metadata_provider: Arc<dyn MetadataProvider>,
}

impl DefaultObjectValidator {
    pub fn new(metadata_provider: Arc<dyn MetadataProvider>) -> Self {
        Self { metadata_provider }
    }
}

impl std::fmt::Debug for DefaultObjectValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultObjectValidator").finish_non_exhaustive()
    }
}

impl ObjectModelValidator for DefaultObjectValidator {
    fn validate(
        &self,
        model_state: &mut ModelState,
        validator_provider: &dyn ValidatorProvider,
        key: &str,
        metadata: &Arc<FieldMetadata>,
        model: Option<&Value>,
    ) {
        let explorer = ModelExplorer::new(self.metadata_provider.as_ref(), Arc::clone(metadata), model);
        let mut visitor = ValidationVisitor { model_state, validator_provider };
        visitor.visit(&explorer, key, true, false);
    }
}

struct ValidationVisitor<'a> {
    model_state: &'a mut ModelState,
    validator_provider: &'a dyn ValidatorProvider,
}

impl ValidationVisitor<'_> {
    fn visit(&mut self, explorer: &ModelExplorer<'_>, key: &str, is_top_level: bool, from_greedy_source: bool) {
        if self.model_state.has_reached_max_errors() {
            return;
        }

        let metadata = explorer.metadata();
        let from_greedy_source =
            from_greedy_source || metadata.binding_source().is_some_and(|source| source.is_greedy());
        let is_required = metadata.validator_attributes().iter().any(|attribute| matches!(attribute, Attribute::Required));
        if !is_top_level && !from_greedy_source && !is_required && !self.model_state.contains_prefix(key) {
            trace!(key, "skip validation of unbound field");
            return;
        }

        for child in explorer.children(key) {
            self.visit(&child.explorer, &child.key, false, from_greedy_source);
        }

        let context = ModelValidationContext { metadata, model: explorer.model(), key };
        for validator in self.validator_provider.validators_for(metadata) {
            for failure in validator.validate(&context) {
                self.model_state.try_add_model_error(key, failure.message);
            }
        }

        if self.model_state.get_field_validation_state(key) != ValidationState::Invalid {
            self.model_state.mark_field_valid(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DefaultObjectValidator, ObjectModelValidator};
    use crate::details::BinderMetadata;
    use crate::metadata::{DefaultMetadataProvider, Describe, MetadataProvider, TypeDescriptor, TypeRef};
    use crate::model_state::{ModelState, ValidationState};
    use crate::options::ErrorLimit;
    use crate::validation::DefaultValidatorProvider;
    use crate::Attribute;
    use serde_json::json;
    use std::sync::Arc;

    struct Line;

    impl Describe for Line {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("Line")
                .property_with::<String>("Sku", [Attribute::Required, Attribute::StringLength { min: 0, max: 4 }])
                .property_with::<u32>("Quantity", [Attribute::Range { min: 1.0, max: 99.0 }])
                .property_with::<String>("Comment", [Attribute::StringLength { min: 0, max: 2 }])
                .build()
        }
    }

    struct Order;

    impl Describe for Order {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("Order").property::<Vec<Line>>("Lines").build()
        }
    }

    struct Envelope;

    impl Describe for Envelope {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::complex("Envelope")
                .property_with::<Order>("Payload", [BinderMetadata::from_body().into()])
                .property::<Order>("Draft")
                .build()
        }
    }

    fn validate_as<T: Describe>(model_state: &mut ModelState, key: &str, model: &serde_json::Value) {
        let provider = Arc::new(DefaultMetadataProvider::new());
        let metadata = provider.get_metadata_for_type(TypeRef::of::<T>());
        let validator = DefaultObjectValidator::new(provider);
        validator.validate(model_state, &DefaultValidatorProvider, key, &metadata, Some(model));
    }

    fn validate(model_state: &mut ModelState, model: &serde_json::Value) {
        validate_as::<Order>(model_state, "order", model);
    }

    #[test]
    fn test_records_failures_under_node_keys() {
        let mut model_state = ModelState::new();
        model_state.set_model_value("order.Lines[0].Sku", vec!["TOO-LONG".into()], "TOO-LONG");
        model_state.set_model_value("order.Lines[0].Quantity", vec!["0".into()], "0");
        let model = json!({ "Lines": [{ "Sku": "TOO-LONG", "Quantity": 0, "Comment": "ignored" }] });

        validate(&mut model_state, &model);

        assert_eq!(
            model_state.errors("order.Lines[0].Sku")[0].message,
            "The field Sku must be a string with a maximum length of 4."
        );
        assert_eq!(model_state.errors("order.Lines[0].Quantity")[0].message, "The field Quantity must be between 1 and 99.");
        assert!(!model_state.contains_key("order.Lines[0].Comment"));
        assert_eq!(model_state.get_field_validation_state("order"), ValidationState::Invalid);
    }

    #[test]
    fn test_required_fields_are_validated_even_when_unbound() {
        let mut model_state = ModelState::new();
        model_state.set_model_value("order.Lines[0].Quantity", vec!["2".into()], "2");
        let model = json!({ "Lines": [{ "Sku": "", "Quantity": 2, "Comment": "" }] });

        validate(&mut model_state, &model);

        assert_eq!(model_state.errors("order.Lines[0].Sku")[0].message, "The Sku field is required.");
        assert_eq!(model_state.get("order.Lines[0].Quantity").unwrap().validation_state(), ValidationState::Valid);
    }

    #[test]
    fn test_valid_model_marks_nodes_valid() {
        let mut model_state = ModelState::new();
        model_state.set_model_value("order.Lines[0].Sku", vec!["A-1".into()], "A-1");
        let model = json!({ "Lines": [{ "Sku": "A-1", "Quantity": 1, "Comment": "" }] });

        validate(&mut model_state, &model);

        assert!(model_state.is_valid());
        assert_eq!(model_state.get_field_validation_state("order"), ValidationState::Valid);
    }

    #[test]
    fn test_stops_at_error_cap() {
        let mut model_state = ModelState::with_max_allowed_errors(ErrorLimit::Max(1));
        model_state.try_add_model_error("id", "bad");
        model_state.try_add_model_error("id", "dropped");
        let model = json!({ "Lines": [{ "Sku": "", "Quantity": 0, "Comment": "" }] });

        validate(&mut model_state, &model);

        assert_eq!(model_state.error_count(), 1);
        assert!(!model_state.contains_key("order.Lines[0].Sku"));
    }

    #[test]
    fn test_greedy_source_subtree_is_validated_without_entries() {
        let mut model_state = ModelState::new();
        let line = json!({ "Sku": "A-1", "Quantity": 0, "Comment": "too long" });
        let model = json!({ "Payload": { "Lines": [line] }, "Draft": { "Lines": [line] } });

        validate_as::<Envelope>(&mut model_state, "envelope", &model);

        assert_eq!(
            model_state.errors("envelope.Payload.Lines[0].Quantity")[0].message,
            "The field Quantity must be between 1 and 99."
        );
        assert_eq!(model_state.errors("envelope.Payload.Lines[0].Comment").len(), 1);
        assert!(!model_state.contains_prefix("envelope.Draft"));
        assert_eq!(model_state.error_count(), 2);
    }
}
