//! Predictor - ordered projection, model call, output transform
//!
//! Every failure in here comes back as a `PredictError`. A panicking
//! backend is caught at this boundary as well.

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;

use crate::logic::features::{FeatureSchema, FeatureVector, ProjectionError};
use crate::logic::model::{OutputTransform, RegressionModel};
use crate::logic::validation::NormalizedRecord;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("malformed feature vector: {0}")]
    Projection(#[from] ProjectionError),

    #[error("model expects layout {model:08x}, vector has {vector:08x}")]
    LayoutMismatch { model: u32, vector: u32 },

    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("model returned {0} outputs, expected exactly one")]
    NotScalar(usize),

    #[error("model returned a non-finite value")]
    NonFinite,
}

/// Run one validated record through the model
pub fn predict(
    record: &NormalizedRecord,
    schema: &FeatureSchema,
    model: &dyn RegressionModel,
    transform: &OutputTransform,
) -> Result<f64, PredictError> {
    let vector = FeatureVector::project(record, schema)?;

    let expected = model.metadata().layout_hash;
    if expected != vector.layout_hash {
        return Err(PredictError::LayoutMismatch {
            model: expected,
            vector: vector.layout_hash,
        });
    }

    let outputs = catch_unwind(AssertUnwindSafe(|| model.predict(&vector)))
        .map_err(|_| PredictError::Invocation("model panicked".to_string()))?
        .map_err(|e| PredictError::Invocation(e.0))?;

    let raw = match outputs.as_slice() {
        [value] => *value,
        other => return Err(PredictError::NotScalar(other.len())),
    };

    let value = transform.apply(raw);
    if !raw.is_finite() || !value.is_finite() {
        return Err(PredictError::NonFinite);
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::{InferenceError, ModelMetadata};

    /// Echoes a fixed output, recording nothing
    struct FixedModel {
        outputs: Result<Vec<f64>, InferenceError>,
        metadata: ModelMetadata,
    }

    impl FixedModel {
        fn new(schema: &FeatureSchema, outputs: Result<Vec<f64>, InferenceError>) -> Self {
            Self {
                outputs,
                metadata: ModelMetadata {
                    model_path: "<memory>".to_string(),
                    model_type: "fixed".to_string(),
                    features: schema.len(),
                    layout_hash: schema.layout_hash(),
                    sha256: String::new(),
                    loaded_at: chrono::Utc::now(),
                },
            }
        }
    }

    impl RegressionModel for FixedModel {
        fn predict(&self, _input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            self.outputs.clone()
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }
    }

    struct PanickingModel(ModelMetadata);

    impl RegressionModel for PanickingModel {
        fn predict(&self, _input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
            panic!("backend bug");
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.0
        }
    }

    fn full_record(schema: &FeatureSchema) -> NormalizedRecord {
        schema.keys().map(|k| (k.to_string(), 1.0)).collect()
    }

    #[test]
    fn test_scalar_output_is_scaled() {
        let schema = FeatureSchema::default();
        let model = FixedModel::new(&schema, Ok(vec![4.526]));

        let value = predict(
            &full_record(&schema),
            &schema,
            &model,
            &OutputTransform::default(),
        );
        assert_eq!(value, Ok(452600.0));
    }

    #[test]
    fn test_identity_transform() {
        let schema = FeatureSchema::default();
        let model = FixedModel::new(&schema, Ok(vec![4.526]));

        let value = predict(&full_record(&schema), &schema, &model, &OutputTransform::Identity);
        assert_eq!(value, Ok(4.526));
    }

    #[test]
    fn test_non_scalar_outputs() {
        let schema = FeatureSchema::default();
        let record = full_record(&schema);

        let empty = FixedModel::new(&schema, Ok(vec![]));
        assert_eq!(
            predict(&record, &schema, &empty, &OutputTransform::Identity),
            Err(PredictError::NotScalar(0))
        );

        let many = FixedModel::new(&schema, Ok(vec![1.0, 2.0]));
        assert_eq!(
            predict(&record, &schema, &many, &OutputTransform::Identity),
            Err(PredictError::NotScalar(2))
        );
    }

    #[test]
    fn test_non_finite_output() {
        let schema = FeatureSchema::default();
        let model = FixedModel::new(&schema, Ok(vec![f64::NAN]));

        assert_eq!(
            predict(&full_record(&schema), &schema, &model, &OutputTransform::default()),
            Err(PredictError::NonFinite)
        );
    }

    #[test]
    fn test_backend_error_is_wrapped() {
        let schema = FeatureSchema::default();
        let model = FixedModel::new(&schema, Err(InferenceError("session closed".to_string())));

        assert_eq!(
            predict(&full_record(&schema), &schema, &model, &OutputTransform::default()),
            Err(PredictError::Invocation("session closed".to_string()))
        );
    }

    #[test]
    fn test_backend_panic_is_caught() {
        let schema = FeatureSchema::default();
        let model = PanickingModel(FixedModel::new(&schema, Ok(vec![])).metadata);

        assert_eq!(
            predict(&full_record(&schema), &schema, &model, &OutputTransform::default()),
            Err(PredictError::Invocation("model panicked".to_string()))
        );
    }

    #[test]
    fn test_incomplete_record() {
        let schema = FeatureSchema::default();
        let model = FixedModel::new(&schema, Ok(vec![1.0]));
        let record: NormalizedRecord = [("MedInc".to_string(), 1.0)].into_iter().collect();

        assert!(matches!(
            predict(&record, &schema, &model, &OutputTransform::default()),
            Err(PredictError::Projection(_))
        ));
    }

    #[test]
    fn test_layout_mismatch() {
        let schema = FeatureSchema::default();
        let mut model = FixedModel::new(&schema, Ok(vec![1.0]));
        model.metadata.layout_hash ^= 1;

        assert!(matches!(
            predict(&full_record(&schema), &schema, &model, &OutputTransform::default()),
            Err(PredictError::LayoutMismatch { .. })
        ));
    }
}
