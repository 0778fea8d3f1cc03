//! Prediction Service - immutable request pipeline
//!
//! `Received -> Validating -> {Rejected | Predicting} -> {Responded | Failed}`
//!
//! Built once at startup and shared read-only across requests.

use std::path::Path;

use thiserror::Error;

use crate::logic::features::{FeatureSchema, LayoutInfo};
use crate::logic::model::{load_model, LoadError, ModelMetadata, OutputTransform, RegressionModel};
use crate::logic::predictor::{predict, PredictError};
use crate::logic::validation::{validate, RawRecord, ValidationResult};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller's fault, every problem listed
    #[error("Invalid input: {}", .0.join("; "))]
    InvalidInput(Vec<String>),

    /// Model could not produce a usable value
    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictError),
}

pub struct PredictionService {
    schema: FeatureSchema,
    model: Box<dyn RegressionModel>,
    transform: OutputTransform,
}

impl PredictionService {
    pub fn new(
        schema: FeatureSchema,
        model: Box<dyn RegressionModel>,
        transform: OutputTransform,
    ) -> Self {
        Self {
            schema,
            model,
            transform,
        }
    }

    /// Load the artifact at `path` and build the service around it
    pub fn load(
        path: impl AsRef<Path>,
        expected_sha256: Option<&str>,
        schema: FeatureSchema,
        transform: OutputTransform,
    ) -> Result<Self, LoadError> {
        let model = load_model(path, expected_sha256, &schema)?;
        Ok(Self::new(schema, model, transform))
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn layout_info(&self) -> LayoutInfo {
        self.schema.layout_info()
    }

    pub fn model_metadata(&self) -> &ModelMetadata {
        self.model.metadata()
    }

    pub fn transform(&self) -> OutputTransform {
        self.transform
    }

    /// Validate then predict. Input errors never reach the model.
    pub fn handle(&self, raw: &RawRecord) -> Result<f64, ServiceError> {
        let record = match validate(raw, &self.schema) {
            ValidationResult::Valid(record) => record,
            ValidationResult::Invalid(errors) => return Err(ServiceError::InvalidInput(errors)),
        };

        let value = predict(&record, &self.schema, self.model.as_ref(), &self.transform)?;
        log::debug!("Prediction served: {}", value);

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::LinearRegressor;
    use serde_json::json;

    fn service() -> PredictionService {
        let schema = FeatureSchema::default();
        let metadata = ModelMetadata {
            model_path: "<memory>".to_string(),
            model_type: "linear".to_string(),
            features: schema.len(),
            layout_hash: schema.layout_hash(),
            sha256: String::new(),
            loaded_at: chrono::Utc::now(),
        };
        // Weight only MedInc
        let mut coefficients = vec![0.0; schema.len()];
        coefficients[0] = 0.5;
        let model = LinearRegressor::new(0.0, coefficients, metadata);

        PredictionService::new(schema, Box::new(model), OutputTransform::default())
    }

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_handle_valid() {
        let input = raw(json!({
            "MedInc": 8.0, "HouseAge": 41, "AveRooms": 6.98, "AveBedrms": 1.02,
            "Population": 322, "AveOccup": 2.55, "Latitude": 37.88, "Longitude": -122.23
        }));

        assert_eq!(service().handle(&input).unwrap(), 400000.0);
    }

    #[test]
    fn test_handle_invalid_never_reaches_model() {
        let err = service().handle(&raw(json!({}))).unwrap_err();

        match err {
            ServiceError::InvalidInput(errors) => assert_eq!(errors.len(), 8),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::InvalidInput(vec!["A is required".into(), "B is required".into()]);
        assert_eq!(err.to_string(), "Invalid input: A is required; B is required");

        let err = ServiceError::Prediction(PredictError::NotScalar(0));
        assert_eq!(
            err.to_string(),
            "Prediction error: model returned 0 outputs, expected exactly one"
        );
    }
}
