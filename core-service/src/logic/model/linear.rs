//! Linear regression backend

use super::inference::{check_width, InferenceError, ModelMetadata, RegressionModel};
use crate::logic::features::FeatureVector;

#[derive(Debug, Clone)]
pub struct LinearRegressor {
    intercept: f64,
    coefficients: Vec<f64>,
    metadata: ModelMetadata,
}

impl LinearRegressor {
    pub fn new(intercept: f64, coefficients: Vec<f64>, metadata: ModelMetadata) -> Self {
        Self {
            intercept,
            coefficients,
            metadata,
        }
    }
}

impl RegressionModel for LinearRegressor {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        check_width(input, self.coefficients.len())?;

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(input.as_slice())
            .map(|(w, x)| w * x)
            .sum();

        Ok(vec![self.intercept + dot])
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
