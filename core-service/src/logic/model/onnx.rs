//! ONNX Runtime backend
//!
//! Expects a regressor exported with a single `(1, n)` float input and a
//! scalar-per-row output (the usual sklearn / xgboost converter shape).

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use super::inference::{check_width, InferenceError, ModelMetadata, RegressionModel};
use crate::logic::features::FeatureVector;

pub struct OnnxRegressor {
    // `Session::run` needs `&mut`, so concurrent requests serialize here
    session: Mutex<Session>,
    metadata: ModelMetadata,
}

impl OnnxRegressor {
    /// Build a session from model bytes
    pub fn from_bytes(model_bytes: &[u8], metadata: ModelMetadata) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| InferenceError(format!("Load from memory error: {}", e)))?;

        Ok(Self {
            session: Mutex::new(session),
            metadata,
        })
    }
}

impl RegressionModel for OnnxRegressor {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError> {
        check_width(input, self.metadata.features)?;

        let input_array = Array2::<f32>::from_shape_vec((1, input.len()), input.to_f32())
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| InferenceError("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?;

        Ok(data.iter().map(|&v| f64::from(v)).collect())
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
