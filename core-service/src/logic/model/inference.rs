//! Inference Engine - Opaque model boundary
//!
//! Every backend (linear, tree ensemble, ONNX) sits behind one trait so the
//! predictor never knows which artifact format was loaded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features::FeatureVector;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String, // "linear", "tree_ensemble" or "onnx"
    pub features: usize,
    /// Layout hash of the feature order the model was built for
    pub layout_hash: u32,
    /// Hex SHA-256 of the artifact bytes
    pub sha256: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error("InferenceError: {0}")]
pub struct InferenceError(pub String);

// ============================================================================
// INFERENCE ENGINE TRAIT
// ============================================================================

/// A loaded, read-only regression model.
///
/// `predict` returns every output value the backend produced. Checking that
/// there is exactly one is the caller's job.
pub trait RegressionModel: Send + Sync {
    fn predict(&self, input: &FeatureVector) -> Result<Vec<f64>, InferenceError>;
    fn metadata(&self) -> &ModelMetadata;
}

/// Shared arity check for backends with a fixed input width
pub(crate) fn check_width(input: &FeatureVector, expected: usize) -> Result<(), InferenceError> {
    if input.len() != expected {
        return Err(InferenceError(format!(
            "expected {} features, got {}",
            expected,
            input.len()
        )));
    }
    Ok(())
}
