//! Model artifact loading
//!
//! Artifact bytes are read once, optionally pinned by SHA-256, and turned
//! into a backend by file extension:
//! - `.json`: `{"type": "linear" | "tree_ensemble", "feature_names": [...], ...}`
//! - `.onnx`: ONNX Runtime session (requires the `onnx` feature)
//!
//! JSON artifacts declare their feature order; it must equal the schema's.

use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::inference::{ModelMetadata, RegressionModel};
use super::linear::LinearRegressor;
use super::trees::{CompiledTree, TreeEnsembleRegressor, TreeNode};
use crate::logic::features::{compute_layout_hash, FeatureSchema, LayoutMismatchError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("malformed model artifact: {0}")]
    Malformed(String),

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),
}

/// JSON artifact body
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonArtifact {
    Linear {
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    },
    TreeEnsemble {
        feature_names: Vec<String>,
        #[serde(default)]
        base_score: f64,
        trees: Vec<TreeNode>,
    },
}

/// Hex SHA-256 of artifact bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Load a model artifact from disk and check it against the schema
pub fn load_model(
    path: impl AsRef<Path>,
    expected_sha256: Option<&str>,
    schema: &FeatureSchema,
) -> Result<Box<dyn RegressionModel>, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    log::info!("Loading model from: {}", display);

    if !path.exists() {
        return Err(LoadError::NotFound(display));
    }

    let bytes = std::fs::read(path)?;
    let sha256 = sha256_hex(&bytes);

    if let Some(expected) = expected_sha256 {
        if !expected.trim().eq_ignore_ascii_case(&sha256) {
            return Err(LoadError::ChecksumMismatch {
                expected: expected.trim().to_lowercase(),
                actual: sha256,
            });
        }
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    // The layout hash records the order the artifact was built for
    let metadata = |model_type: &str, features: usize, layout_hash: u32| ModelMetadata {
        model_path: display.clone(),
        model_type: model_type.to_string(),
        features,
        layout_hash,
        sha256: sha256.clone(),
        loaded_at: chrono::Utc::now(),
    };

    let model: Box<dyn RegressionModel> = match extension.as_str() {
        "json" => {
            let artifact: JsonArtifact = serde_json::from_slice(&bytes)?;
            build_json_model(artifact, schema, metadata)?
        }
        // ONNX graphs carry no feature names, the schema order is assumed
        "onnx" => load_onnx(&bytes, metadata("onnx", schema.len(), schema.layout_hash()))?,
        other => return Err(LoadError::UnsupportedFormat(format!("'.{}'", other))),
    };

    let meta = model.metadata();
    log::info!(
        "Model loaded: type={} features={} layout={:08x} sha256={}",
        meta.model_type,
        meta.features,
        meta.layout_hash,
        meta.sha256
    );

    Ok(model)
}

fn build_json_model(
    artifact: JsonArtifact,
    schema: &FeatureSchema,
    metadata: impl Fn(&str, usize, u32) -> ModelMetadata,
) -> Result<Box<dyn RegressionModel>, LoadError> {
    match artifact {
        JsonArtifact::Linear {
            feature_names,
            intercept,
            coefficients,
        } => {
            schema.validate_layout(&feature_names)?;
            if coefficients.len() != schema.len() {
                return Err(LoadError::Malformed(format!(
                    "{} coefficients for {} features",
                    coefficients.len(),
                    schema.len()
                )));
            }
            if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                return Err(LoadError::Malformed("non-finite weight".to_string()));
            }

            Ok(Box::new(LinearRegressor::new(
                intercept,
                coefficients,
                metadata(
                    "linear",
                    feature_names.len(),
                    compute_layout_hash(names(&feature_names)),
                ),
            )))
        }
        JsonArtifact::TreeEnsemble {
            feature_names,
            base_score,
            trees,
        } => {
            schema.validate_layout(&feature_names)?;
            if trees.is_empty() {
                return Err(LoadError::Malformed("ensemble has no trees".to_string()));
            }

            let compiled = trees
                .iter()
                .enumerate()
                .map(|(i, tree)| {
                    CompiledTree::compile(tree, schema)
                        .map_err(|e| LoadError::Malformed(format!("tree {}: {}", i, e)))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Box::new(TreeEnsembleRegressor::new(
                base_score,
                compiled,
                schema.len(),
                metadata(
                    "tree_ensemble",
                    feature_names.len(),
                    compute_layout_hash(names(&feature_names)),
                ),
            )))
        }
    }
}

fn names(feature_names: &[String]) -> impl Iterator<Item = &str> {
    feature_names.iter().map(String::as_str)
}

#[cfg(feature = "onnx")]
fn load_onnx(bytes: &[u8], metadata: ModelMetadata) -> Result<Box<dyn RegressionModel>, LoadError> {
    let model = super::onnx::OnnxRegressor::from_bytes(bytes, metadata)
        .map_err(|e| LoadError::Malformed(e.0))?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_bytes: &[u8], _metadata: ModelMetadata) -> Result<Box<dyn RegressionModel>, LoadError> {
    Err(LoadError::UnsupportedFormat(
        "ONNX artifacts require the `onnx` feature".to_string(),
    ))
}
