//! Model Module - Opaque regression model boundary
//!
//! Artifact loading, backends, and the output transform.
//! Backends are swappable behind `RegressionModel`.

pub mod artifact;
pub mod inference;
pub mod linear;
pub mod output;
pub mod trees;

#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use artifact::{load_model, sha256_hex, JsonArtifact, LoadError};
pub use inference::{InferenceError, ModelMetadata, RegressionModel};
pub use linear::LinearRegressor;
pub use output::{OutputTransform, TransformError};
pub use trees::{CompiledTree, TreeEnsembleRegressor, TreeNode};
