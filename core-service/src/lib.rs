//! Housing Value Predictor - Core
//!
//! Validates a raw feature record, orders it by the training-time layout,
//! and runs it through a pre-trained regression model.
//!
//! ```text
//! raw record ──► validate ──► Valid ──► FeatureVector ──► model ──► transform ──► f64
//!                    │
//!                    └──► Invalid(errors)
//! ```

pub mod constants;
pub mod logic;

pub use logic::features::{Bound, FeatureSchema, FeatureVector, FieldSpec, LayoutInfo};
pub use logic::model::{LoadError, ModelMetadata, OutputTransform, RegressionModel, TransformError};
pub use logic::predictor::{predict, PredictError};
pub use logic::service::{PredictionService, ServiceError};
pub use logic::validation::{validate, NormalizedRecord, RawRecord, ValidationResult};
