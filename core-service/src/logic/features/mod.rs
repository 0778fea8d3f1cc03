//! Features Module - Schema and positional vector assembly
//!
//! The schema is the single source of truth for which fields are accepted,
//! their ranges, and the order the model consumes them in.

pub mod layout;
pub mod vector;


// Re-export common types
pub use layout::{
    compute_layout_hash, Bound, CrossFieldRule, FeatureSchema, FieldSpec, LayoutInfo,
    LayoutMismatchError, SchemaError,
    FEATURE_COUNT, HOUSING_LAYOUT,
};
pub use vector::{FeatureVector, ProjectionError};
