//! Feature Vector - Core data structure for model input
//!
//! **Positional vector tagged with the schema layout hash**
//!
//! The vector is only ever built by projecting a validated record through
//! the schema, so position `i` always holds `schema.fields()[i].key`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::layout::FeatureSchema;
use crate::logic::validation::NormalizedRecord;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("feature '{0}' missing from record")]
    MissingFeature(String),

    #[error("feature '{0}' is not a finite number")]
    NonFinite(String),
}

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// CRC32 hash of the schema layout the values were ordered by
    pub layout_hash: u32,
    /// Feature values in schema order
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Order a record by the schema, never by the record's own key order
    pub fn project(record: &NormalizedRecord, schema: &FeatureSchema) -> Result<Self, ProjectionError> {
        let mut values = Vec::with_capacity(schema.len());

        for field in schema.fields() {
            let value = record
                .get(&field.key)
                .ok_or_else(|| ProjectionError::MissingFeature(field.key.clone()))?;
            if !value.is_finite() {
                return Err(ProjectionError::NonFinite(field.key.clone()));
            }
            values.push(value);
        }

        Ok(Self {
            layout_hash: schema.layout_hash(),
            values,
        })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Single-precision copy for runtimes that take f32 tensors
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|&v| v as f32).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.index_of(name).and_then(|i| self.get(i))
    }

    /// Check this vector was ordered by `schema`
    pub fn is_compatible(&self, schema: &FeatureSchema) -> bool {
        self.layout_hash == schema.layout_hash() && self.values.len() == schema.len()
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self, schema: &FeatureSchema) -> serde_json::Value {
        let named: serde_json::Map<String, serde_json::Value> = schema
            .keys()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
            .collect();

        serde_json::json!({
            "layout_hash": self.layout_hash,
            "values": self.values,
            "named_values": named,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
