//! Validation data types

use std::collections::HashMap;

use serde::Serialize;

/// Caller-supplied field → value mapping (JSON object semantics).
/// Key order is the order fields arrived in.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Validated values, one finite entry per schema field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord {
    values: HashMap<String, f64>,
}

impl NormalizedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn insert(&mut self, key: String, value: f64) {
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for NormalizedRecord {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Outcome of validating one record. The error list of `Invalid` is never
/// empty and keeps discovery order.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    Valid(NormalizedRecord),
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid(_))
    }

    pub fn errors(&self) -> &[String] {
        match self {
            ValidationResult::Valid(_) => &[],
            ValidationResult::Invalid(errors) => errors,
        }
    }

    pub fn into_result(self) -> Result<NormalizedRecord, Vec<String>> {
        match self {
            ValidationResult::Valid(record) => Ok(record),
            ValidationResult::Invalid(errors) => Err(errors),
        }
    }
}
