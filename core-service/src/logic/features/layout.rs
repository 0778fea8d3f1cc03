//! Feature Layout - Centralized Feature Schema
//!
//! **CRITICAL: This file controls the feature order fed to the model**
//!
//! ## Rules (NEVER break these):
//! 1. Field order MUST match the column order the model was trained on
//! 2. Order is never derived from request order
//! 3. Any change to keys or order changes the layout hash
//!
//! The model has no schema awareness of its own. A permuted vector still
//! produces a plausible number, so the layout hash is the only runtime guard.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// Range bound that remembers whether it was written as an integer or a
/// float, so messages print `40000` and `-114.0` the way the table has them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    pub fn value(&self) -> f64 {
        match *self {
            Bound::Int(v) => v as f64,
            Bound::Float(v) => v,
        }
    }
}

impl From<i64> for Bound {
    fn from(v: i64) -> Self {
        Bound::Int(v)
    }
}

impl From<f64> for Bound {
    fn from(v: f64) -> Self {
        Bound::Float(v)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Bound::Int(v) => write!(f, "{}", v),
            // Whole floats keep their ".0"
            Bound::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Bound::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One model input dimension with its accepted range (both bounds inclusive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,
    pub display_name: String,
    pub min: Bound,
    pub max: Bound,
}

impl FieldSpec {
    pub fn new(key: &str, display_name: &str, min: impl Into<Bound>, max: impl Into<Bound>) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            min: min.into(),
            max: max.into(),
        }
    }

    /// Check value against `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min.value() && value <= self.max.value()
    }
}

/// Consistency rule spanning two fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CrossFieldRule {
    /// `field` must not exceed `limit`
    NotGreaterThan { field: String, limit: String },
}

// ============================================================================
// DEFAULT LAYOUT (California housing)
// ============================================================================

/// Keys in exact training column order
pub const HOUSING_LAYOUT: &[&str] = &[
    "MedInc",     // 0: Median income in block group
    "HouseAge",   // 1: Median house age in block group
    "AveRooms",   // 2: Average rooms per household
    "AveBedrms",  // 3: Average bedrooms per household
    "Population", // 4: Block group population
    "AveOccup",   // 5: Average household members
    "Latitude",   // 6
    "Longitude",  // 7
];

/// Total number of features in the default layout
/// IMPORTANT: Must match HOUSING_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 8;

fn housing_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("MedInc", "Median Income", Bound::Float(0.5), Bound::Int(20)),
        FieldSpec::new("HouseAge", "House Age", Bound::Int(0), Bound::Int(55)),
        FieldSpec::new("AveRooms", "Average Rooms", 1.0, 15.0),
        FieldSpec::new("AveBedrms", "Average Bedrooms", 0.0, 3.0),
        FieldSpec::new("Population", "Population", Bound::Int(100), Bound::Int(40000)),
        FieldSpec::new("AveOccup", "Average Occupancy", 1.0, 10.0),
        FieldSpec::new("Latitude", "Latitude", 32.5, 42.0),
        FieldSpec::new("Longitude", "Longitude", -124.5, -114.0),
    ]
}

fn housing_rules() -> Vec<CrossFieldRule> {
    vec![CrossFieldRule::NotGreaterThan {
        field: "AveBedrms".to_string(),
        limit: "AveRooms".to_string(),
    }]
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema has no fields")]
    Empty,

    #[error("duplicate field key '{0}'")]
    DuplicateKey(String),

    #[error("field '{key}' has invalid bounds [{min}, {max}]")]
    InvalidBounds { key: String, min: Bound, max: Bound },

    #[error("rule references unknown field '{0}'")]
    UnknownRuleField(String),

    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error when a feature order doesn't match the schema
#[derive(Debug, Clone, Error)]
#[error(
    "Feature layout mismatch: expected {expected_count} features (hash: {expected_hash:08x}), \
     got {actual_count} (hash: {actual_hash:08x})"
)]
pub struct LayoutMismatchError {
    pub expected_hash: u32,
    pub expected_count: usize,
    pub actual_hash: u32,
    pub actual_count: usize,
}

// ============================================================================
// SCHEMA
// ============================================================================

/// On-disk form used to override the default schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub rules: Vec<CrossFieldRule>,
}

/// Ordered, immutable feature schema shared by validation and prediction
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    fields: Vec<FieldSpec>,
    rules: Vec<CrossFieldRule>,
    layout_hash: u32,
}

impl FeatureSchema {
    pub fn new(fields: Vec<FieldSpec>, rules: Vec<CrossFieldRule>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.key.as_str()) {
                return Err(SchemaError::DuplicateKey(field.key.clone()));
            }
            let (min, max) = (field.min.value(), field.max.value());
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(SchemaError::InvalidBounds {
                    key: field.key.clone(),
                    min: field.min,
                    max: field.max,
                });
            }
        }

        for rule in &rules {
            let CrossFieldRule::NotGreaterThan { field, limit } = rule;
            for key in [field, limit] {
                if !seen.contains(key.as_str()) {
                    return Err(SchemaError::UnknownRuleField(key.clone()));
                }
            }
        }

        let layout_hash = compute_layout_hash(fields.iter().map(|f| f.key.as_str()));

        Ok(Self { fields, rules, layout_hash })
    }

    /// Default eight-feature housing schema
    pub fn california_housing() -> Self {
        let fields = housing_fields();
        let layout_hash = compute_layout_hash(fields.iter().map(|f| f.key.as_str()));

        Self {
            fields,
            rules: housing_rules(),
            layout_hash,
        }
    }

    /// Parse a schema override from JSON
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile = serde_json::from_str(source)?;
        Self::new(file.fields, file.rules)
    }

    /// Load a schema override from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn rules(&self) -> &[CrossFieldRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get field by key (O(n) but fields are few)
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Get position of a key in the layout
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key.as_str())
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    /// Check that an externally declared feature order (e.g. from a model
    /// artifact) is exactly this schema's order
    pub fn validate_layout<S: AsRef<str>>(&self, names: &[S]) -> Result<(), LayoutMismatchError> {
        let actual_hash = compute_layout_hash(names.iter().map(|n| n.as_ref()));

        if actual_hash != self.layout_hash || names.len() != self.fields.len() {
            return Err(LayoutMismatchError {
                expected_hash: self.layout_hash,
                expected_count: self.fields.len(),
                actual_hash,
                actual_count: names.len(),
            });
        }

        Ok(())
    }

    pub fn layout_info(&self) -> LayoutInfo {
        LayoutInfo {
            hash: self.layout_hash,
            feature_count: self.fields.len(),
            fields: self.fields.clone(),
            rules: self.rules.clone(),
        }
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::california_housing()
    }
}

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over keys in order, NUL separated
pub fn compute_layout_hash<'a>(keys: impl IntoIterator<Item = &'a str>) -> u32 {
    let mut hasher = Hasher::new();

    for key in keys {
        hasher.update(key.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub hash: u32,
    pub feature_count: usize,
    pub fields: Vec<FieldSpec>,
    pub rules: Vec<CrossFieldRule>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        let schema = FeatureSchema::california_housing();
        assert_eq!(HOUSING_LAYOUT.len(), FEATURE_COUNT);
        assert_eq!(schema.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_builtin_schema_passes_checks() {
        let checked = FeatureSchema::new(housing_fields(), housing_rules()).unwrap();
        assert_eq!(checked.layout_hash(), FeatureSchema::california_housing().layout_hash());
    }

    #[test]
    fn test_default_order_matches_layout() {
        let schema = FeatureSchema::default();
        let keys: Vec<&str> = schema.keys().collect();
        assert_eq!(keys, HOUSING_LAYOUT);
    }

    #[test]
    fn test_layout_hash_consistency() {
        let a = FeatureSchema::california_housing();
        let b = FeatureSchema::california_housing();
        assert_eq!(a.layout_hash(), b.layout_hash());
        assert_ne!(a.layout_hash(), 0);
    }

    #[test]
    fn test_layout_hash_is_order_sensitive() {
        let forward = compute_layout_hash(["AveRooms", "AveBedrms"]);
        let swapped = compute_layout_hash(["AveBedrms", "AveRooms"]);
        assert_ne!(forward, swapped);
    }

    #[test]
    fn test_validate_layout_success() {
        let schema = FeatureSchema::default();
        assert!(schema.validate_layout(HOUSING_LAYOUT).is_ok());
    }

    #[test]
    fn test_validate_layout_permuted() {
        let schema = FeatureSchema::default();
        let mut names: Vec<&str> = HOUSING_LAYOUT.to_vec();
        names.swap(2, 3);

        let err = schema.validate_layout(&names).unwrap_err();
        assert_eq!(err.expected_hash, schema.layout_hash());
        assert_eq!(err.actual_count, FEATURE_COUNT);
    }

    #[test]
    fn test_validate_layout_truncated() {
        let schema = FeatureSchema::default();
        assert!(schema.validate_layout(&HOUSING_LAYOUT[..7]).is_err());
    }

    #[test]
    fn test_index_lookup() {
        let schema = FeatureSchema::default();
        assert_eq!(schema.index_of("MedInc"), Some(0));
        assert_eq!(schema.index_of("Longitude"), Some(7));
        assert_eq!(schema.index_of("nonexistent"), None);
        assert_eq!(schema.field("Population").map(|f| f.max), Some(Bound::Int(40000)));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let fields = vec![
            FieldSpec::new("a", "A", 0.0, 1.0),
            FieldSpec::new("a", "A again", 0.0, 1.0),
        ];
        assert!(matches!(
            FeatureSchema::new(fields, vec![]),
            Err(SchemaError::DuplicateKey(k)) if k == "a"
        ));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let fields = vec![FieldSpec::new("a", "A", 2.0, 1.0)];
        assert!(matches!(
            FeatureSchema::new(fields, vec![]),
            Err(SchemaError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_unknown_rule_field() {
        assert!(matches!(FeatureSchema::new(vec![], vec![]), Err(SchemaError::Empty)));

        let fields = vec![FieldSpec::new("a", "A", 0.0, 1.0)];
        let rules = vec![CrossFieldRule::NotGreaterThan {
            field: "a".to_string(),
            limit: "b".to_string(),
        }];
        assert!(matches!(
            FeatureSchema::new(fields, rules),
            Err(SchemaError::UnknownRuleField(k)) if k == "b"
        ));
    }

    #[test]
    fn test_schema_from_json() {
        let json = r#"{
            "fields": [
                {"key": "x", "display_name": "X", "min": 0, "max": 10},
                {"key": "y", "display_name": "Y", "min": -1.5, "max": 1.5}
            ],
            "rules": [{"rule": "not_greater_than", "field": "y", "limit": "x"}]
        }"#;

        let schema = FeatureSchema::from_json_str(json).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.rules().len(), 1);
        assert_eq!(schema.field("y").map(|f| f.min), Some(Bound::Float(-1.5)));
        assert_eq!(schema.field("x").map(|f| f.max), Some(Bound::Int(10)));
    }

    #[test]
    fn test_bounds_print_as_written() {
        assert_eq!(Bound::Int(40000).to_string(), "40000");
        assert_eq!(Bound::Float(-114.0).to_string(), "-114.0");
        assert_eq!(Bound::Float(0.0).to_string(), "0.0");
        assert_eq!(Bound::Float(32.5).to_string(), "32.5");

        let parsed: Bound = serde_json::from_str("15.0").unwrap();
        assert_eq!(parsed, Bound::Float(15.0));
        assert_eq!(serde_json::to_string(&Bound::Int(55)).unwrap(), "55");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "15.0");
    }

    #[test]
    fn test_layout_info() {
        let schema = FeatureSchema::default();
        let info = schema.layout_info();
        assert_eq!(info.hash, schema.layout_hash());
        assert_eq!(info.feature_count, FEATURE_COUNT);
        assert_eq!(info.fields[3].display_name, "Average Bedrooms");
    }
}
