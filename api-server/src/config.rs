//! Configuration module

use std::env;

use anyhow::{bail, Context};
use housing_core::constants::{
    DEFAULT_MODEL_PATH, DEFAULT_PREDICTION_DECIMALS, DEFAULT_PREDICTION_SCALE,
};
use housing_core::logic::features::SchemaError;
use housing_core::{FeatureSchema, OutputTransform};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Model artifact path (.json or .onnx)
    pub model_path: String,

    /// Expected hex SHA-256 of the artifact, if pinned
    pub model_sha256: Option<String>,

    /// Optional JSON file overriding the built-in feature schema
    pub schema_path: Option<String>,

    /// Post-processing of the raw model output
    pub output_transform: OutputTransform,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Output settings that would break every prediction are rejected here
    /// so the server never starts with them.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let output_transform = match non_empty("OUTPUT_TRANSFORM").as_deref().map(str::trim) {
            Some("identity") => OutputTransform::Identity,
            None | Some("scaled") => {
                let factor = match non_empty("PREDICTION_SCALE") {
                    Some(s) => s.trim().parse::<f64>()
                        .with_context(|| format!("Invalid PREDICTION_SCALE '{}'", s))?,
                    None => DEFAULT_PREDICTION_SCALE,
                };
                let decimals = match non_empty("PREDICTION_DECIMALS") {
                    Some(s) => s.trim().parse::<u32>()
                        .with_context(|| format!("Invalid PREDICTION_DECIMALS '{}'", s))?,
                    None => DEFAULT_PREDICTION_DECIMALS,
                };
                OutputTransform::scale_round(factor, decimals)
                    .context("Invalid output transform settings")?
            }
            Some(other) => bail!(
                "Unknown OUTPUT_TRANSFORM '{}' (expected 'scaled' or 'identity')",
                other
            ),
        };

        Ok(Self {
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            model_path: non_empty("MODEL_PATH")
                .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),

            model_sha256: non_empty("MODEL_SHA256"),

            schema_path: non_empty("SCHEMA_PATH"),

            output_transform,

            environment: non_empty("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
        })
    }

    /// Built-in schema unless SCHEMA_PATH points at an override
    pub fn load_schema(&self) -> Result<FeatureSchema, SchemaError> {
        match &self.schema_path {
            Some(path) => {
                tracing::info!("Loading feature schema from {}", path);
                FeatureSchema::from_file(path)
            }
            None => Ok(FeatureSchema::california_housing()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
