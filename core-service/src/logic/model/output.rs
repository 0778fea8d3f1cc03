//! Output transform applied to the raw model scalar

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_PREDICTION_DECIMALS, DEFAULT_PREDICTION_SCALE, MAX_PREDICTION_DECIMALS,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("prediction scale must be a finite number, got {0}")]
    NonFiniteFactor(f64),

    #[error("prediction decimals must be at most {max}, got {0}", max = MAX_PREDICTION_DECIMALS)]
    TooManyDecimals(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputTransform {
    /// Return the model output unchanged
    Identity,
    /// Multiply into target units, then round to `decimals` places
    ScaleRound { factor: f64, decimals: u32 },
}

impl Default for OutputTransform {
    /// The housing model predicts in units of $100,000
    fn default() -> Self {
        OutputTransform::ScaleRound {
            factor: DEFAULT_PREDICTION_SCALE,
            decimals: DEFAULT_PREDICTION_DECIMALS,
        }
    }
}

impl OutputTransform {
    /// Checked constructor for configured scaling
    pub fn scale_round(factor: f64, decimals: u32) -> Result<Self, TransformError> {
        let transform = OutputTransform::ScaleRound { factor, decimals };
        transform.validate()?;
        Ok(transform)
    }

    pub fn validate(&self) -> Result<(), TransformError> {
        match *self {
            OutputTransform::Identity => Ok(()),
            OutputTransform::ScaleRound { factor, .. } if !factor.is_finite() => {
                Err(TransformError::NonFiniteFactor(factor))
            }
            OutputTransform::ScaleRound { decimals, .. } if decimals > MAX_PREDICTION_DECIMALS => {
                Err(TransformError::TooManyDecimals(decimals))
            }
            OutputTransform::ScaleRound { .. } => Ok(()),
        }
    }

    /// Rounds half away from zero, so exact `.xx5` ties go up in magnitude
    pub fn apply(&self, raw: f64) -> f64 {
        match *self {
            OutputTransform::Identity => raw,
            OutputTransform::ScaleRound { factor, decimals } => {
                // Unchecked values are clamped rather than overflowing 10^n
                let exponent = i32::try_from(decimals.min(MAX_PREDICTION_DECIMALS)).unwrap_or(0);
                let unit = 10f64.powi(exponent);
                (raw * factor * unit).round() / unit
            }
        }
    }
}
