//! Per-value numeric coercion
//!
//! Accepts JSON numbers and numeric strings. Everything else, including
//! booleans and values that parse to inf/NaN, is a coercion failure.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("value is null")]
    Null,

    #[error("'{0}' is not numeric")]
    NotNumeric(String),

    #[error("value of type {0} is not numeric")]
    WrongType(&'static str),

    #[error("value is not finite")]
    NonFinite,
}

/// Coerce a raw JSON value to a finite f64
pub fn coerce_f64(value: &Value) -> Result<f64, CoerceError> {
    let number = match value {
        Value::Null => return Err(CoerceError::Null),
        Value::Number(n) => n.as_f64().ok_or(CoerceError::NonFinite)?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| CoerceError::NotNumeric(s.clone()))?,
        Value::Bool(_) => return Err(CoerceError::WrongType("bool")),
        Value::Array(_) => return Err(CoerceError::WrongType("array")),
        Value::Object(_) => return Err(CoerceError::WrongType("object")),
    };

    if number.is_finite() {
        Ok(number)
    } else {
        Err(CoerceError::NonFinite)
    }
}
