//! Validation Module - Raw record checks and normalization

pub mod coerce;
pub mod types;
pub mod validator;

pub use coerce::{coerce_f64, CoerceError};
pub use types::{NormalizedRecord, RawRecord, ValidationResult};
pub use validator::validate;
