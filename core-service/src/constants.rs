//! Central Configuration Constants
//!
//! Single source of truth for defaults shared by the core and the server.

/// Default model artifact location
pub const DEFAULT_MODEL_PATH: &str = "models/housing_model.json";

/// Housing targets are in units of $100,000
pub const DEFAULT_PREDICTION_SCALE: f64 = 100_000.0;

/// Decimal places kept after scaling
pub const DEFAULT_PREDICTION_DECIMALS: u32 = 2;

/// Beyond this `10^decimals` stops being exact and the rounding is noise
pub const MAX_PREDICTION_DECIMALS: u32 = 15;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Housing Value Predictor";
