//! Logic Module - Validation, feature assembly & inference
//!
//! ## Request flow
//! - `validation/` - completeness, range and cross-field checks
//! - `features/` - schema layout and positional feature vector
//! - `model/` - artifact loading and regression backends
//! - `predictor` - vector → model → output transform
//! - `service` - the two stages wired together

pub mod features;
pub mod model;
pub mod predictor;
pub mod service;
pub mod validation;
