//! Feature schema handler

use axum::{extract::State, Json};
use housing_core::LayoutInfo;

use crate::AppState;

/// Ordered fields, bounds and cross-field rules the validator enforces
pub async fn get(State(state): State<AppState>) -> Json<LayoutInfo> {
    Json(state.service.layout_info())
}
