//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

/// Predict from `{"MedInc": .., "HouseAge": .., ...}`
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(body) = payload.map_err(|e| AppError::MalformedBody(e.body_text()))?;

    let record = match body {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Err(AppError::NoData),
    };

    // Model call is CPU bound, keep it off the async workers
    let service = state.service.clone();
    let prediction = tokio::task::spawn_blocking(move || service.handle(&record))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))??;

    Ok(Json(PredictResponse { prediction }))
}
