//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use housing_core::ServiceError;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Input errors
    NoData,
    MalformedBody(String),
    InvalidInput(Vec<String>),

    // Model errors
    PredictionFailed(String),

    // Generic errors
    InternalError(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::NoData | AppError::MalformedBody(_) | AppError::InvalidInput(_) => {
                "invalid_input"
            }
            AppError::PredictionFailed(_) | AppError::InternalError(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::NoData => (StatusCode::BAD_REQUEST, "No data provided".to_string(), vec![]),
            AppError::MalformedBody(msg) => {
                tracing::debug!("Rejected request body: {}", msg);
                (StatusCode::BAD_REQUEST, format!("Malformed request body: {}", msg), vec![])
            }
            AppError::InvalidInput(errors) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid input: {}", errors.join("; ")),
                errors.clone(),
            ),
            AppError::PredictionFailed(msg) => {
                tracing::error!("Prediction error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Prediction error: {}", msg), vec![])
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), vec![])
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": self.kind(),
            "details": details,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(errors) => AppError::InvalidInput(errors),
            ServiceError::Prediction(e) => AppError::PredictionFailed(e.to_string()),
        }
    }
}
