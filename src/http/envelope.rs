//! The `{success, message, data, timestamp, errors?}` response envelope
//! every control-plane route wraps its payload in (spec §6).

use crate::error::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            timestamp: Utc::now(),
            errors: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        (status, Json(self)).into_response()
    }
}

/// A paged list, used by `/shop/history/{playerId}`.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
}

/// Wraps an [`EngineError`] into the envelope with the appropriate HTTP
/// status and no side-effect/transient distinction leaked to the caller
/// beyond the status code itself.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::Validation(_) | EngineError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            EngineError::UnknownItem(_) => StatusCode::NOT_FOUND,
            EngineError::ItemInactive(_) | EngineError::InsufficientFunds { .. } => StatusCode::CONFLICT,
            EngineError::StorageError(_) | EngineError::StorageTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::EngineFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ApiResponse::<()> {
            success: false,
            message: self.0.to_string(),
            data: None,
            timestamp: Utc::now(),
            errors: Some(vec![self.0.to_string()]),
        };
        (status, Json(body)).into_response()
    }
}
