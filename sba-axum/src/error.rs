//! The API error surface and response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sba_core::services::{EngineResult, Rejection};
use serde::Serialize;
use std::fmt::Display;
use tracing::{Level, event};

/// The uniform response envelope: `{success, data?, error?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Wrap a payload in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

/// A failed request: status code plus the enveloped message.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status to respond with.
    pub status: StatusCode,
    /// Human-readable reason, returned in the envelope.
    pub message: String,
}

impl ApiError {
    /// 401 for requests missing or mangling `X-User-Id`.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    /// 500 with the cause logged rather than leaked.
    pub fn internal(err: impl Display) -> Self {
        event!(Level::ERROR, err = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal error".to_owned(),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        let status = match &rejection {
            Rejection::NotFound(_) => StatusCode::NOT_FOUND,
            Rejection::LockTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Rejection::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Rejection::AuctionNotActive
            | Rejection::NoActiveRound
            | Rejection::RoundEnded
            | Rejection::BelowMinimum { .. }
            | Rejection::InsufficientFunds
            | Rejection::Invalid(_) => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: rejection.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
        });
        (self.status, body).into_response()
    }
}

/// Collapse an [`EngineResult`] into a handler result: storage errors become
/// logged 500s, rejections map to their status codes.
pub fn flatten<T, E: Display>(result: EngineResult<T, E>) -> Result<T, ApiError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(rejection)) => Err(rejection.into()),
        Err(err) => Err(ApiError::internal(err)),
    }
}
