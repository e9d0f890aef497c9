use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tubescribe_services::ErrorKind;

/// Failures that never reached the pipeline, or escaped it.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorKind::InputError.as_str(), msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg),
        };

        let body = ErrorResponse {
            success: false,
            error: error_type,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for a pipeline failure. A message without a link is not an
/// HTTP error.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::OK,
        ErrorKind::InputError => StatusCode::BAD_REQUEST,
        ErrorKind::ToolUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::AcquisitionTimeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::AcquisitionFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::TranscriptionFailed => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
