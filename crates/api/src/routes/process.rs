use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, error};
use tubescribe_services::{ErrorKind, PipelineResult, RawMessage};

use crate::{
    error::{ApiError, status_for},
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub chat_id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<PipelineResult> for ProcessResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            success: result.success,
            chat_id: result.chat_id,
            transcription: result.transcription,
            summary: result.summary,
            error: result.error_kind,
            message: result.error_message,
        }
    }
}

pub async fn process(
    State(state): State<AppState>,
    payload: Result<Json<RawMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessResponse>), ApiError> {
    let Json(message) = payload?;

    // Detached so a client hanging up does not cancel a download or
    // transcription halfway through.
    let pipeline = Arc::clone(&state.pipeline);
    let result = tokio::spawn(async move { pipeline.run(message).await }.in_current_span())
        .await
        .map_err(|e| {
            error!(error = %e, "Pipeline task aborted");
            ApiError::Internal("processing aborted unexpectedly".to_string())
        })?;

    let status = result.error_kind.map_or(StatusCode::OK, status_for);
    Ok((status, Json(result.into())))
}
