//! Message → link → audio → transcript → summary.

mod orchestrator;

pub use orchestrator::Pipeline;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tubescribe_transcription::TranscriptionError;

use crate::acquisition::AcquisitionError;

/// An inbound chat message. `chat_id` is echoed back untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub text: String,
    #[serde(default)]
    pub chat_id: Value,
}

impl RawMessage {
    pub fn new(text: impl Into<String>, chat_id: impl Into<Value>) -> Self {
        Self {
            text: text.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.text.trim().is_empty() {
            return Err(PipelineError::Input("text must not be empty".to_string()));
        }
        if self.chat_id.is_null() {
            return Err(PipelineError::Input("chatId is required".to_string()));
        }
        Ok(())
    }
}

/// Failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InputError,
    NotFound,
    AcquisitionTimeout,
    AcquisitionFailed,
    ToolUnavailable,
    TranscriptionFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputError => "InputError",
            Self::NotFound => "NotFound",
            Self::AcquisitionTimeout => "AcquisitionTimeout",
            Self::AcquisitionFailed => "AcquisitionFailed",
            Self::ToolUnavailable => "ToolUnavailable",
            Self::TranscriptionFailed => "TranscriptionFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Input(String),
    #[error("no supported video link found in message")]
    NotFound,
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::InputError,
            Self::NotFound => ErrorKind::NotFound,
            Self::Acquisition(AcquisitionError::Timeout { .. }) => ErrorKind::AcquisitionTimeout,
            Self::Acquisition(AcquisitionError::ToolMissing { .. }) => ErrorKind::ToolUnavailable,
            Self::Acquisition(AcquisitionError::ProcessError { .. } | AcquisitionError::Io(_)) => {
                ErrorKind::AcquisitionFailed
            }
            Self::Transcription(_) => ErrorKind::TranscriptionFailed,
        }
    }
}

/// Where a run currently is.
///
/// ```text
/// Resolving → Acquiring → Transcribing → Summarizing → Done
///     ↓           ↓            ↓
///  Failed      Failed       Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Resolving,
    Acquiring,
    Transcribing,
    Summarizing,
    Done,
    Failed(ErrorKind),
}

impl PipelineStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Resolving, Self::Acquiring)
                | (Self::Acquiring, Self::Transcribing)
                | (Self::Transcribing, Self::Summarizing)
                | (Self::Summarizing, Self::Done)
                | (
                    Self::Resolving | Self::Acquiring | Self::Transcribing,
                    Self::Failed(_)
                )
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => f.write_str("resolving"),
            Self::Acquiring => f.write_str("acquiring"),
            Self::Transcribing => f.write_str("transcribing"),
            Self::Summarizing => f.write_str("summarizing"),
            Self::Done => f.write_str("done"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    pub chat_id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PipelineResult {
    pub fn succeeded(chat_id: Value, transcription: String, summary: Option<String>) -> Self {
        Self {
            success: true,
            chat_id,
            transcription: Some(transcription),
            summary,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn failed(chat_id: Value, error: &PipelineError) -> Self {
        Self {
            success: false,
            chat_id,
            transcription: None,
            summary: None,
            error_kind: Some(error.kind()),
            error_message: Some(error.to_string()),
        }
    }
}
