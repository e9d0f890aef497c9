use serde::{Deserialize, Serialize};

/// Configuration for the transcription system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// ASR backend to use. Only "local_whisper" ships today.
    pub backend: String,
    /// Path to the Whisper model file (for local_whisper backend).
    pub whisper_model_path: Option<String>,
    /// Language hint for ASR (e.g. "en", "de"). None = auto-detect.
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: "local_whisper".to_string(),
            whisper_model_path: None,
            language: None,
        }
    }
}
