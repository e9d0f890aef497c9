#[cfg(feature = "local-whisper")]
pub mod local_whisper;
pub mod segments;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::TranscriptionConfig;

/// Request to transcribe a whole audio file's worth of samples.
pub struct AsrRequest {
    /// PCM audio at 16kHz mono, f32 normalized [-1.0, 1.0].
    pub audio_pcm_16k_mono: Vec<f32>,
    /// Optional language hint (ISO 639-1, e.g. "en", "de").
    pub language_hint: Option<String>,
    /// Sample rate (always 16000 for this pipeline).
    pub sample_rate: u32,
}

/// Result of an ASR transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: Option<String>,
    pub confidence: Option<f64>,
}

/// Trait for pluggable ASR backends.
///
/// Implementations are not required to be reentrant: callers go through
/// [`crate::TranscriptionEngine`], which never runs two requests at once.
#[async_trait]
pub trait AsrBackend: Send + Sync + 'static {
    async fn transcribe(&self, request: AsrRequest) -> anyhow::Result<TranscriptionResult>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}

/// Loads the configured backend. Called once at process start.
pub fn build_backend(config: &TranscriptionConfig) -> anyhow::Result<Arc<dyn AsrBackend>> {
    match config.backend.as_str() {
        #[cfg(feature = "local-whisper")]
        "local_whisper" => {
            let model_path = config
                .whisper_model_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("transcription.whisper_model_path is not set"))?;
            let backend = local_whisper::LocalWhisperBackend::new(model_path, config.language.clone())?;
            Ok(Arc::new(backend))
        }
        other => anyhow::bail!("Unsupported or disabled ASR backend '{}'", other),
    }
}
