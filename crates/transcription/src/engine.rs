use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::asr::{AsrBackend, AsrRequest, TranscriptionResult};
use crate::audio::{self, DecodeError, TARGET_SAMPLE_RATE};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("{backend} failed: {message}")]
    Backend { backend: String, message: String },
    #[error("transcription aborted: {0}")]
    Fault(String),
}

/// Owns the process-wide ASR model and serializes every use of it.
///
/// The engine is created once at startup and shared via `Arc`. The model is
/// not safe for concurrent decoding, so `gate` admits a single transcription
/// at a time; waiters are served in arrival order (tokio's mutex is fair).
/// Once admitted, a transcription runs on its own task holding the gate, so it
/// completes even if the caller goes away, and a panic inside the backend
/// releases the gate while unwinding.
pub struct TranscriptionEngine {
    backend: Arc<dyn AsrBackend>,
    language: Option<String>,
    gate: Arc<Mutex<()>>,
}

impl TranscriptionEngine {
    pub fn new(backend: Arc<dyn AsrBackend>, language: Option<String>) -> Arc<Self> {
        info!(backend = %backend.name(), ?language, "Transcription engine created");
        Arc::new(Self {
            backend,
            language,
            gate: Arc::new(Mutex::new(())),
        })
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Decodes the WAV file at `audio_path` and runs it through the backend.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        let path = audio_path.to_path_buf();
        let backend = Arc::clone(&self.backend);
        let language = self.language.clone();

        let queued = Instant::now();
        let permit = Arc::clone(&self.gate).lock_owned().await;
        debug!(
            waited_ms = queued.elapsed().as_millis() as u64,
            path = %path.display(),
            "Transcription gate acquired"
        );

        let task = tokio::spawn(async move {
            let _permit = permit;
            let started = Instant::now();

            let pcm = tokio::task::spawn_blocking(move || audio::decode_wav(&path))
                .await
                .map_err(|e| TranscriptionError::Fault(join_message(e)))??;
            let samples = pcm.len();

            let request = AsrRequest {
                audio_pcm_16k_mono: pcm,
                language_hint: language,
                sample_rate: TARGET_SAMPLE_RATE,
            };

            let result = backend
                .transcribe(request)
                .await
                .map_err(|e| TranscriptionError::Backend {
                    backend: backend.name().to_string(),
                    message: format!("{e:#}"),
                })?;

            info!(
                samples,
                inference_ms = started.elapsed().as_millis() as u64,
                text_len = result.text.len(),
                "Transcription complete"
            );
            Ok::<_, TranscriptionError>(result)
        });

        let outcome = task
            .await
            .unwrap_or_else(|e| Err(TranscriptionError::Fault(join_message(e))));
        if let Err(e) = &outcome {
            warn!(error = %e, "Transcription failed");
        }
        outcome
    }
}

fn join_message(err: tokio::task::JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        err.to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}
