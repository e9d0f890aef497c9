use std::sync::Arc;
use std::thread;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::segments::{Segment, stitch};
use super::{AsrBackend, AsrRequest, TranscriptionResult};
use crate::audio::TARGET_SAMPLE_RATE;

/// whisper.cpp over a whole downloaded file.
///
/// The context (model weights) is loaded once; each call gets a fresh decoder
/// state, and the engine's gate keeps calls from overlapping.
pub struct LocalWhisperBackend {
    ctx: Arc<WhisperContext>,
    default_language: Option<String>,
    threads: i32,
}

impl LocalWhisperBackend {
    /// Loads a GGML model file such as `models/ggml-base.bin`.
    pub fn new(model_path: &str, default_language: Option<String>) -> anyhow::Result<Self> {
        info!(model_path, "Loading Whisper model");
        let ctx = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|e| anyhow::anyhow!("Failed to load Whisper model '{}': {}", model_path, e))?;
        let threads = thread::available_parallelism()
            .map(|n| n.get().min(8) as i32)
            .unwrap_or(4);
        info!(threads, "Whisper model loaded");
        Ok(Self {
            ctx: Arc::new(ctx),
            default_language,
            threads,
        })
    }
}

#[async_trait]
impl AsrBackend for LocalWhisperBackend {
    async fn transcribe(&self, request: AsrRequest) -> anyhow::Result<TranscriptionResult> {
        if request.sample_rate != TARGET_SAMPLE_RATE {
            anyhow::bail!("Whisper needs {TARGET_SAMPLE_RATE} Hz audio, got {}", request.sample_rate);
        }
        let audio = request.audio_pcm_16k_mono;
        let audio_secs = audio.len() as f64 / f64::from(TARGET_SAMPLE_RATE);
        let language = request
            .language_hint
            .or_else(|| self.default_language.clone());
        let ctx = Arc::clone(&self.ctx);
        let threads = self.threads;

        tokio::task::spawn_blocking(move || -> anyhow::Result<TranscriptionResult> {
            let mut state = ctx
                .create_state()
                .map_err(|e| anyhow::anyhow!("Failed to create Whisper state: {}", e))?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            // Unset means English in whisper.cpp; ask for detection instead.
            params.set_language(Some(language.as_deref().unwrap_or("auto")));
            params.set_n_threads(threads);
            // Whole files: decoder-chosen segments, no context carried between windows.
            params.set_single_segment(false);
            params.set_no_context(true);
            params.set_print_progress(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            state
                .full(params, &audio)
                .map_err(|e| anyhow::anyhow!("Whisper transcription failed: {}", e))?;

            let n_segments = state.full_n_segments();
            let mut segments = Vec::new();
            for i in 0..n_segments {
                let Some(segment) = state.get_segment(i) else {
                    continue;
                };
                let text = segment
                    .to_str()
                    .map_err(|e| anyhow::anyhow!("{e}"))
                    .with_context(|| format!("segment {i} is not valid UTF-8"))?;
                segments.push(Segment {
                    start_cs: segment.start_timestamp(),
                    end_cs: segment.end_timestamp(),
                    text: text.to_string(),
                    no_speech: segment.no_speech_probability(),
                });
            }

            let stitched = stitch(&segments);
            debug!(
                audio_secs,
                spoken_secs = stitched.spoken_secs,
                n_segments,
                kept = stitched.kept,
                text_len = stitched.text.len(),
                "Whisper transcription complete"
            );

            Ok(TranscriptionResult {
                text: stitched.text,
                language,
                confidence: stitched.confidence,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("Whisper task join error: {}", e))?
    }

    fn name(&self) -> &str {
        "local_whisper"
    }
}
