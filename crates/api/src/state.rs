use std::sync::Arc;

use tubescribe_config::Settings;
use tubescribe_services::{AudioAcquirer, Pipeline, Summarizer};
use tubescribe_transcription::{AsrBackend, TranscriptionEngine};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Wires the pipeline around an already loaded ASR backend.
    pub fn new(settings: Settings, backend: Arc<dyn AsrBackend>) -> anyhow::Result<Self> {
        let engine = TranscriptionEngine::new(backend, settings.transcription.language.clone());
        let acquirer = AudioAcquirer::new(&settings.downloader);
        let summarizer = Summarizer::from_settings(&settings.summarizer)?;

        Ok(Self::with_pipeline(
            settings,
            Pipeline::new(acquirer, engine, summarizer),
        ))
    }

    pub fn with_pipeline(settings: Settings, pipeline: Pipeline) -> Self {
        Self {
            settings,
            pipeline: Arc::new(pipeline),
        }
    }
}
