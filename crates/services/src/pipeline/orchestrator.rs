use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, info, info_span, warn};
use tubescribe_transcription::TranscriptionEngine;
use uuid::Uuid;

use super::{PipelineError, PipelineResult, PipelineStage, RawMessage};
use crate::acquisition::AudioAcquirer;
use crate::source::SourceResolver;
use crate::summarization::Summarizer;

/// Runs one message through resolve → acquire → transcribe → summarize.
///
/// A `Pipeline` is shared by every request. Runs are independent except for
/// the transcription step, which the engine serializes.
pub struct Pipeline {
    resolver: SourceResolver,
    acquirer: AudioAcquirer,
    engine: Arc<TranscriptionEngine>,
    summarizer: Summarizer,
    budget: Duration,
}

impl Pipeline {
    pub fn new(
        acquirer: AudioAcquirer,
        engine: Arc<TranscriptionEngine>,
        summarizer: Summarizer,
    ) -> Self {
        let budget = acquirer.default_budget();
        Self {
            resolver: SourceResolver::new(),
            acquirer,
            engine,
            summarizer,
            budget,
        }
    }

    /// Overrides the download time budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn engine(&self) -> &Arc<TranscriptionEngine> {
        &self.engine
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// Always produces a result; failures are reported inside it.
    pub async fn run(&self, message: RawMessage) -> PipelineResult {
        let request_id = Uuid::new_v4();
        let span = info_span!("pipeline", %request_id, chat_id = %message.chat_id);

        async move {
            let started = Instant::now();
            let mut progress = Progress::default();

            match self.execute(&message, &mut progress).await {
                Ok((transcription, summary)) => {
                    info!(
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        text_len = transcription.len(),
                        summarized = summary.is_some(),
                        "Pipeline finished"
                    );
                    PipelineResult::succeeded(message.chat_id, transcription, summary)
                }
                Err(e) => {
                    let kind = e.kind();
                    let stage = progress.stage;
                    progress.advance(PipelineStage::Failed(kind));
                    warn!(%stage, %kind, error = %e, "Pipeline failed");
                    PipelineResult::failed(message.chat_id, &e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        message: &RawMessage,
        progress: &mut Progress,
    ) -> Result<(String, Option<String>), PipelineError> {
        message.validate()?;

        let source = self
            .resolver
            .resolve(&message.text)
            .ok_or(PipelineError::NotFound)?;
        info!(url = %source.url, kind = ?source.kind, "Link found");

        progress.advance(PipelineStage::Acquiring);
        let artifact = self.acquirer.acquire(&source.url, self.budget).await?;

        progress.advance(PipelineStage::Transcribing);
        let transcribed = self.engine.transcribe(artifact.path()).await;
        artifact.discard();
        let transcript = transcribed?;

        progress.advance(PipelineStage::Summarizing);
        let summary = self.summarizer.summarize(&transcript.text).await;

        progress.advance(PipelineStage::Done);
        Ok((transcript.text, summary))
    }
}

#[derive(Debug)]
struct Progress {
    stage: PipelineStage,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            stage: PipelineStage::Resolving,
        }
    }
}

impl Progress {
    fn advance(&mut self, next: PipelineStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid stage transition {} -> {}",
            self.stage,
            next
        );
        debug!(from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }
}
