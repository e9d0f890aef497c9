//! Best-effort summaries of finished transcripts.

pub mod claude;
pub mod gemini;

pub use claude::ClaudeGenerator;
pub use gemini::GeminiGenerator;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use tubescribe_config::SummarizerSettings;

/// Fixed instruction prepended to every transcript.
pub const SUMMARY_INSTRUCTION: &str = "Write a concise one-paragraph summary (150 words at most) \
of the following video transcript. Reply with the summary only.";

/// A remote generative-text service.
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    fn name(&self) -> &str;
}

/// Never fails: every problem on the way to a summary becomes `None`.
#[derive(Clone, Default)]
pub struct Summarizer {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    /// Builds the configured provider. A missing API key disables
    /// summaries rather than failing startup; an unknown provider is an error.
    pub fn from_settings(settings: &SummarizerSettings) -> anyhow::Result<Self> {
        if !settings.enabled {
            info!("Summarization disabled by configuration");
            return Ok(Self::disabled());
        }
        let Some(api_key) = settings.api_key.clone().filter(|k| !k.is_empty()) else {
            info!(provider = %settings.provider, "No summarizer API key configured, summaries disabled");
            return Ok(Self::disabled());
        };

        let timeout = Duration::from_secs(settings.timeout_secs);
        let generator: Arc<dyn TextGenerator> = match settings.provider.as_str() {
            "gemini" => Arc::new(GeminiGenerator::new(
                api_key,
                settings.model.clone(),
                settings.base_url.clone(),
                timeout,
            )?),
            "claude" => Arc::new(ClaudeGenerator::new(
                api_key,
                settings.model.clone(),
                settings.max_tokens,
                settings.base_url.clone(),
                timeout,
            )?),
            other => anyhow::bail!("Unknown summarizer provider '{}'", other),
        };

        info!(provider = %generator.name(), model = %settings.model, "Summarizer configured");
        Ok(Self::new(generator))
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn summarize(&self, transcript: &str) -> Option<String> {
        let generator = self.generator.as_ref()?;
        if transcript.trim().is_empty() {
            debug!("Empty transcript, skipping summary");
            return None;
        }

        let prompt = format!("{SUMMARY_INSTRUCTION}\n\n{transcript}");
        match generator.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!(generator = %generator.name(), "Summarization degraded: empty response");
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                warn!(generator = %generator.name(), error = %format!("{e:#}"), "Summarization degraded");
                None
            }
        }
    }
}
