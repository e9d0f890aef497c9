use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub downloader: DownloaderSettings,
    pub transcription: TranscriptionSettings,
    pub summarizer: SummarizerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// External audio downloader (yt-dlp compatible command line).
#[derive(Debug, Deserialize, Clone)]
pub struct DownloaderSettings {
    /// Executable to spawn.
    pub program: String,
    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`.
    pub leading_args: Vec<String>,
    pub audio_format: String,
    pub timeout_secs: u64,
    /// Maximum concurrent downloads. 0 = unbounded.
    pub max_concurrent: usize,
    /// Root for per-request temporary directories. None = system temp dir.
    pub work_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TranscriptionSettings {
    pub backend: String,
    pub whisper_model_path: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerSettings {
    pub enabled: bool,
    /// "gemini" or "claude".
    pub provider: String,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("TUBESCRIBE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("app.cors_origins")
                    .with_list_parse_key("downloader.leading_args"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 5000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("downloader.program", "yt-dlp")?
            .set_default("downloader.leading_args", Vec::<String>::new())?
            .set_default("downloader.audio_format", "wav")?
            .set_default("downloader.timeout_secs", 300)?
            .set_default("downloader.max_concurrent", 0)?
            .set_default("downloader.work_dir", None::<String>)?
            .set_default("transcription.backend", "local_whisper")?
            .set_default("transcription.whisper_model_path", "models/ggml-base.bin")?
            .set_default("transcription.language", None::<String>)?
            .set_default("summarizer.enabled", true)?
            .set_default("summarizer.provider", "gemini")?
            .set_default("summarizer.api_key", None::<String>)?
            .set_default("summarizer.model", "gemini-1.5-pro-latest")?
            .set_default("summarizer.base_url", None::<String>)?
            .set_default("summarizer.max_tokens", 1024)?
            .set_default("summarizer.timeout_secs", 60)?
            .build()?;

        config.try_deserialize()
    }
}
