pub mod asr;
pub mod audio;
pub mod config;
pub mod engine;

pub use asr::{AsrBackend, AsrRequest, TranscriptionResult};
pub use config::TranscriptionConfig;
pub use engine::{TranscriptionEngine, TranscriptionError};
