pub mod acquisition;
pub mod pipeline;
pub mod source;
pub mod summarization;

pub use acquisition::{AcquisitionError, AudioAcquirer, AudioArtifact};
pub use pipeline::{ErrorKind, Pipeline, PipelineError, PipelineResult, PipelineStage, RawMessage};
pub use source::{ResolvedSource, SourceKind, SourceResolver};
pub use summarization::{Summarizer, TextGenerator};
