use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// A downloaded audio file living in its own temporary directory.
///
/// Whoever holds the artifact owns its deletion. [`AudioArtifact::discard`]
/// removes it explicitly; if the artifact is dropped instead (early return,
/// cancellation, panic) the directory is removed by `TempDir`'s destructor.
/// Either way it happens exactly once.
#[derive(Debug)]
pub struct AudioArtifact {
    dir: TempDir,
    path: PathBuf,
    format: String,
}

impl AudioArtifact {
    pub(crate) fn new(dir: TempDir, path: PathBuf, format: String) -> Self {
        Self { dir, path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn discard(self) {
        let Self { dir, path, .. } = self;
        match dir.close() {
            Ok(()) => debug!(path = %path.display(), "Audio artifact deleted"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete audio artifact"),
        }
    }
}
