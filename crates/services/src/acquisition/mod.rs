//! Audio download through an external yt-dlp compatible command line tool.

mod artifact;

pub use artifact::AudioArtifact;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use tubescribe_config::DownloaderSettings;

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("download exceeded the {}s time budget", .budget.as_secs_f64())]
    Timeout { budget: Duration },
    #[error("downloader exited with {status}: {diagnostics}")]
    ProcessError { status: String, diagnostics: String },
    #[error("downloader '{program}' is not installed or not executable")]
    ToolMissing { program: String },
    #[error("failed to run downloader: {0}")]
    Io(#[from] io::Error),
}

/// Spawns the downloader into a fresh temporary directory per request.
///
/// The directory (and anything the tool left in it) is removed on every
/// failure path before `acquire` returns; on success it travels with the
/// returned [`AudioArtifact`].
pub struct AudioAcquirer {
    program: String,
    leading_args: Vec<String>,
    audio_format: String,
    work_dir: Option<PathBuf>,
    default_budget: Duration,
    permits: Option<Arc<Semaphore>>,
}

impl AudioAcquirer {
    pub fn new(settings: &DownloaderSettings) -> Self {
        let permits = (settings.max_concurrent > 0)
            .then(|| Arc::new(Semaphore::new(settings.max_concurrent)));

        Self {
            program: settings.program.clone(),
            leading_args: settings.leading_args.clone(),
            audio_format: settings.audio_format.clone(),
            work_dir: settings.work_dir.as_ref().map(PathBuf::from),
            default_budget: Duration::from_secs(settings.timeout_secs),
            permits,
        }
    }

    pub fn default_budget(&self) -> Duration {
        self.default_budget
    }

    /// Downloads the audio track of `url` within `budget` wall-clock time.
    pub async fn acquire(
        &self,
        url: &str,
        budget: Duration,
    ) -> Result<AudioArtifact, AcquisitionError> {
        // Waiting for a pool slot is not charged to the budget.
        let _slot = match &self.permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|_| io::Error::other("download pool closed"))?,
            ),
            None => None,
        };

        let dir = self.fresh_dir()?;
        let template = dir.path().join("audio.%(ext)s");

        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(["--no-playlist", "--no-progress", "--quiet", "--no-warnings"])
            .args(["-x", "--audio-format", self.audio_format.as_str()])
            .args(["--postprocessor-args", "ffmpeg:-ar 16000 -ac 1"])
            .arg("--socket-timeout")
            .arg(budget.as_secs().max(1).to_string())
            .arg("-o")
            .arg(&template)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so helpers such as ffmpeg can be killed with it.
        #[cfg(unix)]
        command.process_group(0);

        info!(%url, program = %self.program, budget_secs = budget.as_secs_f64(), "Starting download");
        let started = Instant::now();

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
                warn!(program = %self.program, error = %e, "Downloader unavailable");
                return Err(AcquisitionError::ToolMissing {
                    program: self.program.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let group = child.id();

        let stdout = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr = tokio::spawn(read_pipe(child.stderr.take()));
        let readers = [stdout.abort_handle(), stderr.abort_handle()];

        let status = match timeout(budget, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                kill_process_group(group);
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill downloader after timeout");
                }
                readers.iter().for_each(|r| r.abort());
                warn!(%url, budget_secs = budget.as_secs_f64(), "Download timed out");
                return Err(AcquisitionError::Timeout { budget });
            }
        };

        // Anything still alive in the group was left behind by the tool and
        // may be holding the output pipes open.
        kill_process_group(group);

        let remaining = budget.saturating_sub(started.elapsed());
        let output = timeout(remaining, async {
            (
                stdout.await.unwrap_or_default(),
                stderr.await.unwrap_or_default(),
            )
        })
        .await;
        let Ok((stdout, stderr)) = output else {
            readers.iter().for_each(|r| r.abort());
            warn!(%url, budget_secs = budget.as_secs_f64(), "Downloader output still open after budget");
            return Err(AcquisitionError::Timeout { budget });
        };

        if !status.success() {
            let diagnostics = if stderr.trim().is_empty() { stdout } else { stderr };
            warn!(%url, %status, "Downloader failed");
            return Err(AcquisitionError::ProcessError {
                status: status.to_string(),
                diagnostics,
            });
        }

        let Some(path) = locate_output(dir.path(), &self.audio_format)? else {
            return Err(AcquisitionError::ProcessError {
                status: status.to_string(),
                diagnostics: format!("no audio file was produced\n{stderr}{stdout}"),
            });
        };

        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(&self.audio_format)
            .to_string();
        let bytes = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        info!(
            path = %path.display(),
            bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Download complete"
        );

        Ok(AudioArtifact::new(dir, path, format))
    }

    fn fresh_dir(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("tubescribe-");
        match &self.work_dir {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
    }
}

/// SIGKILL to the whole process group led by `pgid`. Missing groups are fine.
#[cfg(unix)]
fn kill_process_group(pgid: Option<u32>) {
    let Some(pgid) = pgid.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid addresses the group.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            debug!(pgid, error = %err, "Failed to kill downloader process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: Option<u32>) {}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Failed to read downloader output");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// `audio.<format>` if present, otherwise the only finished file in `dir`.
fn locate_output(dir: &Path, format: &str) -> io::Result<Option<PathBuf>> {
    let expected = dir.join(format!("audio.{format}"));
    if expected.is_file() {
        return Ok(Some(expected));
    }

    let mut finished = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let partial = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("part" | "ytdl" | "temp")
        );
        if path.is_file() && !partial {
            finished.push(path);
        }
    }

    Ok(match finished.len() {
        1 => finished.pop(),
        _ => None,
    })
}
