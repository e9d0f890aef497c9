use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use hound::{SampleFormat, WavSpec, WavWriter};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tubescribe_api::{build_router, state::AppState};
use tubescribe_config::Settings;
use tubescribe_services::{AudioAcquirer, Pipeline, Summarizer};
use tubescribe_transcription::{AsrBackend, TranscriptionEngine};

/// Downloader behaviour: copy `<fixtures>/<video id>.wav` to the output path.
pub const SERVE_FIXTURE: &str = r#"id="${url##*/}"
id="${id##*=}"
cp "$fixtures/$id.wav" "$target""#;

/// A running test application backed by a shell-script downloader.
///
/// The script records every URL it is asked for in `urls.log`, then runs the
/// snippet given to [`TestApp::spawn_with`] with `$url`, `$target` and
/// `$fixtures` set.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub settings: Settings,
    pub client: reqwest::Client,
    fixtures: TempDir,
    work: TempDir,
}

impl TestApp {
    pub async fn spawn(asr: Arc<dyn AsrBackend>, summarizer: Summarizer) -> Self {
        Self::spawn_with(asr, summarizer, SERVE_FIXTURE, |_| {}).await
    }

    /// Spawn with a custom downloader snippet and settings tweaks.
    pub async fn spawn_with(
        asr: Arc<dyn AsrBackend>,
        summarizer: Summarizer,
        downloader: &str,
        mutator: impl FnOnce(&mut Settings),
    ) -> Self {
        let fixtures = tempfile::tempdir().expect("Failed to create fixtures dir");
        let work = tempfile::tempdir().expect("Failed to create work dir");

        let script = fixtures.path().join("downloader.sh");
        std::fs::write(&script, downloader_script(fixtures.path(), downloader))
            .expect("Failed to write downloader script");

        let mut settings = Settings::load().expect("Failed to load settings");
        settings.downloader.program = "sh".to_string();
        settings.downloader.leading_args = vec![script.display().to_string()];
        settings.downloader.audio_format = "wav".to_string();
        settings.downloader.timeout_secs = 10;
        settings.downloader.max_concurrent = 0;
        settings.downloader.work_dir = Some(work.path().display().to_string());
        settings.summarizer.api_key = None;
        mutator(&mut settings);

        let engine = TranscriptionEngine::new(asr, settings.transcription.language.clone());
        let pipeline = Pipeline::new(AudioAcquirer::new(&settings.downloader), engine, summarizer);
        let app = build_router(AppState::with_pipeline(settings.clone(), pipeline));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            base_url: format!("http://{}", addr),
            settings,
            client: reqwest::Client::new(),
            fixtures,
            work,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Makes `<id>.wav` (16 kHz mono) available to the downloader.
    pub fn add_video(&self, id: &str, samples: usize) {
        write_wav(&self.fixtures.path().join(format!("{id}.wav")), samples);
    }

    pub async fn process(&self, text: &str, chat_id: Value) -> (StatusCode, Value) {
        self.post_process(json!({ "text": text, "chatId": chat_id })).await
    }

    pub async fn post_process(&self, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url("/api/process"))
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        let status = response.status();
        (status, response.json().await.expect("Response is not JSON"))
    }

    /// URLs handed to the downloader so far, in call order.
    pub fn requested_urls(&self) -> Vec<String> {
        std::fs::read_to_string(self.fixtures.path().join("urls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Entries still present under the artifact work dir.
    pub fn leftovers(&self) -> usize {
        std::fs::read_dir(self.work.path()).unwrap().count()
    }
}

fn downloader_script(fixtures: &Path, snippet: &str) -> String {
    format!(
        r#"fixtures="{fixtures}"
url=""
out=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    *) url="$1" ;;
  esac
  shift
done
target=$(printf '%s' "$out" | sed 's/%(ext)s/wav/')
printf '%s\n' "$url" >> "$fixtures/urls.log"
{snippet}
"#,
        fixtures = fixtures.display()
    )
}

pub fn write_wav(path: &Path, samples: usize) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("Failed to create WAV");
    for i in 0..samples {
        writer
            .write_sample(((i % 80) as i16 - 40) * 200)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}
