use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubescribe_api::{build_router, state::AppState};
use tubescribe_config::Settings;
use tubescribe_transcription::{TranscriptionConfig, asr::build_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "tubescribe_api=debug,tubescribe_services=debug,tubescribe_transcription=debug,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config
    let settings = Settings::load()?;
    info!("Starting Tubescribe API on {}:{}", settings.app.host, settings.app.port);
    info!(
        downloader = %settings.downloader.program,
        timeout_secs = settings.downloader.timeout_secs,
        max_concurrent = settings.downloader.max_concurrent,
        asr_backend = %settings.transcription.backend,
        summarizer = %settings.summarizer.provider,
        "Pipeline config"
    );

    // Load the ASR model once; a model that cannot be loaded aborts startup.
    let backend = build_backend(&TranscriptionConfig {
        backend: settings.transcription.backend.clone(),
        whisper_model_path: settings.transcription.whisper_model_path.clone(),
        language: settings.transcription.language.clone(),
    })?;

    // Build app state
    let app_state = AppState::new(settings.clone(), backend)?;

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
