use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::{Value, json};
use tubescribe_services::Summarizer;

use crate::fixtures::backends::{CountingAsr, FailingAsr, FakeSummary};
use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn command_prefixed_watch_link_is_processed() {
    let asr = Arc::new(CountingAsr::default());
    let summary = Arc::new(FakeSummary::working());
    let app = TestApp::spawn(asr.clone(), Summarizer::new(summary.clone())).await;
    app.add_video("abc123", 16_000);

    let (status, body) = app
        .process("/process_youtube https://youtube.com/watch?v=abc123", json!(101))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "chatId": 101,
            "transcription": "samples=16000",
            "summary": "Summary: samples=16000"
        })
    );
    assert_eq!(app.requested_urls(), vec!["https://youtube.com/watch?v=abc123"]);
    assert_eq!(app.leftovers(), 0);
    assert_eq!(summary.calls(), 1);
}

#[tokio::test]
async fn bare_short_link_in_prose_is_processed() {
    let asr = Arc::new(CountingAsr::default());
    let app = TestApp::spawn(asr.clone(), Summarizer::disabled()).await;
    app.add_video("xyz", 8_000);

    let (status, body) = app.process("check this out https://youtu.be/xyz", json!("chat-b")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["chatId"], "chat-b");
    assert_eq!(body["transcription"], "samples=8000");
    assert!(body.get("summary").is_none());
    assert_eq!(app.requested_urls(), vec!["https://youtu.be/xyz"]);
}

#[tokio::test]
async fn slow_download_times_out_without_transcribing() {
    let asr = Arc::new(CountingAsr::default());
    let app = TestApp::spawn_with(
        asr.clone(),
        Summarizer::disabled(),
        "exec sleep 30",
        |settings| settings.downloader.timeout_secs = 1,
    )
    .await;

    let started = Instant::now();
    let (status, body) = app.process("https://youtu.be/slow", json!(3)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "AcquisitionTimeout");
    assert!(body.get("transcription").is_none());
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(asr.calls(), 0);
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn transcription_failure_deletes_the_artifact() {
    let summary = Arc::new(FakeSummary::working());
    let app = TestApp::spawn(Arc::new(FailingAsr), Summarizer::new(summary.clone())).await;
    app.add_video("abc", 4_000);

    let (status, body) = app.process("https://www.youtube.com/watch?v=abc", json!(4)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "TranscriptionFailed");
    assert!(body["message"].as_str().unwrap().contains("out of memory"));
    assert_eq!(app.requested_urls().len(), 1);
    assert_eq!(app.leftovers(), 0);
    assert_eq!(summary.calls(), 0);
}

#[tokio::test]
async fn summary_failure_keeps_the_transcription() {
    let summary = Arc::new(FakeSummary::broken());
    let app = TestApp::spawn(
        Arc::new(CountingAsr::default()),
        Summarizer::new(summary.clone()),
    )
    .await;
    app.add_video("abc", 1_600);

    let (status, body) = app.process("https://youtu.be/abc", json!(5)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "chatId": 5, "transcription": "samples=1600"})
    );
    assert_eq!(summary.calls(), 1);
}

#[tokio::test]
async fn message_without_link_never_reaches_the_downloader() {
    let app = TestApp::spawn(Arc::new(CountingAsr::default()), Summarizer::disabled()).await;

    let (status, body) = app.process("good morning everyone", json!(6)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NotFound");
    assert!(app.requested_urls().is_empty());
}

#[tokio::test]
async fn downloader_errors_are_passed_through() {
    let app = TestApp::spawn_with(
        Arc::new(CountingAsr::default()),
        Summarizer::disabled(),
        "echo 'ERROR: [youtube] gone: Video unavailable' >&2\nexit 1",
        |_| {},
    )
    .await;

    let (status, body) = app.process("https://youtu.be/gone", json!(7)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "AcquisitionFailed");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("ERROR: [youtube] gone: Video unavailable")
    );
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn missing_downloader_is_service_unavailable() {
    let app = TestApp::spawn_with(
        Arc::new(CountingAsr::default()),
        Summarizer::disabled(),
        "",
        |settings| {
            settings.downloader.program = "/nonexistent/tubescribe-test/yt-dlp".to_string();
            settings.downloader.leading_args.clear();
        },
    )
    .await;

    let (status, body) = app.process("https://youtu.be/abc", json!(8)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ToolUnavailable");
}

#[tokio::test]
async fn invalid_requests_are_input_errors() {
    let app = TestApp::spawn(Arc::new(CountingAsr::default()), Summarizer::disabled()).await;

    let (status, body) = app.post_process(json!({"text": "   ", "chatId": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InputError");

    let (status, body) = app.post_process(json!({"text": "https://youtu.be/abc"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InputError");

    let (status, body) = app.post_process(json!({"chatId": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InputError");

    let response = app
        .client
        .post(app.url("/api/process"))
        .header("content-type", "application/json")
        .body("{\"text\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "InputError");

    assert!(app.requested_urls().is_empty());
}

#[tokio::test]
async fn health_reports_version_and_backend() {
    let app = TestApp::spawn(Arc::new(CountingAsr::default()), Summarizer::disabled()).await;

    let body: Value = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "counting");
    assert!(body["version"].is_string());
}
