use std::sync::Arc;

use futures::future::join_all;
use reqwest::StatusCode;
use serde_json::json;
use tubescribe_services::Summarizer;

use crate::fixtures::backends::{CountingAsr, FakeSummary};
use crate::fixtures::test_app::TestApp;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_model_and_keep_their_results() {
    let asr = Arc::new(CountingAsr::default());
    let app = TestApp::spawn(asr.clone(), Summarizer::new(Arc::new(FakeSummary::working()))).await;

    let videos: Vec<(String, usize)> = (1..=6).map(|i| (format!("vid{i}"), i * 1_000)).collect();
    for (id, samples) in &videos {
        app.add_video(id, *samples);
    }

    let requests = videos.iter().enumerate().map(|(chat, (id, _))| {
        let app = &app;
        async move { app.process(&format!("/yt https://youtu.be/{id}"), json!(chat)).await }
    });
    let responses = join_all(requests).await;

    for (chat, ((_, samples), (status, body))) in videos.iter().zip(responses).enumerate() {
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["chatId"], json!(chat));
        assert_eq!(body["transcription"], format!("samples={samples}"));
        assert_eq!(body["summary"], format!("Summary: samples={samples}"));
    }

    assert_eq!(asr.calls(), videos.len());
    assert_eq!(asr.peak(), 1, "transcriptions overlapped");
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_download_pool_still_serves_everyone() {
    let asr = Arc::new(CountingAsr::default());
    let app = TestApp::spawn_with(
        asr.clone(),
        Summarizer::disabled(),
        crate::fixtures::test_app::SERVE_FIXTURE,
        |settings| settings.downloader.max_concurrent = 2,
    )
    .await;
    for i in 0..5 {
        app.add_video(&format!("p{i}"), 500 + i);
    }

    let responses = join_all((0..5).map(|i| {
        let app = &app;
        async move { app.process(&format!("https://youtu.be/p{i}"), json!(i)).await }
    }))
    .await;

    for (i, (status, body)) in responses.into_iter().enumerate() {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transcription"], format!("samples={}", 500 + i));
    }
    assert_eq!(app.requested_urls().len(), 5);
    assert_eq!(app.leftovers(), 0);
}
