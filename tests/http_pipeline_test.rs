//! Full runs over real HTTP: list and images both come from a mock server.

mod common;

use image::ImageFormat;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{self, BLUE};
use common::{MockImageServer, ScriptedProbe};
use tricolor::services::{
    spawn_producer, AdmissionController, AdmissionSettings, HttpFetcher, InputSource, MemorySink,
    ResultCache, RunSummary,
};

async fn run_list(list_url: String) -> (Arc<MemorySink>, RunSummary) {
    let sink = Arc::new(MemorySink::new());
    let controller = AdmissionController::new(
        AdmissionSettings {
            pacing: Duration::from_millis(1),
            ..AdmissionSettings::default()
        },
        Arc::new(ResultCache::new()),
        Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap()),
        sink.clone(),
        Arc::new(ScriptedProbe::idle()),
    );

    let (urls, producer) = spawn_producer(InputSource::Http(list_url), reqwest::Client::new(), 8);
    let summary = tokio::time::timeout(Duration::from_secs(10), controller.run(urls))
        .await
        .expect("run did not finish");
    producer.await.unwrap();

    (sink, summary)
}

#[tokio::test]
async fn test_list_with_duplicates_and_failures() {
    let mock = MockImageServer::start().await;
    mock.mock_image("/a.png", fixtures::red_red_blue_green_png(), 1).await;
    mock.mock_image("/b.jpg", fixtures::solid(8, 8, [0, 0, 0], ImageFormat::Jpeg), 1)
        .await;
    mock.mock_image("/c.gif", fixtures::solid(2, 2, BLUE, ImageFormat::Gif), 1)
        .await;
    mock.mock_error("/missing.png", 404).await;

    let urls = vec![
        mock.url_for("/a.png"),
        mock.url_for("/b.jpg"),
        mock.url_for("/a.png"),
        mock.url_for("/missing.png"),
        mock.url_for("/c.gif"),
        mock.url_for("/b.jpg"),
    ];
    mock.mock_list("/input.txt", &urls).await;

    let (sink, summary) = run_list(mock.url_for("/input.txt")).await;

    assert_eq!(summary.urls_read, 6);
    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.duplicates_skipped, 2);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.rows_written, 3);
    assert!(!summary.source_truncated);

    let rows = sink.rows();
    assert_eq!(rows.len(), 3);
    assert!(rows.contains(&format!("{},#ff0000,#0000ff,#00ff00", mock.url_for("/a.png"))));
    assert!(rows.iter().any(|r| r.starts_with(&mock.url_for("/b.jpg"))));
    assert!(rows.iter().any(|r| r.starts_with(&mock.url_for("/c.gif"))));
    assert!(!rows.iter().any(|r| r.starts_with(&mock.url_for("/missing.png"))));
    // wiremock verifies each image was requested exactly once on drop
}

#[tokio::test]
async fn test_unreachable_list_ends_cleanly() {
    let mock = MockImageServer::start().await;
    mock.mock_error("/input.txt", 500).await;

    let (sink, summary) = run_list(mock.url_for("/input.txt")).await;

    assert!(summary.source_truncated);
    assert_eq!(summary.urls_read, 0);
    assert!(sink.rows().is_empty());
}

#[tokio::test]
async fn test_empty_list() {
    let mock = MockImageServer::start().await;
    mock.mock_list("/input.txt", &[]).await;

    let (sink, summary) = run_list(mock.url_for("/input.txt")).await;

    assert!(!summary.source_truncated);
    assert_eq!(summary, RunSummary { elapsed: summary.elapsed, ..RunSummary::default() });
    assert!(sink.rows().is_empty());
}
