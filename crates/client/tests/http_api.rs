//! HTTP wrapper tests against an in-process service stub.
//!
//! A small axum app stands in for the style transfer service: it
//! records the multipart fields it receives, serves a scripted
//! progress value, and materializes the artifact on demand.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Multipart, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use styleshift_client::api::{ApiError, TransferApi};
use styleshift_client::manager::TransferManager;
use styleshift_core::job::JobStatus;
use styleshift_core::staging::{AssetStaging, ImagePayload};
use styleshift_core::timings::JobTimings;

// ---------------------------------------------------------------------------
// Service stub
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct ServiceStub {
    inner: Arc<StubState>,
}

#[derive(Default)]
struct StubState {
    /// Reported progress value (may be scripted out of range).
    progress: AtomicI64,
    /// Whether `GET /api/results/out.jpg` answers 200.
    artifact_ready: AtomicBool,
    /// `(field name, byte length)` of every uploaded multipart part.
    uploads: Mutex<Vec<(String, usize)>>,
    /// Raw query string of every artifact request.
    artifact_queries: Mutex<Vec<String>>,
}

impl ServiceStub {
    fn set_progress(&self, value: i64) {
        self.inner.progress.store(value, Ordering::SeqCst);
    }

    fn set_artifact_ready(&self, ready: bool) {
        self.inner.artifact_ready.store(ready, Ordering::SeqCst);
    }

    fn uploads(&self) -> Vec<(String, usize)> {
        self.inner.uploads.lock().unwrap().clone()
    }

    fn artifact_queries(&self) -> Vec<String> {
        self.inner.artifact_queries.lock().unwrap().clone()
    }
}

async fn upload(State(stub): State<ServiceStub>, mut multipart: Multipart) -> Json<serde_json::Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        stub.inner.uploads.lock().unwrap().push((name, bytes.len()));
    }
    // The real service also echoes the stored input paths.
    Json(json!({
        "content": "/api/uploads/content.jpg",
        "style": "/api/uploads/style.jpg",
        "result": "/api/results/out.jpg",
    }))
}

async fn progress(State(stub): State<ServiceStub>) -> Json<serde_json::Value> {
    Json(json!({ "progress": stub.inner.progress.load(Ordering::SeqCst) }))
}

async fn artifact(State(stub): State<ServiceStub>, RawQuery(query): RawQuery) -> Response {
    stub.inner
        .artifact_queries
        .lock()
        .unwrap()
        .push(query.unwrap_or_default());

    if stub.inner.artifact_ready.load(Ordering::SeqCst) {
        (StatusCode::OK, vec![0xFF, 0xD8, 0xFF, 0xE0]).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn spawn_stub(stub: ServiceStub) -> String {
    let app = Router::new()
        .route("/api/upload", post(upload))
        .route("/api/progress", get(progress))
        .route("/api/results/{file}", get(artifact))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn staged_pair() -> AssetStaging {
    let mut staging = AssetStaging::new();
    staging.set_content(ImagePayload::new(vec![1, 2, 3, 4], "content.jpg", "image/jpeg"));
    staging.set_style(ImagePayload::new(vec![5, 6], "style.png", "image/png"));
    staging
}

// ---------------------------------------------------------------------------
// Wrapper behavior
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn submit_sends_both_multipart_fields() {
    let stub = ServiceStub::default();
    let base_url = spawn_stub(stub.clone()).await;
    let api = TransferApi::new(base_url);

    let (content, style) = staged_pair().take_pair().unwrap();
    let response = api.submit(content, style).await.unwrap();

    assert_eq!(response.result, "/api/results/out.jpg");
    assert_eq!(
        stub.uploads(),
        vec![("content".to_string(), 4), ("style".to_string(), 2)]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_progress_parses_value() {
    let stub = ServiceStub::default();
    let base_url = spawn_stub(stub.clone()).await;
    let api = TransferApi::new(base_url);

    stub.set_progress(55);
    assert_eq!(api.fetch_progress().await.unwrap(), 55);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_progress_clamps_out_of_range_values() {
    let stub = ServiceStub::default();
    let base_url = spawn_stub(stub.clone()).await;
    let api = TransferApi::new(base_url);

    stub.set_progress(250);
    assert_eq!(api.fetch_progress().await.unwrap(), 100);

    stub.set_progress(-5);
    assert_eq!(api.fetch_progress().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn probe_reports_missing_artifact_as_status_error() {
    let stub = ServiceStub::default();
    let base_url = spawn_stub(stub.clone()).await;
    let api = TransferApi::new(base_url.clone());

    let url = format!("{base_url}/api/results/out.jpg?t=1&n=0");
    let err = api.probe_artifact(&url).await.unwrap_err();
    assert_matches!(err, ApiError::Status { status: 404, .. });

    stub.set_artifact_ready(true);
    api.probe_artifact(&url).await.unwrap();

    // The advisory query reached the server untouched.
    assert_eq!(stub.artifact_queries(), vec!["t=1&n=0", "t=1&n=0"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_artifact_returns_bytes() {
    let stub = ServiceStub::default();
    stub.set_artifact_ready(true);
    let base_url = spawn_stub(stub.clone()).await;
    let api = TransferApi::new(base_url.clone());

    let bytes = api
        .fetch_artifact(&format!("{base_url}/api/results/out.jpg"))
        .await
        .unwrap();
    assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

// ---------------------------------------------------------------------------
// End to end against the stub
// ---------------------------------------------------------------------------

fn fast_timings() -> JobTimings {
    JobTimings {
        poll_interval: std::time::Duration::from_millis(10),
        settle_delay: std::time::Duration::from_millis(10),
        retry_delay: std::time::Duration::from_millis(10),
        hard_deadline: std::time::Duration::from_secs(5),
        max_retries: 5,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_complete_over_http() {
    let stub = ServiceStub::default();
    stub.set_progress(100);
    stub.set_artifact_ready(true);
    let base_url = spawn_stub(stub.clone()).await;

    let api = Arc::new(TransferApi::new(base_url.clone()));
    let manager = TransferManager::with_timings(api, fast_timings());

    let mut rx = manager.submit(&mut staged_pair()).await.unwrap();
    let snapshot = loop {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        rx.changed().await.unwrap();
    };

    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(snapshot.retry_count, 0);
    let reference = snapshot.result_reference.unwrap();
    assert!(reference.starts_with(&format!("{base_url}/api/results/out.jpg?final=true&t=")));

    let queries = stub.artifact_queries();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].starts_with("final=true&t="));
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_deadline_over_http() {
    let stub = ServiceStub::default();
    stub.set_progress(10); // never advances, artifact never ready
    let base_url = spawn_stub(stub.clone()).await;

    let api = Arc::new(TransferApi::new(base_url));
    let timings = JobTimings {
        hard_deadline: std::time::Duration::from_millis(100),
        ..fast_timings()
    };
    let manager = TransferManager::with_timings(api, timings);

    let mut rx = manager.submit(&mut staged_pair()).await.unwrap();
    let snapshot = loop {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        if rx.changed().await.is_err() {
            break rx.borrow().clone();
        }
    };

    assert_eq!(snapshot.status, JobStatus::TimedOut);
    assert!(snapshot.result_reference.is_none());
}
