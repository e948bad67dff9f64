//! `styleshift` -- command-line front-end for the style transfer service.
//!
//! Stages a content image and a style image, submits them as one job,
//! renders progress from the snapshot stream, and downloads the result
//! artifact when the job resolves.
//!
//! # Usage
//!
//! ```text
//! styleshift <content-image> <style-image> <output-file>
//! ```
//!
//! # Environment variables
//!
//! | Variable             | Required | Default                 | Description          |
//! |----------------------|----------|-------------------------|----------------------|
//! | `STYLESHIFT_API_URL` | no       | `http://localhost:5000` | Service base URL     |

use std::path::Path;
use std::sync::Arc;

use styleshift_client::api::TransferApi;
use styleshift_client::manager::TransferManager;
use styleshift_core::job::JobStatus;
use styleshift_core::staging::{AssetStaging, ImagePayload};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Service base URL used when `STYLESHIFT_API_URL` is unset.
const DEFAULT_API_URL: &str = "http://localhost:5000";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "styleshift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (content_path, style_path, output_path) = match (args.next(), args.next(), args.next()) {
        (Some(c), Some(s), Some(o)) => (c, s, o),
        _ => {
            eprintln!("Usage: styleshift <content-image> <style-image> <output-file>");
            std::process::exit(2);
        }
    };

    let api_url =
        std::env::var("STYLESHIFT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

    let mut staging = AssetStaging::new();
    staging.set_content(load_image(&content_path).await);
    staging.set_style(load_image(&style_path).await);

    let api = Arc::new(TransferApi::new(api_url.clone()));
    let manager = TransferManager::new(
        Arc::clone(&api) as Arc<dyn styleshift_client::backend::TransferBackend>
    );

    tracing::info!(api_url = %api_url, "Submitting style transfer job");

    let mut updates = match manager.submit(&mut staging).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(error = %e, "Submission rejected");
            std::process::exit(1);
        }
    };

    let mut last_progress = None;
    let terminal = loop {
        let snapshot = updates.borrow_and_update().clone();

        if last_progress != Some(snapshot.progress_percent) {
            last_progress = Some(snapshot.progress_percent);
            tracing::info!(
                status = %snapshot.status,
                percent = snapshot.progress_percent,
                "Progress update",
            );
        }

        if snapshot.status.is_terminal() {
            break snapshot;
        }
        if updates.changed().await.is_err() {
            break snapshot;
        }
    };

    match (terminal.status, terminal.result_reference) {
        (JobStatus::Complete, Some(url)) => {
            download(&api, &url, &output_path).await;
        }
        (JobStatus::TimedOut, Some(url)) => {
            tracing::warn!("Job timed out; downloading last known (possibly stale) artifact");
            download(&api, &url, &output_path).await;
        }
        (JobStatus::TimedOut, None) => {
            tracing::error!("Job timed out before any artifact became available");
            std::process::exit(1);
        }
        (status, _) => {
            tracing::error!(
                status = %status,
                error = terminal.error.as_deref().unwrap_or("unknown error"),
                "Transfer failed",
            );
            std::process::exit(1);
        }
    }
}

/// Read an image file into a staged payload, inferring the MIME type
/// from the file extension.
async fn load_image(path: &str) -> ImagePayload {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(path, error = %e, "Failed to read image file");
            std::process::exit(1);
        }
    };

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    ImagePayload::new(bytes, file_name, mime_for(path))
}

fn mime_for(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Fetch the artifact and write it to `output_path`.
async fn download(api: &TransferApi, url: &str, output_path: &str) {
    let bytes = match api.fetch_artifact(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(url, error = %e, "Failed to download result artifact");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::fs::write(output_path, &bytes).await {
        tracing::error!(path = output_path, error = %e, "Failed to write result file");
        std::process::exit(1);
    }

    tracing::info!(path = output_path, size = bytes.len(), "Result saved");
}
