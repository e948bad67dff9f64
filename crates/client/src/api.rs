//! REST API client for the style transfer service.
//!
//! Wraps the service's three HTTP surfaces (job submission, progress
//! query, artifact retrieval) using [`reqwest`].

use serde::Deserialize;
use styleshift_core::staging::ImagePayload;

/// HTTP client for a single style transfer service.
pub struct TransferApi {
    client: reqwest::Client,
    base_url: String,
}

/// Response returned by `POST /api/upload` after a job is accepted.
///
/// The service echoes the stored input paths as well; only the result
/// reference matters to the lifecycle, so extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned reference to the (future) result artifact.
    pub result: String,
}

/// Response returned by `GET /api/progress`.
#[derive(Debug, Deserialize)]
struct ProgressResponse {
    progress: i64,
}

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Service error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl TransferApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Base HTTP URL of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a result reference to an absolute artifact URL.
    ///
    /// The service normally returns a path fragment like
    /// `/api/results/<uuid>.jpg`; absolute URLs pass through unchanged.
    pub fn artifact_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}{}", self.base_url, reference)
        }
    }

    /// Submit both images as a multipart `POST /api/upload`.
    ///
    /// Returns the server-assigned result reference.
    pub async fn submit(
        &self,
        content: ImagePayload,
        style: ImagePayload,
    ) -> Result<SubmitResponse, ApiError> {
        let form = reqwest::multipart::Form::new()
            .part("content", Self::image_part(content)?)
            .part("style", Self::image_part(style)?);

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Query the current progress percentage via `GET /api/progress`.
    ///
    /// Out-of-range values are clamped to 0-100.
    pub async fn fetch_progress(&self) -> Result<u8, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/progress", self.base_url))
            .send()
            .await?;

        let parsed: ProgressResponse = Self::parse_response(response).await?;
        Ok(parsed.progress.clamp(0, 100) as u8)
    }

    /// Check that the artifact at `url` is fetchable.
    ///
    /// `url` must already carry its cache-busting marker. The body is
    /// discarded; only the status matters.
    pub async fn probe_artifact(&self, url: &str) -> Result<(), ApiError> {
        let response = self.client.get(url).send().await?;
        Self::check_status(response).await
    }

    /// Download the artifact bytes at `url`.
    pub async fn fetch_artifact(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Build a multipart part from a staged image payload.
    fn image_part(payload: ImagePayload) -> Result<reqwest::multipart::Part, ApiError> {
        let part = reqwest::multipart::Part::bytes(payload.bytes)
            .file_name(payload.file_name)
            .mime_str(&payload.content_type)
            .map_err(ApiError::Request)?;
        Ok(part)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ApiError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_url_joins_relative_reference() {
        let api = TransferApi::new("http://localhost:5000");
        assert_eq!(
            api.artifact_url("/api/results/abc.jpg"),
            "http://localhost:5000/api/results/abc.jpg"
        );
    }

    #[test]
    fn artifact_url_passes_absolute_reference_through() {
        let api = TransferApi::new("http://localhost:5000");
        assert_eq!(
            api.artifact_url("https://cdn.example.com/abc.jpg"),
            "https://cdn.example.com/abc.jpg"
        );
    }
}
