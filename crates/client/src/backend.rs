//! Transport seam between the lifecycle runner and the service.
//!
//! The runner drives everything through [`TransferBackend`] so that
//! lifecycle behavior (polling cadence, retry ladder, deadline) can be
//! exercised against a scripted backend in tests. [`TransferApi`] is
//! the production implementation.

use async_trait::async_trait;
use styleshift_core::staging::ImagePayload;

use crate::api::{ApiError, TransferApi};

/// The three service operations the lifecycle depends on.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Submit both images; returns the result reference.
    async fn submit(
        &self,
        content: ImagePayload,
        style: ImagePayload,
    ) -> Result<String, ApiError>;

    /// Query the current progress percentage (0-100).
    async fn fetch_progress(&self) -> Result<u8, ApiError>;

    /// Check that the artifact at `url` (already cache-busted) exists.
    async fn probe_artifact(&self, url: &str) -> Result<(), ApiError>;

    /// Resolve a result reference to an absolute artifact URL.
    fn artifact_url(&self, reference: &str) -> String;
}

#[async_trait]
impl TransferBackend for TransferApi {
    async fn submit(
        &self,
        content: ImagePayload,
        style: ImagePayload,
    ) -> Result<String, ApiError> {
        Ok(TransferApi::submit(self, content, style).await?.result)
    }

    async fn fetch_progress(&self) -> Result<u8, ApiError> {
        TransferApi::fetch_progress(self).await
    }

    async fn probe_artifact(&self, url: &str) -> Result<(), ApiError> {
        TransferApi::probe_artifact(self, url).await
    }

    fn artifact_url(&self, reference: &str) -> String {
        TransferApi::artifact_url(self, reference)
    }
}
