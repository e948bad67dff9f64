//! Single-job transfer manager.
//!
//! [`TransferManager`] owns at most one live job at a time. Submitting
//! hands back a [`watch::Receiver`] of [`JobSnapshot`]s for reactive
//! consumption; the manager rejects submissions while a job is live
//! and cancels a superseded job's timers before arming new ones.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use styleshift_core::error::TransferError;
use styleshift_core::job::JobSnapshot;
use styleshift_core::staging::AssetStaging;
use styleshift_core::timings::JobTimings;

use crate::backend::TransferBackend;
use crate::runner;

/// Manages the single live transfer job.
///
/// Cheaply shareable behind an `Arc`; all methods take `&self`.
pub struct TransferManager {
    backend: Arc<dyn TransferBackend>,
    timings: JobTimings,
    current: Mutex<Option<ActiveJob>>,
}

/// Bookkeeping for the job currently owned by the manager.
struct ActiveJob {
    handle: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
    updates: watch::Receiver<JobSnapshot>,
}

impl TransferManager {
    /// Create a manager with the fixed default job timings.
    pub fn new(backend: Arc<dyn TransferBackend>) -> Self {
        Self::with_timings(backend, JobTimings::default())
    }

    /// Create a manager with explicit timings. Intended for tests; the
    /// consumer-facing surface never exposes timing knobs.
    pub fn with_timings(backend: Arc<dyn TransferBackend>, timings: JobTimings) -> Self {
        Self {
            backend,
            timings,
            current: Mutex::new(None),
        }
    }

    /// Submit the staged images as a new job.
    ///
    /// Rejected with [`TransferError::JobInFlight`] while the current
    /// job is live, and with [`TransferError::Validation`] (before any
    /// network call) when an input is missing or empty. On acceptance
    /// any previous terminal job's task is cancelled and replaced, so
    /// exactly one job's timers are ever armed.
    pub async fn submit(
        &self,
        staging: &mut AssetStaging,
    ) -> Result<watch::Receiver<JobSnapshot>, TransferError> {
        let mut current = self.current.lock().await;

        if let Some(active) = current.as_ref() {
            if !active.updates.borrow().status.accepts_submission() {
                return Err(TransferError::JobInFlight);
            }
        }

        let (content, style) = staging.take_pair()?;

        if let Some(previous) = current.take() {
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let (tx, rx) = watch::channel(JobSnapshot::idle());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(runner::drive(
            Arc::clone(&self.backend),
            content,
            style,
            self.timings.clone(),
            tx,
            cancel.clone(),
        ));

        *current = Some(ActiveJob {
            handle,
            cancel,
            updates: rx.clone(),
        });

        Ok(rx)
    }

    /// Latest snapshot of the current job, or the idle snapshot when no
    /// job has been submitted.
    pub async fn snapshot(&self) -> JobSnapshot {
        match self.current.lock().await.as_ref() {
            Some(active) => active.updates.borrow().clone(),
            None => JobSnapshot::idle(),
        }
    }

    /// Subscribe to the current job's snapshot stream, if any.
    pub async fn watch(&self) -> Option<watch::Receiver<JobSnapshot>> {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|active| active.updates.clone())
    }

    /// Cancel the current job and drop it (the UI reset path).
    ///
    /// All of the job's timers die with its task. A following `submit`
    /// is accepted regardless of the cancelled job's last status.
    pub async fn reset(&self) {
        if let Some(previous) = self.current.lock().await.take() {
            tracing::info!("Resetting transfer job");
            previous.cancel.cancel();
            previous.handle.abort();
        }
    }
}
