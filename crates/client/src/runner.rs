//! The lifecycle runner: one task owning one transfer job end to end.
//!
//! [`drive`] races the job lifecycle (submit -> poll -> probe ->
//! finalize) against the hard deadline and the manager's cancellation
//! token in a single `tokio::select!`. Dropping the lifecycle future
//! tears down every timer it owns, so exactly one job's timers are
//! ever alive.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use styleshift_core::cachebust::{bust_url, MarkerSeq, ProbeKind};
use styleshift_core::job::{JobSnapshot, JobStatus, TransferJob};
use styleshift_core::staging::ImagePayload;
use styleshift_core::timings::{JobTimings, SPECULATIVE_PROBE_THRESHOLD};

use crate::backend::TransferBackend;

/// Drive a single transfer job to a terminal snapshot.
///
/// The deadline arm never fails: whatever the backend does, the job
/// resolves to `TimedOut` at the latest, adopting the last published
/// result reference (possibly a speculative one, possibly none).
pub(crate) async fn drive(
    backend: Arc<dyn TransferBackend>,
    content: ImagePayload,
    style: ImagePayload,
    timings: JobTimings,
    updates: watch::Sender<JobSnapshot>,
    cancel: CancellationToken,
) {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::info!("Transfer job cancelled");
        }
        _ = tokio::time::sleep(timings.hard_deadline) => {
            let mut snapshot = updates.borrow().clone();
            if !snapshot.status.is_terminal() {
                tracing::warn!(
                    progress = snapshot.progress_percent,
                    adopted_reference = snapshot.result_reference.as_deref(),
                    "Hard deadline exceeded; resolving job as timed out",
                );
                snapshot.status = JobStatus::TimedOut;
                let _ = updates.send(snapshot);
            }
        }
        _ = run_lifecycle(backend.as_ref(), content, style, &timings, &updates) => {}
    }
}

/// The supervised lifecycle: submit, poll, settle, finalize.
async fn run_lifecycle(
    backend: &dyn TransferBackend,
    content: ImagePayload,
    style: ImagePayload,
    timings: &JobTimings,
    updates: &watch::Sender<JobSnapshot>,
) {
    let mut job = TransferJob::new();
    advance(&mut job, JobStatus::Submitted, updates);

    // No auto-retry here: submission is not idempotent-safe, the user
    // must resubmit explicitly.
    let reference = match backend.submit(content, style).await {
        Ok(reference) => reference,
        Err(e) => {
            tracing::error!(error = %e, "Submission failed");
            terminate(&mut job, format!("Submission failed: {e}"), updates);
            return;
        }
    };

    let artifact = backend.artifact_url(&reference);
    tracing::info!(artifact = %artifact, "Transfer job submitted");
    advance(&mut job, JobStatus::Polling, updates);

    let mut markers = MarkerSeq::new();
    poll_until_complete(backend, &artifact, &mut job, &mut markers, timings, updates).await;

    // Settle delay lets the backend flush the artifact to disk before
    // the authoritative probe.
    advance(&mut job, JobStatus::Finalizing, updates);
    tokio::time::sleep(timings.settle_delay).await;

    finalize(backend, &artifact, &mut job, &mut markers, timings, updates).await;
}

/// Query progress on a fixed cadence until it reaches 100.
///
/// Ticks are interval-scheduled and never queue: a slow response or
/// probe simply skips ticks. A failed query is logged and skipped;
/// only the deadline can terminate a stalled job.
async fn poll_until_complete(
    backend: &dyn TransferBackend,
    artifact: &str,
    job: &mut TransferJob,
    markers: &mut MarkerSeq,
    timings: &JobTimings,
    updates: &watch::Sender<JobSnapshot>,
) {
    let mut ticker = tokio::time::interval(timings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let percent = match backend.fetch_progress().await {
            Ok(percent) => percent,
            Err(e) => {
                tracing::warn!(error = %e, "Progress query failed; tick skipped");
                continue;
            }
        };

        job.record_progress(percent);
        publish(job, updates);
        tracing::debug!(percent = job.progress_percent(), "Progress update");

        if job.progress_percent() >= 100 {
            tracing::info!("Processing complete; handing off to finalization");
            return;
        }

        if job.progress_percent() >= SPECULATIVE_PROBE_THRESHOLD
            && job.result_reference().is_none()
        {
            speculative_probe(backend, artifact, job, markers, updates).await;
        }
    }
}

/// Best-effort early artifact check, at most once per poll tick.
///
/// Success makes a provisional render possible while polling continues;
/// failure is routine before completion and never counts as a retry.
async fn speculative_probe(
    backend: &dyn TransferBackend,
    artifact: &str,
    job: &mut TransferJob,
    markers: &mut MarkerSeq,
    updates: &watch::Sender<JobSnapshot>,
) {
    advance(job, JobStatus::Probing, updates);

    let url = bust_url(artifact, &markers.marker(ProbeKind::Speculative));
    match backend.probe_artifact(&url).await {
        Ok(()) => {
            tracing::info!(
                url = %url,
                percent = job.progress_percent(),
                "Intermediate artifact available",
            );
            job.set_result_reference(url);
        }
        Err(e) => {
            tracing::debug!(error = %e, "No intermediate artifact yet");
        }
    }

    advance(job, JobStatus::Polling, updates);
}

/// The finalization retry ladder: one authoritative probe, then up to
/// `max_retries` sequential re-probes with a fixed backoff. Every probe
/// uses a fresh cache-busting marker.
async fn finalize(
    backend: &dyn TransferBackend,
    artifact: &str,
    job: &mut TransferJob,
    markers: &mut MarkerSeq,
    timings: &JobTimings,
    updates: &watch::Sender<JobSnapshot>,
) {
    let url = bust_url(artifact, &markers.marker(ProbeKind::Final));
    match backend.probe_artifact(&url).await {
        Ok(()) => {
            complete(job, url, updates);
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Final artifact probe failed");
        }
    }

    loop {
        advance(job, JobStatus::Retrying, updates);
        if job.retry_count() >= timings.max_retries {
            break;
        }

        let attempt = job.increment_retry();
        publish(job, updates);
        tracing::info!(attempt, max = timings.max_retries, "Retrying final artifact load");

        tokio::time::sleep(timings.retry_delay).await;

        let url = bust_url(artifact, &markers.marker(ProbeKind::Retry(attempt)));
        match backend.probe_artifact(&url).await {
            Ok(()) => {
                complete(job, url, updates);
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "Retry probe failed");
            }
        }
    }

    tracing::error!(
        retries = job.retry_count(),
        "Max retries reached; result unavailable",
    );
    terminate(job, "result unavailable after maximum retries", updates);
}

// ---- snapshot helpers ----

fn publish(job: &TransferJob, updates: &watch::Sender<JobSnapshot>) {
    let _ = updates.send(job.snapshot());
}

fn advance(job: &mut TransferJob, next: JobStatus, updates: &watch::Sender<JobSnapshot>) {
    match job.transition(next) {
        Ok(()) => publish(job, updates),
        Err(e) => tracing::error!(error = %e, "Status transition rejected"),
    }
}

fn complete(job: &mut TransferJob, url: String, updates: &watch::Sender<JobSnapshot>) {
    job.set_result_reference(url);
    advance(job, JobStatus::Complete, updates);
    tracing::info!("Final artifact loaded; job complete");
}

fn terminate(
    job: &mut TransferJob,
    message: impl Into<String>,
    updates: &watch::Sender<JobSnapshot>,
) {
    match job.fail(message) {
        Ok(()) => publish(job, updates),
        Err(e) => tracing::error!(error = %e, "Failed to mark job as failed"),
    }
}
