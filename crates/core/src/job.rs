//! Transfer job entity and status state machine.
//!
//! [`TransferJob`] is the single live job instance. All lifecycle
//! components mutate it through the methods here, which enforce the
//! forward-only status transitions and the monotonic progress
//! invariant. [`JobSnapshot`] is the read-only view published to
//! consumers after every mutation.

use serde::Serialize;

use crate::error::TransferError;

/// Transfer job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job has been started yet.
    Idle,
    /// The creation request has been issued.
    Submitted,
    /// Progress is being queried on a fixed cadence.
    Polling,
    /// A speculative artifact probe is in flight.
    Probing,
    /// Progress reached 100; the final artifact is being loaded.
    Finalizing,
    /// The final artifact load failed; bounded retries are running.
    Retrying,
    /// The final artifact loaded successfully. Terminal.
    Complete,
    /// Submission failed or the retry budget was exhausted. Terminal.
    Failed,
    /// The hard deadline fired before a natural terminal status. Terminal.
    TimedOut,
}

impl JobStatus {
    /// Stable string form, used in logs and serialized snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Submitted => "submitted",
            JobStatus::Polling => "polling",
            JobStatus::Probing => "probing",
            JobStatus::Finalizing => "finalizing",
            JobStatus::Retrying => "retrying",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
        }
    }

    /// Whether the job has reached an end state.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed | JobStatus::TimedOut
        )
    }

    /// Whether a new submission may replace a job in this status.
    pub fn accepts_submission(self) -> bool {
        self == JobStatus::Idle || self.is_terminal()
    }

    /// Forward-only transition whitelist.
    ///
    /// `Polling <-> Probing` alternates during speculative probing;
    /// everything else moves strictly toward a terminal status. Any
    /// non-terminal status may be forced to `TimedOut` by the deadline.
    fn can_transition_to(self, next: JobStatus) -> bool {
        if !self.is_terminal() && next == JobStatus::TimedOut {
            return true;
        }
        matches!(
            (self, next),
            (JobStatus::Idle, JobStatus::Submitted)
                | (JobStatus::Submitted, JobStatus::Polling)
                | (JobStatus::Submitted, JobStatus::Failed)
                | (JobStatus::Polling, JobStatus::Probing)
                | (JobStatus::Polling, JobStatus::Finalizing)
                | (JobStatus::Probing, JobStatus::Polling)
                | (JobStatus::Probing, JobStatus::Finalizing)
                | (JobStatus::Finalizing, JobStatus::Complete)
                | (JobStatus::Finalizing, JobStatus::Retrying)
                | (JobStatus::Retrying, JobStatus::Retrying)
                | (JobStatus::Retrying, JobStatus::Complete)
                | (JobStatus::Retrying, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a [`TransferJob`], published after every
/// mutation for reactive consumption by a UI or CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Completion percentage (0-100).
    pub progress_percent: u8,
    /// Cache-busted artifact URL, once a probe has confirmed it.
    pub result_reference: Option<String>,
    /// Finalization retry attempts consumed so far.
    pub retry_count: u32,
    /// User-visible error message, set only on `Failed`.
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Snapshot of a job that has not been submitted yet.
    pub fn idle() -> Self {
        TransferJob::new().snapshot()
    }
}

/// The single live transfer job.
///
/// Created per submission; mutated exclusively by the lifecycle runner.
#[derive(Debug)]
pub struct TransferJob {
    status: JobStatus,
    progress_percent: u8,
    result_reference: Option<String>,
    retry_count: u32,
    error: Option<String>,
}

impl TransferJob {
    /// Create a fresh job in `Idle` with zeroed progress and retries.
    pub fn new() -> Self {
        Self {
            status: JobStatus::Idle,
            progress_percent: 0,
            result_reference: None,
            retry_count: 0,
            error: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result_reference(&self) -> Option<&str> {
        self.result_reference.as_deref()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Move to `next`, rejecting backward or undefined transitions.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), TransferError> {
        if !self.status.can_transition_to(next) {
            return Err(TransferError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Record a progress reading.
    ///
    /// Values above 100 are clamped. A reading below the current value
    /// is ignored (the backend is trusted not to regress; a regression
    /// indicates a stale response and is logged, not applied).
    pub fn record_progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent < self.progress_percent {
            tracing::warn!(
                current = self.progress_percent,
                reported = percent,
                "Ignoring regressing progress reading",
            );
            return;
        }
        self.progress_percent = percent;
    }

    /// Adopt a probed artifact URL as the current result reference.
    ///
    /// Later writes win: each probe uses a fresher cache-busting marker
    /// of the same logical artifact, so overwriting is always safe.
    pub fn set_result_reference(&mut self, url: impl Into<String>) {
        self.result_reference = Some(url.into());
    }

    /// Consume one retry attempt and return the new count.
    pub fn increment_retry(&mut self) -> u32 {
        self.retry_count += 1;
        self.retry_count
    }

    /// Terminate the job as `Failed` with a user-visible message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransferError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(message.into());
        Ok(())
    }

    /// Forcibly terminate as `TimedOut`, keeping whatever result
    /// reference is currently known (possibly speculative, possibly none).
    pub fn force_timeout(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::TimedOut;
    }

    /// Current read-only view.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            progress_percent: self.progress_percent,
            result_reference: self.result_reference.clone(),
            retry_count: self.retry_count,
            error: self.error.clone(),
        }
    }
}

impl Default for TransferJob {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
