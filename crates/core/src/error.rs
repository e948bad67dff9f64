use crate::job::JobStatus;

/// Errors surfaced by the transfer lifecycle.
///
/// Only `Validation`, `Submission`, `JobInFlight`, and `RetryExhausted`
/// carry user-visible messages. Transient polling and probing failures
/// are absorbed by the lifecycle runner and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// An input payload is missing or empty. No network call was made.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The creation request failed. Terminal; the user must resubmit.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// A non-terminal job already exists; one job at a time.
    #[error("A transfer job is already in flight")]
    JobInFlight,

    /// The final artifact never became fetchable within the retry budget.
    #[error("Result unavailable after {attempts} retries")]
    RetryExhausted { attempts: u32 },

    /// Internal invariant violation: a backward or undefined status move.
    /// Logged by the runner, never shown to the user.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
