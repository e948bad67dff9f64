//! Fixed timing parameters for one transfer job.

use std::time::Duration;

/// Interval between progress queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Pause between completion signal and the first finalization probe,
/// giving the backend time to flush the artifact to disk.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Fixed backoff between finalization retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Absolute ceiling on total job duration, armed at submission.
pub const DEFAULT_HARD_DEADLINE: Duration = Duration::from_millis(120_000);

/// Maximum finalization retry attempts before declaring failure.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Progress percentage at which speculative probing begins.
pub const SPECULATIVE_PROBE_THRESHOLD: u8 = 50;

/// Timing parameters for a job. Fixed per job and never exposed through
/// the consumer-facing surface; non-default values exist for tests.
#[derive(Debug, Clone)]
pub struct JobTimings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub retry_delay: Duration,
    pub hard_deadline: Duration,
    pub max_retries: u32,
}

impl Default for JobTimings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            retry_delay: DEFAULT_RETRY_DELAY,
            hard_deadline: DEFAULT_HARD_DEADLINE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let t = JobTimings::default();
        assert_eq!(t.poll_interval, Duration::from_secs(2));
        assert_eq!(t.settle_delay, Duration::from_secs(2));
        assert_eq!(t.retry_delay, Duration::from_secs(2));
        assert_eq!(t.hard_deadline, Duration::from_secs(120));
        assert_eq!(t.max_retries, 5);
    }
}
