//! Cache-busting markers for artifact probes.
//!
//! Every probe of the result artifact must hit a URL no earlier probe
//! of the same job has used, so a cached intermediate copy is never
//! mistaken for the final artifact. [`MarkerSeq`] issues the markers:
//! each one carries a wall-clock timestamp plus a per-job sequence
//! number, which keeps consecutive markers distinct even within the
//! same millisecond. The server ignores the query entirely.

use chrono::Utc;

/// Which phase of the lifecycle a probe belongs to.
///
/// The shapes follow the service's advisory convention: speculative
/// probes carry only a timestamp, the first finalization probe is
/// tagged `final=true`, and each retry carries its attempt number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// Pre-completion, best-effort check (progress >= threshold).
    Speculative,
    /// First authoritative probe after progress reached 100.
    Final,
    /// Numbered finalization retry attempt.
    Retry(u32),
}

/// Per-job marker generator.
#[derive(Debug, Default)]
pub struct MarkerSeq {
    next: u64,
}

impl MarkerSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next marker query string for `kind`.
    pub fn marker(&mut self, kind: ProbeKind) -> String {
        let seq = self.next;
        self.next += 1;
        let ts = Utc::now().timestamp_millis();
        match kind {
            ProbeKind::Speculative => format!("t={ts}&n={seq}"),
            ProbeKind::Final => format!("final=true&t={ts}&n={seq}"),
            ProbeKind::Retry(attempt) => format!("retry={attempt}&t={ts}&n={seq}"),
        }
    }
}

/// Append a marker query string to an artifact URL.
///
/// Uses `?` or `&` depending on whether the URL already carries a query.
pub fn bust_url(url: &str, marker: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{marker}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
