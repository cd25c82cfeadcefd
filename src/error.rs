use thiserror::Error;

/// Application-wide error type.
///
/// The variants follow the harvest failure taxonomy: transient conditions are
/// absorbed by the harvester up to its streak ceilings, streak and capacity
/// conditions abort the run, and structural conditions are immediately fatal
/// for the merge/split tools.
#[derive(Debug, Error)]
pub enum HarvestError {
    // ── Transient (retried with backoff, counted in the error streak) ─────────
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("upstream returned HTTP {status}: {body_excerpt}")]
    UpstreamStatus { status: u16, body_excerpt: String },

    #[error("malformed page body: {0}")]
    MalformedBody(String),

    // ── Streak escalations ────────────────────────────────────────────────────
    #[error("aborting after {streak} consecutive failed page requests")]
    ErrorStreakExceeded { streak: u32 },

    #[error("aborting after {streak} consecutive empty pages")]
    EmptyStreakExceeded { streak: u32 },

    // ── Capacity ──────────────────────────────────────────────────────────────
    #[error("upstream declares {declared} records, exceeding the ceiling of {ceiling}")]
    TotalCeilingExceeded { declared: u64, ceiling: u64 },

    #[error("serialized output is {actual} bytes, exceeding the ceiling of {ceiling}")]
    SizeCeilingExceeded { actual: u64, ceiling: u64 },

    // ── Structural ────────────────────────────────────────────────────────────
    #[error("structural error: {0}")]
    Structural(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HarvestError {
    /// True for conditions the harvester retries internally rather than
    /// escalating: network failures, non-2xx statuses, and bodies that fail
    /// to parse. Everything else terminates the run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HarvestError::ConnectionFailed(_)
                | HarvestError::UpstreamStatus { .. }
                | HarvestError::MalformedBody(_)
        )
    }
}
