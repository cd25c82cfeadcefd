//! Resume-state store.
//!
//! The harvester records the upstream continuation pointer after every
//! successful page, twice: a structured state file written atomically
//! (the primary source on restart), and a `next pointer:` line in the run
//! log (the human-auditable trail, kept as a fallback so logs from runs
//! that predate the state file still resume correctly).

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HarvestError;
use crate::runlog::NEXT_POINTER_MARKER;
use crate::storage::write_atomic;

/// Structured resume state, one pointer deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeState {
    /// The continuation URL to fetch next.
    pub next: String,
    /// When the pointer was recorded (RFC 3339).
    pub recorded_at: String,
    /// Pages fetched by the run that recorded the pointer.
    pub pages_fetched: u64,
}

impl ResumeState {
    /// Atomically records the continuation pointer to the state file.
    pub fn record(state_path: &Path, next: &str, pages_fetched: u64) -> Result<(), HarvestError> {
        let state = ResumeState {
            next: next.to_string(),
            recorded_at: Utc::now().to_rfc3339(),
            pages_fetched,
        };
        let bytes = serde_json::to_vec_pretty(&state)
            .map_err(|e| HarvestError::Internal(format!("failed to serialize resume state: {e}")))?;
        write_atomic(state_path, &bytes)
    }
}

/// Recovers the most recently recorded continuation pointer, or `None` when
/// no run has recorded one - the harvest then starts from the dataset's
/// entry point.
///
/// The structured state file wins when present and readable; otherwise the
/// run log is scanned last-write-wins for its final `next pointer:` line,
/// tolerating entries from any number of historical runs.
pub fn recover_cursor(state_path: &Path, log_path: &Path) -> Option<String> {
    if let Some(next) = read_state_file(state_path) {
        return Some(next);
    }
    scan_log(log_path)
}

fn read_state_file(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<ResumeState>(&text) {
        Ok(state) => {
            let next = state.next.trim();
            if next.is_empty() {
                None
            } else {
                Some(next.to_string())
            }
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                "unreadable resume state ({e}), falling back to log scan"
            );
            None
        }
    }
}

fn scan_log(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    text.lines()
        .filter_map(|line| line.split(NEXT_POINTER_MARKER).nth(1))
        .map(str::trim)
        .filter(|pointer| !pointer.is_empty())
        .last()
        .map(str::to_string)
}
