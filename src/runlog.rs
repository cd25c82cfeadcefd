//! Durable run log and progress rendering.
//!
//! Every status line is appended to a UTF-8 text log with a timestamp and
//! mirrored to `tracing`. The log doubles as the human-readable audit trail
//! of past runs; the resume store additionally parses its `next pointer:`
//! lines as a fallback cursor source.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use tracing::info;

use crate::error::HarvestError;

/// Marker prefix of the log line recording each continuation pointer.
/// The resume store scans for this exact text.
pub const NEXT_POINTER_MARKER: &str = "next pointer: ";

/// Width of the rendered progress bar.
const BAR_LENGTH: usize = 40;

/// Append-only log of timestamped status lines.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line and mirrors it to `tracing`.
    pub fn append(&self, msg: &str) -> Result<(), HarvestError> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        info!("{msg}");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{timestamp}] {msg}")?;
        Ok(())
    }

    /// Records the continuation pointer for a fetched page, enabling resume.
    pub fn next_pointer(&self, href: &str) -> Result<(), HarvestError> {
        self.append(&format!("{NEXT_POINTER_MARKER}{href}"))
    }

    /// Appends a rendered progress line.
    pub fn progress(
        &self,
        current_page: u64,
        total_pages: u64,
        est_remaining: Duration,
    ) -> Result<(), HarvestError> {
        self.append(&render_progress(current_page, total_pages, est_remaining))
    }
}

/// Renders a textual progress indicator: a 40-char bar, percent complete,
/// and the estimated remaining time in minutes.
pub fn render_progress(current_page: u64, total_pages: u64, est_remaining: Duration) -> String {
    let total = total_pages.max(1);
    let progress = (current_page as f64 / total as f64).min(1.0);
    let filled = ((BAR_LENGTH as f64) * progress) as usize;
    let filled = filled.min(BAR_LENGTH);

    let mut bar = String::with_capacity(BAR_LENGTH);
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(BAR_LENGTH - filled));

    format!(
        "[{bar}] {:.1}% | estimated remaining: {:.1} min",
        progress * 100.0,
        est_remaining.as_secs_f64() / 60.0
    )
}
