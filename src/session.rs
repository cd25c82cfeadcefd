//! Per-run harvest context.
//!
//! A [`HarvestSession`] is constructed once per process and passed
//! explicitly to the harvester and tools; no state lives in module globals.
//! Counters reset every run - the only thing that crosses runs is the
//! filesystem (chunk files, run log, resume state).

use std::fs;

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::runlog::RunLog;

/// Ephemeral per-run counts. Only the log's textual trace persists them.
#[derive(Debug, Default, Clone)]
pub struct RunCounters {
    /// Pages fetched successfully this run.
    pub pages_fetched: u64,
    /// New records admitted to the buffer this run.
    pub records_added: u64,
    /// Records skipped because their id was already in the dedup index.
    pub duplicates_skipped: u64,
    /// Chunk files written this run.
    pub chunks_written: u64,
    /// Consecutive failed page requests.
    pub error_streak: u32,
    /// Consecutive pages with an empty record list.
    pub empty_streak: u32,
}

/// Explicit context for one run: configuration, the durable run log, and
/// the run counters.
pub struct HarvestSession {
    pub config: HarvestConfig,
    pub log: RunLog,
    pub counters: RunCounters,
}

impl HarvestSession {
    /// Creates the session, ensuring the data directory exists.
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        fs::create_dir_all(&config.data_dir)?;
        let log = RunLog::new(config.log_path());
        Ok(Self {
            config,
            log,
            counters: RunCounters::default(),
        })
    }
}
