//! The paginated harvest loop.
//!
//! Drives the fetch cycle: issue a page request, classify the outcome
//! (success / transient failure / empty), apply retry-with-backoff and
//! streak-based abort policies, normalize and deduplicate records, flush
//! bounded chunks, and advance the continuation cursor. Progress is
//! checkpointed after every page (resume state) and every chunk flush, so a
//! killed run loses at most one partially filled chunk's worth of records.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::config::HarvestConfig;
use crate::dedup::DedupIndex;
use crate::error::HarvestError;
use crate::geometry::convert_wkt_linestring;
use crate::nvdb::client::{initial_page_url, NvdbClient};
use crate::record::SpeedLimitRecord;
use crate::resume::{recover_cursor, ResumeState};
use crate::session::HarvestSession;
use crate::storage::ChunkStore;

/// Cap on the backoff doubling: 2^5 = 32× the base delay.
const MAX_BACKOFF_EXPONENT: u32 = 5;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The upstream returned a page without a continuation cursor.
    UpstreamExhausted,
    /// The per-run page budget ran out before the upstream did.
    PageBudgetExhausted,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub pages_fetched: u64,
    pub records_added: u64,
    pub duplicates_skipped: u64,
    pub chunks_written: u64,
    pub reason: CompletionReason,
}

// ─────────────────────────────────────────────────────────────────────────────
// Harvester
// ─────────────────────────────────────────────────────────────────────────────

/// One run's harvest state: the HTTP client, the rehydrated dedup index,
/// the chunk store, and the in-memory record buffer.
pub struct Harvester {
    client: NvdbClient,
    dedup: DedupIndex,
    chunks: ChunkStore,
    buffer: Vec<SpeedLimitRecord>,
}

impl Harvester {
    /// Builds the harvester for a session, rehydrating the dedup index from
    /// every chunk file already on disk.
    pub fn new(session: &HarvestSession) -> Result<Self, HarvestError> {
        let client = NvdbClient::new(&session.config)?;
        let chunks = ChunkStore::new(
            &session.config.data_dir,
            session.config.merged_ceiling_bytes,
        );

        let mut dedup = DedupIndex::new();
        let rehydrated = dedup.rehydrate(&chunks, &session.log)?;
        if rehydrated > 0 {
            session
                .log
                .append(&format!("rehydrated {rehydrated} previously persisted ids"))?;
        }

        Ok(Self {
            client,
            dedup,
            chunks,
            buffer: Vec::new(),
        })
    }

    /// Runs the harvest loop to completion.
    ///
    /// The loop ends successfully when the upstream stops providing a
    /// continuation cursor or the page budget is exhausted. It fails when a
    /// streak ceiling is reached, the declared total exceeds the sanity
    /// ceiling, or a recorded pointer cannot be parsed. The buffer is
    /// flushed on every exit path, including streak aborts.
    pub async fn run(
        &mut self,
        session: &mut HarvestSession,
    ) -> Result<HarvestSummary, HarvestError> {
        let config = session.config.clone();
        session.log.append("starting harvest run")?;

        let mut cursor = match recover_cursor(&config.state_path(), &config.log_path()) {
            Some(raw) => {
                session
                    .log
                    .append(&format!("resuming from recorded pointer: {raw}"))?;
                Url::parse(&raw).map_err(|e| {
                    HarvestError::Structural(format!(
                        "recorded resume pointer is not a valid URL: {e}"
                    ))
                })?
            }
            None => {
                session
                    .log
                    .append("no resume pointer found, starting from the first page")?;
                initial_page_url(&config)
            }
        };

        let mut expected_pages: Option<u64> = None;
        let mut total_checked = false;
        let mut fetch_time = Duration::ZERO;
        let reason;

        loop {
            if session.counters.pages_fetched >= config.max_pages as u64 {
                session.log.append(&format!(
                    "page budget of {} exhausted, stopping",
                    config.max_pages
                ))?;
                reason = CompletionReason::PageBudgetExhausted;
                break;
            }

            let started = Instant::now();
            let page = match self.client.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(err) => {
                    session.counters.error_streak += 1;
                    let streak = session.counters.error_streak;
                    session.log.append(&format!(
                        "page request failed ({err}), error streak {streak}/{}",
                        config.error_limit
                    ))?;
                    if streak >= config.error_limit {
                        self.flush_buffer(session, &config)?;
                        return Err(HarvestError::ErrorStreakExceeded { streak });
                    }
                    sleep(backoff_delay(&config, streak)).await;
                    continue;
                }
            };
            session.counters.error_streak = 0;
            session.counters.pages_fetched += 1;
            fetch_time += started.elapsed();

            // The declared total is only present (and only checked) on the
            // first successful page of the run.
            if !total_checked {
                total_checked = true;
                if let Some(declared) = page.declared_total() {
                    session
                        .log
                        .append(&format!("upstream declares {declared} records total"))?;
                    if declared > config.total_ceiling {
                        return Err(HarvestError::TotalCeilingExceeded {
                            declared,
                            ceiling: config.total_ceiling,
                        });
                    }
                    expected_pages =
                        Some(declared.div_ceil(config.page_size as u64).max(1));
                }
            }

            if page.objekter.is_empty() {
                session.counters.empty_streak += 1;
                let streak = session.counters.empty_streak;
                session.log.append(&format!(
                    "empty page, empty streak {streak}/{}",
                    config.empty_limit
                ))?;
                if streak >= config.empty_limit {
                    self.flush_buffer(session, &config)?;
                    return Err(HarvestError::EmptyStreakExceeded { streak });
                }
            } else {
                // Streaks are page-scoped: a non-empty page of entirely
                // already-seen records still resets the empty streak.
                session.counters.empty_streak = 0;

                let mut new_on_page = 0u64;
                for raw in &page.objekter {
                    let Some(id) = raw.canonical_id() else {
                        warn!("skipping road object without a usable id");
                        continue;
                    };
                    if self.dedup.contains(&id) {
                        session.counters.duplicates_skipped += 1;
                        continue;
                    }

                    let geometry = raw.wkt().and_then(convert_wkt_linestring);
                    let speed_limit = raw.speed_limit();
                    self.buffer.push(SpeedLimitRecord {
                        id: id.clone(),
                        geometry,
                        speed_limit,
                    });
                    self.dedup.insert(id);
                    new_on_page += 1;
                }
                session.counters.records_added += new_on_page;
                debug!(
                    page = session.counters.pages_fetched,
                    new_on_page, "processed page"
                );

                while self.buffer.len() >= config.chunk_size {
                    self.flush_chunk(session, config.chunk_size)?;
                }
            }

            if let Some(total_pages) = expected_pages {
                let current = session.counters.pages_fetched;
                let mean = fetch_time / current.max(1) as u32;
                let remaining = total_pages.saturating_sub(current) as u32;
                session.log.progress(current, total_pages, mean * remaining)?;
            }

            match page.next_href() {
                None => {
                    session
                        .log
                        .append("no continuation cursor in page metadata, harvest complete")?;
                    reason = CompletionReason::UpstreamExhausted;
                    break;
                }
                Some(href) => {
                    session.log.next_pointer(href)?;
                    ResumeState::record(
                        &config.state_path(),
                        href,
                        session.counters.pages_fetched,
                    )?;
                    cursor = Url::parse(href).map_err(|e| {
                        HarvestError::Structural(format!(
                            "upstream continuation is not a valid URL: {e}"
                        ))
                    })?;
                    sleep(config.request_delay).await;
                }
            }
        }

        self.flush_buffer(session, &config)?;

        let summary = HarvestSummary {
            pages_fetched: session.counters.pages_fetched,
            records_added: session.counters.records_added,
            duplicates_skipped: session.counters.duplicates_skipped,
            chunks_written: session.counters.chunks_written,
            reason,
        };
        session.log.append(&format!(
            "harvest finished: {} pages, {} new records, {} duplicates skipped, {} chunks written",
            summary.pages_fetched,
            summary.records_added,
            summary.duplicates_skipped,
            summary.chunks_written
        ))?;
        Ok(summary)
    }

    /// Writes up to `take` buffered records as one new chunk.
    fn flush_chunk(
        &mut self,
        session: &mut HarvestSession,
        take: usize,
    ) -> Result<(), HarvestError> {
        let take = take.min(self.buffer.len());
        if take == 0 {
            return Ok(());
        }
        let slice: Vec<SpeedLimitRecord> = self.buffer.drain(..take).collect();
        let index = self.chunks.next_part_index()?;
        let (path, size) = self.chunks.write_chunk(&slice, index)?;
        session.counters.chunks_written += 1;
        session.log.append(&format!(
            "wrote {} records to {} ({size} bytes)",
            slice.len(),
            path.display()
        ))?;
        Ok(())
    }

    /// Flushes everything left in the buffer, in `chunk_size` slices.
    fn flush_buffer(
        &mut self,
        session: &mut HarvestSession,
        config: &HarvestConfig,
    ) -> Result<(), HarvestError> {
        while !self.buffer.is_empty() {
            self.flush_chunk(session, config.chunk_size)?;
        }
        Ok(())
    }
}

/// Convenience entry point: build a harvester for the session and run it.
pub async fn run_harvest(session: &mut HarvestSession) -> Result<HarvestSummary, HarvestError> {
    let mut harvester = Harvester::new(session)?;
    harvester.run(session).await
}

/// Exponential backoff: `retry_base_delay * 2^(streak-1)`, capped.
fn backoff_delay(config: &HarvestConfig, streak: u32) -> Duration {
    let exponent = streak.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    config
        .retry_base_delay
        .saturating_mul(1 << exponent)
        .min(config.retry_max_delay)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
