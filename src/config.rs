//! Harvest configuration.
//!
//! All behavior is controlled here rather than by command-line arguments:
//! the upstream endpoint and filters, page/chunk sizing, streak ceilings,
//! politeness delays, and output paths. A small set of values can be
//! promoted to environment variables without changing semantics.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// NVDB road-object endpoint for speed-limit segments (object type 105).
const DEFAULT_BASE_URL: &str = "https://nvdbapiles-v3.atlas.vegvesen.no/vegobjekter/105";

/// County filter: 11 = Rogaland.
const DEFAULT_COUNTY: &str = "11";

/// Spatial reference system for returned geometry (WGS 84).
const DEFAULT_SRID: &str = "4326";

/// Response sections to include per object.
const DEFAULT_INCLUDE: &str = "geometri,egenskaper";

/// Client identification sent in the `X-Client` header. NVDB asks callers
/// to identify themselves; override with `NVDB_CLIENT_NAME`.
const DEFAULT_CLIENT_NAME: &str = "nvdb-harvester";

/// User agent string for all NVDB requests.
const DEFAULT_USER_AGENT: &str = "nvdb-harvester/0.1 (speed-limit cache builder)";

/// Request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

const LOG_FILE: &str = "speedlimits.log";
const STATE_FILE: &str = "harvest_state.json";
const MERGED_FILE: &str = "speedlimits_merged.json";

// ─────────────────────────────────────────────────────────────────────────────
// HarvestConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for a harvest run and the merge/split tools.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// First-page endpoint; later pages follow the upstream continuation URL.
    pub base_url: Url,
    /// County filter sent on the first request (`fylke`).
    pub county: String,
    /// Spatial reference system (`srid`).
    pub srid: String,
    /// Included response sections (`inkluder`).
    pub include: String,
    /// Records requested per page (`antall`).
    pub page_size: u32,
    /// Maximum records per chunk file.
    pub chunk_size: usize,
    /// Sanity ceiling on the upstream's declared total record count. A
    /// declared total above this aborts the run before fetching further
    /// pages; it means the filter is returning far more than one county's
    /// speed limits.
    pub total_ceiling: u64,
    /// Consecutive failed page requests tolerated before aborting.
    pub error_limit: u32,
    /// Consecutive empty pages tolerated before aborting.
    pub empty_limit: u32,
    /// Hard budget on pages fetched in one run.
    pub max_pages: u32,
    /// Politeness delay between successive page requests.
    pub request_delay: Duration,
    /// Base delay for exponential backoff after a failed request.
    pub retry_base_delay: Duration,
    /// Cap on the backoff delay.
    pub retry_max_delay: Duration,
    /// Byte ceiling for the canonical dataset and for each chunk file.
    pub merged_ceiling_bytes: u64,
    /// `X-Client` header value.
    pub client_name: String,
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Directory holding chunk files, the canonical dataset, the run log,
    /// and the resume state file.
    pub data_dir: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default NVDB endpoint is a valid URL"),
            county: DEFAULT_COUNTY.to_string(),
            srid: DEFAULT_SRID.to_string(),
            include: DEFAULT_INCLUDE.to_string(),
            page_size: 1_000,
            chunk_size: 10_000,
            total_ceiling: 20_000,
            error_limit: 10,
            empty_limit: 50,
            max_pages: 10_000,
            request_delay: Duration::from_millis(200),
            retry_base_delay: Duration::from_secs(2),
            retry_max_delay: Duration::from_secs(60),
            merged_ceiling_bytes: 50 * 1024 * 1024,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl HarvestConfig {
    /// Builds a config from the defaults with environment overrides applied:
    /// `NVDB_DATA_DIR`, `NVDB_CLIENT_NAME`, `NVDB_COUNTY`, `NVDB_PAGE_SIZE`,
    /// `NVDB_CHUNK_SIZE`. Unparseable numeric values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var("NVDB_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(name) = env::var("NVDB_CLIENT_NAME") {
            if !name.trim().is_empty() {
                config.client_name = name;
            }
        }
        if let Ok(county) = env::var("NVDB_COUNTY") {
            if !county.trim().is_empty() {
                config.county = county;
            }
        }
        if let Some(page_size) = env::var("NVDB_PAGE_SIZE")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.page_size = page_size;
        }
        if let Some(chunk_size) = env::var("NVDB_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.chunk_size = chunk_size;
        }

        config
    }

    /// Path of the durable run log.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Path of the structured resume-state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    /// Path of the canonical merged dataset.
    pub fn merged_path(&self) -> PathBuf {
        self.data_dir.join(MERGED_FILE)
    }
}
