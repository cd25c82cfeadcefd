//! Split entry point: re-partition the canonical dataset into fresh,
//! bounded chunk files.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nvdb_harvester::storage::split_merged;
use nvdb_harvester::{HarvestConfig, HarvestSession};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() {
    init_tracing();

    let config = HarvestConfig::from_env();
    let session = match HarvestSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("failed to initialize session: {e}");
            std::process::exit(1);
        }
    };

    match split_merged(&session) {
        Ok(summary) => {
            info!(
                "split {} records into {} chunk files",
                summary.total_records, summary.chunks_written
            );
        }
        Err(e) => {
            error!("split failed: {e}");
            std::process::exit(1);
        }
    }
}
