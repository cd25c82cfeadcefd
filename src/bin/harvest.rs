//! Harvest entry point: fetch all speed-limit pages, resuming from the last
//! recorded cursor, and persist new records as chunk files.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nvdb_harvester::nvdb::run_harvest;
use nvdb_harvester::{HarvestConfig, HarvestSession};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = HarvestConfig::from_env();
    let mut session = match HarvestSession::new(config) {
        Ok(session) => session,
        Err(e) => {
            error!("failed to initialize harvest session: {e}");
            std::process::exit(1);
        }
    };

    match run_harvest(&mut session).await {
        Ok(summary) => {
            info!(
                "done: {} pages, {} new records, {} duplicates skipped, {} chunks ({:?})",
                summary.pages_fetched,
                summary.records_added,
                summary.duplicates_skipped,
                summary.chunks_written,
                summary.reason
            );
        }
        Err(e) => {
            error!("harvest failed: {e}");
            std::process::exit(1);
        }
    }
}
