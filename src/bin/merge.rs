//! Merge entry point: reconcile all chunk files into the canonical,
//! de-duplicated, id-sorted dataset.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nvdb_harvester::storage::merge_chunks;
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

    match merge_chunks(&session) {
        Ok(summary) => {
            info!(
                "merged {} chunk files into {} ({} unique records, {} bytes)",
                summary.chunk_files,
                summary.output_path.display(),
                summary.unique_records,
                summary.output_bytes
            );
        }
        Err(e) => {
            error!("merge failed: {e}");
            std::process::exit(1);
        }
    }
}
