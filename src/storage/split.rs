//! Split tool: re-partitions the canonical dataset into fresh chunks.
//!
//! The inverse of merge. The canonical file is read (fatal if missing,
//! malformed, or empty), sorted into canonical id order, every existing
//! chunk file is deleted, and fresh bounded chunks are written with part
//! indices 1..n. Each chunk is validated against the same byte ceiling as
//! the merge output.

use std::fs;

use crate::error::HarvestError;
use crate::record::{compare_ids, SpeedLimitRecord};
use crate::session::HarvestSession;
use crate::storage::ChunkStore;

/// Outcome of a successful split.
#[derive(Debug, Clone)]
pub struct SplitSummary {
    /// Fresh chunk files written.
    pub chunks_written: usize,
    /// Records distributed across them.
    pub total_records: usize,
}

/// Splits the canonical dataset into fresh chunk files of at most
/// `chunk_size` records each.
///
/// # Errors
///
/// - `HarvestError::Structural` - the canonical file is missing, fails to
///   parse as a record list, or is empty.
/// - `HarvestError::SizeCeilingExceeded` - a chunk would exceed the byte
///   ceiling.
pub fn split_merged(session: &HarvestSession) -> Result<SplitSummary, HarvestError> {
    let config = &session.config;
    let merged_path = config.merged_path();

    if !merged_path.exists() {
        return Err(HarvestError::Structural(format!(
            "canonical dataset {} does not exist",
            merged_path.display()
        )));
    }
    let text = fs::read_to_string(&merged_path)?;
    let mut records: Vec<SpeedLimitRecord> = serde_json::from_str(&text).map_err(|e| {
        HarvestError::Structural(format!(
            "canonical dataset {} is not a record list: {e}",
            merged_path.display()
        ))
    })?;
    if records.is_empty() {
        return Err(HarvestError::Structural(format!(
            "canonical dataset {} is empty",
            merged_path.display()
        )));
    }

    records.sort_by(|a, b| compare_ids(&a.id, &b.id));

    let chunk_count = records.len().div_ceil(config.chunk_size);
    session.log.append(&format!(
        "splitting {} records into {chunk_count} chunks",
        records.len()
    ))?;

    let store = ChunkStore::new(&config.data_dir, config.merged_ceiling_bytes);
    let removed = store.delete_all()?;
    if removed > 0 {
        session
            .log
            .append(&format!("deleted {removed} existing chunk files"))?;
    }

    let mut chunks_written = 0;
    for (i, slice) in records.chunks(config.chunk_size).enumerate() {
        let index = (i + 1) as u32;
        let (path, size) = store.write_chunk(slice, index)?;
        chunks_written += 1;
        session.log.append(&format!(
            "wrote {} records to {} ({size} bytes)",
            slice.len(),
            path.display()
        ))?;
    }

    Ok(SplitSummary {
        chunks_written,
        total_records: records.len(),
    })
}
