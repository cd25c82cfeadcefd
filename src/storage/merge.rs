//! Merge tool: reconciles all chunk files into the canonical dataset.
//!
//! All chunks are read and accumulated into a map keyed by record id,
//! last-write-wins with files processed in ascending part order. The output
//! is the id-sorted, de-duplicated record list, written atomically. Missing
//! input, malformed chunks, and oversized output are fatal - silently
//! producing a partial or truncated dataset is worse than stopping.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::HarvestError;
use crate::record::{compare_ids, SpeedLimitRecord};
use crate::session::HarvestSession;
use crate::storage::{write_atomic, ChunkStore};

/// Outcome of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    /// Chunk files read.
    pub chunk_files: usize,
    /// Unique records in the canonical output.
    pub unique_records: usize,
    /// Size of the written canonical file in bytes.
    pub output_bytes: u64,
    /// Path of the canonical file.
    pub output_path: PathBuf,
}

/// Merges every chunk file into the canonical dataset.
///
/// # Errors
///
/// - `HarvestError::Structural` - no chunk files exist, a chunk fails to
///   parse as a record list, or a record carries an empty id.
/// - `HarvestError::SizeCeilingExceeded` - the serialized output exceeds
///   the configured byte ceiling; no canonical file is written.
pub fn merge_chunks(session: &HarvestSession) -> Result<MergeSummary, HarvestError> {
    let config = &session.config;
    let store = ChunkStore::new(&config.data_dir, config.merged_ceiling_bytes);

    let files = store.chunk_files()?;
    if files.is_empty() {
        return Err(HarvestError::Structural(format!(
            "no chunk files found in {}",
            config.data_dir.display()
        )));
    }
    session.log.append(&format!("found {} chunk files", files.len()))?;

    let mut merged: HashMap<String, SpeedLimitRecord> = HashMap::new();
    for (index, path) in &files {
        let text = fs::read_to_string(path)?;
        let records: Vec<SpeedLimitRecord> = serde_json::from_str(&text).map_err(|e| {
            HarvestError::Structural(format!(
                "chunk {} is not a record list: {e}",
                path.display()
            ))
        })?;

        let count = records.len();
        for record in records {
            if record.id.trim().is_empty() {
                return Err(HarvestError::Structural(format!(
                    "record without id in {}",
                    path.display()
                )));
            }
            merged.insert(record.id.clone(), record);
        }
        session.log.append(&format!(
            "read part {index}: {count} records ({} unique so far)",
            merged.len()
        ))?;
    }

    let mut records: Vec<SpeedLimitRecord> = merged.into_values().collect();
    records.sort_by(|a, b| compare_ids(&a.id, &b.id));

    let bytes = serde_json::to_vec_pretty(&records)
        .map_err(|e| HarvestError::Internal(format!("failed to serialize merged dataset: {e}")))?;
    let output_bytes = bytes.len() as u64 + 1;
    if output_bytes > config.merged_ceiling_bytes {
        return Err(HarvestError::SizeCeilingExceeded {
            actual: output_bytes,
            ceiling: config.merged_ceiling_bytes,
        });
    }

    let output_path = config.merged_path();
    write_atomic(&output_path, &bytes)?;
    session.log.append(&format!(
        "merged {} unique records into {} ({output_bytes} bytes)",
        records.len(),
        output_path.display()
    ))?;

    Ok(MergeSummary {
        chunk_files: files.len(),
        unique_records: records.len(),
        output_bytes,
        output_path,
    })
}
