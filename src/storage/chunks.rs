//! Numbered chunk files.
//!
//! Harvested records are persisted as bounded-size, pretty-printed JSON
//! arrays named `speedlimits_part{N}.json`. Chunks are never mutated after
//! being written in a run; part indices are allocated by scanning existing
//! filenames, so resumed runs never overwrite earlier output.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::record::SpeedLimitRecord;
use crate::storage::write_atomic;

const CHUNK_PREFIX: &str = "speedlimits_part";
const CHUNK_SUFFIX: &str = ".json";

/// Access to the chunk files of one data directory.
pub struct ChunkStore {
    data_dir: PathBuf,
    /// Byte ceiling applied to each written chunk.
    size_ceiling: u64,
}

impl ChunkStore {
    pub fn new(data_dir: impl Into<PathBuf>, size_ceiling: u64) -> Self {
        Self {
            data_dir: data_dir.into(),
            size_ceiling,
        }
    }

    /// Path of the chunk file with the given part index.
    pub fn chunk_path(&self, index: u32) -> PathBuf {
        self.data_dir
            .join(format!("{CHUNK_PREFIX}{index}{CHUNK_SUFFIX}"))
    }

    /// Existing chunk files, sorted by numeric part index. `part10` sorts
    /// after `part2`; later parts win during merge. A missing data directory
    /// yields an empty list.
    pub fn chunk_files(&self) -> Result<Vec<(u32, PathBuf)>, HarvestError> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(index) = parse_part_index(name) {
                files.push((index, entry.path()));
            }
        }
        files.sort_by_key(|(index, _)| *index);
        Ok(files)
    }

    /// Smallest part index (starting at 1) not already present on disk.
    pub fn next_part_index(&self) -> Result<u32, HarvestError> {
        let used: BTreeSet<u32> = self
            .chunk_files()?
            .into_iter()
            .map(|(index, _)| index)
            .collect();

        let mut candidate = 1;
        while used.contains(&candidate) {
            candidate += 1;
        }
        Ok(candidate)
    }

    /// Serializes `records` as a pretty-printed array and writes it
    /// atomically to the chunk file with the given part index.
    ///
    /// # Errors
    ///
    /// `HarvestError::SizeCeilingExceeded` if the serialized chunk would
    /// exceed the configured byte ceiling; nothing is written in that case.
    pub fn write_chunk(
        &self,
        records: &[SpeedLimitRecord],
        index: u32,
    ) -> Result<(PathBuf, u64), HarvestError> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| HarvestError::Internal(format!("failed to serialize chunk: {e}")))?;
        let size = bytes.len() as u64 + 1;
        if size > self.size_ceiling {
            return Err(HarvestError::SizeCeilingExceeded {
                actual: size,
                ceiling: self.size_ceiling,
            });
        }

        let path = self.chunk_path(index);
        write_atomic(&path, &bytes)?;
        Ok((path, size))
    }

    /// Deletes every chunk file, returning how many were removed.
    pub fn delete_all(&self) -> Result<usize, HarvestError> {
        let files = self.chunk_files()?;
        let removed = files.len();
        for (_, path) in files {
            fs::remove_file(&path)?;
        }
        Ok(removed)
    }
}

/// Parses the part index out of a chunk filename, or `None` for files that
/// are not chunks.
fn parse_part_index(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(CHUNK_PREFIX)?
        .strip_suffix(CHUNK_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> SpeedLimitRecord {
        SpeedLimitRecord {
            id: id.to_string(),
            geometry: None,
            speed_limit: Some(50),
        }
    }

    #[test]
    fn parse_part_index_accepts_only_chunk_names() {
        assert_eq!(parse_part_index("speedlimits_part1.json"), Some(1));
        assert_eq!(parse_part_index("speedlimits_part12.json"), Some(12));
        assert_eq!(parse_part_index("speedlimits_merged.json"), None);
        assert_eq!(parse_part_index("speedlimits_part.json"), None);
        assert_eq!(parse_part_index("speedlimits_partX.json"), None);
        assert_eq!(parse_part_index("other.json"), None);
    }

    #[test]
    fn chunk_files_sort_numerically() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path(), u64::MAX);

        for index in [10, 2, 1] {
            store.write_chunk(&[record(&index.to_string())], index).unwrap();
        }

        let indices: Vec<u32> = store
            .chunk_files()
            .unwrap()
            .into_iter()
            .map(|(index, _)| index)
            .collect();
        assert_eq!(indices, vec![1, 2, 10]);
    }

    #[test]
    fn chunk_files_empty_for_missing_dir() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path().join("missing"), u64::MAX);

        assert!(store.chunk_files().unwrap().is_empty());
    }

    #[test]
    fn next_part_index_fills_the_smallest_gap() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path(), u64::MAX);

        assert_eq!(store.next_part_index().unwrap(), 1);

        store.write_chunk(&[record("1")], 1).unwrap();
        store.write_chunk(&[record("3")], 3).unwrap();

        assert_eq!(store.next_part_index().unwrap(), 2);

        store.write_chunk(&[record("2")], 2).unwrap();
        assert_eq!(store.next_part_index().unwrap(), 4);
    }

    #[test]
    fn written_chunks_parse_back() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path(), u64::MAX);

        let records = vec![record("1"), record("2")];
        let (path, size) = store.write_chunk(&records, 1).unwrap();

        assert!(path.ends_with("speedlimits_part1.json"));
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.len() as u64, size);
        // Pretty-printed, human-readable output.
        assert!(content.contains("\n"));

        let parsed: Vec<SpeedLimitRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn oversized_chunk_is_rejected_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path(), 10);

        let result = store.write_chunk(&[record("1")], 1);

        assert!(matches!(
            result,
            Err(HarvestError::SizeCeilingExceeded { .. })
        ));
        assert!(!store.chunk_path(1).exists());
    }

    #[test]
    fn delete_all_removes_only_chunks() {
        let dir = TempDir::new().unwrap();
        let store = ChunkStore::new(dir.path(), u64::MAX);

        store.write_chunk(&[record("1")], 1).unwrap();
        store.write_chunk(&[record("2")], 2).unwrap();
        fs::write(dir.path().join("speedlimits_merged.json"), "[]").unwrap();

        let removed = store.delete_all().unwrap();

        assert_eq!(removed, 2);
        assert!(store.chunk_files().unwrap().is_empty());
        assert!(dir.path().join("speedlimits_merged.json").exists());
    }
}
