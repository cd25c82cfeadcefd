//! Deduplication index.
//!
//! An in-memory set of every record identifier already persisted to chunk
//! files. Rehydrated at startup so re-running the harvester against a
//! partially completed dataset never duplicates records.

use std::collections::HashSet;
use std::fs;

use serde_json::Value;
use tracing::warn;

use crate::error::HarvestError;
use crate::record::canonical_id;
use crate::runlog::RunLog;
use crate::storage::ChunkStore;

/// Set of previously persisted record ids, in canonical string form.
#[derive(Debug, Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every existing chunk file and inserts each contained id.
    ///
    /// Chunk files that cannot be read or parsed, or that are not record
    /// lists, are logged and skipped - rehydration is never fatal. Records
    /// without a usable id are skipped individually. Returns the number of
    /// ids inserted.
    pub fn rehydrate(&mut self, store: &ChunkStore, log: &RunLog) -> Result<usize, HarvestError> {
        let mut inserted = 0;

        for (index, path) in store.chunk_files()? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    log.append(&format!(
                        "skipping unreadable chunk {}: {e}",
                        path.display()
                    ))?;
                    continue;
                }
            };
            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(e) => {
                    log.append(&format!(
                        "skipping malformed chunk {}: {e}",
                        path.display()
                    ))?;
                    continue;
                }
            };
            let Some(items) = value.as_array() else {
                log.append(&format!(
                    "skipping chunk {}: not a record list",
                    path.display()
                ))?;
                continue;
            };

            for item in items {
                match item.get("id").and_then(canonical_id) {
                    Some(id) => {
                        if self.seen.insert(id) {
                            inserted += 1;
                        }
                    }
                    None => {
                        warn!(part = index, "record without usable id in chunk, skipped");
                    }
                }
            }
        }

        Ok(inserted)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns true if the id was not already present.
    pub fn insert(&mut self, id: String) -> bool {
        self.seen.insert(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixtures(dir: &TempDir) -> (ChunkStore, RunLog) {
        let store = ChunkStore::new(dir.path(), u64::MAX);
        let log = RunLog::new(dir.path().join("run.log"));
        (store, log)
    }

    #[test]
    fn rehydrates_ids_from_all_chunks() {
        let dir = TempDir::new().unwrap();
        let (store, log) = fixtures(&dir);

        fs::write(
            dir.path().join("speedlimits_part1.json"),
            r#"[{"id": "1"}, {"id": "2"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("speedlimits_part2.json"),
            r#"[{"id": 3}, {"id": "2"}]"#,
        )
        .unwrap();

        let mut index = DedupIndex::new();
        let inserted = index.rehydrate(&store, &log).unwrap();

        assert_eq!(inserted, 3);
        assert!(index.contains("1"));
        assert!(index.contains("2"));
        // Numeric ids are coerced to canonical string form.
        assert!(index.contains("3"));
        assert!(!index.contains("4"));
    }

    #[test]
    fn malformed_chunks_are_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let (store, log) = fixtures(&dir);

        fs::write(dir.path().join("speedlimits_part1.json"), "{ garbage").unwrap();
        fs::write(
            dir.path().join("speedlimits_part2.json"),
            r#"{"id": "not-a-list"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("speedlimits_part3.json"),
            r#"[{"id": "7"}]"#,
        )
        .unwrap();

        let mut index = DedupIndex::new();
        let inserted = index.rehydrate(&store, &log).unwrap();

        assert_eq!(inserted, 1);
        assert!(index.contains("7"));

        let log_content = fs::read_to_string(log.path()).unwrap();
        assert!(log_content.contains("skipping malformed chunk"));
        assert!(log_content.contains("not a record list"));
    }

    #[test]
    fn records_without_ids_are_skipped() {
        let dir = TempDir::new().unwrap();
        let (store, log) = fixtures(&dir);

        fs::write(
            dir.path().join("speedlimits_part1.json"),
            r#"[{"id": "1"}, {"speed_limit": 50}, {"id": ""}, {"id": null}]"#,
        )
        .unwrap();

        let mut index = DedupIndex::new();
        let inserted = index.rehydrate(&store, &log).unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn insert_reports_novelty() {
        let mut index = DedupIndex::new();

        assert!(index.insert("42".to_string()));
        assert!(!index.insert("42".to_string()));
        assert!(index.contains("42"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn empty_data_dir_rehydrates_to_empty() {
        let dir = TempDir::new().unwrap();
        let (store, log) = fixtures(&dir);

        let mut index = DedupIndex::new();
        let inserted = index.rehydrate(&store, &log).unwrap();

        assert_eq!(inserted, 0);
        assert!(index.is_empty());
    }
}
