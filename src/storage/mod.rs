//! On-disk persistence: numbered chunk files, the canonical merged dataset,
//! and the merge/split tools that reconcile between the two.

pub mod chunks;
pub mod merge;
pub mod split;

pub use chunks::ChunkStore;
pub use merge::{merge_chunks, MergeSummary};
pub use split::{split_merged, SplitSummary};

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::HarvestError;

/// Writes `bytes` (plus a trailing newline) to `path` atomically: a
/// temporary file in the destination directory, persisted over the target.
/// The destination is never left partially written.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), HarvestError> {
    let parent = path.parent().ok_or_else(|| {
        HarvestError::Internal(format!(
            "cannot determine parent directory for {}",
            path.display()
        ))
    })?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.write_all(b"\n")?;
    temp.persist(path).map_err(|e| {
        HarvestError::Internal(format!("failed to persist {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "OLD").unwrap();

        write_atomic(&path, b"NEW").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "NEW\n");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        write_atomic(&path, b"[]").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
