//! Version allocation for training artifacts
//!
//! A version string is `"{n}_{YYYYMMDD_HHMMSS}"` where `n` is one past the
//! highest leading integer prefix among existing subdirectories of the
//! artifact root. The scan-then-create sequence is not atomic: two training
//! jobs racing on the same root can allocate colliding numbers. Callers that
//! run training concurrently must serialize externally.

use chrono::Local;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Compute the version string for a new training run.
///
/// An explicit override is returned unchanged; otherwise the next free
/// sequence number is combined with a local timestamp.
pub fn allocate(root: impl AsRef<Path>, explicit: Option<&str>) -> Result<String> {
    if let Some(version) = explicit {
        return Ok(version.to_string());
    }

    let mut highest = 0u64;
    if root.as_ref().is_dir() {
        for entry in std::fs::read_dir(root.as_ref())? {
            let entry = entry?;
            if let Some(n) = entry.file_name().to_str().and_then(leading_index) {
                highest = highest.max(n);
            }
        }
    }

    let version = format!("{}_{}", highest + 1, Local::now().format("%Y%m%d_%H%M%S"));
    debug!("allocated version {}", version);
    Ok(version)
}

/// Extract the leading integer of a `^(\d+)_` directory name, if any
pub(crate) fn leading_index(name: &str) -> Option<u64> {
    let (prefix, _) = name.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_after_existing_versions() {
        let root = tempfile::tempdir().unwrap();
        for name in ["1_20250101_000000", "2_20250102_000000", "5_20250105_000000"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        let version = allocate(root.path(), None).unwrap();
        assert!(version.starts_with("6_"), "got {}", version);
    }

    #[test]
    fn ignores_unprefixed_names() {
        let root = tempfile::tempdir().unwrap();
        for name in ["checkpoint-3", "notes", "_leading", "3x_bad", "4_ok"] {
            std::fs::create_dir(root.path().join(name)).unwrap();
        }
        let version = allocate(root.path(), None).unwrap();
        assert!(version.starts_with("5_"), "got {}", version);
    }

    #[test]
    fn empty_root_starts_at_one() {
        let root = tempfile::tempdir().unwrap();
        let version = allocate(root.path(), None).unwrap();
        assert!(version.starts_with("1_"), "got {}", version);
    }

    #[test]
    fn missing_root_starts_at_one() {
        let root = tempfile::tempdir().unwrap();
        let version = allocate(root.path().join("does-not-exist"), None).unwrap();
        assert!(version.starts_with("1_"), "got {}", version);
    }

    #[test]
    fn explicit_override_wins() {
        let root = tempfile::tempdir().unwrap();
        let version = allocate(root.path(), Some("rc-candidate")).unwrap();
        assert_eq!(version, "rc-candidate");
    }

    #[test]
    fn timestamp_shape() {
        let root = tempfile::tempdir().unwrap();
        let version = allocate(root.path(), None).unwrap();
        let (_, stamp) = version.split_once('_').unwrap();
        // YYYYMMDD_HHMMSS
        assert_eq!(stamp.len(), 15);
    }
}
