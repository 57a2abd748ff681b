//! Cleanup of abandoned downloads.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use crate::error::{IoContext, RegistryError, Result};
use crate::layout::Layout;

/// Removes quarantine files last modified more than `max_age` before `now`.
///
/// Returns the removed paths sorted. A missing quarantine directory is not
/// an error.
pub fn prune_quarantine(layout: &Layout, max_age: Duration, now: SystemTime) -> Result<Vec<PathBuf>> {
    let dir = layout.quarantine_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(RegistryError::Io { path: dir, source }),
    };

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.at(&dir)?;
        let path = entry.path();
        let metadata = entry.metadata().at(&path)?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified().at(&path)?;
        // Files dated in the future have age zero.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age > max_age {
            std::fs::remove_file(&path).at(&path)?;
            debug!(path = %path.display(), age_secs = age.as_secs(), "pruned quarantine file");
            removed.push(path);
        }
    }
    removed.sort();
    info!(count = removed.len(), "pruned quarantine");
    Ok(removed)
}

/// Days to a [`Duration`].
pub fn days(n: u64) -> Duration {
    Duration::from_secs(n * 24 * 60 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prunes_only_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_dirs().unwrap();
        let old = layout.quarantine_path("old");
        let fresh = layout.quarantine_path("fresh");
        std::fs::write(&old, "x").unwrap();
        std::fs::write(&fresh, "x").unwrap();

        // Both files were written just now; viewed from ten days ahead only
        // an age limit below ten days removes them.
        let later = SystemTime::now() + days(10);
        let removed = prune_quarantine(&layout, days(30), later).unwrap();
        assert!(removed.is_empty());

        let removed = prune_quarantine(&layout, days(7), later).unwrap();
        assert_eq!(removed, vec![fresh.clone(), old.clone()]);
        assert!(!old.exists());
        assert!(!fresh.exists());
    }

    #[test]
    fn test_future_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.quarantine_path("x"), "x").unwrap();
        let past = SystemTime::now() - days(1);
        assert!(prune_quarantine(&layout, Duration::ZERO, past).unwrap().is_empty());
    }

    #[test]
    fn test_missing_quarantine_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("absent"));
        assert!(prune_quarantine(&layout, days(1), SystemTime::now()).unwrap().is_empty());
    }
}
