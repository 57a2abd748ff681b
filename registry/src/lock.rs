//! Cross-process advisory lock on an act root.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use tracing::debug;

use crate::error::{IoContext, Result};
use crate::layout::Layout;

/// Exclusive lock on `<root>/.lock`, held until dropped.
///
/// Serializes shim-directory rewrites and quarantine-to-community renames
/// between concurrent `act` processes. Advisory only: code that does not
/// take the lock is not blocked.
#[derive(Debug)]
pub struct RegistryLock {
    _file: File,
    path: PathBuf,
}

impl RegistryLock {
    /// Blocks until the lock is available.
    pub fn acquire(layout: &Layout) -> Result<Self> {
        let root = layout.root();
        std::fs::create_dir_all(root).at(root)?;

        let path = layout.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .at(&path)?;
        file.lock_exclusive().at(&path)?;
        debug!(path = %path.display(), "acquired registry lock");
        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("root"));
        let lock = RegistryLock::acquire(&layout).unwrap();
        assert!(lock.path().is_file());
    }

    #[test]
    fn test_reacquire_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        drop(RegistryLock::acquire(&layout).unwrap());
        let _again = RegistryLock::acquire(&layout).unwrap();
    }
}
