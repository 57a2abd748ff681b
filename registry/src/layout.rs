//! On-disk layout of an act root.
//!
//! ```text
//! <root>/
//!   config.yml
//!   .lock
//!   local/        user-authored scripts
//!   community/    installed scripts
//!   quarantine/   downloads awaiting confirmation
//!   bin/          generated shims (unless configured elsewhere)
//! ```

use std::path::{Path, PathBuf};

use act_core::Namespace;

use crate::config::ActConfig;
use crate::error::{IoContext, Result};
use crate::source::{FsSource, SCRIPT_EXTENSION};

/// Paths of every directory and file the registry touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    bin_dir: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`, with shims in `<root>/bin`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let bin_dir = root.join("bin");
        Self { root, bin_dir }
    }

    /// Layout rooted at `root` honoring the configured shim directory.
    pub fn from_config(root: impl Into<PathBuf>, config: &ActConfig) -> Self {
        let layout = Self::new(root);
        match &config.bin_dir {
            Some(bin_dir) => layout.with_bin_dir(bin_dir.clone()),
            None => layout,
        }
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = bin_dir.into();
        self
    }

    /// `$HOME/.act`, or `.act` in the working directory when `HOME` is unset.
    pub fn default_root() -> PathBuf {
        match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home).join(".act"),
            _ => PathBuf::from(".act"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    pub fn quarantine_dir(&self) -> PathBuf {
        self.root.join("quarantine")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yml")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    /// Where a script named `name` lives in `namespace`.
    pub fn script_path(&self, namespace: Namespace, name: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{name}.{SCRIPT_EXTENSION}"))
    }

    /// Where a download of `name` waits for confirmation.
    pub fn quarantine_path(&self, name: &str) -> PathBuf {
        self.quarantine_dir()
            .join(format!("{name}.{SCRIPT_EXTENSION}"))
    }

    /// Creates the namespace, quarantine and shim directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        let dirs = [
            self.namespace_dir(Namespace::Local),
            self.namespace_dir(Namespace::Community),
            self.quarantine_dir(),
            self.bin_dir.clone(),
        ];
        for dir in &dirs {
            std::fs::create_dir_all(dir).at(dir)?;
        }
        Ok(())
    }

    /// Script source reading this layout's namespace directories.
    pub fn source(&self) -> FsSource {
        FsSource::new(
            self.namespace_dir(Namespace::Local),
            self.namespace_dir(Namespace::Community),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = Layout::new("/home/jane/.act");
        assert_eq!(layout.bin_dir(), Path::new("/home/jane/.act/bin"));
        assert_eq!(
            layout.namespace_dir(Namespace::Community),
            PathBuf::from("/home/jane/.act/community")
        );
        assert_eq!(
            layout.script_path(Namespace::Local, "build"),
            PathBuf::from("/home/jane/.act/local/build.py")
        );
        assert_eq!(
            layout.quarantine_path("weather"),
            PathBuf::from("/home/jane/.act/quarantine/weather.py")
        );
        assert_eq!(layout.lock_path(), PathBuf::from("/home/jane/.act/.lock"));
    }

    #[test]
    fn test_configured_bin_dir() {
        let config = ActConfig {
            bin_dir: Some(PathBuf::from("/usr/local/bin")),
            ..ActConfig::default()
        };
        let layout = Layout::from_config("/r", &config);
        assert_eq!(layout.bin_dir(), Path::new("/usr/local/bin"));
        assert_eq!(layout.root(), Path::new("/r"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("act"));
        layout.ensure_dirs().unwrap();
        assert!(layout.namespace_dir(Namespace::Local).is_dir());
        assert!(layout.namespace_dir(Namespace::Community).is_dir());
        assert!(layout.quarantine_dir().is_dir());
        assert!(layout.bin_dir().is_dir());
        // Second call is a no-op.
        layout.ensure_dirs().unwrap();
    }
}
