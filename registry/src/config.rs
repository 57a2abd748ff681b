//! User configuration for the script manager.
//!
//! Loaded from `<root>/config.yml`. Every field is optional; a missing file
//! or a missing key falls back to the defaults below.
//!
//! # Example YAML
//!
//! ```yaml
//! bin_dir: /home/jane/.act/bin
//! runner: [uv, run, --quiet]
//! editor: nano
//! author: jane
//! provider_dir: ./community-scripts
//! install:
//!   on_collision: reject
//!   sanitize: drop
//! quarantine:
//!   max_age_days: 7
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IoContext, Result};

/// What to do when an installed script would replace an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Refuse the install.
    #[default]
    Reject,
    /// Replace the existing file.
    Overwrite,
}

/// How disallowed characters in a requested script name are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizePolicy {
    /// Silently drop them.
    #[default]
    Drop,
    /// Refuse names containing them.
    Reject,
}

/// Installer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    pub on_collision: CollisionPolicy,
    pub sanitize: SanitizePolicy,
}

/// Quarantine retention settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineConfig {
    /// Files older than this are removed by `prune`.
    pub max_age_days: u64,
}

impl Default for QuarantineConfig {
    fn default() -> Self {
        Self { max_age_days: 7 }
    }
}

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use act_registry::{ActConfig, CollisionPolicy};
///
/// let config: ActConfig = serde_yaml::from_str("editor: vim\n").unwrap();
/// assert_eq!(config.editor, "vim");
/// assert_eq!(config.runner, vec!["uv", "run", "--quiet"]);
/// assert_eq!(config.install.on_collision, CollisionPolicy::Reject);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActConfig {
    /// Shim directory. Defaults to `<root>/bin`.
    ///
    /// Every regular file in it is deleted on each sync, so it must hold
    /// nothing but shims.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,
    /// Program and leading arguments used to execute a script.
    pub runner: Vec<String>,
    /// Fallback editor when `$EDITOR` is unset.
    pub editor: String,
    /// Author written into new local scripts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Directory the installer fetches community scripts from.
    pub provider_dir: PathBuf,
    pub install: InstallConfig,
    pub quarantine: QuarantineConfig,
}

impl Default for ActConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            runner: vec!["uv".into(), "run".into(), "--quiet".into()],
            editor: "nano".into(),
            author: None,
            provider_dir: PathBuf::from("./community-scripts"),
            install: InstallConfig::default(),
            quarantine: QuarantineConfig::default(),
        }
    }
}

impl ActConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::RegistryError::Io) if the file cannot be read,
    /// or [`YamlError`](crate::RegistryError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).at(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).at(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
