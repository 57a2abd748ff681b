//! Installing community scripts.
//!
//! An install moves through a fixed sequence of stages:
//!
//! ```text
//! Fetched -> Quarantined -> Validated -> Confirmed -> Published
//!                                    \-> Aborted
//! ```
//!
//! Downloaded content is written to the quarantine directory first and only
//! renamed into the community namespace after it parses, declares the
//! required fields, and the user confirms. A failure or refusal at any stage
//! leaves the community namespace and shim directory untouched.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use act_core::{INSTALL_REQUIRED_FIELDS, Namespace, parse_header, validate_metadata};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{CollisionPolicy, InstallConfig, SanitizePolicy};
use crate::error::{IoContext, RegistryError, Result};
use crate::layout::Layout;
use crate::lock::RegistryLock;
use crate::shims::{ShimLauncher, SyncOutcome, synchronize_shims};
use crate::source::SCRIPT_EXTENSION;

/// Failures of a [`ScriptProvider`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not available from the provider")]
    NotFound,

    #[error("provider returned empty content")]
    Empty,

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Supplies script text by sanitized name.
pub trait ScriptProvider {
    fn fetch(&self, name: &str) -> std::result::Result<String, FetchError>;
}

/// Serves `<root>/<name>.py` from a local directory, such as a checkout of
/// the community repository.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptProvider for DirectoryProvider {
    fn fetch(&self, name: &str) -> std::result::Result<String, FetchError> {
        let path = self.root.join(format!("{name}.{SCRIPT_EXTENSION}"));
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound),
            Err(e) => Err(FetchError::Io(e)),
        }
    }
}

/// Asks the user whether to proceed.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Stages of an install, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Fetched,
    Quarantined,
    Validated,
    Confirmed,
    Aborted,
    Published,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::Fetched => "fetched",
            InstallStage::Quarantined => "quarantined",
            InstallStage::Validated => "validated",
            InstallStage::Confirmed => "confirmed",
            InstallStage::Aborted => "aborted",
            InstallStage::Published => "published",
        };
        f.write_str(name)
    }
}

/// Terminal state of a successful run of the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The script is in the community namespace and shims were resynced.
    Published { path: PathBuf, shims: SyncOutcome },
    /// The user declined; the download stays in quarantine.
    Aborted { quarantine: PathBuf },
}

/// The disclosure shown before a community script is installed.
pub fn risk_prompt(name: &str, author: &str) -> String {
    format!(
        "'{name}' is a community script by {author}.\n\
         It may access the internet, read and write files, and use third party libraries.\n\
         Are you sure you want to install this script?"
    )
}

/// Reduces `raw` to ASCII letters, digits, `-` and `_`.
///
/// # Errors
///
/// Returns [`InvalidName`](RegistryError::InvalidName) if the result is
/// empty, or under [`SanitizePolicy::Reject`] if anything would be dropped.
///
/// # Examples
///
/// ```
/// use act_registry::{SanitizePolicy, sanitize_script_name};
///
/// assert_eq!(sanitize_script_name("../we@ther", SanitizePolicy::Drop).unwrap(), "wether");
/// assert!(sanitize_script_name("../we@ther", SanitizePolicy::Reject).is_err());
/// assert!(sanitize_script_name("@@", SanitizePolicy::Drop).is_err());
/// ```
pub fn sanitize_script_name(raw: &str, policy: SanitizePolicy) -> Result<String> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if clean.is_empty() || (policy == SanitizePolicy::Reject && clean.len() != raw.len()) {
        return Err(RegistryError::InvalidName(raw.to_string()));
    }
    Ok(clean)
}

/// Runs the install workflow against a [`Layout`].
#[derive(Debug)]
pub struct Installer<'a> {
    layout: &'a Layout,
    launcher: &'a ShimLauncher,
    config: InstallConfig,
}

impl<'a> Installer<'a> {
    pub fn new(layout: &'a Layout, launcher: &'a ShimLauncher, config: InstallConfig) -> Self {
        Self {
            layout,
            launcher,
            config,
        }
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.on_collision = policy;
        self
    }

    /// Installs the script `requested` from `provider`.
    ///
    /// # Errors
    ///
    /// - [`InvalidName`](RegistryError::InvalidName) before anything is fetched.
    /// - [`Fetch`](RegistryError::Fetch) with nothing written.
    /// - [`Parse`](RegistryError::Parse), [`Validation`](RegistryError::Validation)
    ///   or [`NameCollision`](RegistryError::NameCollision) with the
    ///   download left in quarantine.
    pub fn install(
        &self,
        requested: &str,
        provider: &dyn ScriptProvider,
        confirm: &mut dyn Confirm,
    ) -> Result<InstallOutcome> {
        let name = sanitize_script_name(requested, self.config.sanitize)?;

        let content = provider
            .fetch(&name)
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(FetchError::Empty)
                } else {
                    Ok(text)
                }
            })
            .map_err(|source| RegistryError::Fetch {
                name: name.clone(),
                source,
            })?;
        self.transition(&name, InstallStage::Fetched);

        let quarantine = self.layout.quarantine_path(&name);
        let quarantine_dir = self.layout.quarantine_dir();
        std::fs::create_dir_all(&quarantine_dir).at(&quarantine_dir)?;
        std::fs::write(&quarantine, &content).at(&quarantine)?;
        self.transition(&name, InstallStage::Quarantined);

        let metadata = parse_header(&content).map_err(|source| RegistryError::Parse {
            path: quarantine.clone(),
            source,
        })?;
        if let Some(source) = validate_metadata(&metadata, INSTALL_REQUIRED_FIELDS)
            .into_iter()
            .next()
        {
            return Err(RegistryError::Validation {
                path: quarantine,
                source,
            });
        }
        self.transition(&name, InstallStage::Validated);

        let destination = self.layout.script_path(Namespace::Community, &name);
        self.check_collision(&name, &destination)?;

        let author = metadata.author().unwrap_or_default();
        if !confirm.confirm(&risk_prompt(&name, author)) {
            self.transition(&name, InstallStage::Aborted);
            info!(name = %name, quarantine = %quarantine.display(), "install aborted");
            return Ok(InstallOutcome::Aborted { quarantine });
        }
        self.transition(&name, InstallStage::Confirmed);

        let _lock = RegistryLock::acquire(self.layout)?;
        self.check_collision(&name, &destination)?;
        let community = self.layout.namespace_dir(Namespace::Community);
        std::fs::create_dir_all(&community).at(&community)?;
        std::fs::rename(&quarantine, &destination).at(&destination)?;
        self.transition(&name, InstallStage::Published);

        let shims = synchronize_shims(&self.layout.source(), self.layout.bin_dir(), self.launcher)?;
        info!(name = %name, path = %destination.display(), "installed script");
        Ok(InstallOutcome::Published {
            path: destination,
            shims,
        })
    }

    fn check_collision(&self, name: &str, destination: &Path) -> Result<()> {
        if destination.exists() {
            match self.config.on_collision {
                CollisionPolicy::Reject => {
                    return Err(RegistryError::NameCollision {
                        name: name.to_string(),
                        path: destination.to_path_buf(),
                    });
                }
                CollisionPolicy::Overwrite => {
                    debug!(name = %name, path = %destination.display(), "will overwrite existing script");
                }
            }
        }
        Ok(())
    }

    fn transition(&self, name: &str, stage: InstallStage) {
        debug!(name = %name, stage = %stage, "install stage");
    }
}
