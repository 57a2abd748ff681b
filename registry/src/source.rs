//! Where script files are read from.
//!
//! The resolver and shim synchronizer only ever see a [`ScriptSource`], so
//! they can run against the real namespace directories ([`FsSource`]) or an
//! in-memory set of files ([`MemorySource`]).

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use act_core::Namespace;

use crate::error::{IoContext, RegistryError, Result};

/// File extension of managed scripts.
pub const SCRIPT_EXTENSION: &str = "py";

/// Read access to the scripts of each namespace.
pub trait ScriptSource {
    /// Script files in `namespace`, sorted by file name. A namespace with no
    /// backing storage has no scripts.
    fn scripts(&self, namespace: Namespace) -> Result<Vec<PathBuf>>;

    /// Full text of a script returned by [`scripts`](Self::scripts).
    fn read(&self, path: &Path) -> Result<String>;
}

/// Reads scripts from one directory per namespace.
#[derive(Debug, Clone)]
pub struct FsSource {
    local: PathBuf,
    community: PathBuf,
}

impl FsSource {
    pub fn new(local: impl Into<PathBuf>, community: impl Into<PathBuf>) -> Self {
        Self {
            local: local.into(),
            community: community.into(),
        }
    }

    fn dir(&self, namespace: Namespace) -> &Path {
        match namespace {
            Namespace::Local => &self.local,
            Namespace::Community => &self.community,
        }
    }
}

fn has_script_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SCRIPT_EXTENSION)
}

impl ScriptSource for FsSource {
    fn scripts(&self, namespace: Namespace) -> Result<Vec<PathBuf>> {
        let dir = self.dir(namespace);
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(RegistryError::Io {
                    path: dir.to_path_buf(),
                    source: e,
                });
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.at(dir)?.path();
            if has_script_extension(&path) && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    fn read(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).at(path)
    }
}

/// In-memory scripts keyed by namespace and file name.
///
/// Paths handed out are `<namespace>/<file name>`.
///
/// # Examples
///
/// ```
/// use act_core::Namespace;
/// use act_registry::{MemorySource, ScriptSource};
///
/// let source = MemorySource::new()
///     .with_script(Namespace::Local, "b.py", "print('b')")
///     .with_script(Namespace::Local, "a.py", "print('a')");
///
/// let paths = source.scripts(Namespace::Local).unwrap();
/// assert_eq!(paths[0].to_str(), Some("local/a.py"));
/// assert!(source.scripts(Namespace::Community).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(
        mut self,
        namespace: Namespace,
        file_name: &str,
        contents: impl Into<String>,
    ) -> Self {
        self.insert(namespace, file_name, contents);
        self
    }

    pub fn insert(&mut self, namespace: Namespace, file_name: &str, contents: impl Into<String>) {
        let path = Path::new(namespace.as_str()).join(file_name);
        self.files.insert(path, contents.into());
    }
}

impl ScriptSource for MemorySource {
    fn scripts(&self, namespace: Namespace) -> Result<Vec<PathBuf>> {
        let prefix = Path::new(namespace.as_str());
        Ok(self
            .files
            .keys()
            .filter(|path| path.parent() == Some(prefix) && has_script_extension(path))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RegistryError::Io {
                path: path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            })
    }
}
