//! Shim synchronization.
//!
//! Every script with a command gets one executable file in the shim
//! directory, named after the command, that re-enters `act run`. A sync
//! rebuilds the directory from scratch, so its result depends only on the
//! scripts present.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use act_core::{Namespace, is_valid_command_name};
use tracing::{debug, info, warn};

use crate::error::{IoContext, Result};
use crate::resolver::{ScriptEntry, scan_namespace};
use crate::source::ScriptSource;

/// Commands mapped to the script that owns them.
pub type ShimSet = BTreeMap<String, ScriptEntry>;

/// Result of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No script declares a command; the shim directory was left empty.
    Empty,
    /// Shims written, in command order.
    Linked(Vec<PathBuf>),
}

impl SyncOutcome {
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            SyncOutcome::Empty => &[],
            SyncOutcome::Linked(paths) => paths,
        }
    }
}

/// The program invocation written into every shim.
///
/// # Examples
///
/// ```
/// use act_registry::ShimLauncher;
///
/// let launcher = ShimLauncher::new("/usr/bin/act").with_args(["--root", "/srv/act"]);
/// assert_eq!(
///     launcher.render("weather"),
///     "#!/bin/sh\nexec '/usr/bin/act' '--root' '/srv/act' run -- 'weather' \"$@\"\n"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl ShimLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Global arguments placed before `run`.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shim file contents for `command`.
    pub fn render(&self, command: &str) -> String {
        let mut line = format!("exec {}", shell_quote(&self.program.to_string_lossy()));
        for arg in &self.args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line.push_str(" run -- ");
        line.push_str(&shell_quote(command));
        line.push_str(" \"$@\"");
        format!("#!/bin/sh\n{line}\n")
    }
}

/// Single-quotes `s` for POSIX sh.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Builds the command-to-script map.
///
/// Local scripts are visited first and a community script never takes a
/// command from a local one; otherwise the last file (in name order)
/// declaring a command owns it. Commands that cannot be file names are
/// skipped with a warning.
pub fn plan_shims(source: &dyn ScriptSource) -> Result<ShimSet> {
    let mut shims = ShimSet::new();
    for namespace in Namespace::SEARCH_ORDER {
        for entry in scan_namespace(source, namespace)? {
            let Some(command) = entry.command().map(str::to_string) else {
                continue;
            };
            if !is_valid_command_name(&command) {
                warn!(
                    command = %command,
                    path = %entry.path.display(),
                    "command cannot be used as a shim name"
                );
                continue;
            }
            if let Some(previous) = shims.get(&command) {
                if previous.namespace == Namespace::Local && namespace == Namespace::Community {
                    debug!(
                        command = %command,
                        shadowed = %entry.path.display(),
                        "community script shadowed by local"
                    );
                    continue;
                }
                debug!(
                    command = %command,
                    replaced = %previous.path.display(),
                    by = %entry.path.display(),
                    "shim owner replaced"
                );
            }
            shims.insert(command, entry);
        }
    }
    Ok(shims)
}

/// Rebuilds `shim_dir` so it holds exactly one shim per command.
///
/// Regular files already in the directory are removed first; subdirectories
/// and dangling symlinks are left alone.
pub fn synchronize_shims(
    source: &dyn ScriptSource,
    shim_dir: &Path,
    launcher: &ShimLauncher,
) -> Result<SyncOutcome> {
    std::fs::create_dir_all(shim_dir).at(shim_dir)?;
    clear_shims(shim_dir)?;

    let shims = plan_shims(source)?;
    if shims.is_empty() {
        info!(dir = %shim_dir.display(), "no commands to link");
        return Ok(SyncOutcome::Empty);
    }

    let mut written = Vec::with_capacity(shims.len());
    for command in shims.keys() {
        let path = shim_dir.join(command);
        std::fs::write(&path, launcher.render(command)).at(&path)?;
        make_executable(&path)?;
        written.push(path);
    }
    info!(count = written.len(), dir = %shim_dir.display(), "linked shims");
    Ok(SyncOutcome::Linked(written))
}

fn clear_shims(shim_dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(shim_dir).at(shim_dir)? {
        let path = entry.at(shim_dir)?.path();
        let is_file = std::fs::metadata(&path)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            std::fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).at(path)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
