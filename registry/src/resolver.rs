//! Resolving identifiers to scripts.
//!
//! Namespaces are searched in priority order (local before community), and
//! files within a namespace in file-name order. The first script whose
//! command or aliases match wins. A script whose header cannot be read or
//! parsed is logged and skipped; it never hides the scripts after it.

use std::path::{Path, PathBuf};

use act_core::{Identifier, Namespace, ScriptMetadata, parse_header};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::source::ScriptSource;

/// A script found in a namespace, together with its parsed header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptEntry {
    pub namespace: Namespace,
    pub path: PathBuf,
    pub metadata: ScriptMetadata,
}

impl ScriptEntry {
    /// The script's command, if it declares one.
    pub fn command(&self) -> Option<&str> {
        self.metadata.command()
    }

    /// `namespace:command`, falling back to the file stem.
    pub fn qualified_name(&self) -> String {
        let name = match self.command() {
            Some(command) => command.to_string(),
            None => self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        format!("{}:{name}", self.namespace)
    }
}

/// Reads and parses one script.
pub fn load_script(
    source: &dyn ScriptSource,
    namespace: Namespace,
    path: &Path,
) -> Result<ScriptEntry> {
    let text = source.read(path)?;
    let metadata = parse_header(&text).map_err(|source| RegistryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ScriptEntry {
        namespace,
        path: path.to_path_buf(),
        metadata,
    })
}

/// Every readable script in `namespace`, in file-name order.
///
/// Unreadable or unparsable files are logged at `warn` and omitted.
pub fn scan_namespace(source: &dyn ScriptSource, namespace: Namespace) -> Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();
    for path in source.scripts(namespace)? {
        match load_script(source, namespace, &path) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping script"),
        }
    }
    Ok(entries)
}

/// Resolves `identifier` to the first matching script.
///
/// # Errors
///
/// Returns [`NotFound`](RegistryError::NotFound) if no script in the
/// searched namespaces matches, or [`Io`](RegistryError::Io) if a namespace
/// cannot be listed.
///
/// # Examples
///
/// ```
/// use act_core::{Identifier, Namespace};
/// use act_registry::{MemorySource, find_script};
///
/// let header = "# /// script\n# command = \"build\"\n# ///\n";
/// let source = MemorySource::new()
///     .with_script(Namespace::Local, "build.py", header)
///     .with_script(Namespace::Community, "build.py", header);
///
/// let entry = find_script(&source, &Identifier::parse("build")).unwrap();
/// assert_eq!(entry.namespace, Namespace::Local);
///
/// let entry = find_script(&source, &Identifier::parse("community:build")).unwrap();
/// assert_eq!(entry.namespace, Namespace::Community);
/// ```
pub fn find_script(source: &dyn ScriptSource, identifier: &Identifier) -> Result<ScriptEntry> {
    let token = identifier.token();
    for &namespace in identifier.search_order() {
        for path in source.scripts(namespace)? {
            let entry = match load_script(source, namespace, &path) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping script");
                    continue;
                }
            };
            if entry.metadata.matches(token) {
                debug!(
                    identifier = %identifier,
                    path = %entry.path.display(),
                    "resolved script"
                );
                return Ok(entry);
            }
        }
    }
    Err(RegistryError::NotFound(identifier.to_string()))
}

/// Every script with a command, local namespace first.
pub fn list_scripts(source: &dyn ScriptSource) -> Result<Vec<ScriptEntry>> {
    let mut all = Vec::new();
    for namespace in Namespace::SEARCH_ORDER {
        all.extend(
            scan_namespace(source, namespace)?
                .into_iter()
                .filter(|entry| entry.command().is_some()),
        );
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn script(command: &str, aliases: &[&str]) -> String {
        let aliases = aliases
            .iter()
            .map(|a| format!("\"{a}\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!("# /// script\n# command = \"{command}\"\n# aliases = [{aliases}]\n# ///\nprint()\n")
    }

    #[test]
    fn test_local_shadows_community() {
        let source = MemorySource::new()
            .with_script(Namespace::Community, "weather.py", script("weather", &[]))
            .with_script(Namespace::Local, "mine.py", script("weather", &[]));

        let entry = find_script(&source, &Identifier::parse("weather")).unwrap();
        assert_eq!(entry.namespace, Namespace::Local);
        assert_eq!(entry.path, PathBuf::from("local/mine.py"));
    }

    #[test]
    fn test_alias_match() {
        let source = MemorySource::new().with_script(
            Namespace::Community,
            "weather.py",
            script("weather", &["wttr", "forecast"]),
        );
        let entry = find_script(&source, &Identifier::parse("forecast")).unwrap();
        assert_eq!(entry.command(), Some("weather"));
    }

    #[test]
    fn test_first_file_in_name_order_wins() {
        let source = MemorySource::new()
            .with_script(Namespace::Local, "b.py", script("b", &["x"]))
            .with_script(Namespace::Local, "a.py", script("a", &["x"]));
        let entry = find_script(&source, &Identifier::parse("x")).unwrap();
        assert_eq!(entry.command(), Some("a"));
    }

    #[test]
    fn test_scoped_lookup_does_not_fall_through() {
        let source =
            MemorySource::new().with_script(Namespace::Community, "w.py", script("weather", &[]));
        let err = find_script(&source, &Identifier::parse("local:weather")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref id) if id == "local:weather"));
    }

    #[test]
    fn test_broken_script_is_skipped() {
        let source = MemorySource::new()
            .with_script(
                Namespace::Local,
                "a.py",
                "# /// script\n# command = \"tool\n# ///\n",
            )
            .with_script(Namespace::Local, "b.py", script("tool", &[]));
        let entry = find_script(&source, &Identifier::parse("tool")).unwrap();
        assert_eq!(entry.path, PathBuf::from("local/b.py"));
    }

    #[test]
    fn test_headerless_script_never_matches() {
        let source = MemorySource::new().with_script(Namespace::Local, "plain.py", "print(1)\n");
        assert!(find_script(&source, &Identifier::parse("plain")).is_err());
    }

    #[test]
    fn test_load_script_reports_parse_error() {
        let source = MemorySource::new().with_script(
            Namespace::Local,
            "bad.py",
            "# /// script\n# command = open('x')\n# ///\n",
        );
        let err = load_script(&source, Namespace::Local, Path::new("local/bad.py")).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }

    #[test]
    fn test_list_scripts_orders_namespaces() {
        let source = MemorySource::new()
            .with_script(Namespace::Community, "a.py", script("remote", &[]))
            .with_script(Namespace::Local, "z.py", script("mine", &[]))
            .with_script(Namespace::Local, "plain.py", "print(1)\n");

        let names: Vec<_> = list_scripts(&source)
            .unwrap()
            .iter()
            .map(ScriptEntry::qualified_name)
            .collect();
        assert_eq!(names, vec!["local:mine", "community:remote"]);
    }
}
