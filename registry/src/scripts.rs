//! Creating and deleting scripts.

use std::path::PathBuf;

use act_core::{Identifier, Namespace, ScriptMetadata, Value, render_header};
use tracing::info;

use crate::config::SanitizePolicy;
use crate::error::{IoContext, RegistryError, Result};
use crate::install::sanitize_script_name;
use crate::layout::Layout;
use crate::resolver::{ScriptEntry, find_script};

/// Author written into new scripts when none is configured.
pub const PLACEHOLDER_AUTHOR: &str = "your_name_here";

/// Starting text of a new local script named `name`.
///
/// # Examples
///
/// ```
/// let text = act_registry::script_template("deploy", "jane");
/// assert!(text.starts_with("# /// script\n# command = \"deploy\"\n"));
/// assert!(text.ends_with("# Write your code below\n"));
/// ```
pub fn script_template(name: &str, author: &str) -> String {
    let mut metadata = ScriptMetadata::new();
    metadata.insert("command", Value::from(name));
    metadata.insert("aliases", Value::from(vec![name]));
    metadata.insert("author", Value::from(author));
    metadata.insert("dependencies", Value::List(Vec::new()));
    format!("{}\n# Write your code below\n", render_header(&metadata))
}

/// Writes `local/<name>.py` from [`script_template`].
///
/// # Errors
///
/// Returns [`InvalidName`](RegistryError::InvalidName) if `name` does not
/// survive sanitizing, or [`AlreadyExists`](RegistryError::AlreadyExists)
/// if the file is present.
pub fn create_local_script(
    layout: &Layout,
    name: &str,
    author: Option<&str>,
    policy: SanitizePolicy,
) -> Result<PathBuf> {
    let name = sanitize_script_name(name, policy)?;
    let path = layout.script_path(Namespace::Local, &name);
    if path.exists() {
        return Err(RegistryError::AlreadyExists(path));
    }

    let dir = layout.namespace_dir(Namespace::Local);
    std::fs::create_dir_all(&dir).at(&dir)?;
    let template = script_template(&name, author.unwrap_or(PLACEHOLDER_AUTHOR));
    std::fs::write(&path, template).at(&path)?;
    info!(path = %path.display(), "created script");
    Ok(path)
}

/// Resolves `identifier` and removes the script file.
///
/// Shims are not touched; callers resync afterwards.
pub fn delete_script(layout: &Layout, identifier: &Identifier) -> Result<ScriptEntry> {
    let entry = find_script(&layout.source(), identifier)?;
    std::fs::remove_file(&entry.path).at(&entry.path)?;
    info!(path = %entry.path.display(), "deleted script");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use act_core::parse_header;

    #[test]
    fn test_template_parses() {
        let meta = parse_header(&script_template("deploy", PLACEHOLDER_AUTHOR)).unwrap();
        assert_eq!(meta.command(), Some("deploy"));
        assert_eq!(meta.aliases(), vec!["deploy"]);
        assert_eq!(meta.author(), Some("your_name_here"));
        assert!(meta.dependencies().is_empty());
    }

    #[test]
    fn test_create_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());

        let path = create_local_script(&layout, "deploy", Some("jane"), SanitizePolicy::Drop).unwrap();
        assert_eq!(path, layout.script_path(Namespace::Local, "deploy"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("author = \"jane\""));

        let err = create_local_script(&layout, "deploy", None, SanitizePolicy::Drop).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(ref p) if p == &path));
    }

    #[test]
    fn test_create_sanitizes_name() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let path = create_local_script(&layout, "../deploy!", None, SanitizePolicy::Drop).unwrap();
        assert_eq!(path, layout.script_path(Namespace::Local, "deploy"));
    }

    #[test]
    fn test_delete_resolves_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        let path = create_local_script(&layout, "deploy", None, SanitizePolicy::Drop).unwrap();

        let entry = delete_script(&layout, &Identifier::parse("local:deploy")).unwrap();
        assert_eq!(entry.path, path);
        assert!(!path.exists());

        let err = delete_script(&layout, &Identifier::parse("deploy")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }
}
