//! Index of a community script repository.
//!
//! [`build_index`] reads every script header in a directory and
//! [`update_readme`] renders the result as a markdown table between marker
//! comments in a README.

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::LazyLock;

use act_core::{Namespace, parse_header};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IoContext, Result};
use crate::source::{FsSource, ScriptSource};

pub const README_START: &str = "<!-- ACT_SCRIPTS_START -->";
pub const README_END: &str = "<!-- ACT_SCRIPTS_END -->";

static README_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*{}",
        regex::escape(README_START),
        regex::escape(README_END)
    ))
    .expect("static regex must compile")
});

/// One indexed script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Path of the script as found under the indexed directory.
    pub file: String,
    pub command: String,
    pub description: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The published index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityIndex {
    /// RFC 3339 time the index was built.
    pub generated_at: String,
    pub scripts: Vec<IndexEntry>,
}

impl CommunityIndex {
    /// Loads an index from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).at(path)?;
        let index = serde_json::from_reader(BufReader::new(file))?;
        Ok(index)
    }

    /// Writes the index as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).at(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Markdown table listing every script.
    pub fn markdown_table(&self) -> String {
        let mut table = String::from("| Title | Description |  |\n| --- | --- | --- |\n");
        let rows: Vec<String> = self
            .scripts
            .iter()
            .map(|s| {
                format!(
                    "| **{}** | {} | [View Script]({}) |",
                    s.command,
                    s.description.as_deref().unwrap_or_default(),
                    s.file
                )
            })
            .collect();
        table.push_str(&rows.join("\n"));
        table
    }
}

/// Indexes every script in `dir` that declares a command, in file-name
/// order. Files whose header fails to parse are skipped with a warning.
pub fn build_index(dir: &Path) -> Result<CommunityIndex> {
    let source = FsSource::new(dir, dir);
    let mut scripts = Vec::new();
    for path in source.scripts(Namespace::Community)? {
        let text = source.read(&path)?;
        let metadata = match parse_header(&text) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping script");
                continue;
            }
        };
        let Some(command) = metadata.command() else {
            continue;
        };
        scripts.push(IndexEntry {
            file: path.display().to_string(),
            command: command.to_string(),
            description: metadata.description().map(str::to_string),
            author: metadata.author().map(str::to_string),
            aliases: metadata.aliases().into_iter().map(str::to_string).collect(),
        });
    }
    info!(count = scripts.len(), dir = %dir.display(), "built index");
    Ok(CommunityIndex {
        generated_at: chrono::Utc::now().to_rfc3339(),
        scripts,
    })
}

/// Replaces the marker block in the README at `path` with the index table.
///
/// Returns `false`, leaving the file unchanged, if the markers are absent.
pub fn update_readme(path: &Path, index: &CommunityIndex) -> Result<bool> {
    let content = std::fs::read_to_string(path).at(path)?;
    if !README_BLOCK.is_match(&content) {
        warn!(path = %path.display(), "README has no script markers");
        return Ok(false);
    }
    let block = format!("{README_START}\n{}\n{README_END}", index.markdown_table());
    let updated = README_BLOCK.replace(&content, NoExpand(&block));
    std::fs::write(path, updated.as_bytes()).at(path)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(command: &str, description: Option<&str>) -> IndexEntry {
        IndexEntry {
            file: format!("scripts/{command}.py"),
            command: command.into(),
            description: description.map(Into::into),
            author: Some("jane".into()),
            aliases: vec![],
        }
    }

    #[test]
    fn test_build_index_reads_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("weather.py"),
            "# /// script\n# command = \"weather\"\n# description = \"Current weather\"\n# aliases = [\"wttr\"]\n# author = \"jane\"\n# dependencies = [\n#   \"requests<3\",\n# ]\n# ///\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("helper.py"), "print('no header')\n").unwrap();
        std::fs::write(dir.path().join("bad.py"), "# /// script\n# command = (\n# ///\n").unwrap();

        let index = build_index(dir.path()).unwrap();
        assert_eq!(index.scripts.len(), 1);
        let weather = &index.scripts[0];
        assert_eq!(weather.command, "weather");
        assert_eq!(weather.description.as_deref(), Some("Current weather"));
        assert_eq!(weather.aliases, vec!["wttr"]);
        assert!(weather.file.ends_with("weather.py"));
    }

    #[test]
    fn test_markdown_table() {
        let index = CommunityIndex {
            generated_at: String::new(),
            scripts: vec![entry("a", Some("Does a")), entry("b", None)],
        };
        assert_eq!(
            index.markdown_table(),
            "| Title | Description |  |\n| --- | --- | --- |\n\
             | **a** | Does a | [View Script](scripts/a.py) |\n\
             | **b** |  | [View Script](scripts/b.py) |"
        );
    }

    #[test]
    fn test_update_readme_replaces_block() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.md");
        std::fs::write(
            &readme,
            "# Scripts\n<!-- ACT_SCRIPTS_START -->\nold\ntable\n<!-- ACT_SCRIPTS_END -->\nfooter\n",
        )
        .unwrap();
        let index = CommunityIndex {
            generated_at: String::new(),
            scripts: vec![entry("cost", Some("Costs $5"))],
        };

        assert!(update_readme(&readme, &index).unwrap());
        let text = std::fs::read_to_string(&readme).unwrap();
        assert!(text.starts_with("# Scripts\n<!-- ACT_SCRIPTS_START -->\n| Title"));
        assert!(text.contains("Costs $5"));
        assert!(!text.contains("old\ntable"));
        assert!(text.ends_with("<!-- ACT_SCRIPTS_END -->\nfooter\n"));
    }

    #[test]
    fn test_update_readme_without_markers() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.md");
        std::fs::write(&readme, "nothing here\n").unwrap();
        let index = CommunityIndex {
            generated_at: String::new(),
            scripts: vec![],
        };
        assert!(!update_readme(&readme, &index).unwrap());
        assert_eq!(std::fs::read_to_string(&readme).unwrap(), "nothing here\n");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let index = CommunityIndex {
            generated_at: "2024-01-01T00:00:00+00:00".into(),
            scripts: vec![entry("a", None)],
        };
        index.save(&path).unwrap();
        assert_eq!(CommunityIndex::load(&path).unwrap(), index);
    }
}
