//! What a composition run produced.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// One external command the pipeline ran (or would have run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedCommand {
    pub command: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl std::fmt::Display for ExecutedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Files, commands, and deletions recorded by a capturing environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComposedOutput {
    /// Absolute path to final content.
    pub files: BTreeMap<PathBuf, String>,
    pub commands: Vec<ExecutedCommand>,
    pub deleted_files: Vec<PathBuf>,
}

impl ComposedOutput {
    /// Files keyed by path relative to `root`, with `/` separators.
    ///
    /// Files outside `root` are left out.
    pub fn relative_files(&self, root: &Path) -> BTreeMap<String, String> {
        self.files
            .iter()
            .filter_map(|(path, content)| {
                let rel = path.strip_prefix(root).ok()?;
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                Some((key, content.clone()))
            })
            .collect()
    }
}
