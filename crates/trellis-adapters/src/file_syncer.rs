//! Compare-and-write synchronisation of generated files into a project.
//!
//! Used in two places:
//! - dev-watch rebuilds into a temp directory and syncs the result into the
//!   real target ([`FileSyncer::sync`])
//! - `trellis add` and dry-run compare an in-memory [`ComposedOutput`] with
//!   the project on disk ([`FileSyncer::preview`], [`FileSyncer::apply`])
//!
//! Only files whose bytes differ are written. Files present in the target
//! but not in the source are never deleted.

use std::{collections::HashMap, fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use trellis_core::{
    application::ApplicationError,
    domain::{BINARY_PREFIX, ComposedOutput},
    error::TrellisResult,
};

/// Directory names never synced.
pub const DEFAULT_IGNORED: &[&str] = &["node_modules", ".git", "dist", "build"];

// ── Reports ───────────────────────────────────────────────────────────────────

/// A file whose content changed, with a rough line delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedFile {
    pub path: String,
    pub added_lines: usize,
    pub removed_lines: usize,
}

/// Outcome of one sync, per file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub updated: Vec<UpdatedFile>,
    pub created: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of files written.
    pub fn written(&self) -> usize {
        self.updated.len() + self.created.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Changed,
    Unchanged,
}

/// How one recorded file compares with the tree on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub kind: ChangeKind,
}

// ── Syncer ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileSyncer {
    ignored: Vec<String>,
}

impl Default for FileSyncer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSyncer {
    pub fn new() -> Self {
        Self {
            ignored: DEFAULT_IGNORED.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Copy every differing file from `source` into `target`.
    ///
    /// Per-file failures are collected in [`SyncReport::errors`]; only an
    /// unreadable `source` root fails the call.
    #[instrument(skip(self), fields(source = %source.display(), target = %target.display()))]
    pub fn sync(&self, source: &Path, target: &Path) -> TrellisResult<SyncReport> {
        if !source.is_dir() {
            return Err(ApplicationError::FilesystemError {
                path: source.to_path_buf(),
                reason: "sync source is not a directory".into(),
            }
            .into());
        }

        let mut report = SyncReport::default();
        let walker = WalkDir::new(source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_ignored(e.file_name().to_string_lossy().as_ref()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.errors.push(e.to_string());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(source) else {
                continue;
            };
            let rel_key = slash_path(rel);
            match fs::read(entry.path()) {
                Ok(bytes) => self.write_if_changed(&rel_key, &bytes, &target.join(rel), &mut report),
                Err(e) => report.errors.push(format!("{rel_key}: {e}")),
            }
        }

        debug!(
            updated = report.updated.len(),
            created = report.created.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "sync finished"
        );
        Ok(report)
    }

    /// Compare recorded files under `root` with the tree at `target`.
    pub fn preview(&self, output: &ComposedOutput, root: &Path, target: &Path) -> Vec<FileChange> {
        output
            .relative_files(root)
            .into_iter()
            .filter(|(path, _)| !self.is_ignored_path(path))
            .map(|(path, content)| {
                let kind = match fs::read(target.join(&path)) {
                    Err(_) => ChangeKind::Added,
                    Ok(existing) if existing == decode(&content) => ChangeKind::Unchanged,
                    Ok(_) => ChangeKind::Changed,
                };
                FileChange { path, kind }
            })
            .collect()
    }

    /// Write recorded files under `root` into `target`, skipping identical ones.
    #[instrument(skip_all, fields(target = %target.display()))]
    pub fn apply(&self, output: &ComposedOutput, root: &Path, target: &Path) -> SyncReport {
        let mut report = SyncReport::default();
        for (path, content) in output.relative_files(root) {
            if self.is_ignored_path(&path) {
                continue;
            }
            let destination = target.join(&path);
            self.write_if_changed(&path, &decode(&content), &destination, &mut report);
        }
        report
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn write_if_changed(&self, rel: &str, bytes: &[u8], destination: &Path, report: &mut SyncReport) {
        let existing = fs::read(destination).ok();
        if existing.as_deref() == Some(bytes) {
            report.skipped.push(rel.to_string());
            return;
        }

        if let Err(e) = write_file(destination, bytes) {
            warn!(path = rel, error = %e, "failed to sync file");
            report.errors.push(format!("{rel}: {e}"));
            return;
        }

        match existing {
            Some(old) => {
                let (added_lines, removed_lines) = line_delta(&old, bytes);
                report.updated.push(UpdatedFile {
                    path: rel.to_string(),
                    added_lines,
                    removed_lines,
                });
            }
            None => report.created.push(rel.to_string()),
        }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|i| i == name)
    }

    fn is_ignored_path(&self, rel: &str) -> bool {
        rel.split('/').any(|segment| self.is_ignored(segment))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)
}

/// Bytes a recorded file will have on disk.
fn decode(content: &str) -> Vec<u8> {
    content
        .strip_prefix(BINARY_PREFIX)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .unwrap_or_else(|| content.as_bytes().to_vec())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lines only in `new` and lines only in `old`, counted as multisets.
///
/// Binary content reports `(0, 0)`.
fn line_delta(old: &[u8], new: &[u8]) -> (usize, usize) {
    let (Ok(old), Ok(new)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return (0, 0);
    };

    let mut counts: HashMap<&str, isize> = HashMap::new();
    for line in new.lines() {
        *counts.entry(line).or_default() += 1;
    }
    for line in old.lines() {
        *counts.entry(line).or_default() -= 1;
    }

    counts.values().fold((0, 0), |(added, removed), &n| {
        if n > 0 {
            (added + n.unsigned_abs(), removed)
        } else {
            (added, removed + n.unsigned_abs())
        }
    })
}
