//! In-memory environment for dry-run and tests.
//!
//! Nothing touches disk and no process is spawned. Writes, deletions and
//! commands are recorded so the run can be inspected afterwards as a
//! [`ComposedOutput`].

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use tracing::{debug, warn};

use trellis_core::{
    application::{ApplicationError, ports::Environment},
    domain::{ComposedOutput, ExecutedCommand},
    error::TrellisResult,
};

/// Recording environment.
///
/// Cloning shares the same state, so a clone handed to a service can be read
/// back by the caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnvironment {
    inner: Arc<RwLock<MemoryEnvironmentInner>>,
}

#[derive(Debug, Default)]
struct MemoryEnvironmentInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    commands: Vec<ExecutedCommand>,
    deleted: Vec<PathBuf>,
    warnings: Vec<String>,
}

impl MemoryEnvironment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `path` and its ancestors as existing directories.
    pub fn with_directory(self, path: impl AsRef<Path>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            for ancestor in path.as_ref().ancestors() {
                if !ancestor.as_os_str().is_empty() {
                    inner.directories.insert(ancestor.to_path_buf());
                }
            }
        }
        self
    }

    /// Seed a file, e.g. one read from an existing project.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        if let Ok(mut inner) = self.inner.write() {
            inner.files.insert(path.into(), content.into());
        }
        self
    }

    /// Content of a recorded file (testing helper).
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path.as_ref()).cloned()
    }

    /// Recorded commands in execution order.
    pub fn commands(&self) -> Vec<ExecutedCommand> {
        self.inner
            .read()
            .map(|inner| inner.commands.clone())
            .unwrap_or_default()
    }

    /// Warnings reported through [`Environment::warn`].
    pub fn warnings(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|inner| inner.warnings.clone())
            .unwrap_or_default()
    }

    /// Snapshot of everything the run produced.
    pub fn output(&self) -> TrellisResult<ComposedOutput> {
        let inner = self
            .inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError)?;
        Ok(ComposedOutput {
            files: inner.files.clone(),
            commands: inner.commands.clone(),
            deleted_files: inner.deleted.clone(),
        })
    }

    fn write(&self) -> TrellisResult<std::sync::RwLockWriteGuard<'_, MemoryEnvironmentInner>> {
        self.inner
            .write()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }

    fn read(&self) -> TrellisResult<std::sync::RwLockReadGuard<'_, MemoryEnvironmentInner>> {
        self.inner
            .read()
            .map_err(|_| ApplicationError::StoreLockError.into())
    }
}

impl Environment for MemoryEnvironment {
    fn exists(&self, path: &Path) -> bool {
        let Ok(inner) = self.read() else {
            return false;
        };
        inner.files.contains_key(path)
            || inner.directories.contains(path)
            || inner.files.keys().any(|f| f.starts_with(path))
    }

    fn read_file(&self, path: &Path) -> TrellisResult<String> {
        self.read()?.files.get(path).cloned().ok_or_else(|| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "No such file in memory environment".into(),
            }
            .into()
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        let mut inner = self.write()?;
        inner.files.insert(path.to_path_buf(), content.to_string());
        inner.deleted.retain(|d| d != path);
        Ok(())
    }

    fn append_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        let mut inner = self.write()?;
        inner
            .files
            .entry(path.to_path_buf())
            .or_default()
            .push_str(content);
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> TrellisResult<()> {
        let mut inner = self.write()?;
        if inner.files.remove(path).is_some() {
            inner.deleted.push(path.to_path_buf());
        }
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> TrellisResult<()> {
        let mut inner = self.write()?;
        inner.files.retain(|p, _| !p.starts_with(path));
        inner.directories.retain(|p| !p.starts_with(path));
        Ok(())
    }

    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> TrellisResult<()> {
        let recorded = ExecutedCommand {
            command: command.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        };
        debug!(command = %recorded, "Recorded command");
        self.write()?.commands.push(recorded);
        Ok(())
    }

    fn readdir(&self, path: &Path) -> TrellisResult<Vec<String>> {
        let inner = self.read()?;
        let children: BTreeSet<String> = inner
            .files
            .keys()
            .chain(inner.directories.iter())
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter_map(|rest| rest.components().next())
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(children.into_iter().collect())
    }

    fn start_step(&self, _id: &str, _message: &str) {}

    fn finish_step(&self, _id: &str, _message: &str) {}

    fn warn(&self, title: &str, message: &str) {
        warn!(title, "{message}");
        if let Ok(mut inner) = self.inner.write() {
            inner.warnings.push(message.to_string());
        }
    }
}
