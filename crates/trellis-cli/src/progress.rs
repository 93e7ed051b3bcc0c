//! Spinner-driven environment for interactive runs.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use trellis_core::{application::Environment, error::TrellisResult};

const TICK: Duration = Duration::from_millis(80);

/// Wraps another environment and shows one spinner per pipeline step.
///
/// File operations and commands are delegated unchanged.  Warnings are not
/// printed here; callers report them from the run's result.
pub struct ProgressEnvironment<E> {
    inner: E,
    enabled: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl<E: Environment> ProgressEnvironment<E> {
    pub fn new(inner: E, enabled: bool) -> Self {
        Self {
            inner,
            enabled,
            spinner: Mutex::new(None),
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Stop any spinner still running, e.g. after a failed step.
    pub fn abandon(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.abandon();
            }
        }
    }
}

impl<E: Environment> Environment for ProgressEnvironment<E> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn read_file(&self, path: &Path) -> TrellisResult<String> {
        self.inner.read_file(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        self.inner.write_file(path, content)
    }

    fn append_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
        self.inner.append_file(path, content)
    }

    fn delete_file(&self, path: &Path) -> TrellisResult<()> {
        self.inner.delete_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> TrellisResult<()> {
        self.inner.remove_dir_all(path)
    }

    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> TrellisResult<()> {
        self.inner.execute(command, args, cwd)
    }

    fn readdir(&self, path: &Path) -> TrellisResult<Vec<String>> {
        self.inner.readdir(path)
    }

    fn start_step(&self, id: &str, message: &str) {
        self.inner.start_step(id, message);
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(TICK);
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn finish_step(&self, id: &str, message: &str) {
        self.inner.finish_step(id, message);
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_with_message(format!("\u{2713} {message}"));
            }
        }
    }

    fn warn(&self, title: &str, message: &str) {
        debug!(title, "{message}");
    }
}
