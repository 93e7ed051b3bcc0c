//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `trellis-adapters` crate provides implementations.

use std::path::Path;

use tracing::{info, warn};

use crate::domain::{AddOn, TemplateContext};
use crate::error::TrellisResult;

/// Port for everything composition does to the outside world.
///
/// Implemented by:
/// - `trellis_adapters::environment::LocalEnvironment` (real disk, real processes)
/// - `trellis_adapters::environment::MemoryEnvironment` (dry-run and tests)
///
/// ## Design Notes
///
/// - Paths are absolute; services resolve them against the target directory
/// - File content is UTF-8 text or a `base64::`-prefixed binary payload;
///   implementations that touch disk decode the latter on write
/// - Progress reporting has logging defaults so recording environments need
///   not implement it
pub trait Environment: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read_file(&self, path: &Path) -> TrellisResult<String>;

    /// Write a file, creating parent directories.
    fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()>;

    /// Append to a file, creating it when missing.
    fn append_file(&self, path: &Path, content: &str) -> TrellisResult<()>;

    /// Remove a file. Removing a missing file is not an error.
    fn delete_file(&self, path: &Path) -> TrellisResult<()>;

    /// Remove a directory tree. Removing a missing directory is not an error.
    fn remove_dir_all(&self, path: &Path) -> TrellisResult<()>;

    /// Run `command` with `args` in `cwd`, failing on a non-zero exit.
    fn execute(&self, command: &str, args: &[String], cwd: &Path) -> TrellisResult<()>;

    /// Names of the direct children of a directory, sorted.
    fn readdir(&self, path: &Path) -> TrellisResult<Vec<String>>;

    fn start_step(&self, id: &str, message: &str) {
        info!(step = id, "{message}");
    }

    fn finish_step(&self, id: &str, message: &str) {
        info!(step = id, "{message}");
    }

    fn warn(&self, title: &str, message: &str) {
        warn!(title, "{message}");
    }
}

/// Result of rendering one template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    /// The template asked not to be written.
    Skipped,
}

/// Port for template rendering.
///
/// Implemented by:
/// - `trellis_adapters::renderer::TeraRenderer`
///
/// A template that calls its skip hook yields [`RenderOutcome::Skipped`];
/// any other failure is an `ApplicationError::TemplateRendering` naming
/// the file.
pub trait TemplateRenderer: Send + Sync {
    /// Render `content`, the body of source file `file`.
    fn render(
        &self,
        file: &str,
        content: &str,
        context: &TemplateContext,
    ) -> TrellisResult<RenderOutcome>;
}

/// Port for source formatting of generated TypeScript.
pub trait CodeFormatter: Send + Sync {
    fn format(&self, path: &str, content: &str) -> TrellisResult<String>;
}

/// Port for fetching add-on descriptors by URL.
///
/// Implemented by:
/// - `trellis_adapters::remote::HttpAddOnSource`
///
/// Implementations set the returned add-on's `id` to `url`. No retries.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteAddOnSource: Send + Sync {
    fn load(&self, url: &str) -> TrellisResult<AddOn>;
}
