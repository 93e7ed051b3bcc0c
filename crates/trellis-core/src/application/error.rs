//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// A template failed to render. Aborts the whole run.
    #[error("Template rendering failed in {path}: {cause}")]
    TemplateRendering { path: PathBuf, cause: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The target directory exists and is not empty.
    #[error("Target directory {path} already exists and is not empty")]
    TargetNotEmpty { path: PathBuf },

    /// The directory the project would be created in does not exist.
    #[error("Parent directory of {path} does not exist")]
    TargetParentMissing { path: PathBuf },

    /// A remote add-on could not be fetched or parsed.
    #[error("Failed to load remote add-on {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    /// An external command exited unsuccessfully or could not start.
    #[error("Command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Shared state access failed (lock poisoned).
    #[error("Environment state lock poisoned")]
    StoreLockError,

    /// The persisted project config is missing or malformed.
    #[error("Project config {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateRendering { path, .. } => vec![
                format!("Fix the template at {}", path.display()),
                "Run with -vv to see the rendering context".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::TargetNotEmpty { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --force to write into it anyway".into(),
                "Choose a different project name".into(),
            ],
            Self::TargetParentMissing { path } => vec![
                format!("Create {} first", path.display()),
                "Or pass a path whose parent exists".into(),
            ],
            Self::RemoteFetch { url, .. } => vec![
                format!("Check that {url} is reachable and returns an add-on descriptor"),
                "Remote add-ons are not retried automatically".into(),
            ],
            Self::CommandFailed { command, .. } => vec![
                format!("Try running `{command}` manually in the project directory"),
                "Use --no-install to skip dependency installation".into(),
            ],
            Self::StoreLockError => vec!["Try again in a moment".into()],
            Self::ConfigFile { .. } => vec![
                "Run this command from a project created by trellis".into(),
                "The project config is written as .trellis.json".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateRendering { .. } => ErrorCategory::Internal,
            Self::FilesystemError { .. } | Self::StoreLockError => ErrorCategory::Internal,
            Self::TargetNotEmpty { .. } => ErrorCategory::Validation,
            Self::TargetParentMissing { .. } => ErrorCategory::NotFound,
            Self::RemoteFetch { .. } => ErrorCategory::NotFound,
            Self::CommandFailed { .. } => ErrorCategory::Internal,
            Self::ConfigFile { .. } => ErrorCategory::Configuration,
        }
    }
}
