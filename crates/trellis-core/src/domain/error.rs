// ============================================================================
// domain/error.rs - RESOLUTION AND DESCRIPTOR ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (so a batch can report the first failure and keep going)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Resolution Errors (404-level equivalent)
    // ========================================================================
    #[error("Add-on '{id}' not found{}", did_you_mean(.suggestion))]
    AddOnNotFound {
        id: String,
        suggestion: Option<String>,
    },

    #[error("Dependency '{dependency}' of add-on '{required_by}' not found")]
    DependencyNotFound {
        dependency: String,
        required_by: String,
    },

    #[error("Framework '{id}' not found")]
    FrameworkNotFound {
        id: String,
        suggestion: Option<String>,
    },

    // ========================================================================
    // Compatibility Errors (409-level equivalent)
    // ========================================================================
    #[error("framework '{framework}' does not support mode '{mode}'")]
    UnsupportedMode { framework: String, mode: String },

    // ========================================================================
    // Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("Invalid add-on '{id}': {reason}")]
    InvalidAddOn { id: String, reason: String },

    #[error("Invalid framework definition: {0}")]
    InvalidFramework(String),

    #[error("Unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::AddOnNotFound { id, suggestion } => {
                let mut out = Vec::new();
                if let Some(s) = suggestion {
                    out.push(format!("Did you mean \"{s}\" instead of \"{id}\"?"));
                }
                out.push("Try: trellis list to see the add-ons for this framework and mode".into());
                out
            }
            Self::DependencyNotFound {
                dependency,
                required_by,
            } => vec![
                format!("'{required_by}' declares a dependency on '{dependency}'"),
                "The add-on descriptor is malformed; report it to the add-on author".into(),
            ],
            Self::FrameworkNotFound { suggestion, .. } => {
                let mut out = Vec::new();
                if let Some(s) = suggestion {
                    out.push(format!("Did you mean \"{s}\"?"));
                }
                out.push("Use --framework-dir to load a framework from disk".into());
                out.push("Or set TRELLIS_FRAMEWORKS_DIR".into());
                out
            }
            Self::UnsupportedMode { framework, .. } => vec![
                format!("'{framework}' supports a fixed set of routing modes"),
                "Try: trellis list --framework <id> to see them".into(),
            ],
            Self::InvalidProjectName { .. } => vec![
                "Use lowercase letters, digits, hyphens, and underscores".into(),
                "Examples: my-app, my_app, app123".into(),
            ],
            Self::UnknownValue { kind, .. } => {
                vec![format!("Use --help to see the accepted {kind} values")]
            }
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AddOnNotFound { .. }
            | Self::DependencyNotFound { .. }
            | Self::FrameworkNotFound { .. } => ErrorCategory::NotFound,
            Self::UnsupportedMode { .. } => ErrorCategory::Compatibility,
            Self::InvalidAddOn { .. }
            | Self::InvalidFramework(_)
            | Self::UnknownValue { .. }
            | Self::InvalidProjectName { .. }
            | Self::AbsolutePathNotAllowed { .. } => ErrorCategory::Validation,
        }
    }
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(". Did you mean \"{s}\"?"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Compatibility,
    NotFound,
    Internal,
}
