//! Command handlers, one module per subcommand.
//!
//! Handlers translate arguments into core calls and print results.  Helpers
//! shared by several commands live here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use trellis_adapters::{TeraRenderer, TypeScriptFormatter, load_registry};
use trellis_core::{
    application::ComposeService,
    domain::{DomainError, DomainValidator, Framework, FrameworkRegistry, Mode},
    error::TrellisError,
};

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
};

pub mod add;
pub mod completions;
pub mod config;
pub mod create;
pub mod init;
pub mod list;

/// Build the framework registry from built-ins plus every configured path.
pub(crate) fn registry(
    global: &GlobalArgs,
    config: &AppConfig,
    extra: Option<&Path>,
) -> CliResult<FrameworkRegistry> {
    let mut paths: Vec<PathBuf> = global.framework_dirs.clone();
    paths.extend(config.frameworks.paths.iter().cloned());
    paths.extend(extra.map(Path::to_path_buf));
    Ok(load_registry(&paths).map_err(TrellisError::from)?)
}

/// Pick the framework: explicit id, configured default, then the registry default.
pub(crate) fn select_framework(
    registry: &FrameworkRegistry,
    requested: Option<&str>,
    config: &AppConfig,
) -> CliResult<Arc<Framework>> {
    let id = requested.or(config.defaults.framework.as_deref());
    let framework = match id {
        Some(id) => registry.get(id).map_err(TrellisError::from)?,
        None => registry
            .default_framework()
            .ok_or_else(|| CliError::ConfigError {
                message: "no frameworks are available".into(),
                source: None,
            })?,
    };
    Ok(framework)
}

/// Pick the mode and check the framework supports it.
pub(crate) fn select_mode(
    framework: &Framework,
    requested: Option<&str>,
    config: &AppConfig,
) -> CliResult<Mode> {
    let mode = requested
        .or(config.defaults.mode.as_deref())
        .map(Mode::new)
        .unwrap_or_else(|| framework.default_mode());

    if !framework.supports_mode(&mode) {
        return Err(CliError::Core(
            DomainError::UnsupportedMode {
                framework: framework.id.clone(),
                mode: mode.to_string(),
            }
            .into(),
        ));
    }
    Ok(mode)
}

/// The compose service wired with the production renderer and formatter.
pub(crate) fn compose_service() -> ComposeService {
    ComposeService::new(
        Box::new(TeraRenderer::new()),
        Box::new(TypeScriptFormatter::new()),
    )
}

// ── Path resolution ───────────────────────────────────────────────────────────

/// Split the user's `NAME` into a project name and an absolute target path.
///
/// `.` means the current directory, named after itself.
pub(crate) fn resolve_project_path(name: &str) -> CliResult<(String, PathBuf)> {
    let cwd = std::env::current_dir().with_cli_context(|| "cannot determine current directory")?;
    resolve_project_path_in(&cwd, name)
}

fn resolve_project_path_in(cwd: &Path, name: &str) -> CliResult<(String, PathBuf)> {
    let target = if name == "." {
        cwd.to_path_buf()
    } else {
        cwd.join(name)
    };

    let project_name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::InvalidInput {
            message: format!("cannot derive a project name from '{name}'"),
            source: None,
        })?
        .to_string();

    DomainValidator::validate_project_name(&project_name)
        .map_err(TrellisError::from)?;

    Ok((project_name, target))
}
