//! `trellis config`: read and write configuration values.

use std::path::Path;

use tracing::info;

use crate::{
    cli::ConfigCommands,
    config::{AppConfig, KEYS},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

const BOOL_KEYS: &[&str] = &["defaults.git", "defaults.install", "output.no_color"];
const LIST_KEYS: &[&str] = &["frameworks.paths"];

/// Dispatch to the correct config subcommand.
pub fn execute(cmd: ConfigCommands, config: AppConfig, output: OutputManager) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            output.print(&value)?;
        }

        ConfigCommands::Set { key, value } => {
            let path = AppConfig::config_path();
            set_config_value(&path, &key, &value)?;
            info!(%key, %value, path = %path.display(), "Configuration updated");
            output.success(&format!("{key} = {value}  ({})", path.display()))?;
        }

        ConfigCommands::List => {
            let serialised = toml::to_string_pretty(&config).map_err(|e| CliError::ConfigError {
                message: format!("Failed to serialise config: {e}"),
                source: Some(Box::new(e)),
            })?;
            output.header("Current configuration:")?;
            output.print(serialised.trim_end())?;
        }

        ConfigCommands::Path => {
            output.print(&AppConfig::config_path().display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn unknown_key(key: &str) -> CliError {
    CliError::ConfigError {
        message: format!("Unknown config key: '{key}' (expected one of: {})", KEYS.join(", ")),
        source: None,
    }
}

fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    let optional = |v: &Option<String>| v.clone().unwrap_or_default();
    match key {
        "defaults.framework" => Ok(optional(&config.defaults.framework)),
        "defaults.mode" => Ok(optional(&config.defaults.mode)),
        "defaults.package_manager" => Ok(optional(&config.defaults.package_manager)),
        "defaults.toolchain" => Ok(optional(&config.defaults.toolchain)),
        "defaults.git" => Ok(config.defaults.git.to_string()),
        "defaults.install" => Ok(config.defaults.install.to_string()),
        "frameworks.paths" => Ok(config
            .frameworks
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(",")),
        "output.no_color" => Ok(config.output.no_color.to_string()),
        "output.format" => Ok(config.output.format.clone()),
        _ => Err(unknown_key(key)),
    }
}

/// Update one key in the TOML file at `path`, keeping everything else.
///
/// The edited document must still deserialize into [`AppConfig`] and name a
/// valid package manager before anything is written.
fn set_config_value(path: &Path, key: &str, raw: &str) -> CliResult<()> {
    if !KEYS.contains(&key) {
        return Err(unknown_key(key));
    }
    let Some((section, field)) = key.split_once('.') else {
        return Err(unknown_key(key));
    };

    let value = if BOOL_KEYS.contains(&key) {
        let parsed = raw.parse::<bool>().map_err(|e| CliError::ConfigError {
            message: format!("'{key}' expects true or false, got '{raw}'"),
            source: Some(Box::new(e)),
        })?;
        toml::Value::Boolean(parsed)
    } else if LIST_KEYS.contains(&key) {
        toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        )
    } else {
        toml::Value::String(raw.to_string())
    };

    let mut document = if path.exists() {
        let existing = std::fs::read_to_string(path)
            .with_cli_context(|| format!("Failed to read '{}'", path.display()))?;
        existing.parse::<toml::Table>().map_err(|e| CliError::ConfigError {
            message: format!("'{}' is not valid TOML", path.display()),
            source: Some(Box::new(e)),
        })?
    } else {
        toml::Table::new()
    };

    let table = document
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let toml::Value::Table(table) = table else {
        return Err(CliError::ConfigError {
            message: format!("'{section}' in '{}' is not a table", path.display()),
            source: None,
        });
    };
    table.insert(field.to_string(), value);

    let checked: AppConfig = toml::Value::Table(document.clone())
        .try_into()
        .map_err(|e: toml::de::Error| CliError::ConfigError {
            message: format!("invalid value for '{key}'"),
            source: Some(Box::new(e)),
        })?;
    checked.package_manager().map_err(CliError::config)?;

    let rendered = toml::to_string_pretty(&document).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise config: {e}"),
        source: Some(Box::new(e)),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    std::fs::write(path, rendered)
        .with_cli_context(|| format!("Failed to write config to '{}'", path.display()))
}

// ── tests ─────────────────────────────────────────────────────────────────────
