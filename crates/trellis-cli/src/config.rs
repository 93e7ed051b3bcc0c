//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables (`TRELLIS_DEFAULTS__PACKAGE_MANAGER=pnpm`)
//! 3. The file passed with `--config`
//! 4. `trellis.toml` in the current directory
//! 5. The global config file (see [`AppConfig::config_path`])
//! 6. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use trellis_core::domain::PackageManager;

/// File name of the per-directory config.
pub const LOCAL_CONFIG_FILE: &str = "trellis.toml";

const ENV_PREFIX: &str = "TRELLIS";

/// Keys accepted by `trellis config get|set`.
pub const KEYS: &[&str] = &[
    "defaults.framework",
    "defaults.mode",
    "defaults.package_manager",
    "defaults.toolchain",
    "defaults.git",
    "defaults.install",
    "frameworks.paths",
    "output.no_color",
    "output.format",
];

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default values for new projects.
    pub defaults: Defaults,
    /// Where to look for frameworks besides the built-in ones.
    pub frameworks: FrameworksConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub framework: Option<String>,
    pub mode: Option<String>,
    pub package_manager: Option<String>,
    pub toolchain: Option<String>,
    pub git: bool,
    pub install: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            framework: None,
            mode: None,
            package_manager: None,
            toolchain: None,
            git: true,
            install: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworksConfig {
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "auto".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from every layer.
    ///
    /// `config_file` is the path the user passed via `--config`; unlike the
    /// implicit locations it must exist.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        Self::load_from(
            &Self::config_path(),
            &cwd.join(LOCAL_CONFIG_FILE),
            config_file.map(PathBuf::as_path),
        )
    }

    fn load_from(global: &Path, local: &Path, explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default()).context("invalid built-in defaults")?)
            .add_source(File::from(global).required(false))
            .add_source(File::from(local).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("frameworks.paths"),
        );

        builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("configuration has an invalid shape")
    }

    /// Path to the global configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `trellis.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "trellis", "trellis")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// The configured package manager, if one is set.
    pub fn package_manager(&self) -> anyhow::Result<Option<PackageManager>> {
        self.defaults
            .package_manager
            .as_deref()
            .map(|pm| pm.parse::<PackageManager>())
            .transpose()
            .context("defaults.package_manager")
    }
}
