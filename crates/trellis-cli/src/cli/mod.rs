//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use trellis_core::domain::PackageManager;

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "trellis",
    bin_name = "trellis",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "\u{26a1} Add-on driven project scaffolding",
    long_about = "Trellis composes a web application from a framework's base \
                  project and any number of add-ons, toolchains and deployment \
                  targets.",
    after_help = "EXAMPLES:\n\
        \x20 trellis create my-app --add-ons tanstack-query,shadcn\n\
        \x20 trellis create my-app --mode code-router --no-typescript --dry-run\n\
        \x20 trellis add biome\n\
        \x20 trellis list --format json\n\
        \x20 trellis completions bash > /usr/share/bash-completion/completions/trellis",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new project.
    #[command(
        visible_alias = "new",
        about = "Create a new project",
        after_help = "EXAMPLES:\n\
            \x20 trellis create my-app\n\
            \x20 trellis create my-app --add-ons tanstack-query --toolchain biome --deployment netlify\n\
            \x20 trellis create my-app --package-manager pnpm --tailwind\n\
            \x20 trellis create my-app --dry-run --attribution\n\
            \x20 trellis create my-app --dev-watch ../my-framework"
    )]
    Create(CreateArgs),

    /// Add add-ons to an existing project.
    #[command(
        about = "Add add-ons to the project in the current directory",
        after_help = "EXAMPLES:\n\
            \x20 trellis add tanstack-store\n\
            \x20 trellis add biome,netlify\n\
            \x20 trellis add shadcn --dry-run"
    )]
    Add(AddArgs),

    /// List frameworks or add-ons.
    #[command(
        visible_alias = "ls",
        about = "List available add-ons",
        after_help = "EXAMPLES:\n\
            \x20 trellis list\n\
            \x20 trellis list --mode code-router\n\
            \x20 trellis list --chosen query-demo --format json\n\
            \x20 trellis list --frameworks"
    )]
    List(ListArgs),

    /// Initialise a Trellis configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 trellis init           # global config\n\
            \x20 trellis init --local   # trellis.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 trellis completions bash > ~/.local/share/bash-completion/completions/trellis\n\
            \x20 trellis completions zsh  > ~/.zfunc/_trellis\n\
            \x20 trellis completions fish > ~/.config/fish/completions/trellis.fish"
    )]
    Completions(CompletionsArgs),

    /// Manage the Trellis configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 trellis config get defaults.package_manager\n\
            \x20 trellis config set defaults.package_manager pnpm\n\
            \x20 trellis config list"
    )]
    Config(ConfigCommands),
}

// ── create ────────────────────────────────────────────────────────────────────

/// Arguments for `trellis create`.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Project name or path.  A plain name creates `./name`; a path like
    /// `../foo` places the project one level up.
    #[arg(value_name = "NAME", help = "Project name or path")]
    pub name: String,

    /// Framework id.
    #[arg(
        short = 'f',
        long = "framework",
        value_name = "ID",
        help = "Framework to build on (default: react)"
    )]
    pub framework: Option<String>,

    /// Routing mode.
    #[arg(
        short = 'm',
        long = "mode",
        visible_alias = "template",
        value_name = "MODE",
        help = "Routing mode, e.g. file-router or code-router"
    )]
    pub mode: Option<String>,

    /// Add-on ids (or URLs of remote add-ons).
    #[arg(
        short = 'a',
        long = "add-ons",
        value_name = "IDS",
        value_delimiter = ',',
        help = "Comma-separated add-on ids or URLs"
    )]
    pub add_ons: Vec<String>,

    /// Package manager used by the generated project.
    #[arg(
        short = 'p',
        long = "package-manager",
        value_name = "PM",
        value_enum,
        help = "Package manager (default: detected, then config, then npm)"
    )]
    pub package_manager: Option<PackageManagerArg>,

    /// Toolchain add-on id.
    #[arg(long = "toolchain", value_name = "ID", help = "Toolchain add-on, e.g. biome")]
    pub toolchain: Option<String>,

    /// Deployment add-on id.
    #[arg(
        long = "deployment",
        value_name = "ID",
        help = "Deployment add-on, e.g. netlify"
    )]
    pub deployment: Option<String>,

    /// URL of a starter descriptor.
    #[arg(long = "starter", value_name = "URL", help = "Starter to apply last")]
    pub starter: Option<String>,

    /// Enable Tailwind CSS.
    #[arg(long = "tailwind", help = "Add Tailwind CSS")]
    pub tailwind: bool,

    /// Generate JavaScript instead of TypeScript.
    #[arg(
        long = "no-typescript",
        visible_alias = "js",
        help = "Use JavaScript (ignored by modes that require TypeScript)"
    )]
    pub no_typescript: bool,

    /// Skip `git init`.
    #[arg(long = "no-git", help = "Do not initialise a git repository")]
    pub no_git: bool,

    /// Skip dependency installation.
    #[arg(long = "no-install", help = "Do not install dependencies")]
    pub no_install: bool,

    /// Overwrite a non-empty target directory.
    #[arg(long = "force", help = "Write into a non-empty directory")]
    pub force: bool,

    /// Pick add-ons interactively.
    #[arg(short = 'i', long = "interactive", help = "Choose add-ons interactively")]
    pub interactive: bool,

    /// Preview what would be created without writing any files.
    #[arg(long = "dry-run", help = "Show what would be created without creating")]
    pub dry_run: bool,

    /// Show which framework or add-on produced each file.
    #[arg(
        long = "attribution",
        requires = "dry_run",
        help = "With --dry-run, print file provenance"
    )]
    pub attribution: bool,

    /// Re-sync the project whenever a framework or add-on directory changes.
    #[arg(
        long = "dev-watch",
        value_name = "PATH",
        conflicts_with = "dry_run",
        help = "Watch a framework or add-on directory and re-sync on change"
    )]
    pub dev_watch: Option<PathBuf>,
}

// ── add ───────────────────────────────────────────────────────────────────────

/// Arguments for `trellis add`.
#[derive(Debug, Args)]
pub struct AddArgs {
    /// Add-on ids to add.
    #[arg(
        value_name = "IDS",
        required = true,
        value_delimiter = ',',
        help = "Add-on ids or URLs"
    )]
    pub ids: Vec<String>,

    /// Project directory.
    #[arg(
        short = 'C',
        long = "project-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Project directory"
    )]
    pub project_dir: PathBuf,

    /// Skip dependency installation.
    #[arg(long = "no-install", help = "Do not install dependencies")]
    pub no_install: bool,

    /// Show the files that would change without writing them.
    #[arg(long = "dry-run", help = "Show what would change")]
    pub dry_run: bool,
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `trellis list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Framework whose add-ons to list.
    #[arg(short = 'f', long = "framework", value_name = "ID", help = "Framework id")]
    pub framework: Option<String>,

    /// Routing mode.
    #[arg(short = 'm', long = "mode", value_name = "MODE", help = "Routing mode")]
    pub mode: Option<String>,

    /// Add-ons to treat as chosen when computing selection state.
    #[arg(
        long = "chosen",
        value_name = "IDS",
        value_delimiter = ',',
        help = "Show selection state as if these add-ons were chosen"
    )]
    pub chosen: Vec<String>,

    /// List frameworks instead of add-ons.
    #[arg(long = "frameworks", help = "List frameworks instead of add-ons")]
    pub frameworks: bool,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One id per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `trellis init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `trellis.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `trellis completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `trellis config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `defaults.package_manager`.
        key: String,
    },
    /// Set a configuration key in the global config file.
    Set {
        /// Dotted key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the global configuration file.
    Path,
}

// ── value enums ───────────────────────────────────────────────────────────────

/// Package managers accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum PackageManagerArg {
    Npm,
    Yarn,
    Pnpm,
    Bun,
    Deno,
}

impl From<PackageManagerArg> for PackageManager {
    fn from(arg: PackageManagerArg) -> Self {
        match arg {
            PackageManagerArg::Npm => Self::Npm,
            PackageManagerArg::Yarn => Self::Yarn,
            PackageManagerArg::Pnpm => Self::Pnpm,
            PackageManagerArg::Bun => Self::Bun,
            PackageManagerArg::Deno => Self::Deno,
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn package_manager_arg_converts() {
        assert_eq!(PackageManager::from(PackageManagerArg::Pnpm), PackageManager::Pnpm);
        assert_eq!(PackageManager::from(PackageManagerArg::Deno), PackageManager::Deno);
    }

    #[test]
    fn parse_create_command() {
        let cli = Cli::parse_from([
            "trellis",
            "create",
            "my-app",
            "--add-ons",
            "tanstack-query,shadcn",
            "--package-manager",
            "pnpm",
            "--no-git",
        ]);
        let Commands::Create(args) = cli.command else {
            panic!("expected Create command");
        };
        assert_eq!(args.name, "my-app");
        assert_eq!(args.add_ons, vec!["tanstack-query", "shadcn"]);
        assert_eq!(args.package_manager, Some(PackageManagerArg::Pnpm));
        assert!(args.no_git);
        assert!(!args.no_install);
    }

    #[test]
    fn new_is_an_alias_for_create() {
        let cli = Cli::parse_from(["trellis", "new", "my-app"]);
        assert!(matches!(cli.command, Commands::Create(_)));
    }

    #[test]
    fn template_is_an_alias_for_mode() {
        let cli = Cli::parse_from(["trellis", "create", "x", "--template", "code-router"]);
        let Commands::Create(args) = cli.command else {
            panic!("expected Create command");
        };
        assert_eq!(args.mode.as_deref(), Some("code-router"));
    }

    #[test]
    fn attribution_requires_dry_run() {
        let result = Cli::try_parse_from(["trellis", "create", "x", "--attribution"]);
        assert!(result.is_err());
    }

    #[test]
    fn dev_watch_conflicts_with_dry_run() {
        let result = Cli::try_parse_from([
            "trellis",
            "create",
            "x",
            "--dry-run",
            "--dev-watch",
            "../fw",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn add_splits_comma_separated_ids() {
        let cli = Cli::parse_from(["trellis", "add", "biome,netlify", "vercel"]);
        let Commands::Add(args) = cli.command else {
            panic!("expected Add command");
        };
        assert_eq!(args.ids, vec!["biome", "netlify", "vercel"]);
        assert_eq!(args.project_dir, PathBuf::from("."));
    }

    #[test]
    fn add_requires_ids() {
        assert!(Cli::try_parse_from(["trellis", "add"]).is_err());
    }

    #[test]
    fn framework_dir_is_global_and_repeatable() {
        let cli = Cli::parse_from([
            "trellis",
            "list",
            "--framework-dir",
            "a",
            "--framework-dir",
            "b",
        ]);
        assert_eq!(
            cli.global.framework_dirs,
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["trellis", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }
}
