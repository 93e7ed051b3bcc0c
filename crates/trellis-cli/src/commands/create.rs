//! Implementation of the `trellis create` command.
//!
//! Responsibility: translate CLI arguments into core `Options`, run the
//! compose service against the real disk or an in-memory recording, and
//! display results.  No business logic lives here.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use trellis_adapters::{
    ChangeKind, FileChange, FileSyncer, HttpAddOnSource, LocalEnvironment, MemoryEnvironment,
};
use trellis_core::{
    application::{AddOnResolver, ApplicationError, RemoteAddOnSource},
    domain::{
        Attribution, Framework, Mode, Options, PackageManager, compute_attribution,
        package_manager::{
            USER_AGENT_VAR, detect_from_user_agent, format_command, install_command, script_command,
        },
        populate_add_on_options_defaults,
    },
    error::TrellisError,
};

use crate::{
    cli::{CreateArgs, GlobalArgs, OutputFormat},
    commands::{compose_service, registry, resolve_project_path, select_framework, select_mode},
    config::AppConfig,
    dev_watch::{self, WatchSource},
    error::{CliError, CliResult},
    output::OutputManager,
    progress::ProgressEnvironment,
};

/// Execute the `trellis create` command.
///
/// Dispatch sequence:
/// 1. Resolve the project path and validate the `--dev-watch` path
/// 2. Pick framework and mode, resolve the add-on closure
/// 3. Build `Options` from flags, config and detection
/// 4. Dry run into memory, or create on disk
/// 5. Optionally hand over to the dev-watch loop
#[instrument(skip_all, fields(project = %args.name))]
pub fn execute(
    args: CreateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let (project_name, target_dir) = resolve_project_path(&args.name)?;

    let watch = match &args.dev_watch {
        Some(path) => {
            if args.no_install {
                return Err(CliError::InvalidInput {
                    message: "--dev-watch needs installed dependencies; drop --no-install".into(),
                    source: None,
                });
            }
            Some(WatchSource::validate(path)?)
        }
        None => None,
    };

    let registry = registry(&global, &config, None)?;
    let base_framework = select_framework(&registry, args.framework.as_deref(), &config)?;
    let framework = match &watch {
        Some(source) => Arc::new(source.overlay(&base_framework)?),
        None => Arc::clone(&base_framework),
    };
    let mode = select_mode(&framework, args.mode.as_deref(), &config)?;

    let mut ids = args.add_ons.clone();
    if args.interactive {
        ids = prompt_add_ons(&framework, &mode, &ids)?;
    }
    ids.extend(args.toolchain.clone().or_else(|| config.defaults.toolchain.clone()));
    ids.extend(args.deployment.clone());

    let chosen_add_ons =
        AddOnResolver::new(Box::new(HttpAddOnSource::new())).finalize_add_ons(&framework, &mode, &ids)?;
    let starter = match &args.starter {
        Some(url) => Some(Arc::new(HttpAddOnSource::new().load(url)?)),
        None => None,
    };

    let mut options = Options::new(project_name.clone(), target_dir, Arc::clone(&framework));
    options.mode = mode;
    options.typescript = !args.no_typescript || framework.forces_typescript(&options.mode);
    options.package_manager = pick_package_manager(&args, &config)?;
    options.git = !args.no_git && config.defaults.git;
    options.install = !args.no_install && config.defaults.install;
    options.force = args.force;
    options.add_on_options = populate_add_on_options_defaults(&chosen_add_ons);
    options.chosen_add_ons = chosen_add_ons;
    options.starter = starter;
    options.tailwind = args.tailwind || options.any_add_on_requires_tailwind();

    debug!(
        framework = %options.framework.id,
        mode = %options.mode,
        add_ons = ?options.chosen_ids(),
        package_manager = %options.package_manager,
        typescript = options.typescript,
        tailwind = options.tailwind,
        "Options resolved"
    );

    if args.dry_run {
        return dry_run(&options, args.attribution, &output);
    }

    output.header(&format!("Creating '{project_name}'..."))?;
    let env = ProgressEnvironment::new(LocalEnvironment::new(), output.shows_progress());
    let report = compose_service().create_app(&options, &env).inspect_err(|_| env.abandon())?;
    info!(project = %project_name, run_id = %report.run_id, "Project created");

    for warning in &report.warnings {
        output.warning(warning)?;
    }
    output.success(&format!("Project '{project_name}' created!"))?;
    print_next_steps(&options, &output)?;

    if let Some(source) = watch {
        let session = dev_watch::Session {
            source,
            base_framework,
            options,
        };
        return dev_watch::run(session, &output);
    }

    Ok(())
}

// ── Option helpers ────────────────────────────────────────────────────────────

/// Explicit flag, then the invoking package manager, then config, then npm.
fn pick_package_manager(args: &CreateArgs, config: &AppConfig) -> CliResult<PackageManager> {
    if let Some(pm) = args.package_manager {
        return Ok(pm.into());
    }
    let agent = std::env::var(USER_AGENT_VAR).ok();
    if let Some(pm) = detect_from_user_agent(agent.as_deref()) {
        debug!(package_manager = %pm, "Detected package manager from user agent");
        return Ok(pm);
    }
    Ok(config
        .package_manager()
        .map_err(CliError::config)?
        .unwrap_or_default())
}

#[cfg(feature = "interactive")]
fn prompt_add_ons(framework: &Framework, mode: &Mode, preselected: &[String]) -> CliResult<Vec<String>> {
    use dialoguer::{MultiSelect, theme::ColorfulTheme};
    use trellis_core::domain::add_on_status;

    let available = AddOnResolver::local_only().list_add_ons(framework, mode);
    if available.is_empty() {
        return Ok(preselected.to_vec());
    }

    let status = add_on_status(&available, preselected, &[]);
    let items: Vec<String> = available
        .iter()
        .map(|a| format!("{} ({})", a.name, a.kind))
        .collect();
    let defaults: Vec<bool> = available
        .iter()
        .map(|a| status.get(&a.id).is_some_and(|s| s.selected))
        .collect();

    let picked = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Add-ons (space to toggle, enter to confirm)")
        .items(&items)
        .defaults(&defaults)
        .interact_opt()
        .map_err(|e| CliError::InvalidInput {
            message: format!("prompt failed: {e}"),
            source: None,
        })?
        .ok_or(CliError::Cancelled)?;

    // Deployments are single-select: the state machine keeps the last one.
    let chosen: Vec<String> = picked.into_iter().map(|i| available[i].id.clone()).collect();
    let status = add_on_status(&available, &chosen, &[]);
    Ok(chosen
        .into_iter()
        .filter(|id| status.get(id).is_some_and(|s| s.selected))
        .collect())
}

#[cfg(not(feature = "interactive"))]
fn prompt_add_ons(_framework: &Framework, _mode: &Mode, _preselected: &[String]) -> CliResult<Vec<String>> {
    Err(CliError::FeatureNotAvailable {
        feature: "interactive",
    })
}

// ── Dry run ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DryRunReport<'a> {
    target: String,
    files: &'a [FileChange],
    commands: Vec<String>,
    warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution: Option<&'a Attribution>,
}

/// Compose into memory and compare the result with what is on disk.
fn dry_run(options: &Options, attribution: bool, output: &OutputManager) -> CliResult<()> {
    let target = &options.target_dir;
    refuse_non_empty_target(options)?;

    let mut memory = MemoryEnvironment::new();
    if let Some(parent) = target.parent().filter(|p| p.is_dir()) {
        memory = memory.with_directory(parent);
    }

    let report = compose_service().create_app(options, &memory)?;
    let composed = memory.output()?;
    let changes = FileSyncer::new().preview(&composed, target, target);
    let commands: Vec<String> = composed.commands.iter().map(ToString::to_string).collect();
    let attribution = attribution.then(|| {
        compute_attribution(
            &options.framework,
            &options.chosen_add_ons,
            options.starter.as_deref(),
            &composed.relative_files(target),
        )
    });

    if output.format() == OutputFormat::Json {
        output.json(&DryRunReport {
            target: target.display().to_string(),
            files: &changes,
            commands,
            warnings: &report.warnings,
            attribution: attribution.as_ref(),
        })?;
        return Ok(());
    }

    output.info(&format!("Dry run: would create {}", target.display()))?;
    for change in &changes {
        let marker = match change.kind {
            ChangeKind::Added => "+",
            ChangeKind::Changed => "~",
            ChangeKind::Unchanged => "=",
        };
        output.print(&format!("  {marker} {}", change.path))?;
        if let Some(file) = attribution.as_ref().and_then(|a| a.attributed_files.get(&change.path)) {
            let injected = file.injected_lines();
            let mut detail = format!("from {}", file.provenance.source_name);
            if injected > 0 {
                detail.push_str(&format!(", {injected} injected line(s)"));
            }
            output.detail(&detail)?;
        }
    }

    if let Some(attribution) = &attribution {
        if !attribution.dependencies.is_empty() {
            output.header("Dependencies")?;
            for dep in &attribution.dependencies {
                output.print(&format!("  {}@{}  ({})", dep.name, dep.version, dep.source_name))?;
            }
        }
    }

    if !commands.is_empty() {
        output.header("Commands")?;
        for command in &commands {
            output.print(&format!("  $ {command}"))?;
        }
    }
    for warning in &report.warnings {
        output.warning(warning)?;
    }
    Ok(())
}

/// The in-memory run cannot see the disk, so check the target here.
fn refuse_non_empty_target(options: &Options) -> CliResult<()> {
    let target = &options.target_dir;
    if options.force || !target.is_dir() {
        return Ok(());
    }
    let non_empty = std::fs::read_dir(target)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if non_empty {
        return Err(TrellisError::from(ApplicationError::TargetNotEmpty {
            path: target.clone(),
        })
        .into());
    }
    Ok(())
}

// ── UI helpers ────────────────────────────────────────────────────────────────

fn print_next_steps(options: &Options, output: &OutputManager) -> CliResult<()> {
    if output.is_quiet() {
        return Ok(());
    }
    let dev = format_command(&script_command(options.package_manager, &["dev"]));
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  cd {}", display_relative(&options.target_dir)))?;
    if !options.install {
        let install = format_command(&install_command(options.package_manager, None, false));
        output.print(&format!("  {install}"))?;
    }
    output.print(&format!("  {dev}"))?;
    Ok(())
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
