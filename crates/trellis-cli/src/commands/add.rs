//! Implementation of the `trellis add` command.
//!
//! Re-composes an existing project with its persisted choices plus the new
//! add-ons, then writes only the files that differ.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use trellis_adapters::{ChangeKind, FileSyncer, HttpAddOnSource, LocalEnvironment, MemoryEnvironment};
use trellis_core::{
    application::{AddOnResolver, ApplicationError, Environment, PersistedConfig, RemoteAddOnSource},
    domain::{
        AddOn, Options, package_manager::{install_command, translate_execute_command},
        populate_add_on_options_defaults,
    },
    error::TrellisError,
};

use crate::{
    cli::{AddArgs, GlobalArgs},
    commands::{compose_service, registry, select_framework},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Execute the `trellis add` command.
#[instrument(skip_all, fields(ids = ?args.ids))]
pub fn execute(
    args: AddArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let project_dir = canonical_project_dir(&args.project_dir)?;
    let local = LocalEnvironment::new();

    let persisted = match PersistedConfig::read(&local, &project_dir) {
        Ok(persisted) => persisted,
        Err(TrellisError::Application(ApplicationError::ConfigFile { reason, .. }))
            if reason == "not found" =>
        {
            return Err(CliError::NotAProject { path: project_dir });
        }
        Err(e) => return Err(e.into()),
    };
    debug!(
        project = %persisted.project_name,
        framework = %persisted.framework,
        existing = ?persisted.chosen_add_ons,
        "Loaded project config"
    );

    let registry = registry(&global, &config, None)?;
    let framework = select_framework(&registry, Some(&persisted.framework), &config)?;

    let new_ids: Vec<String> = args
        .ids
        .iter()
        .filter(|id| !persisted.chosen_add_ons.contains(id))
        .cloned()
        .collect();
    if new_ids.is_empty() {
        output.info("All requested add-ons are already part of this project")?;
        return Ok(());
    }

    let chosen_add_ons = AddOnResolver::new(Box::new(HttpAddOnSource::new())).finalize_add_ons(
        &framework,
        &persisted.mode,
        &persisted.merged_add_on_ids(&new_ids),
    )?;
    let added: Vec<Arc<AddOn>> = chosen_add_ons
        .iter()
        .filter(|a| !persisted.chosen_add_ons.contains(&a.id))
        .cloned()
        .collect();

    let mut options = Options::new(
        persisted.project_name.clone(),
        project_dir.clone(),
        Arc::clone(&framework),
    );
    persisted.apply_to(&mut options);
    let mut add_on_options = populate_add_on_options_defaults(&chosen_add_ons);
    for (id, values) in &persisted.add_on_options {
        add_on_options.entry(id.clone()).or_default().extend(values.clone());
    }
    options.add_on_options = add_on_options;
    options.chosen_add_ons = chosen_add_ons;
    options.starter = match &persisted.starter {
        Some(url) => Some(Arc::new(HttpAddOnSource::new().load(url)?)),
        None => None,
    };
    options.tailwind = options.tailwind || options.any_add_on_requires_tailwind();
    options.force = true;
    options.git = false;
    options.install = false;

    let memory = MemoryEnvironment::new().with_directory(&project_dir);
    let report = compose_service().create_app(&options, &memory)?;
    let composed = memory.output()?;
    let syncer = FileSyncer::new();

    if args.dry_run {
        output.info(&format!(
            "Dry run: would add {} to {}",
            ids_of(&added),
            project_dir.display()
        ))?;
        for change in syncer.preview(&composed, &project_dir, &project_dir) {
            let marker = match change.kind {
                ChangeKind::Added => "+",
                ChangeKind::Changed => "~",
                ChangeKind::Unchanged => continue,
            };
            output.print(&format!("  {marker} {}", change.path))?;
        }
        for path in &composed.deleted_files {
            if path.exists() {
                output.print(&format!("  - {}", display_in(path, &project_dir)))?;
            }
        }
        return Ok(());
    }

    output.header(&format!("Adding {}...", ids_of(&added)))?;
    let sync = syncer.apply(&composed, &project_dir, &project_dir);
    for path in &composed.deleted_files {
        if local.exists(path) {
            local.delete_file(path)?;
            output.detail(&format!("- {}", display_in(path, &project_dir)))?;
        }
    }
    for file in &sync.updated {
        output.detail(&format!("~ {} (+{} -{})", file.path, file.added_lines, file.removed_lines))?;
    }
    for path in &sync.created {
        output.detail(&format!("+ {path}"))?;
    }

    for add_on in &added {
        if let Some(command) = &add_on.command {
            let command = translate_execute_command(options.package_manager, command);
            info!(add_on = %add_on.id, command = %command, "Running add-on command");
            local.execute(&command.command, &command.args, &project_dir)?;
        }
    }

    let package_changed = sync.created.iter().any(|p| p == "package.json")
        || sync.updated.iter().any(|u| u.path == "package.json");
    if package_changed && !args.no_install {
        let install = install_command(options.package_manager, None, false);
        local.execute(&install.command, &install.args, &project_dir)?;
    }

    if let Some(first) = sync.errors.first() {
        return Err(CliError::SyncFailed {
            count: sync.errors.len(),
            first: first.clone(),
        });
    }

    for warning in &report.warnings {
        output.warning(warning)?;
    }
    output.success(&format!(
        "Added {} ({} updated, {} created)",
        ids_of(&added),
        sync.updated.len(),
        sync.created.len()
    ))?;
    Ok(())
}

fn canonical_project_dir(dir: &Path) -> CliResult<PathBuf> {
    if !dir.is_dir() {
        return Err(CliError::NotAProject {
            path: dir.to_path_buf(),
        });
    }
    dir.canonicalize()
        .with_cli_context(|| format!("cannot resolve {}", dir.display()))
}

fn ids_of(add_ons: &[Arc<AddOn>]) -> String {
    add_ons
        .iter()
        .map(|a| a.id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_in(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
