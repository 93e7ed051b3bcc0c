//! Implementation of the `trellis list` command.

use std::collections::BTreeMap;

use owo_colors::OwoColorize;
use serde::Serialize;

use trellis_core::{
    application::AddOnResolver,
    domain::{AddOnStatus, add_on_status},
};

use crate::{
    cli::{ListArgs, ListFormat, OutputFormat, global::GlobalArgs},
    commands::{registry, select_framework, select_mode},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

#[derive(Serialize)]
struct FrameworkRow<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    modes: Vec<&'a str>,
}

#[derive(Serialize)]
struct AddOnRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: String,
    description: &'a str,
    depends_on: &'a [String],
    status: AddOnStatus,
}

pub fn execute(
    args: ListArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let registry = registry(&global, &config, None)?;
    let format = if output.format() == OutputFormat::Json {
        ListFormat::Json
    } else {
        args.format
    };

    if args.frameworks {
        let rows: Vec<FrameworkRow<'_>> = registry
            .list()
            .iter()
            .map(|f| FrameworkRow {
                id: &f.id,
                name: &f.name,
                description: &f.description,
                modes: f.supported_modes.keys().map(String::as_str).collect(),
            })
            .collect();

        match format {
            ListFormat::Json => output.json(&rows)?,
            ListFormat::List => {
                for row in &rows {
                    output.print(row.id)?;
                }
            }
            ListFormat::Table => {
                output.header("Available frameworks:")?;
                for row in &rows {
                    output.print(&format!(
                        "  {:<12} {:<16} {}",
                        row.id,
                        row.name,
                        row.modes.join(", ")
                    ))?;
                }
            }
        }
        return Ok(());
    }

    let framework = select_framework(&registry, args.framework.as_deref(), &config)?;
    let mode = select_mode(&framework, args.mode.as_deref(), &config)?;
    let available = AddOnResolver::local_only().list_add_ons(&framework, &mode);
    let status = add_on_status(&available, &args.chosen, &[]);

    let rows: Vec<AddOnRow<'_>> = available
        .iter()
        .filter_map(|a| {
            Some(AddOnRow {
                id: &a.id,
                name: &a.name,
                kind: a.kind.to_string(),
                description: &a.description,
                depends_on: &a.depends_on,
                status: *status.get(&a.id)?,
            })
        })
        .collect();

    match format {
        ListFormat::Json => output.json(&rows)?,
        ListFormat::List => {
            for row in &rows {
                output.print(row.id)?;
            }
        }
        ListFormat::Table => {
            output.header(&format!("Add-ons for {} ({mode}):", framework.name))?;
            let width = rows.iter().map(|r| r.id.len()).max().unwrap_or(0);
            for (kind, group) in group_by_kind(&rows) {
                output.print(&format!("  {kind}"))?;
                for row in group {
                    let symbol = marker(&row.status);
                    let symbol = if output.supports_color() && row.status.selected {
                        symbol.green().to_string()
                    } else {
                        symbol.to_string()
                    };
                    output.print(&format!(
                        "    {symbol} {:<width$}  {}",
                        row.id,
                        row.description
                    ))?;
                }
            }
        }
    }

    Ok(())
}

fn group_by_kind<'r, 'a>(rows: &'r [AddOnRow<'a>]) -> BTreeMap<&'r str, Vec<&'r AddOnRow<'a>>> {
    let mut groups: BTreeMap<&str, Vec<&AddOnRow<'_>>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.kind.as_str()).or_default().push(row);
    }
    groups
}

/// `[x]` selected, `[*]` selected and required by another, `[-]` disabled.
fn marker(status: &AddOnStatus) -> &'static str {
    match (status.selected, status.depended_upon, status.enabled) {
        (true, true, _) => "[*]",
        (true, false, _) => "[x]",
        (false, _, false) => "[-]",
        (false, _, true) => "[ ]",
    }
}
