//! Package-manager command translation.
//!
//! Pure mappings from an abstract intent (run a script, execute a package,
//! install a dependency) to the concrete invocation for one manager, plus the
//! reverse: parsing an already-concrete execute invocation so it can be
//! re-targeted at another manager.

use crate::domain::entities::CommandSpec;
use crate::domain::value_objects::PackageManager;

/// Environment variable package managers set for child processes.
pub const USER_AGENT_VAR: &str = "npm_config_user_agent";

/// Run a `package.json` script.
pub fn script_command(pm: PackageManager, args: &[&str]) -> CommandSpec {
    let prefix: &[&str] = match pm {
        PackageManager::Yarn => &["run"],
        PackageManager::Pnpm => &[],
        PackageManager::Bun => &["--bun", "run"],
        PackageManager::Deno => &["task"],
        PackageManager::Npm => &["run"],
    };
    CommandSpec::new(pm.as_str(), prefix.iter().chain(args).copied())
}

/// Execute a package binary without installing it.
pub fn execute_command(pm: PackageManager, pkg: &str, args: &[&str]) -> CommandSpec {
    let (command, mut full): (&str, Vec<String>) = match pm {
        PackageManager::Yarn => ("yarn", vec!["dlx".into(), pkg.into()]),
        PackageManager::Pnpm => ("pnpm", vec!["dlx".into(), pkg.into()]),
        PackageManager::Bun => ("bunx", vec!["--bun".into(), pkg.into()]),
        PackageManager::Deno => ("deno", vec!["run".into(), format!("npm:{pkg}")]),
        PackageManager::Npm => ("npx", vec!["-y".into(), pkg.into()]),
    };
    full.extend(args.iter().map(|a| (*a).to_string()));
    CommandSpec::new(command, full)
}

/// Install all dependencies, or add one package.
pub fn install_command(pm: PackageManager, pkg: Option<&str>, dev: bool) -> CommandSpec {
    let Some(pkg) = pkg else {
        return CommandSpec::new(pm.as_str(), ["install"]);
    };

    let mut args = match pm {
        PackageManager::Yarn | PackageManager::Pnpm => vec!["add", pkg],
        _ => vec!["install", pkg],
    };
    if dev {
        args.push(match pm {
            PackageManager::Yarn | PackageManager::Pnpm => "--dev",
            _ => "-D",
        });
    }
    CommandSpec::new(pm.as_str(), args)
}

/// Re-target an execute-style invocation at `pm`.
///
/// Recognizes `npx [-y]`, `pnpx`, `bunx [--bun]`, `pnpm dlx`, `yarn dlx`, and
/// `deno run npm:<pkg>`. Anything else is returned unchanged.
pub fn translate_execute_command(pm: PackageManager, command: &CommandSpec) -> CommandSpec {
    match parse_execute_command(&command.command, &command.args) {
        Some((pkg, rest)) => {
            let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
            execute_command(pm, pkg, &rest)
        }
        None => command.clone(),
    }
}

fn parse_execute_command<'a>(command: &str, args: &'a [String]) -> Option<(&'a str, &'a [String])> {
    let first = args.first().map(String::as_str);

    let tail: &'a [String] = match command {
        "npx" if first == Some("-y") => &args[1..],
        "npx" | "pnpx" => args,
        "bunx" if first == Some("--bun") => &args[1..],
        "bunx" => args,
        "pnpm" | "yarn" if first == Some("dlx") => &args[1..],
        "deno" if first == Some("run") => {
            let pkg = args.get(1)?.strip_prefix("npm:")?;
            if pkg.is_empty() {
                return None;
            }
            return Some((pkg, &args[2..]));
        }
        _ => return None,
    };

    let (pkg, rest) = tail.split_first()?;
    Some((pkg.as_str(), rest))
}

/// Render a command for display, dropping empty arguments.
pub fn format_command(command: &CommandSpec) -> String {
    command.to_string()
}

/// Detect the manager from an `npm_config_user_agent` value.
///
/// Unset means npm. A set but unrecognized agent yields `None`.
pub fn detect_from_user_agent(user_agent: Option<&str>) -> Option<PackageManager> {
    match user_agent {
        None => Some(PackageManager::Npm),
        Some(agent) => PackageManager::ALL
            .into_iter()
            .find(|pm| agent.starts_with(pm.as_str())),
    }
}
