//! The add-on descriptor and its parts.
//!
//! An [`AddOn`] is a structurally uniform record; what it does is decided by
//! its `type`/`phase` tags, not by a type hierarchy. Local (directory-scanned)
//! and remote (HTTP-fetched) add-ons deserialize into the same struct and are
//! indistinguishable downstream.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{
    AddOnType, COMPOSITION_PHASES, COMPOSITION_TYPES, Mode, Phase,
};

/// Prefix marking a file payload as base64-encoded binary content.
pub const BINARY_PREFIX: &str = "base64::";

// ── AddOn ────────────────────────────────────────────────────────────────────

/// A named, typed bundle of files, dependencies, and hooks.
///
/// Immutable once loaded. The registry owns each add-on behind an [`Arc`];
/// chosen sets share those handles instead of copying.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOn {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: AddOnType,
    #[serde(default)]
    pub phase: Phase,
    /// Also accepted as `templates`.
    #[serde(default, alias = "templates")]
    pub modes: Vec<Mode>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub priority: i64,
    /// Keyed by `./`-prefixed path relative to the add-on's `assets/` dir.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    #[serde(default)]
    pub deleted_files: Vec<String>,
    #[serde(default)]
    pub package_additions: PackageAdditions,
    /// Raw `package.json.ejs` fragment, rendered at composition time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_template: Option<String>,
    #[serde(default)]
    pub integrations: Vec<Integration>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub options: BTreeMap<String, AddOnOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tailwind: Option<bool>,
    #[serde(default)]
    pub shadcn_components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    /// Named post-install steps such as `rimraf-node-modules`.
    #[serde(default)]
    pub special_steps: Vec<String>,
}

impl AddOn {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Paths of every file this add-on contributes.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Content of one contributed file.
    pub fn file_contents(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn supports_mode(&self, mode: &Mode) -> bool {
        self.modes.iter().any(|m| m == mode)
    }

    pub fn is_single_select(&self) -> bool {
        self.kind.is_single_select()
    }

    /// Whether the add-on was fetched from a URL rather than a directory.
    pub fn is_remote(&self) -> bool {
        self.id.starts_with("http")
    }

    /// Default value of every declared option, keyed by option name.
    pub fn option_defaults(&self) -> BTreeMap<String, Value> {
        self.options
            .iter()
            .map(|(key, opt)| (key.clone(), opt.default.clone()))
            .collect()
    }
}

// ── Parts ────────────────────────────────────────────────────────────────────

/// Package manifest entries an add-on merges into `package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageAdditions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, String>,
}

impl PackageAdditions {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty() && self.scripts.is_empty()
    }
}

/// Where an integration hooks into the generated application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrationKind {
    VitePlugin,
    Provider,
    RootProvider,
    Devtools,
    Layout,
    HeaderUser,
    #[serde(other)]
    Other,
}

impl IntegrationKind {
    /// Whether injected lines of this kind land in the root route/layout.
    pub fn targets_root(self) -> bool {
        matches!(self, Self::Provider | Self::RootProvider | Self::Devtools)
    }
}

/// A code hook an add-on injects into framework templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    #[serde(rename = "type")]
    pub kind: IntegrationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A route an add-on contributes to the navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_name: Option<String>,
}

/// A user-facing option declared by an add-on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOnOption {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Value,
}

/// An abstract command invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command)?;
        for arg in self.args.iter().filter(|a| !a.is_empty()) {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ── Ordering ─────────────────────────────────────────────────────────────────

/// Chosen add-ons in composition order: type, then phase, then the order
/// they appear in `add_ons`.
///
/// Starters and hosts are not part of the layered set and are left out.
pub fn in_composition_order(add_ons: &[Arc<AddOn>]) -> Vec<&Arc<AddOn>> {
    COMPOSITION_TYPES
        .iter()
        .flat_map(|kind| {
            COMPOSITION_PHASES.iter().flat_map(move |phase| {
                add_ons
                    .iter()
                    .filter(move |a| a.kind == *kind && a.phase == *phase)
            })
        })
        .collect()
}

/// Populate default option values for every add-on that declares options.
pub fn populate_add_on_options_defaults(
    add_ons: &[Arc<AddOn>],
) -> BTreeMap<String, BTreeMap<String, Value>> {
    add_ons
        .iter()
        .filter(|a| !a.options.is_empty())
        .map(|a| (a.id.clone(), a.option_defaults()))
        .collect()
}
