//! Framework definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entities::add_on::AddOn;
use crate::domain::value_objects::Mode;

/// Display information for one supported routing mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeInfo {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub force_typescript: bool,
}

/// A framework: base project files, base manifest, and its add-on universe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Framework {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_directory: PathBuf,
    pub supported_modes: BTreeMap<String, ModeInfo>,
    pub default_mode: Option<Mode>,
    /// In discovery order.
    pub add_ons: Vec<Arc<AddOn>>,
    /// Keyed by `./`-prefixed path relative to `project/base/`.
    pub base_files: BTreeMap<String, String>,
    pub base_package_json: Value,
    /// Keyed by `typescript`, `tailwindcss`, or a mode name.
    pub optional_packages: BTreeMap<String, Value>,
}

impl Framework {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_package_json: Value::Object(Default::default()),
            ..Self::default()
        }
    }

    pub fn add_ons(&self) -> &[Arc<AddOn>] {
        &self.add_ons
    }

    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.base_files.keys().map(String::as_str)
    }

    pub fn file_contents(&self, path: &str) -> Option<&str> {
        self.base_files.get(path).map(String::as_str)
    }

    pub fn supports_mode(&self, mode: &Mode) -> bool {
        self.supported_modes.is_empty() || self.supported_modes.contains_key(mode.as_str())
    }

    pub fn mode_info(&self, mode: &Mode) -> Option<&ModeInfo> {
        self.supported_modes.get(mode.as_str())
    }

    /// The mode used when the caller does not pick one.
    pub fn default_mode(&self) -> Mode {
        if let Some(mode) = &self.default_mode {
            return mode.clone();
        }
        if self.supported_modes.contains_key(Mode::FILE_ROUTER) || self.supported_modes.is_empty()
        {
            return Mode::file_router();
        }
        self.supported_modes
            .keys()
            .next()
            .map(|m| Mode::new(m.as_str()))
            .unwrap_or_default()
    }

    /// Whether `mode` requires TypeScript regardless of user choice.
    pub fn forces_typescript(&self, mode: &Mode) -> bool {
        self.mode_info(mode).is_some_and(|m| m.force_typescript)
    }

    pub fn find_add_on(&self, id: &str) -> Option<&Arc<AddOn>> {
        self.add_ons.iter().find(|a| a.id == id)
    }
}
