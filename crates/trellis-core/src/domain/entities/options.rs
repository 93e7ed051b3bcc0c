//! The full set of choices driving one composition run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::entities::add_on::AddOn;
use crate::domain::entities::framework::Framework;
use crate::domain::value_objects::{AddOnType, Mode, PackageManager};

/// Option values keyed by add-on id, then option name.
pub type AddOnOptions = BTreeMap<String, BTreeMap<String, Value>>;

/// Everything `create_app` needs to know.
#[derive(Debug, Clone)]
pub struct Options {
    pub project_name: String,
    pub target_dir: PathBuf,
    pub framework: Arc<Framework>,
    pub mode: Mode,
    pub typescript: bool,
    pub tailwind: bool,
    pub package_manager: PackageManager,
    pub git: bool,
    pub install: bool,
    /// Overwrite a non-empty target directory.
    pub force: bool,
    /// Closure of the user's selection, already resolved.
    pub chosen_add_ons: Vec<Arc<AddOn>>,
    pub add_on_options: AddOnOptions,
    pub starter: Option<Arc<AddOn>>,
}

impl Options {
    pub fn new(
        project_name: impl Into<String>,
        target_dir: impl Into<PathBuf>,
        framework: Arc<Framework>,
    ) -> Self {
        let mode = framework.default_mode();
        Self {
            project_name: project_name.into(),
            target_dir: target_dir.into(),
            framework,
            mode,
            typescript: true,
            tailwind: false,
            package_manager: PackageManager::default(),
            git: true,
            install: true,
            force: false,
            chosen_add_ons: Vec::new(),
            add_on_options: AddOnOptions::new(),
            starter: None,
        }
    }

    pub fn is_add_on_enabled(&self, id: &str) -> bool {
        self.chosen_add_ons.iter().any(|a| a.id == id)
    }

    pub fn chosen_ids(&self) -> Vec<String> {
        self.chosen_add_ons.iter().map(|a| a.id.clone()).collect()
    }

    /// The chosen toolchain add-on, if any.
    pub fn toolchain(&self) -> Option<&Arc<AddOn>> {
        self.chosen_add_ons
            .iter()
            .find(|a| a.kind == AddOnType::Toolchain)
    }

    pub fn toolchain_is(&self, id: &str) -> bool {
        self.toolchain().is_some_and(|t| t.id == id)
    }

    /// Every add-on whose files and manifest fragments take part in the run.
    ///
    /// The starter, when present, comes last.
    pub fn contributing_add_ons(&self) -> impl Iterator<Item = &Arc<AddOn>> {
        self.chosen_add_ons.iter().chain(self.starter.iter())
    }

    /// Whether any chosen add-on asks for Tailwind.
    pub fn any_add_on_requires_tailwind(&self) -> bool {
        self.contributing_add_ons()
            .any(|a| a.tailwind == Some(true))
    }
}
