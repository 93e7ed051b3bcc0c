//! Values exposed to file templates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::entities::add_on::{
    AddOn, Integration, Route, populate_add_on_options_defaults,
};
use crate::domain::entities::options::{AddOnOptions, Options};
use crate::domain::value_objects::{AddOnType, PackageManager, Phase};

/// The parts of an add-on a template may read. File contents stay out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOnSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AddOnType,
    pub phase: Phase,
    pub readme: Option<String>,
}

impl From<&AddOn> for AddOnSummary {
    fn from(add_on: &AddOn) -> Self {
        Self {
            id: add_on.id.clone(),
            name: add_on.name.clone(),
            description: add_on.description.clone(),
            kind: add_on.kind,
            phase: add_on.phase,
            readme: add_on.readme.clone(),
        }
    }
}

/// Template variables derived once per run from [`Options`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateContext {
    pub package_manager: PackageManager,
    pub project_name: String,
    pub typescript: bool,
    pub tailwind: bool,
    /// `ts` or `js`.
    pub js: &'static str,
    /// `tsx` or `jsx`.
    pub jsx: &'static str,
    pub file_router: bool,
    pub code_router: bool,
    pub add_on_enabled: BTreeMap<String, bool>,
    pub add_ons: Vec<AddOnSummary>,
    pub integrations: Vec<Integration>,
    pub routes: Vec<Route>,
    /// Option values per add-on, defaults overlaid with user choices.
    pub add_on_option: AddOnOptions,
}

impl TemplateContext {
    pub fn from_options(options: &Options) -> Self {
        let chosen = &options.chosen_add_ons;

        let mut add_on_option = populate_add_on_options_defaults(chosen);
        for (id, values) in &options.add_on_options {
            add_on_option
                .entry(id.clone())
                .or_default()
                .extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Self {
            package_manager: options.package_manager,
            project_name: options.project_name.clone(),
            typescript: options.typescript,
            tailwind: options.tailwind,
            js: if options.typescript { "ts" } else { "js" },
            jsx: if options.typescript { "tsx" } else { "jsx" },
            file_router: options.mode.is_file_router(),
            code_router: options.mode.is_code_router(),
            add_on_enabled: options
                .framework
                .add_ons()
                .iter()
                .map(|a| (a.id.clone(), false))
                .chain(chosen.iter().map(|a| (a.id.clone(), true)))
                .collect(),
            add_ons: chosen.iter().map(|a| AddOnSummary::from(a.as_ref())).collect(),
            integrations: chosen
                .iter()
                .flat_map(|a| a.integrations.iter().cloned())
                .collect(),
            routes: chosen.iter().flat_map(|a| a.routes.iter().cloned()).collect(),
            add_on_option,
        }
    }
}
