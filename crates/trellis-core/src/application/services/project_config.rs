//! Persisted project configuration.
//!
//! Written into the project root after a successful run so that a later
//! `add` can rebuild the options without asking again.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::{ApplicationError, ports::Environment},
    domain::{AddOnOptions, Mode, Options, PackageManager},
    error::TrellisResult,
};

/// File name of the persisted config inside the project root.
pub const CONFIG_FILE_NAME: &str = ".trellis.json";

/// The resolved options of a run, minus file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedConfig {
    pub version: String,
    pub project_name: String,
    pub framework: String,
    pub mode: Mode,
    pub typescript: bool,
    pub tailwind: bool,
    pub package_manager: PackageManager,
    #[serde(default)]
    pub git: bool,
    pub chosen_add_ons: Vec<String>,
    #[serde(default, skip_serializing_if = "AddOnOptions::is_empty")]
    pub add_on_options: AddOnOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starter: Option<String>,
}

impl PersistedConfig {
    pub fn from_options(options: &Options) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            project_name: options.project_name.clone(),
            framework: options.framework.id.clone(),
            mode: options.mode.clone(),
            typescript: options.typescript,
            tailwind: options.tailwind,
            package_manager: options.package_manager,
            git: options.git,
            chosen_add_ons: options.chosen_ids(),
            add_on_options: options.add_on_options.clone(),
            starter: options.starter.as_ref().map(|s| s.id.clone()),
        }
    }

    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    pub fn write(&self, env: &dyn Environment, dir: &Path) -> TrellisResult<()> {
        let path = Self::path_in(dir);
        let mut json = serde_json::to_string_pretty(self).map_err(|e| ApplicationError::ConfigFile {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        json.push('\n');
        debug!(path = %path.display(), "Writing project config");
        env.write_file(&path, &json)
    }

    pub fn read(env: &dyn Environment, dir: &Path) -> TrellisResult<Self> {
        let path = Self::path_in(dir);
        if !env.exists(&path) {
            return Err(ApplicationError::ConfigFile {
                path,
                reason: "not found".into(),
            }
            .into());
        }
        let raw = env.read_file(&path)?;
        serde_json::from_str(&raw).map_err(|e| {
            ApplicationError::ConfigFile {
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Previously chosen ids followed by `new` ids not already present.
    pub fn merged_add_on_ids(&self, new: &[String]) -> Vec<String> {
        let mut ids = self.chosen_add_ons.clone();
        for id in new {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    /// Copy the persisted choices onto freshly built options.
    pub fn apply_to(&self, options: &mut Options) {
        options.mode = self.mode.clone();
        options.typescript = self.typescript;
        options.tailwind = self.tailwind;
        options.package_manager = self.package_manager;
        options.git = self.git;
        options.add_on_options = self.add_on_options.clone();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::{AddOn, Framework};
    use crate::error::TrellisError;

    #[derive(Default)]
    struct FileMap(Mutex<BTreeMap<PathBuf, String>>);

    impl Environment for FileMap {
        fn exists(&self, path: &Path) -> bool {
            self.0.lock().unwrap().contains_key(path)
        }
        fn read_file(&self, path: &Path) -> TrellisResult<String> {
            Ok(self.0.lock().unwrap()[path].clone())
        }
        fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
            self.0.lock().unwrap().insert(path.into(), content.into());
            Ok(())
        }
        fn append_file(&self, _: &Path, _: &str) -> TrellisResult<()> {
            Ok(())
        }
        fn delete_file(&self, _: &Path) -> TrellisResult<()> {
            Ok(())
        }
        fn remove_dir_all(&self, _: &Path) -> TrellisResult<()> {
            Ok(())
        }
        fn execute(&self, _: &str, _: &[String], _: &Path) -> TrellisResult<()> {
            Ok(())
        }
        fn readdir(&self, _: &Path) -> TrellisResult<Vec<String>> {
            Ok(vec![])
        }
    }

    fn options() -> Options {
        let mut opts = Options::new("demo", "/p/demo", Arc::new(Framework::new("react", "React")));
        opts.package_manager = PackageManager::Pnpm;
        opts.chosen_add_ons = vec![Arc::new(AddOn::new("query", "Query"))];
        opts
    }

    #[test]
    fn written_config_reads_back() {
        let env = FileMap::default();
        let config = PersistedConfig::from_options(&options());
        config.write(&env, Path::new("/p/demo")).unwrap();

        let back = PersistedConfig::read(&env, Path::new("/p/demo")).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.chosen_add_ons, vec!["query"]);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let json = serde_json::to_value(PersistedConfig::from_options(&options())).unwrap();
        assert_eq!(json["packageManager"], "pnpm");
        assert_eq!(json["chosenAddOns"][0], "query");
        assert!(json.get("starter").is_none());
    }

    #[test]
    fn missing_config_is_a_config_error() {
        let err = PersistedConfig::read(&FileMap::default(), Path::new("/nowhere")).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::ConfigFile { .. })
        ));
    }

    #[test]
    fn merged_ids_keep_order_and_skip_duplicates() {
        let config = PersistedConfig::from_options(&options());
        let merged = config.merged_add_on_ids(&["store".into(), "query".into()]);
        assert_eq!(merged, vec!["query", "store"]);
    }
}
