//! Compose Service - materializes resolved options into a project tree.
//!
//! The run is a fixed sequence against an [`Environment`]:
//! 1. Check the target directory
//! 2. Write framework base files (rendering `.ejs` sources)
//! 3. Assemble `package.json`
//! 4. Apply add-ons in `type × phase` order, then the starter
//! 5. Install shadcn components, init git, persist the project config
//! 6. Install dependencies, run special steps and toolchain fixups
//!
//! Every write goes through the environment, so the same run can target the
//! real disk or an in-memory recording for dry-run.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, field, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{CodeFormatter, Environment, RenderOutcome, TemplateRenderer},
        services::project_config::PersistedConfig,
    },
    domain::{
        AddOn, BINARY_PREFIX, CommandSpec, Framework, Options, PackageManager, RelativePath,
        TemplateContext, in_composition_order,
        package_json::{self, PackageJsonBuilder, TAILWIND_PACKAGES, TYPESCRIPT_PACKAGES},
        package_manager::{execute_command, install_command, script_command, translate_execute_command},
        paths,
    },
    error::TrellisResult,
};

const SHADCN_ADD_ON: &str = "shadcn";
const SHADCN_PACKAGE: &str = "shadcn@latest";
const PACKAGE_JSON: &str = "package.json";
const NODE_MODULES: &str = "node_modules";
const POST_INIT_SCRIPT: &str = "post-init";

/// What a finished run reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateReport {
    pub run_id: Uuid,
    /// Add-on warnings and non-fatal step failures, in the order they arose.
    pub warnings: Vec<String>,
}

/// File composition pipeline.
pub struct ComposeService {
    renderer: Box<dyn TemplateRenderer>,
    formatter: Box<dyn CodeFormatter>,
}

impl ComposeService {
    pub fn new(renderer: Box<dyn TemplateRenderer>, formatter: Box<dyn CodeFormatter>) -> Self {
        Self {
            renderer,
            formatter,
        }
    }

    /// Create the project described by `options` inside `env`.
    ///
    /// Target checks happen before any write. A render error aborts the run
    /// and names the offending file.
    #[instrument(
        skip_all,
        fields(
            project = %options.project_name,
            framework = %options.framework.id,
            mode = %options.mode,
            run_id = field::Empty
        )
    )]
    pub fn create_app(&self, options: &Options, env: &dyn Environment) -> TrellisResult<CreateReport> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", field::display(run_id));
        info!(
            add_ons = options.chosen_add_ons.len(),
            typescript = options.typescript,
            "Creating application"
        );

        self.check_target(options, env)?;

        let context = TemplateContext::from_options(options);
        let mut warnings = Vec::new();

        env.start_step("base", "Copying framework files");
        for file in options.framework.file_paths() {
            let content = options.framework.file_contents(file).unwrap_or_default();
            self.template_file(file, content, options, &context, env)?;
        }
        env.finish_step("base", "Framework files copied");

        self.write_package_json(options, &context, env)?;

        env.start_step("add-ons", "Applying add-ons");
        for add_on in in_composition_order(&options.chosen_add_ons) {
            self.apply_add_on(add_on, options, &context, env)?;
        }
        env.finish_step("add-ons", "Add-ons applied");

        if let Some(starter) = &options.starter {
            env.start_step("starter", &format!("Applying starter {}", starter.name));
            self.apply_add_on(starter, options, &context, env)?;
            env.finish_step("starter", "Starter applied");
        }

        self.install_shadcn_components(options, env)?;

        if options.git {
            env.start_step("git", "Initializing git repository");
            env.execute("git", &["init".to_string()], &options.target_dir)?;
            env.finish_step("git", "Git repository initialized");
        }

        PersistedConfig::from_options(options).write(env, &options.target_dir)?;

        if options.install {
            env.start_step("install", &format!("Installing dependencies via {}", options.package_manager));
            self.run_command(&install_command(options.package_manager, None, false), options, env)?;
            env.finish_step("install", "Dependencies installed");

            self.run_special_steps(options, env, &mut warnings)?;
            self.run_toolchain_fixups(options, env)?;
        }

        for add_on in options.contributing_add_ons() {
            if let Some(text) = &add_on.warning {
                warnings.push(format!("{}: {text}", add_on.name));
            }
        }
        for warning in &warnings {
            env.warn("Warning", warning);
        }

        info!(warnings = warnings.len(), "Application created");
        Ok(CreateReport { run_id, warnings })
    }

    /// Apply one add-on to an existing project: files, deletions, command.
    #[instrument(skip_all, fields(add_on = %add_on.id))]
    pub fn run_add_on(&self, add_on: &AddOn, options: &Options, env: &dyn Environment) -> TrellisResult<()> {
        let context = TemplateContext::from_options(options);
        self.apply_add_on(add_on, options, &context, env)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn check_target(&self, options: &Options, env: &dyn Environment) -> TrellisResult<()> {
        let target = &options.target_dir;

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !env.exists(parent) {
                return Err(ApplicationError::TargetParentMissing {
                    path: parent.to_path_buf(),
                }
                .into());
            }
        }

        if env.exists(target) && !options.force && !env.readdir(target)?.is_empty() {
            return Err(ApplicationError::TargetNotEmpty {
                path: target.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn apply_add_on(
        &self,
        add_on: &AddOn,
        options: &Options,
        context: &TemplateContext,
        env: &dyn Environment,
    ) -> TrellisResult<()> {
        debug!(add_on = %add_on.id, files = add_on.files.len(), "Applying add-on");

        for file in add_on.file_paths() {
            let content = add_on.file_contents(file).unwrap_or_default();
            self.template_file(file, content, options, context, env)?;
        }

        for deleted in &add_on.deleted_files {
            let target = paths::target_path(deleted, options.typescript);
            let relative = RelativePath::try_new(&target.path)?;
            env.delete_file(&relative.under(&options.target_dir))?;
        }

        if let Some(command) = &add_on.command {
            let translated = translate_execute_command(options.package_manager, command);
            env.start_step(&add_on.id, &format!("Running {translated}"));
            self.run_command(&translated, options, env)?;
            env.finish_step(&add_on.id, &format!("{} set up", add_on.name));
        }
        Ok(())
    }

    /// Render (when needed), format and write one source file.
    fn template_file(
        &self,
        file: &str,
        content: &str,
        options: &Options,
        context: &TemplateContext,
        env: &dyn Environment,
    ) -> TrellisResult<()> {
        let binary = content.starts_with(BINARY_PREFIX);

        let rendered = if !binary && paths::is_template(file) {
            match self.renderer.render(file, content, context)? {
                RenderOutcome::Rendered(text) => text,
                RenderOutcome::Skipped => {
                    debug!(file, "Template skipped itself");
                    return Ok(());
                }
            }
        } else {
            content.to_string()
        };

        let target = paths::target_path(file, options.typescript);
        let typed_path = paths::target_path(file, true).path;
        let output = if !binary && paths::is_formattable(&typed_path) {
            self.formatter.format(&typed_path, &rendered)?
        } else {
            rendered
        };

        let destination = RelativePath::try_new(&target.path)?.under(&options.target_dir);
        if target.append {
            env.append_file(&destination, &output)
        } else {
            env.write_file(&destination, &output)
        }
    }

    fn write_package_json(
        &self,
        options: &Options,
        context: &TemplateContext,
        env: &dyn Environment,
    ) -> TrellisResult<()> {
        let framework = &options.framework;

        let mut builder = PackageJsonBuilder::new(&framework.base_package_json)
            .name(&options.project_name)
            .layer(optional_block(framework, options.typescript, TYPESCRIPT_PACKAGES))
            .layer(optional_block(framework, options.tailwind, TAILWIND_PACKAGES))
            .layer(framework.optional_packages.get(options.mode.as_str()));

        for add_on in in_composition_order(&options.chosen_add_ons)
            .into_iter()
            .chain(options.starter.iter())
        {
            if !add_on.package_additions.is_empty() {
                builder = builder.layer(Some(&package_json::additions_value(&add_on.package_additions)));
            }
            if let Some(template) = &add_on.package_template {
                builder = builder.layer(self.render_package_template(add_on, template, context)?.as_ref());
            }
        }

        let manifest = package_json::to_pretty_string(&builder.build());
        env.write_file(&options.target_dir.join(PACKAGE_JSON), &manifest)
    }

    fn render_package_template(
        &self,
        add_on: &AddOn,
        template: &str,
        context: &TemplateContext,
    ) -> TrellisResult<Option<Value>> {
        let file = format!("{}/{PACKAGE_JSON}{}", add_on.id, paths::TEMPLATE_SUFFIX);
        let text = match self.renderer.render(&file, template, context)? {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Skipped => return Ok(None),
        };
        let value = serde_json::from_str(&text).map_err(|e| ApplicationError::TemplateRendering {
            path: file.into(),
            cause: format!("rendered manifest is not valid JSON: {e}"),
        })?;
        Ok(Some(value))
    }

    fn install_shadcn_components(&self, options: &Options, env: &dyn Environment) -> TrellisResult<()> {
        if !options.is_add_on_enabled(SHADCN_ADD_ON) {
            return Ok(());
        }

        let mut seen = BTreeSet::new();
        let components: Vec<&str> = options
            .contributing_add_ons()
            .flat_map(|a| a.shadcn_components.iter())
            .filter(|c| seen.insert(c.as_str()))
            .map(String::as_str)
            .collect();
        if components.is_empty() {
            return Ok(());
        }

        let mut args = vec!["add", "--silent", "--yes"];
        args.extend(&components);
        env.start_step("shadcn", "Installing shadcn components");
        self.run_command(&execute_command(options.package_manager, SHADCN_PACKAGE, &args), options, env)?;
        env.finish_step("shadcn", &format!("Installed {} shadcn components", components.len()));
        Ok(())
    }

    fn run_special_steps(
        &self,
        options: &Options,
        env: &dyn Environment,
        warnings: &mut Vec<String>,
    ) -> TrellisResult<()> {
        let mut seen = BTreeSet::new();
        let steps: Vec<&str> = options
            .contributing_add_ons()
            .flat_map(|a| a.special_steps.iter())
            .filter(|s| seen.insert(s.as_str()))
            .map(String::as_str)
            .collect();

        for step in steps {
            match step {
                "rimraf-node-modules" => {
                    env.start_step(step, "Reinstalling dependencies");
                    env.remove_dir_all(&options.target_dir.join(NODE_MODULES))?;
                    self.run_command(&install_command(options.package_manager, None, false), options, env)?;
                    env.finish_step(step, "Dependencies reinstalled");
                }
                "post-init-script" => {
                    if let Some(warning) = self.run_post_init_script(options, env)? {
                        warnings.push(warning);
                    }
                }
                unknown => {
                    warn!(step = unknown, "Unknown special step");
                    warnings.push(format!("Unknown special step: {unknown}"));
                }
            }
        }
        Ok(())
    }

    /// Returns a warning instead of failing when the script itself fails.
    fn run_post_init_script(&self, options: &Options, env: &dyn Environment) -> TrellisResult<Option<String>> {
        let manifest_path = options.target_dir.join(PACKAGE_JSON);
        if !env.exists(&manifest_path) {
            return Ok(Some("No package.json found, skipping post-init script".into()));
        }

        let manifest: Value = serde_json::from_str(&env.read_file(&manifest_path)?).map_err(|e| {
            ApplicationError::FilesystemError {
                path: manifest_path.clone(),
                reason: format!("invalid JSON: {e}"),
            }
        })?;
        if manifest.pointer("/scripts/post-init").is_none() {
            return Ok(None);
        }

        env.start_step("post-init", "Running post-init script");
        let command = script_command(options.package_manager, &[POST_INIT_SCRIPT]);
        match self.run_command(&command, options, env) {
            Ok(()) => {
                env.finish_step("post-init", "Post-init script finished");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Post-init script failed");
                Ok(Some(format!("Post-init script failed: {e}")))
            }
        }
    }

    fn run_toolchain_fixups(&self, options: &Options, env: &dyn Environment) -> TrellisResult<()> {
        let pm = options.package_manager;
        let command = if options.toolchain_is("biome") {
            match pm {
                PackageManager::Pnpm => script_command(pm, &["check", "--fix"]),
                _ => script_command(pm, &["check", "--", "--fix"]),
            }
        } else if options.toolchain_is("eslint") {
            script_command(pm, &["check"])
        } else {
            return Ok(());
        };

        env.start_step("toolchain", "Applying toolchain fixes");
        self.run_command(&command, options, env)?;
        env.finish_step("toolchain", "Toolchain fixes applied");
        Ok(())
    }

    fn run_command(&self, command: &CommandSpec, options: &Options, env: &dyn Environment) -> TrellisResult<()> {
        debug!(%command, "Executing");
        env.execute(&command.command, &command.args, &options.target_dir)
    }
}

fn optional_block<'a>(framework: &'a Framework, enabled: bool, key: &str) -> Option<&'a Value> {
    if enabled {
        framework.optional_packages.get(key)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::{AddOnType, Phase};
    use crate::error::TrellisError;

    // ── Test doubles ───────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingEnv {
        dirs: Mutex<BTreeSet<PathBuf>>,
        files: Mutex<BTreeMap<PathBuf, String>>,
        commands: Mutex<Vec<String>>,
        warnings: Mutex<Vec<String>>,
        fail_commands: Vec<String>,
    }

    impl RecordingEnv {
        fn with_dir(dir: &str) -> Self {
            let env = Self::default();
            env.dirs.lock().unwrap().insert(PathBuf::from(dir));
            env
        }

        fn file(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }

        fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl Environment for RecordingEnv {
        fn exists(&self, path: &Path) -> bool {
            self.dirs.lock().unwrap().contains(path)
                || self.files.lock().unwrap().keys().any(|f| f.starts_with(path))
        }

        fn read_file(&self, path: &Path) -> TrellisResult<String> {
            self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
                ApplicationError::FilesystemError {
                    path: path.into(),
                    reason: "missing".into(),
                }
                .into()
            })
        }

        fn write_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
            self.files.lock().unwrap().insert(path.into(), content.into());
            Ok(())
        }

        fn append_file(&self, path: &Path, content: &str) -> TrellisResult<()> {
            self.files
                .lock()
                .unwrap()
                .entry(path.into())
                .or_default()
                .push_str(content);
            Ok(())
        }

        fn delete_file(&self, path: &Path) -> TrellisResult<()> {
            self.files.lock().unwrap().remove(path);
            Ok(())
        }

        fn remove_dir_all(&self, path: &Path) -> TrellisResult<()> {
            self.files.lock().unwrap().retain(|f, _| !f.starts_with(path));
            Ok(())
        }

        fn execute(&self, command: &str, args: &[String], _cwd: &Path) -> TrellisResult<()> {
            let line = std::iter::once(command.to_string())
                .chain(args.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ");
            self.commands.lock().unwrap().push(line.clone());
            if self.fail_commands.contains(&line) {
                return Err(ApplicationError::CommandFailed {
                    command: line,
                    reason: "exit status 1".into(),
                }
                .into());
            }
            Ok(())
        }

        fn readdir(&self, path: &Path) -> TrellisResult<Vec<String>> {
            let files = self.files.lock().unwrap();
            let mut names: Vec<String> = files
                .keys()
                .filter_map(|f| f.strip_prefix(path).ok())
                .filter_map(|rest| rest.components().next())
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            names.dedup();
            Ok(names)
        }

        fn warn(&self, _title: &str, message: &str) {
            self.warnings.lock().unwrap().push(message.into());
        }
    }

    /// Treats content as literal; `SKIP` skips, `BOOM` fails.
    struct MarkerRenderer;

    impl TemplateRenderer for MarkerRenderer {
        fn render(&self, file: &str, content: &str, ctx: &TemplateContext) -> TrellisResult<RenderOutcome> {
            if content.contains("SKIP") {
                return Ok(RenderOutcome::Skipped);
            }
            if content.contains("BOOM") {
                return Err(ApplicationError::TemplateRendering {
                    path: file.into(),
                    cause: "boom".into(),
                }
                .into());
            }
            Ok(RenderOutcome::Rendered(content.replace("{{ project_name }}", &ctx.project_name)))
        }
    }

    struct UpperFormatter;

    impl CodeFormatter for UpperFormatter {
        fn format(&self, _path: &str, content: &str) -> TrellisResult<String> {
            Ok(content.to_uppercase())
        }
    }

    fn service() -> ComposeService {
        ComposeService::new(Box::new(MarkerRenderer), Box::new(UpperFormatter))
    }

    fn options(base: &[(&str, &str)], add_ons: Vec<AddOn>) -> Options {
        let mut fw = Framework::new("react", "React");
        fw.base_files = base.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let mut opts = Options::new("demo", "/work/demo", Arc::new(fw));
        opts.git = false;
        opts.install = false;
        opts.chosen_add_ons = add_ons.into_iter().map(Arc::new).collect();
        opts
    }

    fn add_on_with_file(id: &str, phase: Phase, path: &str, content: &str) -> AddOn {
        let mut a = AddOn::new(id, id);
        a.phase = phase;
        a.files.insert(path.into(), content.into());
        a
    }

    // ── Composition ────────────────────────────────────────────────────────

    #[test]
    fn base_files_are_copied_and_rendered() {
        let env = RecordingEnv::with_dir("/work");
        let opts = options(&[("./src/test.txt", "Hello"), ("./README.md.ejs", "# {{ project_name }}")], vec![]);

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/test.txt").as_deref(), Some("Hello"));
        assert_eq!(env.file("/work/demo/README.md").as_deref(), Some("# demo"));
        assert!(env.file("/work/demo/package.json").is_some());
        assert!(env.file("/work/demo/.trellis.json").is_some());
    }

    #[test]
    fn typescript_outputs_are_formatted() {
        let env = RecordingEnv::with_dir("/work");
        let opts = options(&[("./src/main.tsx.ejs", "main"), ("./src/styles.css", "body")], vec![]);

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/main.tsx").as_deref(), Some("MAIN"));
        assert_eq!(env.file("/work/demo/src/styles.css").as_deref(), Some("body"));
    }

    #[test]
    fn javascript_mode_renames_but_still_formats() {
        let env = RecordingEnv::with_dir("/work");
        let mut opts = options(&[("./src/main.tsx.ejs", "main")], vec![]);
        opts.typescript = false;

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/main.jsx").as_deref(), Some("MAIN"));
        assert!(env.file("/work/demo/src/main.tsx").is_none());
    }

    #[test]
    fn later_phase_wins_on_collision() {
        let env = RecordingEnv::with_dir("/work");
        let example = add_on_with_file("b", Phase::Example, "./src/foo.txt", "from b");
        let setup = add_on_with_file("a", Phase::Setup, "./src/foo.txt", "from a");
        let opts = options(&[], vec![example, setup]);

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/foo.txt").as_deref(), Some("from b"));
    }

    #[test]
    fn deleted_files_are_removed_after_base_copy() {
        let env = RecordingEnv::with_dir("/work");
        let mut remover = AddOn::new("no-css", "No CSS");
        remover.deleted_files.push("./src/App.css".into());
        let opts = options(&[("./src/App.css", "h1 {}")], vec![remover]);

        service().create_app(&opts, &env).unwrap();

        assert!(env.file("/work/demo/src/App.css").is_none());
    }

    #[test]
    fn skipped_template_is_not_written() {
        let env = RecordingEnv::with_dir("/work");
        let opts = options(&[("./src/optional.ts.ejs", "SKIP"), ("./src/kept.txt", "kept")], vec![]);

        service().create_app(&opts, &env).unwrap();

        assert!(env.file("/work/demo/src/optional.ts").is_none());
        assert!(env.file("/work/demo/src/kept.txt").is_some());
    }

    #[test]
    fn render_error_aborts_with_file_name() {
        let env = RecordingEnv::with_dir("/work");
        let opts = options(&[("./src/broken.tsx.ejs", "BOOM")], vec![]);

        let err = service().create_app(&opts, &env).unwrap_err();

        match err {
            TrellisError::Application(ApplicationError::TemplateRendering { path, .. }) => {
                assert_eq!(path, PathBuf::from("./src/broken.tsx.ejs"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(env.file("/work/demo/.trellis.json").is_none());
    }

    #[test]
    fn binary_content_passes_through_untouched() {
        let env = RecordingEnv::with_dir("/work");
        let opts = options(&[("./public/logo.png", "base64::iVBORw0KGgo=")], vec![]);

        service().create_app(&opts, &env).unwrap();

        assert_eq!(
            env.file("/work/demo/public/logo.png").as_deref(),
            Some("base64::iVBORw0KGgo=")
        );
    }

    #[test]
    fn append_files_extend_existing_content() {
        let env = RecordingEnv::with_dir("/work");
        let appender = add_on_with_file("env", Phase::AddOn, "./_dot_env.append", "B=2\n");
        let opts = options(&[("./_dot_env", "A=1\n")], vec![appender]);

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/.env").as_deref(), Some("A=1\nB=2\n"));
    }

    // ── Target checks ──────────────────────────────────────────────────────

    #[test]
    fn missing_parent_fails_before_writes() {
        let env = RecordingEnv::default();
        let opts = options(&[("./a.txt", "a")], vec![]);

        let err = service().create_app(&opts, &env).unwrap_err();

        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::TargetParentMissing { .. })
        ));
        assert!(env.files.lock().unwrap().is_empty());
    }

    #[test]
    fn non_empty_target_requires_force() {
        let env = RecordingEnv::with_dir("/work");
        env.write_file(Path::new("/work/demo/existing.txt"), "x").unwrap();
        let mut opts = options(&[("./a.txt", "a")], vec![]);

        assert!(matches!(
            service().create_app(&opts, &env).unwrap_err(),
            TrellisError::Application(ApplicationError::TargetNotEmpty { .. })
        ));

        opts.force = true;
        service().create_app(&opts, &env).unwrap();
        assert_eq!(env.file("/work/demo/a.txt").as_deref(), Some("a"));
    }

    // ── Manifest ───────────────────────────────────────────────────────────

    #[test]
    fn package_json_layers_optional_blocks_and_additions() {
        let env = RecordingEnv::with_dir("/work");
        let mut query = AddOn::new("query", "Query");
        query
            .package_additions
            .dependencies
            .insert("@tanstack/react-query".into(), "^5.0.0".into());
        let mut opts = options(&[], vec![query]);
        let fw = Arc::make_mut(&mut opts.framework);
        fw.base_package_json = serde_json::json!({"name": "base", "dependencies": {"react": "^19"}});
        fw.optional_packages.insert(
            TYPESCRIPT_PACKAGES.into(),
            serde_json::json!({"devDependencies": {"typescript": "^5"}}),
        );
        fw.optional_packages.insert(
            TAILWIND_PACKAGES.into(),
            serde_json::json!({"dependencies": {"tailwindcss": "^4"}}),
        );

        service().create_app(&opts, &env).unwrap();

        let manifest: Value =
            serde_json::from_str(&env.file("/work/demo/package.json").unwrap()).unwrap();
        assert_eq!(manifest["name"], "demo");
        assert_eq!(manifest["dependencies"]["react"], "^19");
        assert_eq!(manifest["dependencies"]["@tanstack/react-query"], "^5.0.0");
        assert_eq!(manifest["devDependencies"]["typescript"], "^5");
        assert!(manifest["dependencies"].get("tailwindcss").is_none());
    }

    #[test]
    fn invalid_rendered_manifest_is_a_render_error() {
        let env = RecordingEnv::with_dir("/work");
        let mut db = AddOn::new("db", "DB");
        db.package_template = Some("{ not json".into());
        let opts = options(&[], vec![db]);

        let err = service().create_app(&opts, &env).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::TemplateRendering { .. })
        ));
    }

    // ── Commands ───────────────────────────────────────────────────────────

    #[test]
    fn commands_follow_the_fixed_order() {
        let env = RecordingEnv::with_dir("/work");
        let mut shadcn = AddOn::new("shadcn", "shadcn/ui");
        shadcn.shadcn_components = vec!["button".into(), "input".into()];
        let mut biome = AddOn::new("biome", "Biome");
        biome.kind = AddOnType::Toolchain;
        let mut cmd = AddOn::new("convex", "Convex");
        cmd.command = Some(CommandSpec::new("npx", ["-y", "convex", "init"]));

        let mut opts = options(&[], vec![shadcn, biome, cmd]);
        opts.git = true;
        opts.install = true;
        opts.package_manager = PackageManager::Pnpm;

        service().create_app(&opts, &env).unwrap();

        assert_eq!(
            env.commands(),
            vec![
                "pnpm dlx convex init",
                "pnpm dlx shadcn@latest add --silent --yes button input",
                "git init",
                "pnpm install",
                "pnpm check --fix",
            ]
        );
    }

    #[test]
    fn no_install_skips_install_and_fixups() {
        let env = RecordingEnv::with_dir("/work");
        let mut eslint = AddOn::new("eslint", "ESLint");
        eslint.kind = AddOnType::Toolchain;
        let opts = options(&[], vec![eslint]);

        service().create_app(&opts, &env).unwrap();

        assert!(env.commands().is_empty());
    }

    #[test]
    fn failing_add_on_command_propagates() {
        let env = RecordingEnv {
            fail_commands: vec!["npx -y broken".into()],
            ..RecordingEnv::with_dir("/work")
        };
        let mut broken = AddOn::new("broken", "Broken");
        broken.command = Some(CommandSpec::new("npx", ["broken"]));
        let opts = options(&[], vec![broken]);

        let err = service().create_app(&opts, &env).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::CommandFailed { .. })
        ));
    }

    #[test]
    fn special_steps_run_after_install() {
        let env = RecordingEnv::with_dir("/work");
        let mut a = AddOn::new("a", "A");
        a.special_steps = vec!["rimraf-node-modules".into(), "mystery".into()];
        a.package_additions
            .scripts
            .insert("post-init".into(), "node setup.js".into());
        let mut b = AddOn::new("b", "B");
        b.special_steps = vec!["post-init-script".into(), "rimraf-node-modules".into()];
        let mut opts = options(&[], vec![a, b]);
        opts.install = true;

        let report = service().create_app(&opts, &env).unwrap();

        assert_eq!(
            env.commands(),
            vec!["npm install", "npm install", "npm run post-init"]
        );
        assert_eq!(report.warnings, vec!["Unknown special step: mystery"]);
    }

    #[test]
    fn failing_post_init_script_becomes_a_warning() {
        let env = RecordingEnv {
            fail_commands: vec!["npm run post-init".into()],
            ..RecordingEnv::with_dir("/work")
        };
        let mut a = AddOn::new("a", "A");
        a.special_steps = vec!["post-init-script".into()];
        a.package_additions
            .scripts
            .insert("post-init".into(), "exit 1".into());
        let mut opts = options(&[], vec![a]);
        opts.install = true;

        let report = service().create_app(&opts, &env).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Post-init script failed"));
    }

    #[test]
    fn add_on_warnings_are_reported_once() {
        let env = RecordingEnv::with_dir("/work");
        let mut clerk = AddOn::new("clerk", "Clerk");
        clerk.warning = Some("Set CLERK_PUBLISHABLE_KEY".into());
        let opts = options(&[], vec![clerk]);

        let report = service().create_app(&opts, &env).unwrap();

        assert_eq!(report.warnings, vec!["Clerk: Set CLERK_PUBLISHABLE_KEY"]);
        assert_eq!(env.warnings.lock().unwrap().len(), 1);
    }

    #[test]
    fn starter_is_applied_after_add_ons() {
        let env = RecordingEnv::with_dir("/work");
        let add_on = add_on_with_file("a", Phase::Example, "./src/App.tsx", "add-on");
        let mut opts = options(&[], vec![add_on]);
        let mut starter = add_on_with_file("starter", Phase::Setup, "./src/App.tsx", "starter");
        starter.kind = AddOnType::Starter;
        opts.starter = Some(Arc::new(starter));

        service().create_app(&opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/App.tsx").as_deref(), Some("STARTER"));
    }

    #[test]
    fn run_add_on_applies_a_single_add_on() {
        let env = RecordingEnv::with_dir("/work/demo");
        let opts = options(&[], vec![]);
        let add_on = add_on_with_file("x", Phase::AddOn, "./src/x.txt", "x");

        service().run_add_on(&add_on, &opts, &env).unwrap();

        assert_eq!(env.file("/work/demo/src/x.txt").as_deref(), Some("x"));
        assert!(env.file("/work/demo/package.json").is_none());
    }
}
