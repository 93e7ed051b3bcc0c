//! End-to-end composition through the real renderer and formatter.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tempfile::TempDir;

use trellis_adapters::{
    FilesystemFrameworkLoader, LocalEnvironment, MemoryEnvironment, NormalizingFormatter,
    TeraRenderer, builtin_frameworks::builtin,
};
use trellis_core::{
    application::{AddOnResolver, ApplicationError, ComposeService, PersistedConfig},
    domain::{
        AddOn, AddOnType, Framework, Mode, Options, PackageManager, Phase, compute_attribution,
        attribution::{LineKind, SourceKind},
    },
    error::TrellisError,
};

const TARGET: &str = "/projects/my-app";

// ── Helpers ───────────────────────────────────────────────────────────────────

fn service() -> ComposeService {
    ComposeService::new(Box::new(TeraRenderer::new()), Box::new(NormalizingFormatter::new()))
}

fn env() -> MemoryEnvironment {
    MemoryEnvironment::new().with_directory("/projects")
}

fn framework(files: &[(&str, &str)], add_ons: Vec<AddOn>) -> Arc<Framework> {
    let mut fw = Framework::new("test", "Test");
    fw.base_files = files
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    fw.add_ons = add_ons.into_iter().map(Arc::new).collect();
    Arc::new(fw)
}

fn options(framework: Arc<Framework>, chosen: &[&str]) -> Options {
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&framework));
    opts.git = false;
    opts.install = false;
    opts.chosen_add_ons = chosen
        .iter()
        .map(|id| Arc::clone(framework.find_add_on(id).expect("add-on in framework")))
        .collect();
    opts
}

fn add_on(id: &str, files: &[(&str, &str)]) -> AddOn {
    AddOn {
        files: files
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        ..AddOn::new(id, id)
    }
}

fn compose(opts: &Options) -> (MemoryEnvironment, BTreeMap<String, String>) {
    let env = env();
    service().create_app(opts, &env).unwrap();
    let files = env.output().unwrap().relative_files(Path::new(TARGET));
    (env, files)
}

// ── Base project ──────────────────────────────────────────────────────────────

#[test]
fn base_file_without_add_ons_is_copied_verbatim() {
    let fw = framework(&[("./src/test.txt", "Hello")], vec![]);
    let (_, files) = compose(&options(fw, &[]));

    assert_eq!(files["src/test.txt"], "Hello");
    let extra: Vec<&String> = files
        .keys()
        .filter(|k| !["src/test.txt", "package.json", ".trellis.json"].contains(&k.as_str()))
        .collect();
    assert!(extra.is_empty(), "unexpected files: {extra:?}");
}

#[test]
fn templates_render_and_lose_their_suffix() {
    let fw = framework(
        &[("./src/main.tsx.ejs", "const name = '{{ project_name }}'")],
        vec![],
    );
    let (_, files) = compose(&options(fw, &[]));
    assert_eq!(files["src/main.tsx"], "const name = 'my-app'\n");
}

#[test]
fn javascript_projects_get_js_extensions() {
    let fw = framework(
        &[("./src/main.tsx.ejs", "export {}"), ("./src/util.ts", "export {}")],
        vec![],
    );
    let mut opts = options(fw, &[]);
    opts.typescript = false;
    let (_, files) = compose(&opts);

    assert!(files.contains_key("src/main.jsx"));
    assert!(files.contains_key("src/util.js"));
    assert!(!files.contains_key("src/main.tsx"));
}

#[test]
fn ignore_file_skips_only_that_file() {
    let fw = framework(
        &[
            ("./src/skipped.ts.ejs", "{{ ignore_file() }}"),
            ("./src/kept.ts.ejs", "kept"),
        ],
        vec![],
    );
    let (_, files) = compose(&options(fw, &[]));
    assert!(!files.contains_key("src/skipped.ts"));
    assert_eq!(files["src/kept.ts"], "kept\n");
}

#[test]
fn render_error_aborts_with_file_and_cause() {
    let fw = framework(&[("./src/broken.ts.ejs", "{{ nope.nothing }}")], vec![]);
    let err = service().create_app(&options(fw, &[]), &env()).unwrap_err();

    match err {
        TrellisError::Application(ApplicationError::TemplateRendering { path, cause }) => {
            assert!(path.to_string_lossy().contains("broken.ts.ejs"));
            assert!(!cause.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn dotfiles_and_append_files_land_correctly() {
    let fw = framework(
        &[("./_dot_env", "A=1\n")],
        vec![add_on("env-extra", &[("./_dot_env.append", "B=2\n")])],
    );
    let (_, files) = compose(&options(fw, &["env-extra"]));
    assert_eq!(files[".env"], "A=1\nB=2\n");
}

// ── Layering ──────────────────────────────────────────────────────────────────

#[test]
fn deleted_files_are_removed_after_base_copy() {
    let remover = AddOn {
        deleted_files: vec!["./src/App.css".into()],
        ..add_on("remover", &[])
    };
    let fw = framework(&[("./src/App.css", "body {}"), ("./src/main.ts", "x")], vec![remover]);
    let (env, files) = compose(&options(fw, &["remover"]));

    assert!(!files.contains_key("src/App.css"));
    assert!(files.contains_key("src/main.ts"));
    assert_eq!(
        env.output().unwrap().deleted_files,
        vec![PathBuf::from(TARGET).join("src/App.css")]
    );
}

#[test]
fn later_phase_wins_on_the_same_path() {
    let setup = AddOn {
        phase: Phase::Setup,
        ..add_on("a", &[("./src/foo.txt", "from a")])
    };
    let example = AddOn {
        phase: Phase::Example,
        ..add_on("b", &[("./src/foo.txt", "from b")])
    };
    let fw = framework(&[], vec![example, setup]);

    // chosen order puts b first; composition order still applies a first
    let (_, files) = compose(&options(fw, &["b", "a"]));
    assert_eq!(files["src/foo.txt"], "from b");
}

#[test]
fn composition_is_deterministic() {
    let fw = Arc::new(builtin::react());
    let chosen = AddOnResolver::local_only()
        .finalize_add_ons(&fw, &Mode::file_router(), &["query-demo".into(), "biome".into()])
        .unwrap();

    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.chosen_add_ons = chosen;

    let run = || {
        let env = env();
        service().create_app(&opts, &env).unwrap();
        env.output().unwrap()
    };
    assert_eq!(run().files, run().files);
}

#[test]
fn starter_is_applied_after_add_ons() {
    let fw = framework(&[], vec![add_on("a", &[("./src/page.tsx", "from add-on")])]);
    let mut opts = options(fw, &["a"]);
    opts.starter = Some(Arc::new(AddOn {
        kind: AddOnType::Starter,
        ..add_on("blog", &[("./src/page.tsx", "from starter")])
    }));
    let (_, files) = compose(&opts);
    assert_eq!(files["src/page.tsx"], "from starter\n");
}

// ── Manifest and config ───────────────────────────────────────────────────────

#[test]
fn package_json_merges_base_flags_and_add_ons() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.tailwind = true;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("tanstack-query").unwrap())];

    let env = env();
    service().create_app(&opts, &env).unwrap();
    let manifest: serde_json::Value =
        serde_json::from_str(&env.file(Path::new(TARGET).join("package.json")).unwrap()).unwrap();

    assert_eq!(manifest["name"], "my-app");
    assert!(manifest["dependencies"]["tailwindcss"].is_string());
    assert!(manifest["dependencies"]["@tanstack/react-query"].is_string());
    assert!(manifest["devDependencies"]["typescript"].is_string());
    assert!(manifest["devDependencies"]["@tanstack/router-plugin"].is_string());
}

#[test]
fn persisted_config_round_trips_the_choices() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.package_manager = PackageManager::Pnpm;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("tanstack-store").unwrap())];

    let env = env();
    service().create_app(&opts, &env).unwrap();
    let config = PersistedConfig::read(&env, Path::new(TARGET)).unwrap();

    assert_eq!(config.framework, "react");
    assert_eq!(config.chosen_add_ons, vec!["tanstack-store".to_string()]);
    assert_eq!(config.package_manager, PackageManager::Pnpm);
}

// ── Built-in framework ────────────────────────────────────────────────────────

#[test]
fn builtin_root_route_wraps_outlet_in_providers() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("tanstack-query").unwrap())];
    let (_, files) = compose(&opts);

    let root = &files["src/routes/__root.tsx"];
    assert!(root.contains("import TanStackQueryProvider from '../integrations/tanstack-query/root-provider'"));
    assert!(root.contains("<TanStackQueryProvider>"));
    assert!(!files.contains_key("src/App.tsx"), "code-router file leaked into file-router");
}

#[test]
fn builtin_code_router_in_javascript() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.mode = Mode::code_router();
    opts.typescript = false;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("tanstack-query").unwrap())];
    let (_, files) = compose(&opts);

    assert!(files.contains_key("src/App.jsx"));
    assert!(files.contains_key("src/main.jsx"));
    assert!(!files.contains_key("tsconfig.json"));
    assert!(!files.contains_key("src/routes/__root.jsx"));
    assert!(files["src/App.jsx"].contains("from './integrations/tanstack-query/root-provider'"));
}

#[test]
fn builtin_shadcn_and_biome_run_their_commands() {
    let fw = Arc::new(builtin::react());
    let chosen = AddOnResolver::local_only()
        .finalize_add_ons(&fw, &Mode::file_router(), &["shadcn".into(), "biome".into()])
        .unwrap();

    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.package_manager = PackageManager::Pnpm;
    opts.tailwind = true;
    opts.chosen_add_ons = chosen;

    let env = env();
    service().create_app(&opts, &env).unwrap();
    let commands: Vec<String> = env.commands().iter().map(ToString::to_string).collect();

    assert_eq!(
        commands,
        vec![
            "pnpm dlx shadcn@latest add --silent --yes button",
            "git init",
            "pnpm install",
            "pnpm check --fix",
        ]
    );
}

#[test]
fn builtin_deployment_warning_is_reported() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("vercel").unwrap())];

    let env = env();
    let report = service().create_app(&opts, &env).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(env.warnings()[0].starts_with("Vercel:"));
}

// ── Attribution ───────────────────────────────────────────────────────────────

#[test]
fn attribution_over_composed_output() {
    let fw = Arc::new(builtin::react());
    let mut opts = Options::new("my-app", TARGET, Arc::clone(&fw));
    opts.git = false;
    opts.install = false;
    opts.chosen_add_ons = vec![Arc::clone(fw.find_add_on("tanstack-query").unwrap())];
    let (_, files) = compose(&opts);

    let attribution = compute_attribution(&fw, &opts.chosen_add_ons, None, &files);

    let provider = &attribution.attributed_files["src/integrations/tanstack-query/root-provider.tsx"];
    assert_eq!(provider.provenance.source, SourceKind::AddOn);
    assert_eq!(provider.provenance.source_id, "tanstack-query");

    let root = &attribution.attributed_files["src/routes/__root.tsx"];
    assert_eq!(root.provenance.source, SourceKind::Framework);
    assert!(
        root.line_attributions
            .iter()
            .any(|l| l.kind == LineKind::Injected && l.source_id == "tanstack-query")
    );

    assert!(
        attribution
            .dependencies
            .iter()
            .any(|d| d.name == "@tanstack/react-query" && d.source_id == "tanstack-query")
    );
}

// ── Disk round-trip ───────────────────────────────────────────────────────────

#[test]
fn binary_asset_round_trips_through_loader_and_disk() {
    let source = TempDir::new().unwrap();
    let bytes: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0xFF];
    fs::write(source.path().join("framework.json"), r#"{ "id": "img", "name": "Img" }"#).unwrap();
    fs::create_dir_all(source.path().join("project/base/public")).unwrap();
    fs::write(source.path().join("project/base/public/logo.png"), &bytes).unwrap();

    let fw = FilesystemFrameworkLoader::new(source.path()).load().unwrap();
    let stored = fw.file_contents("./public/logo.png").unwrap();
    assert_eq!(stored, format!("base64::{}", STANDARD.encode(&bytes)));

    let out = TempDir::new().unwrap();
    let target = out.path().join("app");
    let mut opts = Options::new("app", &target, Arc::new(fw));
    opts.git = false;
    opts.install = false;

    service().create_app(&opts, &LocalEnvironment::new()).unwrap();
    assert_eq!(fs::read(target.join("public/logo.png")).unwrap(), bytes);
}

#[test]
fn existing_non_empty_target_is_refused_before_writing() {
    let fw = framework(&[("./a.txt", "a")], vec![]);
    let env = env().with_file(PathBuf::from(TARGET).join("keep.txt"), "mine");

    let err = service().create_app(&options(fw, &[]), &env).unwrap_err();
    assert!(matches!(
        err,
        TrellisError::Application(ApplicationError::TargetNotEmpty { .. })
    ));
    assert!(env.file(Path::new(TARGET).join("a.txt")).is_none());
}
