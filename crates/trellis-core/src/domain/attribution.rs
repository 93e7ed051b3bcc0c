//! Provenance of composed files and the lines inside them.
//!
//! Whole-file ownership follows write order: the starter wins, then add-ons
//! from the last applied to the first, then the framework base. Individual
//! lines are attributed to an add-on when they match one of its injection
//! patterns (integration imports and hook code in root/vite files, quoted
//! dependency names in `package.json`). Everything else inherits the owner.
//!
//! This is a best-effort annotation. Unparseable manifest templates are
//! skipped silently.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::add_on::{AddOn, Integration, IntegrationKind, in_composition_order};
use crate::domain::entities::Framework;
use crate::domain::paths::normalize_source_path;

static TEMPLATED_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""[^"]*(\{\{|\{%)[^"]*""#).expect("templated string pattern is valid")
});

// ── Output types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Framework,
    AddOn,
    Starter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProvenance {
    pub source: SourceKind,
    pub source_id: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Original,
    Injected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineAttribution {
    /// 1-based.
    pub line: usize,
    pub source_id: String,
    pub source_name: String,
    #[serde(rename = "type")]
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributedFile {
    pub content: String,
    pub provenance: FileProvenance,
    pub line_attributions: Vec<LineAttribution>,
}

impl AttributedFile {
    pub fn injected_lines(&self) -> usize {
        self.line_attributions
            .iter()
            .filter(|l| l.kind == LineKind::Injected)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyKind {
    Dependency,
    DevDependency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyAttribution {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub source_id: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub attributed_files: BTreeMap<String, AttributedFile>,
    pub dependencies: Vec<DependencyAttribution>,
}

// ── Injection patterns ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Source {
    id: String,
    name: String,
}

impl Source {
    fn of(add_on: &AddOn) -> Self {
        Self {
            id: add_on.id.clone(),
            name: add_on.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    ViteConfig,
    RootRoute,
    PackageJson,
    Nowhere,
}

impl Scope {
    fn for_integration(kind: IntegrationKind) -> Self {
        match kind {
            IntegrationKind::VitePlugin => Self::ViteConfig,
            k if k.targets_root() => Self::RootRoute,
            _ => Self::Nowhere,
        }
    }

    fn applies_to(self, path: &str) -> bool {
        match self {
            Self::ViteConfig => path.contains("vite.config"),
            Self::RootRoute => path.contains("__root") || path.contains("root.tsx"),
            Self::PackageJson => path.ends_with("package.json"),
            Self::Nowhere => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Injection {
    needle: String,
    scope: Scope,
    source: Source,
}

fn integration_injections(integration: &Integration, source: &Source) -> Vec<Injection> {
    let scope = Scope::for_integration(integration.kind);
    let mut out = Vec::new();

    if let Some(import) = &integration.import {
        let prefix = import.split(" from ").next().unwrap_or(import);
        out.push(Injection {
            needle: prefix.to_string(),
            scope,
            source: source.clone(),
        });
    }

    if let Some(code) = integration.code.as_ref().or(integration.js_name.as_ref()) {
        out.push(Injection {
            needle: code.clone(),
            scope,
            source: source.clone(),
        });
    }

    out
}

fn add_on_dependencies(add_on: &AddOn) -> Vec<DependencyAttribution> {
    let source = Source::of(add_on);
    let mut out = Vec::new();

    let mut push = |name: &str, version: &str, kind: DependencyKind| {
        out.push(DependencyAttribution {
            name: name.to_string(),
            version: version.to_string(),
            kind,
            source_id: source.id.clone(),
            source_name: source.name.clone(),
        });
    };

    let additions = &add_on.package_additions;
    for (name, version) in &additions.dependencies {
        push(name, version, DependencyKind::Dependency);
    }
    for (name, version) in &additions.dev_dependencies {
        push(name, version, DependencyKind::DevDependency);
    }

    if let Some(template) = &add_on.package_template {
        let stripped = TEMPLATED_STRING.replace_all(template, "\"\"");
        if let Ok(parsed) = serde_json::from_str::<Value>(&stripped) {
            for (key, kind) in [
                ("dependencies", DependencyKind::Dependency),
                ("devDependencies", DependencyKind::DevDependency),
            ] {
                if let Some(Value::Object(deps)) = parsed.get(key) {
                    for (name, version) in deps {
                        if let Value::String(version) = version {
                            push(name, version, kind);
                        }
                    }
                }
            }
        }
    }

    out
}

// ── Provenance ───────────────────────────────────────────────────────────────

fn owns<'a>(mut paths: impl Iterator<Item = &'a str>, target: &str) -> bool {
    paths.any(|p| normalize_source_path(p) == target)
}

fn file_provenance(
    file_path: &str,
    framework: &Framework,
    ordered: &[&Arc<AddOn>],
    starter: Option<&AddOn>,
) -> Option<FileProvenance> {
    let target = file_path.strip_prefix("./").unwrap_or(file_path);

    if let Some(starter) = starter {
        if owns(starter.file_paths(), target) {
            return Some(FileProvenance {
                source: SourceKind::Starter,
                source_id: starter.id.clone(),
                source_name: starter.name.clone(),
            });
        }
    }

    for add_on in ordered.iter().rev() {
        if owns(add_on.file_paths(), target) {
            return Some(FileProvenance {
                source: SourceKind::AddOn,
                source_id: add_on.id.clone(),
                source_name: add_on.name.clone(),
            });
        }
    }

    if owns(framework.file_paths(), target) {
        return Some(FileProvenance {
            source: SourceKind::Framework,
            source_id: framework.id.clone(),
            source_name: framework.name.clone(),
        });
    }

    None
}

// ── Entry point ──────────────────────────────────────────────────────────────

/// Attribute every file in `files` (relative path → content).
///
/// Files with no known owner are left out of the result.
pub fn compute_attribution(
    framework: &Framework,
    chosen_add_ons: &[Arc<AddOn>],
    starter: Option<&AddOn>,
    files: &BTreeMap<String, String>,
) -> Attribution {
    let dependencies: Vec<DependencyAttribution> =
        chosen_add_ons.iter().flat_map(|a| add_on_dependencies(a)).collect();

    let mut injections: Vec<Injection> = chosen_add_ons
        .iter()
        .flat_map(|a| {
            let source = Source::of(a);
            a.integrations
                .iter()
                .flat_map(|i| integration_injections(i, &source))
                .collect::<Vec<_>>()
        })
        .collect();
    injections.extend(dependencies.iter().map(|dep| Injection {
        needle: format!("\"{}\"", dep.name),
        scope: Scope::PackageJson,
        source: Source {
            id: dep.source_id.clone(),
            name: dep.source_name.clone(),
        },
    }));

    let ordered = in_composition_order(chosen_add_ons);
    let mut attributed_files = BTreeMap::new();

    for (file_path, content) in files {
        let Some(provenance) = file_provenance(file_path, framework, &ordered, starter) else {
            continue;
        };

        let lines: Vec<&str> = content.split('\n').collect();
        let mut injected: HashMap<usize, &Source> = HashMap::new();
        for injection in injections.iter().filter(|i| i.scope.applies_to(file_path)) {
            for (idx, line) in lines.iter().enumerate() {
                if line.contains(injection.needle.as_str()) {
                    injected.entry(idx + 1).or_insert(&injection.source);
                }
            }
        }

        let line_attributions = (1..=lines.len())
            .map(|line| match injected.get(&line) {
                Some(source) => LineAttribution {
                    line,
                    source_id: source.id.clone(),
                    source_name: source.name.clone(),
                    kind: LineKind::Injected,
                },
                None => LineAttribution {
                    line,
                    source_id: provenance.source_id.clone(),
                    source_name: provenance.source_name.clone(),
                    kind: LineKind::Original,
                },
            })
            .collect();

        attributed_files.insert(
            file_path.clone(),
            AttributedFile {
                content: content.clone(),
                provenance,
                line_attributions,
            },
        );
    }

    Attribution {
        attributed_files,
        dependencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{AddOnType, Phase};

    fn framework() -> Framework {
        let mut fw = Framework::new("react", "React");
        fw.base_files.insert("./src/routes/__root.tsx.ejs".into(), String::new());
        fw.base_files.insert("./package.json".into(), String::new());
        fw.base_files.insert("./_dot_gitignore".into(), String::new());
        fw
    }

    fn query() -> Arc<AddOn> {
        let mut a = AddOn::new("query", "TanStack Query");
        a.integrations.push(Integration {
            kind: IntegrationKind::RootProvider,
            path: None,
            js_name: Some("QueryProvider".into()),
            import: Some("import { QueryProvider } from './integrations/query'".into()),
            code: None,
        });
        a.package_additions
            .dependencies
            .insert("@tanstack/react-query".into(), "^5".into());
        a.files.insert("./src/integrations/query/provider.tsx".into(), String::new());
        Arc::new(a)
    }

    fn files(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn framework_owns_base_files_after_normalization() {
        let out = compute_attribution(
            &framework(),
            &[],
            None,
            &files(&[(".gitignore", "node_modules"), ("stray.txt", "x")]),
        );
        assert_eq!(
            out.attributed_files[".gitignore"].provenance.source,
            SourceKind::Framework
        );
        assert!(!out.attributed_files.contains_key("stray.txt"));
    }

    #[test]
    fn root_lines_are_attributed_to_integration_source() {
        let content = "import { Outlet } from 'x'\nimport { QueryProvider } from './integrations/query'\n<QueryProvider>\n";
        let out = compute_attribution(
            &framework(),
            &[query()],
            None,
            &files(&[("src/routes/__root.tsx", content)]),
        );
        let file = &out.attributed_files["src/routes/__root.tsx"];

        assert_eq!(file.line_attributions[0].kind, LineKind::Original);
        assert_eq!(file.line_attributions[0].source_id, "react");
        assert_eq!(file.line_attributions[1].kind, LineKind::Injected);
        assert_eq!(file.line_attributions[1].source_id, "query");
        assert_eq!(file.line_attributions[2].source_id, "query");
        assert_eq!(file.injected_lines(), 2);
    }

    #[test]
    fn package_json_dependency_lines_are_injected() {
        let manifest = "{\n  \"dependencies\": {\n    \"@tanstack/react-query\": \"^5\"\n  }\n}";
        let out = compute_attribution(
            &framework(),
            &[query()],
            None,
            &files(&[("package.json", manifest)]),
        );
        let file = &out.attributed_files["package.json"];
        assert_eq!(file.line_attributions[2].kind, LineKind::Injected);
        assert_eq!(file.line_attributions[2].line, 3);
        assert_eq!(out.dependencies.len(), 1);
    }

    #[test]
    fn later_add_on_owns_shared_file() {
        let mut early = AddOn::new("early", "Early");
        early.phase = Phase::Setup;
        early.files.insert("./src/foo.ts".into(), "a".into());
        let mut late = AddOn::new("late", "Late");
        late.phase = Phase::Example;
        late.files.insert("./src/foo.ts".into(), "b".into());

        let out = compute_attribution(
            &framework(),
            &[Arc::new(late), Arc::new(early)],
            None,
            &files(&[("src/foo.ts", "b")]),
        );
        assert_eq!(out.attributed_files["src/foo.ts"].provenance.source_id, "late");
    }

    #[test]
    fn starter_wins_over_everything() {
        let mut starter = AddOn::new("blog", "Blog");
        starter.kind = AddOnType::Starter;
        starter.files.insert("./package.json".into(), "{}".into());

        let out = compute_attribution(
            &framework(),
            &[query()],
            Some(&starter),
            &files(&[("package.json", "{}")]),
        );
        assert_eq!(
            out.attributed_files["package.json"].provenance.source,
            SourceKind::Starter
        );
    }

    #[test]
    fn templated_manifest_is_parsed_best_effort() {
        let mut a = AddOn::new("db", "DB");
        a.package_template = Some(
            r#"{ "dependencies": { "drizzle-orm": "^0.40", "driver": "{{ add_on_option.db.driver }}" } }"#
                .into(),
        );
        let mut broken = AddOn::new("broken", "Broken");
        broken.package_template = Some("{% if tailwind %}{ nope".into());

        let out = compute_attribution(
            &framework(),
            &[Arc::new(a), Arc::new(broken)],
            None,
            &BTreeMap::new(),
        );
        let names: Vec<&str> = out.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert!(names.contains(&"drizzle-orm"));
        assert!(out.dependencies.iter().all(|d| d.source_id == "db"));
    }
}
