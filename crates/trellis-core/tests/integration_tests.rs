//! Integration tests for trellis-core.

use std::collections::HashSet;
use std::sync::Arc;

use trellis_core::{
    domain::{AddOnType, add_on_status, levenshtein, package_manager},
    prelude::*,
};

fn add_on(id: &str, kind: AddOnType, deps: &[&str]) -> AddOn {
    AddOn {
        kind,
        modes: vec![Mode::file_router(), Mode::code_router()],
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
        ..AddOn::new(id, id)
    }
}

fn registry() -> FrameworkRegistry {
    let mut fw = Framework::new("react", "React");
    fw.add_ons = vec![
        add_on("start", AddOnType::AddOn, &["tanstack-query", "router-devtools"]),
        add_on("tanstack-query", AddOnType::AddOn, &[]),
        add_on("router-devtools", AddOnType::AddOn, &["tanstack-query"]),
        add_on("tailwind", AddOnType::AddOn, &[]),
        add_on("shadcn", AddOnType::AddOn, &["tailwind"]),
        add_on("ping", AddOnType::AddOn, &["pong"]),
        add_on("pong", AddOnType::AddOn, &["ping"]),
        add_on("netlify", AddOnType::Deployment, &[]),
        add_on("vercel", AddOnType::Deployment, &[]),
        add_on("biome", AddOnType::Toolchain, &[]),
    ]
    .into_iter()
    .map(Arc::new)
    .collect();

    let mut registry = FrameworkRegistry::default();
    registry.register(fw).unwrap();
    registry
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn resolved_sets_are_closed_for_every_single_request() {
    let registry = registry();
    let fw = registry.get("react").unwrap();
    let resolver = AddOnResolver::local_only();

    for candidate in fw.add_ons() {
        let resolved = resolver
            .finalize_add_ons(&fw, &Mode::file_router(), &[candidate.id.clone()])
            .unwrap();
        let present: HashSet<&str> = resolved.iter().map(|a| a.id.as_str()).collect();
        for a in &resolved {
            for dep in &a.depends_on {
                assert!(present.contains(dep.as_str()), "{} lacks {dep}", candidate.id);
            }
        }
    }
}

#[test]
fn resolution_is_idempotent_and_tolerates_cycles() {
    let registry = registry();
    let fw = registry.get("react").unwrap();
    let resolver = AddOnResolver::local_only();

    let first = resolver
        .finalize_add_ons(&fw, &Mode::file_router(), &ids(&["ping", "start", "shadcn"]))
        .unwrap();
    let first_ids: Vec<String> = first.iter().map(|a| a.id.clone()).collect();
    let second = resolver
        .finalize_add_ons(&fw, &Mode::file_router(), &first_ids)
        .unwrap();
    let second_ids: Vec<String> = second.iter().map(|a| a.id.clone()).collect();

    assert_eq!(first_ids, second_ids);
    assert!(first_ids.contains(&"pong".to_string()));
}

#[test]
fn typo_in_framework_and_add_on_ids_gets_suggestions() {
    let registry = registry();
    let err = registry.get("raect").unwrap_err();
    assert!(err.suggestions().iter().any(|s| s.contains("react")));

    let fw = registry.get("react").unwrap();
    let err = AddOnResolver::local_only()
        .finalize_add_ons(&fw, &Mode::file_router(), &ids(&["tailwnd"]))
        .unwrap_err();
    assert!(err.to_string().contains("tailwind"));
    assert_eq!(
        levenshtein::closest_match("tailwnd", fw.add_ons().iter().map(|a| a.id.as_str())),
        Some("tailwind")
    );
}

#[test]
fn selection_locks_dependencies_and_keeps_deployments_exclusive() {
    let registry = registry();
    let fw = registry.get("react").unwrap();

    let status = add_on_status(fw.add_ons(), &ids(&["shadcn", "vercel"]), &ids(&["netlify"]));

    let tailwind = &status["tailwind"];
    assert!(tailwind.selected && !tailwind.enabled && tailwind.depended_upon);

    assert!(!status["netlify"].selected);
    assert!(status["netlify"].enabled);
    assert!(status["vercel"].selected && status["vercel"].enabled);
}

#[test]
fn selection_state_is_stable_under_cycles() {
    let registry = registry();
    let fw = registry.get("react").unwrap();

    let once = add_on_status(fw.add_ons(), &ids(&["ping"]), &[]);
    let again = add_on_status(fw.add_ons(), &ids(&["ping"]), &[]);
    assert_eq!(once, again);
    assert!(once["ping"].selected && once["pong"].selected);
}

#[test]
fn execute_commands_round_trip_through_any_manager() {
    let npx = package_manager::execute_command(PackageManager::Npm, "shadcn@latest", &["init"]);
    for pm in PackageManager::ALL {
        let there = package_manager::translate_execute_command(pm, &npx);
        let back = package_manager::translate_execute_command(PackageManager::Npm, &there);
        assert_eq!(back, npx, "round trip through {pm}");
    }
}
