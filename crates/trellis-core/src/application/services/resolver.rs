//! Add-on Resolver - turns requested ids into a closed add-on set.
//!
//! Resolution is a fixed point over an ordered id set: every id is resolved
//! (exact, then case-insensitive, then as a remote URL) and its dependencies
//! are appended, until no new ids appear. Cycles terminate because inserting
//! an id already in the set does nothing.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    application::{ApplicationError, ports::RemoteAddOnSource},
    domain::{AddOn, DomainError, DomainValidator, Framework, Mode, levenshtein::closest_match},
    error::TrellisResult,
};

/// Resolves add-on ids against a framework.
pub struct AddOnResolver {
    remote: Option<Box<dyn RemoteAddOnSource>>,
}

impl AddOnResolver {
    /// Create a resolver that can fetch add-ons by URL.
    pub fn new(remote: Box<dyn RemoteAddOnSource>) -> Self {
        Self {
            remote: Some(remote),
        }
    }

    /// Create a resolver that only knows the framework's own add-ons.
    pub fn local_only() -> Self {
        Self { remote: None }
    }

    /// Add-ons available in `mode`, highest priority first.
    ///
    /// Ties keep discovery order.
    pub fn list_add_ons(&self, framework: &Framework, mode: &Mode) -> Vec<Arc<AddOn>> {
        let mut add_ons: Vec<Arc<AddOn>> = framework
            .add_ons()
            .iter()
            .filter(|a| a.supports_mode(mode))
            .cloned()
            .collect();
        add_ons.sort_by(|a, b| b.priority.cmp(&a.priority));
        add_ons
    }

    /// Expand `chosen_ids` into the closed set including every transitive
    /// dependency.
    ///
    /// The result follows insertion order. A mistyped id is replaced in place
    /// by its canonical spelling.
    #[instrument(skip_all, fields(framework = %framework.id, mode = %mode, requested = chosen_ids.len()))]
    pub fn finalize_add_ons(
        &self,
        framework: &Framework,
        mode: &Mode,
        chosen_ids: &[String],
    ) -> TrellisResult<Vec<Arc<AddOn>>> {
        let mut pool = self.list_add_ons(framework, mode);

        let mut ids: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for id in chosen_ids {
            if seen.insert(id.clone()) {
                ids.push(id.clone());
            }
        }

        let mut idx = 0;
        while idx < ids.len() {
            let requested = ids[idx].clone();

            let add_on = match find_exact(&pool, &requested) {
                Some(found) => found,
                None => match find_case_insensitive(&pool, &requested) {
                    Some(found) => {
                        debug!(requested = %requested, canonical = %found.id, "Corrected add-on id");
                        seen.remove(&requested);
                        if !seen.insert(found.id.clone()) {
                            // The canonical id is already queued.
                            ids.remove(idx);
                            continue;
                        }
                        ids[idx] = found.id.clone();
                        found
                    }
                    None if requested.starts_with("http") => {
                        let remote = self.load_remote(&requested)?;
                        pool.push(Arc::clone(&remote));
                        remote
                    }
                    None => {
                        return Err(DomainError::AddOnNotFound {
                            suggestion: closest_match(&requested, pool.iter().map(|a| a.id.as_str()))
                                .map(str::to_string),
                            id: requested,
                        }
                        .into());
                    }
                },
            };

            for dependency in &add_on.depends_on {
                let dep = find_exact(&pool, dependency).ok_or_else(|| DomainError::DependencyNotFound {
                    dependency: dependency.clone(),
                    required_by: add_on.id.clone(),
                })?;
                if seen.insert(dep.id.clone()) {
                    ids.push(dep.id.clone());
                }
            }

            idx += 1;
        }

        let resolved: Vec<Arc<AddOn>> = ids
            .iter()
            .filter_map(|id| find_exact(&pool, id))
            .collect();

        info!(resolved = resolved.len(), "Add-ons resolved");
        Ok(resolved)
    }

    fn load_remote(&self, url: &str) -> TrellisResult<Arc<AddOn>> {
        let remote = self.remote.as_ref().ok_or_else(|| ApplicationError::RemoteFetch {
            url: url.into(),
            reason: "remote add-ons are not enabled".into(),
        })?;

        let mut add_on = remote.load(url)?;
        add_on.id = url.to_string();
        DomainValidator::validate_add_on(&add_on)?;
        info!(url, name = %add_on.name, "Loaded remote add-on");
        Ok(Arc::new(add_on))
    }
}

fn find_exact(pool: &[Arc<AddOn>], id: &str) -> Option<Arc<AddOn>> {
    pool.iter().find(|a| a.id == id).cloned()
}

fn find_case_insensitive(pool: &[Arc<AddOn>], id: &str) -> Option<Arc<AddOn>> {
    let lower = id.to_lowercase();
    pool.iter().find(|a| a.id.to_lowercase() == lower).cloned()
}
