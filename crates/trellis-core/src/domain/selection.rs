//! Selection state for interactive add-on pickers.
//!
//! [`add_on_status`] is a pure function of the available add-ons, the set the
//! user is currently choosing, and the set persisted from an earlier run. It
//! is recomputed on every change.
//!
//! Rules:
//! - Choosing an add-on selects every transitive dependency and locks it
//!   (`enabled = false`, `depended_upon = true`). Deployment dependencies are
//!   selected but never locked.
//! - Deployment add-ons are single-select: at most one is ever selected.
//!   Whichever deployment is selected last wins, whether it was chosen
//!   directly or pulled in as a dependency; the one it displaces is cleared
//!   even if another add-on depends on it.
//! - Previously persisted add-ons are reconciled first. They stay selected and
//!   locked, except a persisted deployment that is being replaced by a newly
//!   chosen one of the same type.
//!
//! Dependency walks carry a visited set so cyclic graphs terminate. The state
//! produced for cyclic graphs is stable but not otherwise meaningful.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::AddOn;
use crate::domain::value_objects::AddOnType;

/// Checkbox state of one add-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddOnStatus {
    pub enabled: bool,
    pub selected: bool,
    pub depended_upon: bool,
    /// The single-select group this add-on belongs to, if any.
    pub single_select: Option<AddOnType>,
}

impl AddOnStatus {
    fn initial(add_on: &AddOn) -> Self {
        Self {
            enabled: true,
            selected: false,
            depended_upon: false,
            single_select: add_on.is_single_select().then_some(add_on.kind),
        }
    }
}

/// Compute the status of every available add-on, keyed by id.
pub fn add_on_status(
    available: &[Arc<AddOn>],
    chosen: &[String],
    original: &[String],
) -> BTreeMap<String, AddOnStatus> {
    SelectionState::new(available).resolve(chosen, original)
}

struct SelectionState<'a> {
    by_id: HashMap<&'a str, &'a AddOn>,
    status: BTreeMap<String, AddOnStatus>,
}

impl<'a> SelectionState<'a> {
    fn new(available: &'a [Arc<AddOn>]) -> Self {
        let by_id = available.iter().map(|a| (a.id.as_str(), a.as_ref())).collect();
        let status = available
            .iter()
            .map(|a| (a.id.clone(), AddOnStatus::initial(a)))
            .collect();
        Self { by_id, status }
    }

    fn kind_of(&self, id: &str) -> Option<AddOnType> {
        self.by_id.get(id).map(|a| a.kind)
    }

    fn is_single_select(&self, id: &str) -> bool {
        self.kind_of(id).is_some_and(AddOnType::is_single_select)
    }

    fn resolve(mut self, chosen: &[String], original: &[String]) -> BTreeMap<String, AddOnStatus> {
        // ── Previously persisted choices ────────────────────────────────────
        for id in original {
            let Some(kind) = self.kind_of(id) else {
                continue;
            };
            let replaced = kind.is_single_select()
                && chosen.iter().any(|c| self.kind_of(c) == Some(kind));

            let Some(status) = self.status.get_mut(id.as_str()) else {
                continue;
            };
            if kind.is_single_select() {
                status.selected = !replaced;
                status.enabled = true;
                status.depended_upon = !replaced;
            } else {
                status.selected = true;
                status.enabled = false;
                status.depended_upon = true;
                self.select_with_dependencies(id);
            }
        }

        // ── Current choices ─────────────────────────────────────────────────
        for id in chosen {
            self.select_with_dependencies(id);
        }

        self.status
    }

    /// Select `start` and lock its transitive dependencies.
    fn select_with_dependencies(&mut self, start: &str) {
        let Some((&start, _)) = self.by_id.get_key_value(start) else {
            return;
        };
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut stack: Vec<&'a str> = vec![start];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(add_on) = self.by_id.get(id).copied() else {
                continue;
            };

            for dep in add_on.depends_on.iter().rev() {
                let dep_single = self.is_single_select(dep);
                if dep_single {
                    self.deselect_siblings(dep);
                }
                if let Some(status) = self.status.get_mut(dep.as_str()) {
                    status.selected = true;
                    status.enabled = dep_single;
                    status.depended_upon = true;
                }
                if let Some((&dep_id, _)) = self.by_id.get_key_value(dep.as_str()) {
                    stack.push(dep_id);
                }
            }
        }

        if self.is_single_select(start) {
            self.deselect_siblings(start);
        }
        if let Some(status) = self.status.get_mut(start) {
            status.selected = true;
            if !status.depended_upon {
                status.enabled = true;
            }
        }
    }

    /// Deselect every other add-on of the same single-select type, including
    /// ones pulled in as a dependency.
    fn deselect_siblings(&mut self, id: &str) {
        let Some(kind) = self.kind_of(id) else {
            return;
        };
        for (other_id, status) in self.status.iter_mut() {
            if other_id != id && self.by_id.get(other_id.as_str()).map(|a| a.kind) == Some(kind) {
                status.selected = false;
                status.enabled = true;
                status.depended_upon = false;
            }
        }
    }
}
