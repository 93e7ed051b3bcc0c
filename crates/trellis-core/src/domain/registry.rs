//! Framework registry.
//!
//! An explicit object, created per process or per rebuild, instead of global
//! state. Dev-watch builds a fresh registry for every rebuild so updated
//! framework files are picked up.

use std::sync::Arc;

use crate::domain::entities::Framework;
use crate::domain::error::DomainError;
use crate::domain::levenshtein::closest_match;
use crate::domain::validation::DomainValidator;

#[derive(Debug, Clone, Default)]
pub struct FrameworkRegistry {
    /// Registration order.
    frameworks: Vec<Arc<Framework>>,
}

impl FrameworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a framework. A later registration with the same id
    /// replaces the earlier one in place.
    pub fn register(&mut self, framework: Framework) -> Result<Arc<Framework>, DomainError> {
        DomainValidator::validate_framework(&framework)?;
        let framework = Arc::new(framework);

        match self.frameworks.iter_mut().find(|f| f.id == framework.id) {
            Some(slot) => *slot = Arc::clone(&framework),
            None => self.frameworks.push(Arc::clone(&framework)),
        }
        Ok(framework)
    }

    /// Look up by id, case-insensitively.
    pub fn get(&self, id: &str) -> Result<Arc<Framework>, DomainError> {
        self.frameworks
            .iter()
            .find(|f| f.id == id)
            .or_else(|| self.frameworks.iter().find(|f| f.id.eq_ignore_ascii_case(id)))
            .cloned()
            .ok_or_else(|| DomainError::FrameworkNotFound {
                id: id.into(),
                suggestion: closest_match(id, self.frameworks.iter().map(|f| f.id.as_str()))
                    .map(str::to_string),
            })
    }

    pub fn list(&self) -> &[Arc<Framework>] {
        &self.frameworks
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }

    /// The first registered framework.
    pub fn default_framework(&self) -> Option<Arc<Framework>> {
        self.frameworks.first().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let mut reg = FrameworkRegistry::new();
        reg.register(Framework::new("react", "React")).unwrap();
        reg.register(Framework::new("solid", "Solid")).unwrap();

        assert_eq!(reg.get("solid").unwrap().name, "Solid");
        assert_eq!(reg.get("REACT").unwrap().id, "react");
        assert_eq!(reg.list().len(), 2);
        assert_eq!(reg.default_framework().unwrap().id, "react");
    }

    #[test]
    fn re_registering_replaces_in_place() {
        let mut reg = FrameworkRegistry::new();
        reg.register(Framework::new("react", "React")).unwrap();
        reg.register(Framework::new("solid", "Solid")).unwrap();
        reg.register(Framework::new("react", "React v2")).unwrap();

        assert_eq!(reg.list()[0].name, "React v2");
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn unknown_framework_suggests_closest() {
        let mut reg = FrameworkRegistry::new();
        reg.register(Framework::new("react", "React")).unwrap();

        match reg.get("raect") {
            Err(DomainError::FrameworkNotFound { suggestion, .. }) => {
                assert_eq!(suggestion.as_deref(), Some("react"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
