use crate::domain::{
    entities::{AddOn, Framework, common::RelativePath},
    error::DomainError,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across entities.
pub struct DomainValidator;

impl DomainValidator {
    /// Check an add-on descriptor before it joins a registry.
    ///
    /// Remote descriptors go through the same checks as local ones.
    pub fn validate_add_on(add_on: &AddOn) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidAddOn {
            id: add_on.id.clone(),
            reason,
        };

        if add_on.id.trim().is_empty() {
            return Err(invalid("id must not be empty".into()));
        }
        if add_on.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }
        for path in add_on.file_paths().chain(add_on.deleted_files.iter().map(String::as_str)) {
            RelativePath::try_new(path)
                .map_err(|_| invalid(format!("file path '{path}' escapes the project root")))?;
        }
        if let Some(command) = &add_on.command {
            if command.command.trim().is_empty() {
                return Err(invalid("command must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn validate_framework(framework: &Framework) -> Result<(), DomainError> {
        if framework.id.trim().is_empty() {
            return Err(DomainError::InvalidFramework("id must not be empty".into()));
        }
        for path in framework.file_paths() {
            RelativePath::try_new(path).map_err(|_| {
                DomainError::InvalidFramework(format!(
                    "base file '{path}' of '{}' escapes the project root",
                    framework.id
                ))
            })?;
        }
        Ok(())
    }

    /// Project names become directory and package names.
    pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidProjectName {
            name: name.into(),
            reason: reason.into(),
        };

        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if name.len() > 214 {
            return Err(invalid("name must be at most 214 characters"));
        }
        if name.starts_with('.') || name.starts_with('_') {
            return Err(invalid("name must not start with '.' or '_'"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(
                "only lowercase letters, digits, '-', '_' and '.' are allowed",
            ));
        }
        Ok(())
    }
}
