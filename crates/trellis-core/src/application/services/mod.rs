//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "resolve these add-ons" or "create this app".

pub mod compose_service;
pub mod project_config;
pub mod resolver;

pub use compose_service::{ComposeService, CreateReport};
pub use project_config::{CONFIG_FILE_NAME, PersistedConfig};
pub use resolver::AddOnResolver;
