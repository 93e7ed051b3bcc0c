pub mod add_on;
pub mod common;
pub mod context;
pub mod framework;
pub mod options;
pub mod output;

pub use crate::domain::DomainError;
pub use add_on::{AddOn, CommandSpec, Integration, IntegrationKind, Route};
pub use context::TemplateContext;
pub use framework::Framework;
pub use options::Options;
pub use output::ComposedOutput;
