//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `trellis-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Environment`: Files, directories, and subprocesses
//!   - `TemplateRenderer`: Template rendering
//!   - `CodeFormatter`: Output formatting
//!   - `RemoteAddOnSource`: Add-on descriptors fetched by URL
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

#[cfg(test)]
pub use output::MockRemoteAddOnSource;
pub use output::{CodeFormatter, Environment, RemoteAddOnSource, RenderOutcome, TemplateRenderer};
