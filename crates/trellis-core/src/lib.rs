//! Trellis Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Trellis, an
//! add-on driven project scaffolder, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           trellis-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │    (AddOnResolver, ComposeService)      │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Driven: Environment, Renderer, Remote) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    trellis-adapters (Infrastructure)    │
//! │ (LocalEnvironment, MemoryEnvironment)   │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (AddOn, Framework, selection, paths)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_core::prelude::*;
//!
//! // 1. Resolve the requested add-ons against a framework
//! let resolver = AddOnResolver::new(remote);
//! let chosen = resolver.finalize_add_ons(&framework, &mode, &["query".into()])?;
//!
//! // 2. Compose the project through an environment
//! let mut options = Options::new("my-app", "./my-app", framework);
//! options.chosen_add_ons = chosen;
//! let service = ComposeService::new(Box::new(renderer), Box::new(formatter));
//! let report = service.create_app(&options, &env)?;
//! ```

// Re-export domain layer (stable, well-defined API)
pub mod domain;

// Re-export application layer (orchestration logic)
pub mod application;

// Re-export error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        AddOnResolver, ComposeService, CreateReport, PersistedConfig,
        ports::{CodeFormatter, Environment, RemoteAddOnSource, RenderOutcome, TemplateRenderer},
    };
    pub use crate::domain::{
        AddOn, AddOnType, Framework, FrameworkRegistry, Mode, Options, PackageManager, Phase,
        TemplateContext,
    };
    pub use crate::error::{TrellisError, TrellisResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
