// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Trellis.
//!
//! Pure business logic: add-on descriptors, dependency and selection rules,
//! path conventions, manifest merging, and attribution. All I/O, templating,
//! and process execution are reached through ports defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No I/O**: No filesystem, network, or external calls
//! - **Immutable entities**: Loaded descriptors are shared behind `Arc`
//! - **Pure functions**: Selection, attribution, and command translation are
//!   plain functions of their inputs
//!
// Public API - what the world sees
pub mod attribution;
pub mod entities;
pub mod error;
pub mod levenshtein;
pub mod package_json;
pub mod package_manager;
pub mod paths;
pub mod registry;
pub mod selection;
pub mod value_objects;

mod validation;

// Re-exports for convenience
pub use attribution::{Attribution, AttributedFile, compute_attribution};
pub use entities::{
    AddOn, CommandSpec, ComposedOutput, Framework, Integration, IntegrationKind, Options, Route,
    TemplateContext,
    add_on::{BINARY_PREFIX, PackageAdditions, in_composition_order, populate_add_on_options_defaults},
    common::RelativePath,
    framework::ModeInfo,
    options::AddOnOptions,
    output::ExecutedCommand,
};
pub use error::{DomainError, ErrorCategory};
pub use registry::FrameworkRegistry;
pub use selection::{AddOnStatus, add_on_status};
pub use validation::DomainValidator;
pub use value_objects::{AddOnType, Mode, PackageManager, Phase};
