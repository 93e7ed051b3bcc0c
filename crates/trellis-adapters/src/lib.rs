//! Infrastructure adapters for Trellis.
//!
//! This crate implements the ports defined in `trellis-core::application::ports`
//! and everything else that touches disk, network or processes.

pub mod builtin_frameworks;
pub mod environment;
pub mod file_syncer;
pub mod formatter;
pub mod framework_loader;
pub mod remote;
pub mod renderer;

// Re-export commonly used adapters
pub use builtin_frameworks::load_registry;
pub use environment::{LocalEnvironment, MemoryEnvironment};
pub use file_syncer::{ChangeKind, FileChange, FileSyncer, SyncReport};
pub use formatter::{NormalizingFormatter, TypeScriptFormatter};
pub use framework_loader::FilesystemFrameworkLoader;
pub use remote::HttpAddOnSource;
pub use renderer::TeraRenderer;
