//! Environment adapters.

mod local;
mod memory;

pub use local::LocalEnvironment;
pub use memory::MemoryEnvironment;
