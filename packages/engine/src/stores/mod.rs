//! Storage implementations for the catalog and profile traits.
//!
//! Available backends:
//! - `MemoryCatalog` / `MemoryProfileStore` - In-memory storage (always available)

pub mod memory;

pub use memory::{MemoryCatalog, MemoryProfileStore};
