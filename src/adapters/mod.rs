//! Infrastructure adapters for the domain ports.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStateStore;
pub use memory::InMemoryStateStore;
