//! Ports (interfaces) the services depend on.

pub mod state_store;

pub use state_store::TaskStateStore;
