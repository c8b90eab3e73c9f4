//! Domain layer for phasegate
//!
//! Lifecycle vocabulary (phases, triggers, records), errors and ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DefinitionError, StoreError, WorkflowError, WorkflowResult};
