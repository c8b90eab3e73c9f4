//! CLI command implementations.

pub mod artifact;
pub mod task;
pub mod workflow;
