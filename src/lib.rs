//! Phasegate - phase-gated task workflow engine
//!
//! Phasegate moves each task through a fixed lifecycle of phases
//! (requirements, git setup, planning, optional scaffold, coding, testing,
//! finalize) where every phase passes through AI review and developer review
//! before it can be left. Task state lives in one JSON document so that
//! short-lived tool invocations can pick up where the last one stopped.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Lifecycle vocabulary, records, errors and the store port
//! - **Service Layer** (`services`): Transition table, artifact write modes, workflow sessions
//! - **Adapters** (`adapters`): JSON file and in-memory state stores
//! - **Infrastructure Layer** (`infrastructure`): Configuration, logging, artifact files
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use phasegate::adapters::JsonFileStateStore;
//! use phasegate::services::WorkflowSession;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = JsonFileStateStore::new(".phasegate/state.json");
//!     let mut session = WorkflowSession::create(&store, "feature-login")?;
//!     session.execute("submit_requirements")?;
//!     session.persist(None)?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{InMemoryStateStore, JsonFileStateStore};
pub use domain::errors::{DefinitionError, StoreError, WorkflowError, WorkflowResult};
pub use domain::models::{ArtifactBehavior, Config, Phase, StateFile, TaskRecord, Trigger};
pub use domain::ports::TaskStateStore;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{definition, ArtifactBehaviorResolver, StateMachineDefinition, WorkflowSession};
