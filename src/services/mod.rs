//! Workflow services: the transition table, write-mode resolution and
//! per-task sessions.

pub mod artifact_behavior;
pub mod state_machine;
pub mod workflow_session;

pub use artifact_behavior::ArtifactBehaviorResolver;
pub use state_machine::{
    compose_full_table, definition, generate_review_cycle, PhaseDefinition, StateMachineDefinition,
};
pub use workflow_session::WorkflowSession;
