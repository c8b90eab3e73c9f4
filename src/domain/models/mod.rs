pub mod behavior;
pub mod config;
pub mod phase;
pub mod task_record;
pub mod transition;

pub use behavior::ArtifactBehavior;
pub use config::{ArtifactsConfig, Config, LoggingConfig, StoreConfig, WorkflowConfig};
pub use phase::{split_state, substate, Phase, DEFAULT_SUBSTATE, STATE_DELIMITER};
pub use task_record::{StateFile, TaskRecord};
pub use transition::{TransitionRule, Trigger};
