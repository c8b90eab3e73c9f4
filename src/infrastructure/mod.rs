//! Infrastructure layer
//!
//! Concerns outside the workflow domain:
//! - Configuration loading
//! - Logging
//! - Artifact files

pub mod artifacts;
pub mod config;
pub mod logging;

pub use artifacts::{ArtifactError, ArtifactWriter};
pub use config::{ConfigError, ConfigLoader};
pub use logging::{LogConfig, LoggerImpl};
