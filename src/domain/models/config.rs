use serde::{Deserialize, Serialize};

/// Main configuration structure for phasegate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Task state store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Artifact output configuration
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Workflow behaviour switches
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Task state store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Path to the JSON state file
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_state_file() -> String {
    ".phasegate/state.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactsConfig {
    /// Root directory holding one sub-directory per task
    #[serde(default = "default_artifacts_dir")]
    pub root_dir: String,
}

fn default_artifacts_dir() -> String {
    ".phasegate/tasks".to_string()
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root_dir: default_artifacts_dir(),
        }
    }
}

/// Workflow behaviour switches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Route planning through the scaffold phase before coding
    #[serde(default)]
    pub scaffolding_mode: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
