//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::{artifact::ArtifactArgs, task::TaskArgs, workflow::WorkflowArgs};

#[derive(Parser, Debug)]
#[command(name = "phasegate")]
#[command(about = "Phasegate - phase-gated task workflow engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .phasegate/config.yaml + local.yaml)
    #[arg(short, long, global = true, env = "PHASEGATE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, inspect and select tasks
    Task(TaskArgs),

    /// Drive a task through the phase lifecycle
    Workflow(WorkflowArgs),

    /// Write and archive task artifacts
    Artifact(ArtifactArgs),
}
