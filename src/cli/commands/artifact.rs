//! Artifact CLI commands.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::id_resolver::resolve_task_id;
use crate::cli::open_store;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{split_state, Config, Phase};
use crate::domain::ports::TaskStateStore;
use crate::infrastructure::artifacts::{ArtifactWriter, WriteReport};

#[derive(Args, Debug)]
pub struct ArtifactArgs {
    #[command(subcommand)]
    pub command: ArtifactCommands,
}

#[derive(Subcommand, Debug)]
pub enum ArtifactCommands {
    /// Write the task artifact for its current state (content from stdin or --file)
    Write {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,

        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Composite state to write for (defaults to the task's state)
        #[arg(short, long)]
        state: Option<String>,
    },
    /// Print the live artifact
    Show {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,
    },
    /// Snapshot the live artifact into the task archive
    Archive {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,

        /// Phase to file the snapshot under (defaults to the task's phase)
        #[arg(short, long)]
        phase: Option<String>,
    },
    /// List archived snapshots
    List {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,
    },
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WriteOutput {
    task_id: String,
    #[serde(flatten)]
    report: WriteReport,
}

impl CommandOutput for WriteOutput {
    fn to_human(&self) -> String {
        let mode = if self.report.appended { "Appended" } else { "Wrote" };
        format!(
            "{} {} bytes to {} (task {}, state {})",
            mode,
            self.report.bytes_written,
            self.report.path.display(),
            self.task_id,
            self.report.state
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    task_id: String,
    path: PathBuf,
    content: String,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        self.content.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ArchiveOutput {
    task_id: String,
    phase: Phase,
    snapshot: PathBuf,
}

impl CommandOutput for ArchiveOutput {
    fn to_human(&self) -> String {
        format!(
            "Archived {} artifact for task {} to {}",
            self.phase,
            self.task_id,
            self.snapshot.display()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ArchiveListOutput {
    task_id: String,
    snapshots: Vec<PathBuf>,
}

impl CommandOutput for ArchiveListOutput {
    fn to_human(&self) -> String {
        if self.snapshots.is_empty() {
            return format!("No archived artifacts for task {}.", self.task_id);
        }
        let mut lines = vec![format!("Archived artifacts for task {}:", self.task_id)];
        for snapshot in &self.snapshots {
            lines.push(format!("  {}", snapshot.display()));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn read_content(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read artifact content from stdin")?;
            Ok(content)
        }
    }
}

pub fn execute(args: ArtifactArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config);
    let root = &config.artifacts.root_dir;

    match args.command {
        ArtifactCommands::Write { task, file, state } => {
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let state = match state {
                Some(state) => state,
                None => {
                    store
                        .get(&task_id)
                        .with_context(|| format!("Task not found: {task_id}"))?
                        .current_state
                }
            };
            let content = read_content(file)?;

            let report = ArtifactWriter::new(root, &task_id)?.write(&state, &content)?;
            output(&WriteOutput { task_id, report }, json_mode);
        }

        ArtifactCommands::Show { task } => {
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let writer = ArtifactWriter::new(root, &task_id)?;
            let Some(content) = writer.read()? else {
                bail!("Task {task_id} has no artifact yet");
            };
            output(
                &ShowOutput {
                    path: writer.artifact_path(),
                    task_id,
                    content,
                },
                json_mode,
            );
        }

        ArtifactCommands::Archive { task, phase } => {
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let phase_name = match phase {
                Some(name) => name,
                None => {
                    let record = store
                        .get(&task_id)
                        .with_context(|| format!("Task not found: {task_id}"))?;
                    split_state(&record.current_state).0.to_string()
                }
            };
            let Some(phase) = Phase::from_str(&phase_name) else {
                bail!("Unknown phase: {phase_name}");
            };

            let snapshot = ArtifactWriter::new(root, &task_id)?.archive(phase)?;
            output(
                &ArchiveOutput {
                    task_id,
                    phase,
                    snapshot,
                },
                json_mode,
            );
        }

        ArtifactCommands::List { task } => {
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let snapshots = ArtifactWriter::new(root, &task_id)?.list_archive()?;
            output(&ArchiveListOutput { task_id, snapshots }, json_mode);
        }
    }

    Ok(())
}
