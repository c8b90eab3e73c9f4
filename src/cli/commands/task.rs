//! Task CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::id_resolver::resolve_task_id;
use crate::cli::open_store;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, TaskRecord};
use crate::domain::ports::TaskStateStore;
use crate::services::{ArtifactBehaviorResolver, WorkflowSession};

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task at the start of the lifecycle
    Create {
        /// Task id (a random UUID when omitted)
        id: Option<String>,

        /// Make the new task the active one
        #[arg(short, long)]
        activate: bool,
    },
    /// Show one task (the active task when no id is given)
    Show {
        /// Task id or unique prefix
        id: Option<String>,
    },
    /// List all tasks
    List,
    /// Make a task the active one
    Activate {
        /// Task id or unique prefix
        id: String,
    },
    /// Show or clear the active task
    Active {
        /// Clear the active marker instead of showing it
        #[arg(long)]
        clear: bool,
    },
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TaskDetailOutput {
    task: TaskRecord,
    phase: Option<String>,
    terminal: bool,
    legal_triggers: Vec<String>,
    artifact_appends: bool,
}

impl TaskDetailOutput {
    fn from_session(session: &WorkflowSession<'_>, record: TaskRecord) -> Self {
        Self {
            phase: session.phase().map(|p| p.label().to_string()),
            terminal: session.is_terminal(),
            legal_triggers: session
                .legal_triggers()
                .iter()
                .map(|t| t.as_str().to_string())
                .collect(),
            artifact_appends: ArtifactBehaviorResolver::new().should_append(session.state()),
            task: record,
        }
    }
}

impl CommandOutput for TaskDetailOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Task: {}", self.task.task_id),
            format!("State: {}", self.task.current_state),
        ];
        if let Some(phase) = &self.phase {
            lines.push(format!("Phase: {phase}"));
        }
        lines.push(format!(
            "Steps: {} completed, current {}",
            self.task.completed_steps, self.task.current_step
        ));
        lines.push(format!("Active: {}", if self.task.is_active { "yes" } else { "no" }));
        if let Some(feedback) = &self.task.revision_feedback {
            lines.push(format!("Revision feedback: {feedback}"));
        }
        lines.push(format!(
            "Artifact mode: {}",
            if self.artifact_appends { "append" } else { "replace" }
        ));
        if self.terminal {
            lines.push("Lifecycle complete.".to_string());
        } else {
            lines.push(format!("Legal triggers: {}", self.legal_triggers.join(", ")));
        }
        lines.push(format!("Created: {}", self.task.created_at.to_rfc3339()));
        lines.push(format!("Updated: {}", self.task.updated_at.to_rfc3339()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct TaskListOutput {
    tasks: Vec<TaskRecord>,
    total: usize,
}

impl CommandOutput for TaskListOutput {
    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks found.".to_string();
        }
        format!(
            "{}\nTotal: {} task(s)",
            TableFormatter::new().format_tasks(&self.tasks),
            self.total
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct ActiveTaskOutput {
    active: Option<String>,
    cleared: bool,
}

impl CommandOutput for ActiveTaskOutput {
    fn to_human(&self) -> String {
        match (&self.active, self.cleared) {
            (_, true) => "Active task cleared.".to_string(),
            (Some(id), false) => format!("Active task: {id}"),
            (None, false) => "No active task.".to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(args: TaskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_store(config);

    match args.command {
        TaskCommands::Create { id, activate } => {
            let task_id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let session =
                WorkflowSession::create(&store, &task_id).context("Failed to create task")?;
            if activate {
                store
                    .set_active(session.task_id())
                    .context("Failed to activate task")?;
            }
            let record = session
                .record()
                .context("Created task vanished from the store")?;
            output(&TaskDetailOutput::from_session(&session, record), json_mode);
        }

        TaskCommands::Show { id } => {
            let task_id = resolve_task_id(&store, id.as_deref())?;
            let session = WorkflowSession::load(&store, &task_id)
                .with_context(|| format!("Task not found or its state is not in the workflow: {task_id}"))?;
            let record = session
                .record()
                .with_context(|| format!("Task not found: {task_id}"))?;
            output(&TaskDetailOutput::from_session(&session, record), json_mode);
        }

        TaskCommands::List => {
            let tasks = store.list();
            let out = TaskListOutput {
                total: tasks.len(),
                tasks,
            };
            output(&out, json_mode);
        }

        TaskCommands::Activate { id } => {
            let task_id = resolve_task_id(&store, Some(&id))?;
            store
                .set_active(&task_id)
                .context("Failed to activate task")?;
            output(
                &ActiveTaskOutput {
                    active: Some(task_id),
                    cleared: false,
                },
                json_mode,
            );
        }

        TaskCommands::Active { clear } => {
            if clear {
                store.clear_active().context("Failed to clear active task")?;
            }
            output(
                &ActiveTaskOutput {
                    active: store.get_active(),
                    cleared: clear,
                },
                json_mode,
            );
        }
    }

    Ok(())
}
