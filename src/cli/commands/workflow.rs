//! Workflow CLI commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::id_resolver::resolve_task_id;
use crate::cli::open_store;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{split_state, ArtifactBehavior, Config, Phase, TransitionRule, Trigger};
use crate::services::{definition, ArtifactBehaviorResolver, WorkflowSession};

#[derive(Args, Debug)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    pub command: WorkflowCommands,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// Fire a trigger on a task and persist the new state
    Trigger {
        /// Trigger name (e.g. submit_for_ai_review, request_revision)
        trigger: String,

        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,

        /// Revision feedback stored with the new state
        #[arg(short, long)]
        feedback: Option<String>,

        /// Validate the transition without persisting it
        #[arg(long)]
        dry_run: bool,
    },
    /// Leave a verified phase for the next one
    Advance {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,

        /// Route planning through scaffold regardless of configuration
        #[arg(long)]
        scaffold: bool,
    },
    /// Record step progress within the current phase
    Step {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long)]
        task: Option<String>,

        /// Set the current step number
        #[arg(long, conflicts_with = "complete")]
        set: Option<u32>,

        /// Mark the current step complete
        #[arg(long)]
        complete: bool,
    },
    /// List the triggers that are legal right now
    Triggers {
        /// Task id or unique prefix (defaults to the active task)
        #[arg(short, long, conflicts_with = "state")]
        task: Option<String>,

        /// Query a composite state directly instead of a task
        #[arg(short, long)]
        state: Option<String>,
    },
    /// Show the transition table
    Rules {
        /// Only rules whose source state belongs to this phase
        #[arg(short, long)]
        phase: Option<String>,
    },
    /// Show how artifacts are written in a composite state
    Behavior {
        /// Composite state, e.g. planning_solutiondesign
        state: String,
    },
}

// ── Output structs ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TransitionOutput {
    task_id: String,
    from: String,
    to: String,
    trigger: Option<String>,
    persisted: bool,
    revision_feedback: Option<String>,
    legal_triggers: Vec<String>,
}

impl CommandOutput for TransitionOutput {
    fn to_human(&self) -> String {
        let verb = if self.persisted { "moved" } else { "would move" };
        let mut lines = vec![format!(
            "Task {} {verb}: {} -> {}",
            self.task_id, self.from, self.to
        )];
        if let Some(feedback) = &self.revision_feedback {
            lines.push(format!("Feedback: {feedback}"));
        }
        if self.legal_triggers.is_empty() {
            lines.push("No further triggers: lifecycle complete.".to_string());
        } else {
            lines.push(format!("Next: {}", self.legal_triggers.join(", ")));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct StepOutput {
    task_id: String,
    state: String,
    current_step: u32,
    completed_steps: u32,
}

impl CommandOutput for StepOutput {
    fn to_human(&self) -> String {
        format!(
            "Task {} ({}): step {}, {} completed",
            self.task_id, self.state, self.current_step, self.completed_steps
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct TriggersOutput {
    state: String,
    known_state: bool,
    triggers: Vec<String>,
}

impl CommandOutput for TriggersOutput {
    fn to_human(&self) -> String {
        if !self.known_state {
            return format!("'{}' is not a state of the workflow.", self.state);
        }
        if self.triggers.is_empty() {
            return format!("{}: no legal triggers.", self.state);
        }
        let mut lines = vec![format!("Legal triggers from {}:", self.state)];
        for trigger in &self.triggers {
            lines.push(format!("  {trigger}"));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct RulesOutput {
    initial_state: String,
    terminal_state: String,
    rules: Vec<TransitionRule>,
}

impl CommandOutput for RulesOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\nInitial: {}  Terminal: {}  Rules: {}",
            TableFormatter::new().format_rules(&self.rules),
            self.initial_state,
            self.terminal_state,
            self.rules.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct BehaviorOutput {
    state: String,
    phase: String,
    substage: String,
    behavior: ArtifactBehavior,
    first_substage: bool,
    appends: bool,
}

impl CommandOutput for BehaviorOutput {
    fn to_human(&self) -> String {
        let action = if self.appends {
            "appends to the existing artifact"
        } else {
            "replaces the artifact"
        };
        format!(
            "{} (phase {}, substage {}): {} - next write {}",
            self.state, self.phase, self.substage, self.behavior, action
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn trigger_names(triggers: &[Trigger]) -> Vec<String> {
    triggers.iter().map(|t| t.as_str().to_string()).collect()
}

pub fn execute(args: WorkflowArgs, config: &Config, json_mode: bool) -> Result<()> {
    match args.command {
        WorkflowCommands::Trigger {
            trigger,
            task,
            feedback,
            dry_run,
        } => {
            let store = open_store(config);
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let mut session = WorkflowSession::load(&store, &task_id)
                .with_context(|| format!("Task not found or its state is not in the workflow: {task_id}"))?;

            let from = session.state().to_string();
            session.execute(&trigger)?;
            if !dry_run {
                session.persist(feedback.as_deref())?;
            }

            let out = TransitionOutput {
                task_id,
                from,
                to: session.state().to_string(),
                trigger: Some(trigger),
                persisted: !dry_run,
                revision_feedback: feedback,
                legal_triggers: trigger_names(&session.legal_triggers()),
            };
            output(&out, json_mode);
        }

        WorkflowCommands::Advance { task, scaffold } => {
            let store = open_store(config);
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let mut session = WorkflowSession::load(&store, &task_id)
                .with_context(|| format!("Task not found or its state is not in the workflow: {task_id}"))?;

            let from = session.state().to_string();
            session.advance(scaffold || config.workflow.scaffolding_mode)?;
            session.persist(None)?;

            let out = TransitionOutput {
                task_id,
                from,
                to: session.state().to_string(),
                trigger: None,
                persisted: true,
                revision_feedback: None,
                legal_triggers: trigger_names(&session.legal_triggers()),
            };
            output(&out, json_mode);
        }

        WorkflowCommands::Step {
            task,
            set,
            complete,
        } => {
            let store = open_store(config);
            let task_id = resolve_task_id(&store, task.as_deref())?;
            let mut session = WorkflowSession::load(&store, &task_id)
                .with_context(|| format!("Task not found or its state is not in the workflow: {task_id}"))?;

            if let Some(step) = set {
                session.set_current_step(step);
            }
            if complete {
                session.complete_step();
            }
            if set.is_some() || complete {
                // Step bookkeeping keeps the stored feedback
                let feedback = session.revision_feedback().map(str::to_string);
                session.persist(feedback.as_deref())?;
            }

            let out = StepOutput {
                task_id,
                state: session.state().to_string(),
                current_step: session.current_step(),
                completed_steps: session.completed_steps(),
            };
            output(&out, json_mode);
        }

        WorkflowCommands::Triggers { task, state } => {
            let state = match state {
                Some(state) => state,
                None => {
                    let store = open_store(config);
                    let task_id = resolve_task_id(&store, task.as_deref())?;
                    WorkflowSession::load(&store, &task_id)
                        .with_context(|| format!("Task not found or its state is not in the workflow: {task_id}"))?
                        .state()
                        .to_string()
                }
            };

            let table = definition();
            let out = TriggersOutput {
                known_state: table.contains_state(&state),
                triggers: trigger_names(&table.legal_triggers(&state)),
                state,
            };
            output(&out, json_mode);
        }

        WorkflowCommands::Rules { phase } => {
            let table = definition();
            let filter = match phase.as_deref() {
                Some(name) => match Phase::from_str(name) {
                    Some(phase) => Some(phase),
                    None => bail!("Unknown phase: {name}"),
                },
                None => None,
            };

            let rules = table
                .rules()
                .iter()
                .filter(|rule| {
                    filter.is_none_or(|phase| split_state(&rule.source).0 == phase.as_str())
                })
                .cloned()
                .collect();

            let out = RulesOutput {
                initial_state: table.initial_state().to_string(),
                terminal_state: table.terminal_state().to_string(),
                rules,
            };
            output(&out, json_mode);
        }

        WorkflowCommands::Behavior { state } => {
            let resolver = ArtifactBehaviorResolver::new();
            let (phase, substage) = ArtifactBehaviorResolver::decompose(&state);
            let out = BehaviorOutput {
                phase: phase.to_string(),
                substage: substage.to_string(),
                behavior: resolver.get_behavior(&state),
                first_substage: resolver.is_first_substage(&state),
                appends: resolver.should_append(&state),
                state,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
