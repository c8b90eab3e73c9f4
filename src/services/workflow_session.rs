//! Binds one task's persisted state to the static transition table.
//!
//! A session is a thin value: the task id, its current composite state and
//! progress counters, plus references to the shared table and the store.
//! `execute` only changes the in-memory copy; nothing is durable until
//! `persist` commits it, so a session that is never persisted is a dry run.

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{WorkflowError, WorkflowResult};
use crate::domain::models::{split_state, Phase, TaskRecord, Trigger};
use crate::domain::ports::TaskStateStore;
use crate::services::state_machine::{definition, StateMachineDefinition};

pub struct WorkflowSession<'a> {
    store: &'a dyn TaskStateStore,
    table: &'a StateMachineDefinition,
    task_id: String,
    state: String,
    revision_feedback: Option<String>,
    current_step: u32,
    completed_steps: u32,
}

impl std::fmt::Debug for WorkflowSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowSession")
            .field("task_id", &self.task_id)
            .field("state", &self.state)
            .field("current_step", &self.current_step)
            .field("completed_steps", &self.completed_steps)
            .finish_non_exhaustive()
    }
}

impl<'a> WorkflowSession<'a> {
    /// Create a task at the lifecycle's initial state.
    pub fn create(store: &'a dyn TaskStateStore, task_id: &str) -> WorkflowResult<Self> {
        Self::create_with(definition(), store, task_id)
    }

    /// [`Self::create`] against an explicit table.
    #[instrument(skip(table, store))]
    pub fn create_with(
        table: &'a StateMachineDefinition,
        store: &'a dyn TaskStateStore,
        task_id: &str,
    ) -> WorkflowResult<Self> {
        if task_id.trim().is_empty() || task_id.trim() != task_id {
            return Err(WorkflowError::InvalidTaskId(task_id.to_string()));
        }

        let record = TaskRecord::new(task_id, table.initial_state());
        store.insert(record.clone())?;
        info!(task_id, state = %record.current_state, "task created");

        Ok(Self::bind(table, store, record))
    }

    /// Bind to an existing task.
    ///
    /// `None` if the id is unknown or its persisted state is not part of the
    /// table; such a record is treated as corrupt and left for inspection.
    pub fn load(store: &'a dyn TaskStateStore, task_id: &str) -> Option<Self> {
        Self::load_with(definition(), store, task_id)
    }

    /// [`Self::load`] against an explicit table.
    pub fn load_with(
        table: &'a StateMachineDefinition,
        store: &'a dyn TaskStateStore,
        task_id: &str,
    ) -> Option<Self> {
        let mut record = store.get(task_id)?;
        if !table.contains_state(&record.current_state) {
            warn!(
                task_id,
                state = %record.current_state,
                "persisted state is not part of the workflow table, refusing to load"
            );
            return None;
        }
        task_id.clone_into(&mut record.task_id);
        Some(Self::bind(table, store, record))
    }

    fn bind(table: &'a StateMachineDefinition, store: &'a dyn TaskStateStore, record: TaskRecord) -> Self {
        Self {
            store,
            table,
            task_id: record.task_id,
            state: record.current_state,
            revision_feedback: record.revision_feedback,
            current_step: record.current_step,
            completed_steps: record.completed_steps,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Current composite state (in memory; may be ahead of the store).
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Phase of the current state, if it names a known phase.
    pub fn phase(&self) -> Option<Phase> {
        Phase::from_str(split_state(&self.state).0)
    }

    pub fn is_terminal(&self) -> bool {
        self.table.is_terminal(&self.state)
    }

    /// Feedback as loaded from the store.
    pub fn revision_feedback(&self) -> Option<&str> {
        self.revision_feedback.as_deref()
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn completed_steps(&self) -> u32 {
        self.completed_steps
    }

    /// Last committed record for this task (not the in-memory state).
    pub fn record(&self) -> Option<TaskRecord> {
        self.store.get(&self.task_id)
    }

    /// Triggers valid from the current state.
    pub fn legal_triggers(&self) -> Vec<Trigger> {
        self.table.legal_triggers(&self.state)
    }

    /// Apply a trigger by name. Unknown names fail like illegal ones.
    pub fn execute(&mut self, trigger: &str) -> WorkflowResult<&str> {
        match Trigger::from_str(trigger) {
            Some(parsed) => self.execute_trigger(parsed),
            None => Err(self.invalid_transition(trigger)),
        }
    }

    /// Apply a trigger. On success the session moves to the destination in
    /// one step; on failure it is left untouched.
    pub fn execute_trigger(&mut self, trigger: Trigger) -> WorkflowResult<&str> {
        let Some(destination) = self.table.destination(trigger, &self.state) else {
            return Err(self.invalid_transition(trigger.as_str()));
        };

        let from_phase = split_state(&self.state).0;
        if split_state(destination).0 != from_phase {
            self.current_step = 0;
            self.completed_steps = 0;
        }

        debug!(
            task_id = %self.task_id,
            from = %self.state,
            to = destination,
            trigger = %trigger,
            "workflow transition"
        );
        self.state = destination.to_string();
        Ok(&self.state)
    }

    /// Leave a verified phase, taking the scaffold branch out of planning
    /// when `scaffolding_mode` is set.
    pub fn advance(&mut self, scaffolding_mode: bool) -> WorkflowResult<&str> {
        let trigger = self.table.advance_trigger(&self.state, scaffolding_mode);
        self.execute_trigger(trigger)
    }

    pub fn set_current_step(&mut self, step: u32) {
        self.current_step = step;
    }

    /// Mark the current step finished and move on to the next one.
    pub fn complete_step(&mut self) {
        self.completed_steps = self.completed_steps.saturating_add(1);
        self.current_step = self.completed_steps.saturating_add(1);
    }

    /// Commit the session's state, counters and `feedback` to the store.
    ///
    /// `feedback` replaces whatever was stored before; `None` clears it.
    /// The whole document is re-read and rewritten, so other records are
    /// preserved as last committed.
    #[instrument(skip(self, feedback), fields(task_id = %self.task_id, state = %self.state))]
    pub fn persist(&mut self, feedback: Option<&str>) -> WorkflowResult<TaskRecord> {
        let mut document = self.store.read();
        let record = document
            .get_mut(&self.task_id)
            .ok_or_else(|| WorkflowError::TaskNotFound(self.task_id.clone()))?;

        record.current_state.clone_from(&self.state);
        record.revision_feedback = feedback.map(str::to_string);
        record.current_step = self.current_step;
        record.completed_steps = self.completed_steps;
        record.touch();
        let snapshot = record.clone();

        self.store.write(&document)?;
        self.revision_feedback = snapshot.revision_feedback.clone();
        info!(has_feedback = feedback.is_some(), "workflow state persisted");

        Ok(snapshot)
    }

    fn invalid_transition(&self, trigger: &str) -> WorkflowError {
        warn!(task_id = %self.task_id, state = %self.state, trigger, "rejected transition");
        WorkflowError::InvalidTransition {
            state: self.state.clone(),
            trigger: trigger.to_string(),
        }
    }
}

impl WorkflowError {
    /// For [`WorkflowError::InvalidTransition`], the triggers that would have
    /// been legal from the offending state. Computed on demand.
    pub fn legal_triggers(&self) -> Option<Vec<Trigger>> {
        match self {
            Self::InvalidTransition { state, .. } => Some(definition().legal_triggers(state)),
            _ => None,
        }
    }
}
