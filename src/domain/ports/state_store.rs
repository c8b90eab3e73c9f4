use tracing::{debug, info};

use crate::domain::errors::{StoreError, WorkflowError};
use crate::domain::models::{StateFile, TaskRecord};

/// Port for the durable task-state document.
///
/// Implementors only provide whole-document `read` and `write`; every other
/// operation is a full read-modify-write on top of them. There is no process
/// local cache: each call observes the latest committed document. Concurrent
/// writers are last-writer-wins.
pub trait TaskStateStore: Send + Sync {
    /// Load the whole document. Missing or malformed content reads as empty.
    fn read(&self) -> StateFile;

    /// Replace the whole document in one atomic step.
    fn write(&self, state: &StateFile) -> Result<(), StoreError>;

    /// Insert a new record, failing if the id is taken.
    fn insert(&self, record: TaskRecord) -> Result<(), WorkflowError> {
        let mut state = self.read();
        if state.contains(&record.task_id) {
            return Err(WorkflowError::AlreadyExists(record.task_id));
        }
        debug!(task_id = %record.task_id, state = %record.current_state, "inserting task record");
        state.upsert(record);
        self.write(&state)?;
        Ok(())
    }

    /// Get a record by id.
    fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.read().get(task_id).cloned()
    }

    /// Overwrite an existing record.
    fn update(&self, record: TaskRecord) -> Result<(), WorkflowError> {
        let mut state = self.read();
        if !state.contains(&record.task_id) {
            return Err(WorkflowError::TaskNotFound(record.task_id));
        }
        state.upsert(record);
        self.write(&state)?;
        Ok(())
    }

    /// All records ordered by id.
    fn list(&self) -> Vec<TaskRecord> {
        self.read().records().cloned().collect()
    }

    /// Make `task_id` the single active task.
    fn set_active(&self, task_id: &str) -> Result<(), WorkflowError> {
        let mut state = self.read();
        if !state.contains(task_id) {
            return Err(WorkflowError::TaskNotFound(task_id.to_string()));
        }
        for (key, record) in &mut state.tasks {
            let active = key == task_id;
            if record.is_active != active {
                record.is_active = active;
                record.touch();
            }
        }
        self.write(&state)?;
        info!(task_id, "active task set");
        Ok(())
    }

    /// Id of the active task, if any.
    fn get_active(&self) -> Option<String> {
        self.read().active_id().map(str::to_string)
    }

    /// Clear the active marker on every record.
    fn clear_active(&self) -> Result<(), WorkflowError> {
        let mut state = self.read();
        let mut changed = false;
        for record in state.tasks.values_mut().filter(|r| r.is_active) {
            record.is_active = false;
            record.touch();
            changed = true;
        }
        if changed {
            self.write(&state)?;
        }
        Ok(())
    }
}
