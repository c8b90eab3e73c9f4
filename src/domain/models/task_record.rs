//! Persisted per-task workflow state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Durable progress of one task through the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique, immutable identifier.
    pub task_id: String,
    /// Composite `phase_substate` token.
    pub current_state: String,
    /// Feedback attached by the last transition that carried any.
    #[serde(default)]
    pub revision_feedback: Option<String>,
    /// At most one record in a store has this set.
    #[serde(default)]
    pub is_active: bool,
    /// Step currently being worked on in a multi-step phase.
    #[serde(default)]
    pub current_step: u32,
    /// Number of steps finished in the current phase.
    #[serde(default)]
    pub completed_steps: u32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// New inactive record at `initial_state`.
    pub fn new(task_id: impl Into<String>, initial_state: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            current_state: initial_state.into(),
            revision_feedback: None,
            is_active: false,
            current_step: 0,
            completed_steps: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// The whole backing document: `task_id -> TaskRecord`.
///
/// The map key is authoritative. A record whose embedded `task_id` disagrees
/// with its key is rewritten to match on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StateFile {
    pub tasks: BTreeMap<String, TaskRecord>,
}

impl<'de> Deserialize<'de> for StateFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut tasks = BTreeMap::<String, TaskRecord>::deserialize(deserializer)?;
        for (key, record) in &mut tasks {
            if record.task_id != *key {
                warn!(key = %key, task_id = %record.task_id, "record id does not match its key, using the key");
                record.task_id.clone_from(key);
            }
        }
        Ok(Self { tasks })
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskRecord> {
        self.tasks.get(task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.contains_key(task_id)
    }

    /// Insert or overwrite the record keyed by its own `task_id`.
    pub fn upsert(&mut self, record: TaskRecord) {
        self.tasks.insert(record.task_id.clone(), record);
    }

    /// First record flagged active, if any.
    pub fn active(&self) -> Option<&TaskRecord> {
        self.tasks.values().find(|r| r.is_active)
    }

    /// Key of the first record flagged active, if any.
    pub fn active_id(&self) -> Option<&str> {
        self.tasks
            .iter()
            .find(|(_, r)| r.is_active)
            .map(|(key, _)| key.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.values()
    }
}
