//! In-process task-state store.
//!
//! Same semantics as the JSON file store minus durability. Used by tests and
//! by dry-run tooling that must not touch the real state file.

use std::sync::RwLock;

use crate::domain::errors::StoreError;
use crate::domain::models::StateFile;
use crate::domain::ports::TaskStateStore;

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    document: RwLock<StateFile>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing document.
    pub fn with_state(state: StateFile) -> Self {
        Self {
            document: RwLock::new(state),
        }
    }
}

impl TaskStateStore for InMemoryStateStore {
    fn read(&self) -> StateFile {
        match self.document.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write(&self, state: &StateFile) -> Result<(), StoreError> {
        let mut guard = match self.document.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = state.clone();
        Ok(())
    }
}
