//! JSON file backed task-state store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::errors::StoreError;
use crate::domain::models::StateFile;
use crate::domain::ports::TaskStateStore;

/// Whole-document store kept in one pretty-printed JSON file.
///
/// Every read goes back to disk. Writes land in a temporary file next to the
/// target and are renamed over it, so readers see either the old or the new
/// document and never a partial one.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

fn parent_directory(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

impl TaskStateStore for JsonFileStateStore {
    fn read(&self) -> StateFile {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file missing, starting empty");
                return StateFile::default();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "state file unreadable, treating as empty");
                return StateFile::default();
            }
        };

        if content.trim().is_empty() {
            return StateFile::default();
        }

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    bytes = content.len(),
                    "state file is corrupted, treating as empty; its tasks will be lost on next write"
                );
                StateFile::default()
            }
        }
    }

    fn write(&self, state: &StateFile) -> Result<(), StoreError> {
        let dir = parent_directory(&self.path);
        fs::create_dir_all(dir).map_err(|e| Self::io_error(dir, e))?;

        let serialized = serde_json::to_string_pretty(state)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Self::io_error(dir, e))?;
        tmp.write_all(serialized.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| Self::io_error(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| Self::io_error(&self.path, e.error))?;

        debug!(path = %self.path.display(), tasks = state.len(), "state file written");
        Ok(())
    }
}
