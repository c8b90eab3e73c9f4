//! Per-task artifact files.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/<task_id>/artifact.md            live artifact
//! <root>/<task_id>/archive/NN-<phase>.md  immutable snapshots
//! ```

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::Phase;
use crate::services::ArtifactBehaviorResolver;

pub const ARTIFACT_FILE_NAME: &str = "artifact.md";
pub const ARCHIVE_DIR_NAME: &str = "archive";

/// Artifact I/O failures
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid task id for artifact path: {0:?}")]
    InvalidTaskId(String),

    #[error("No artifact to archive at {0}")]
    NothingToArchive(String),
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// What a single write did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub path: PathBuf,
    pub state: String,
    pub appended: bool,
    pub bytes_written: usize,
}

/// Writes one task's artifact, asking the resolver before every write.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    task_dir: PathBuf,
    resolver: ArtifactBehaviorResolver,
}

impl ArtifactWriter {
    /// Writer for `task_id` under `root` using the default resolver.
    pub fn new(root: impl AsRef<Path>, task_id: &str) -> Result<Self, ArtifactError> {
        Self::with_resolver(root, task_id, ArtifactBehaviorResolver::new())
    }

    pub fn with_resolver(
        root: impl AsRef<Path>,
        task_id: &str,
        resolver: ArtifactBehaviorResolver,
    ) -> Result<Self, ArtifactError> {
        validate_task_id(task_id)?;
        Ok(Self {
            task_dir: root.as_ref().join(task_id),
            resolver,
        })
    }

    pub fn task_dir(&self) -> &Path {
        &self.task_dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.task_dir.join(ARTIFACT_FILE_NAME)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.task_dir.join(ARCHIVE_DIR_NAME)
    }

    /// Write `content` for the given composite state.
    ///
    /// Appends when the resolver says so, otherwise atomically replaces the
    /// live artifact. The content itself is never examined.
    pub fn write(&self, state: &str, content: &str) -> Result<WriteReport, ArtifactError> {
        let appended = self.resolver.should_append(state);
        let path = self.artifact_path();

        fs::create_dir_all(&self.task_dir).map_err(|e| ArtifactError::io(&self.task_dir, e))?;

        if appended {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| ArtifactError::io(&path, e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| ArtifactError::io(&path, e))?;
        } else {
            let mut tmp =
                NamedTempFile::new_in(&self.task_dir).map_err(|e| ArtifactError::io(&path, e))?;
            tmp.write_all(content.as_bytes())
                .map_err(|e| ArtifactError::io(&path, e))?;
            tmp.as_file()
                .sync_all()
                .map_err(|e| ArtifactError::io(&path, e))?;
            tmp.persist(&path)
                .map_err(|e| ArtifactError::io(&path, e.error))?;
        }

        debug!(path = %path.display(), state, appended, bytes = content.len(), "artifact written");

        Ok(WriteReport {
            path,
            state: state.to_string(),
            appended,
            bytes_written: content.len(),
        })
    }

    /// Current live artifact, if one exists.
    pub fn read(&self) -> Result<Option<String>, ArtifactError> {
        let path = self.artifact_path();
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ArtifactError::io(&path, err)),
        }
    }

    /// Snapshot the live artifact as `archive/NN-<phase>.md`.
    ///
    /// An existing snapshot is never overwritten; later snapshots of the
    /// same phase get a `-2`, `-3`, ... suffix.
    pub fn archive(&self, phase: Phase) -> Result<PathBuf, ArtifactError> {
        let source = self.artifact_path();
        if !source.is_file() {
            return Err(ArtifactError::NothingToArchive(source.display().to_string()));
        }

        let archive_dir = self.archive_dir();
        fs::create_dir_all(&archive_dir).map_err(|e| ArtifactError::io(&archive_dir, e))?;

        let content = fs::read(&source).map_err(|e| ArtifactError::io(&source, e))?;
        let stem = snapshot_stem(phase);

        let mut attempt = 1u32;
        loop {
            let name = if attempt == 1 {
                format!("{stem}.md")
            } else {
                format!("{stem}-{attempt}.md")
            };
            let target = archive_dir.join(name);

            // create_new makes the existence check and the create one step
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(mut file) => {
                    file.write_all(&content)
                        .map_err(|e| ArtifactError::io(&target, e))?;
                    info!(path = %target.display(), phase = %phase, "artifact archived");
                    return Ok(target);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(err) => return Err(ArtifactError::io(&target, err)),
            }
        }
    }

    /// Archived snapshots in lifecycle order, repeats of a phase in the
    /// order they were taken.
    pub fn list_archive(&self) -> Result<Vec<PathBuf>, ArtifactError> {
        let archive_dir = self.archive_dir();
        let entries = match fs::read_dir(&archive_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(ArtifactError::io(&archive_dir, err)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::io(&archive_dir, e))?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort_by_cached_key(|path| archive_sort_key(path));
        Ok(paths)
    }
}

/// `(NN-<phase>, sequence)` for a snapshot path. The unsuffixed snapshot is
/// sequence 1; `NN-<phase>-K.md` is sequence `K`.
fn archive_sort_key(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if let Some((base, suffix)) = stem.rsplit_once('-') {
        if base.contains('-') {
            if let Ok(sequence) = suffix.parse() {
                return (base.to_string(), sequence);
            }
        }
    }
    (stem, 1)
}

/// `NN-<phase>` with `NN` the zero-padded phase order.
pub fn snapshot_stem(phase: Phase) -> String {
    format!("{:02}-{}", phase.order(), phase.as_str())
}

fn validate_task_id(task_id: &str) -> Result<(), ArtifactError> {
    let trimmed = task_id.trim();
    if trimmed.is_empty()
        || trimmed != task_id
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
    {
        return Err(ArtifactError::InvalidTaskId(task_id.to_string()));
    }
    Ok(())
}
