//! Task id resolution for CLI commands.
//!
//! Commands accept a full id, any unique prefix of one (like git short
//! hashes), or nothing at all to mean the active task.

use anyhow::{bail, Result};

use crate::domain::ports::TaskStateStore;

/// Resolve an optional id argument to a stored task id.
pub fn resolve_task_id(store: &dyn TaskStateStore, requested: Option<&str>) -> Result<String> {
    match requested {
        Some(prefix) => resolve_prefix(store, prefix),
        None => match store.get_active() {
            Some(task_id) => Ok(task_id),
            None => bail!("No task id given and no active task is set (see `phasegate task activate`)"),
        },
    }
}

fn resolve_prefix(store: &dyn TaskStateStore, prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("Task id must not be empty");
    }

    let document = store.read();
    if document.contains(prefix) {
        return Ok(prefix.to_string());
    }

    let matches: Vec<&str> = document
        .records()
        .map(|record| record.task_id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => bail!("No task found matching '{prefix}'"),
        [single] => Ok((*single).to_string()),
        _ => bail!(
            "Ambiguous task id '{}': matches {} tasks ({})",
            prefix,
            matches.len(),
            matches.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStateStore;
    use crate::domain::models::TaskRecord;

    fn store_with(ids: &[&str]) -> InMemoryStateStore {
        let store = InMemoryStateStore::new();
        for id in ids {
            store
                .insert(TaskRecord::new(*id, "gatherrequirements_working"))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_exact_match_wins_over_prefix() {
        let store = store_with(&["abc", "abcd"]);
        assert_eq!(resolve_task_id(&store, Some("abc")).unwrap(), "abc");
    }

    #[test]
    fn test_unique_prefix() {
        let store = store_with(&["feature-login", "bugfix-42"]);
        assert_eq!(resolve_task_id(&store, Some("feat")).unwrap(), "feature-login");
    }

    #[test]
    fn test_ambiguous_prefix() {
        let store = store_with(&["task-1", "task-2"]);
        let err = resolve_task_id(&store, Some("task")).unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[test]
    fn test_unknown_prefix() {
        let store = store_with(&["task-1"]);
        assert!(resolve_task_id(&store, Some("zzz")).is_err());
    }

    #[test]
    fn test_falls_back_to_active_task() {
        let store = store_with(&["task-1", "task-2"]);
        assert!(resolve_task_id(&store, None).is_err());

        store.set_active("task-2").unwrap();
        assert_eq!(resolve_task_id(&store, None).unwrap(), "task-2");
    }
}
