//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::path::PathBuf;

use phasegate::adapters::JsonFileStateStore;
use phasegate::services::WorkflowSession;
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Path for a state file inside a fresh temporary directory.
///
/// The file itself is not created.
pub fn temp_state_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("state.json");
    (dir, path)
}

/// A JSON file store rooted in a fresh temporary directory
pub fn temp_store() -> (TempDir, JsonFileStateStore) {
    let (dir, path) = temp_state_path();
    (dir, JsonFileStateStore::new(path))
}

/// Fire each trigger in order, panicking with context on the first failure.
pub fn drive(session: &mut WorkflowSession<'_>, triggers: &[&str]) {
    for trigger in triggers {
        if let Err(err) = session.execute(trigger) {
            panic!("trigger {trigger} failed from {}: {err}", session.state());
        }
    }
}

/// Triggers that take a standard-cycle phase from working to verified
pub const REVIEW_PASS: [&str; 3] = ["submit_for_ai_review", "ai_approves", "human_approves"];

/// Triggers that take planning from strategy to verified
pub const PLANNING_PASS: [&str; 9] = [
    "submit_for_ai_review",
    "ai_approves",
    "human_approves",
    "submit_for_ai_review",
    "ai_approves",
    "human_approves",
    "submit_for_ai_review",
    "ai_approves",
    "human_approves",
];

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
