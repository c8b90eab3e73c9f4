//! End-to-end lifecycle through the JSON file store.
//!
//! Each step reopens the store from its path, the way separate tool
//! invocations would.

mod common;

use common::{drive, temp_state_path, PLANNING_PASS, REVIEW_PASS};
use phasegate::adapters::JsonFileStateStore;
use phasegate::domain::models::{Phase, Trigger};
use phasegate::domain::ports::TaskStateStore;
use phasegate::services::{definition, WorkflowSession};
use phasegate::WorkflowError;

fn advance_and_persist(path: &std::path::Path, task_id: &str, scaffolding_mode: bool) -> String {
    let store = JsonFileStateStore::new(path);
    let mut session = WorkflowSession::load(&store, task_id).expect("task should exist");
    session.advance(scaffolding_mode).expect("advance should be legal");
    session.persist(None).expect("persist should succeed");
    session.state().to_string()
}

fn review_and_persist(path: &std::path::Path, task_id: &str, triggers: &[&str]) -> String {
    let store = JsonFileStateStore::new(path);
    let mut session = WorkflowSession::load(&store, task_id).expect("task should exist");
    drive(&mut session, triggers);
    session.persist(None).expect("persist should succeed");
    session.state().to_string()
}

#[test]
fn test_full_lifecycle_without_scaffold() {
    common::setup_test_logging();
    let (_dir, path) = temp_state_path();

    {
        let store = JsonFileStateStore::new(&path);
        let mut session = WorkflowSession::create(&store, "feature-login").unwrap();
        session.execute("submit_requirements").unwrap();
        session.persist(None).unwrap();
    }

    assert_eq!(advance_and_persist(&path, "feature-login", false), "gitsetup_working");
    assert_eq!(review_and_persist(&path, "feature-login", &REVIEW_PASS), "gitsetup_verified");
    assert_eq!(advance_and_persist(&path, "feature-login", false), "planning_strategy");
    assert_eq!(review_and_persist(&path, "feature-login", &PLANNING_PASS), "planning_verified");
    assert_eq!(advance_and_persist(&path, "feature-login", false), "coding_working");
    assert_eq!(review_and_persist(&path, "feature-login", &REVIEW_PASS), "coding_verified");
    assert_eq!(advance_and_persist(&path, "feature-login", false), "testing_working");
    assert_eq!(review_and_persist(&path, "feature-login", &REVIEW_PASS), "testing_verified");
    assert_eq!(advance_and_persist(&path, "feature-login", false), "finalize_working");
    assert_eq!(review_and_persist(&path, "feature-login", &REVIEW_PASS), "finalize_verified");
    assert_eq!(advance_and_persist(&path, "feature-login", false), "done");

    let store = JsonFileStateStore::new(&path);
    let session = WorkflowSession::load(&store, "feature-login").unwrap();
    assert!(session.is_terminal());
    assert!(session.legal_triggers().is_empty());
}

#[test]
fn test_scaffold_branch_merges_into_coding() {
    let (_dir, path) = temp_state_path();
    let store = JsonFileStateStore::new(&path);

    let mut session = WorkflowSession::create(&store, "T-scaffold").unwrap();
    session.execute("submit_requirements").unwrap();
    session.advance(true).unwrap();
    drive(&mut session, &REVIEW_PASS);
    session.advance(true).unwrap();
    drive(&mut session, &PLANNING_PASS);
    assert_eq!(session.state(), "planning_verified");

    session.advance(true).unwrap();
    assert_eq!(session.state(), "scaffold_working");
    drive(&mut session, &REVIEW_PASS);
    session.advance(true).unwrap();
    assert_eq!(session.state(), "coding_working");
    session.persist(None).unwrap();

    let reopened = JsonFileStateStore::new(&path);
    assert_eq!(reopened.get("T-scaffold").unwrap().current_state, "coding_working");
}

#[test]
fn test_review_cycle_for_every_standard_phase() {
    let table = definition();
    for phase in [Phase::GitSetup, Phase::Scaffold, Phase::Coding, Phase::Testing, Phase::Finalize] {
        let mut state = phase.working();
        for (trigger, expected) in [
            (Trigger::SubmitForAiReview, phase.state("aireview")),
            (Trigger::AiApproves, phase.state("devreview")),
            (Trigger::HumanApproves, phase.state("verified")),
        ] {
            state = table
                .destination(trigger, &state)
                .unwrap_or_else(|| panic!("{trigger} should be legal from {state}"))
                .to_string();
            assert_eq!(state, expected);
        }

        let verified = phase.state("verified");
        assert!(table.destination(Trigger::RequestRevision, &verified).is_none());
        assert!(table.destination(Trigger::HumanApproves, &verified).is_none());
    }
}

#[test]
fn test_testing_revisions_return_to_coding() {
    let (_dir, store) = common::temp_store();
    let mut session = WorkflowSession::create(&store, "T-rev").unwrap();
    session.execute("submit_requirements").unwrap();
    session.advance(false).unwrap();
    drive(&mut session, &REVIEW_PASS);
    session.advance(false).unwrap();
    drive(&mut session, &PLANNING_PASS);
    session.advance(false).unwrap();
    drive(&mut session, &REVIEW_PASS);
    session.advance(false).unwrap();
    assert_eq!(session.state(), "testing_working");

    drive(&mut session, &["submit_for_ai_review", "ai_approves", "request_revision"]);
    assert_eq!(session.state(), "coding_working");
    let record = session.persist(Some("integration tests fail on CI")).unwrap();
    assert_eq!(record.revision_feedback.as_deref(), Some("integration tests fail on CI"));
}

#[test]
fn test_rejected_trigger_does_not_touch_the_file() {
    let (_dir, path) = temp_state_path();
    let store = JsonFileStateStore::new(&path);
    WorkflowSession::create(&store, "T-1").unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut session = WorkflowSession::load(&store, "T-1").unwrap();
    let err = session.execute("human_approves").unwrap_err();
    match &err {
        WorkflowError::InvalidTransition { state, trigger } => {
            assert_eq!(state, "gatherrequirements_working");
            assert_eq!(trigger, "human_approves");
        }
        other => panic!("Expected InvalidTransition, got {other:?}"),
    }
    assert_eq!(err.legal_triggers(), Some(vec![Trigger::SubmitRequirements]));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_dry_run_then_persist() {
    let (_dir, path) = temp_state_path();
    let store = JsonFileStateStore::new(&path);
    let mut session = WorkflowSession::create(&store, "T-1").unwrap();

    session.execute("submit_requirements").unwrap();
    assert_eq!(
        JsonFileStateStore::new(&path).get("T-1").unwrap().current_state,
        "gatherrequirements_working"
    );

    session.persist(None).unwrap();
    assert_eq!(
        JsonFileStateStore::new(&path).get("T-1").unwrap().current_state,
        "gatherrequirements_verified"
    );
}

#[test]
fn test_two_tasks_progress_independently() {
    let (_dir, path) = temp_state_path();
    let store = JsonFileStateStore::new(&path);

    let mut first = WorkflowSession::create(&store, "first").unwrap();
    let mut second = WorkflowSession::create(&store, "second").unwrap();
    store.set_active("second").unwrap();

    first.execute("submit_requirements").unwrap();
    first.persist(None).unwrap();
    second.execute("submit_requirements").unwrap();
    second.advance(false).unwrap();
    second.persist(None).unwrap();

    let reopened = JsonFileStateStore::new(&path);
    assert_eq!(reopened.get("first").unwrap().current_state, "gatherrequirements_verified");
    assert_eq!(reopened.get("second").unwrap().current_state, "gitsetup_working");
    assert_eq!(reopened.get_active().as_deref(), Some("second"));
}
