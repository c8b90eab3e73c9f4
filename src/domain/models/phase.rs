//! Lifecycle phases and composite state tokens.
//!
//! A composite state is the `phase_substate` string persisted for every task
//! (e.g. `coding_aireview`). Phase tokens never contain the delimiter, so the
//! first `_` always separates the phase from its sub-state.

use serde::{Deserialize, Serialize};

/// Delimiter between the phase token and the sub-state token.
pub const STATE_DELIMITER: char = '_';

/// Sub-state used when a composite state carries no explicit sub-state.
pub const DEFAULT_SUBSTATE: &str = "working";

/// Standard review lifecycle sub-states.
pub mod substate {
    /// Work in progress.
    pub const WORKING: &str = "working";
    /// Awaiting AI review.
    pub const AI_REVIEW: &str = "aireview";
    /// Awaiting developer (human) review.
    pub const DEV_REVIEW: &str = "devreview";
    /// Phase accepted.
    pub const VERIFIED: &str = "verified";

    /// Planning stage one: overall strategy.
    pub const STRATEGY: &str = "strategy";
    /// Planning stage two: solution design.
    pub const SOLUTION_DESIGN: &str = "solutiondesign";
    /// Planning stage three: execution plan.
    pub const EXECUTION_PLAN: &str = "executionplan";

    /// Planning's bespoke stages, in order.
    pub const PLANNING_STAGES: [&str; 3] = [STRATEGY, SOLUTION_DESIGN, EXECUTION_PLAN];
}

/// Top-level lifecycle stage of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Requirements are gathered and submitted straight to verified.
    GatherRequirements,
    /// Branch and repository preparation.
    GitSetup,
    /// Strategy, solution design and execution plan.
    Planning,
    /// Optional project scaffolding.
    Scaffold,
    /// Implementation.
    Coding,
    /// Test authoring and execution.
    Testing,
    /// Wrap-up: docs, PR description, cleanup.
    Finalize,
    /// Terminal phase.
    Done,
}

impl Phase {
    /// All phases in lifecycle order.
    pub const ALL: [Self; 8] = [
        Self::GatherRequirements,
        Self::GitSetup,
        Self::Planning,
        Self::Scaffold,
        Self::Coding,
        Self::Testing,
        Self::Finalize,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GatherRequirements => "gatherrequirements",
            Self::GitSetup => "gitsetup",
            Self::Planning => "planning",
            Self::Scaffold => "scaffold",
            Self::Coding => "coding",
            Self::Testing => "testing",
            Self::Finalize => "finalize",
            Self::Done => "done",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.as_str() == s)
    }

    /// 1-based position in the lifecycle; used to prefix archive snapshots.
    pub fn order(&self) -> u8 {
        match self {
            Self::GatherRequirements => 1,
            Self::GitSetup => 2,
            Self::Planning => 3,
            Self::Scaffold => 4,
            Self::Coding => 5,
            Self::Testing => 6,
            Self::Finalize => 7,
            Self::Done => 8,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::GatherRequirements => "Requirements gathering",
            Self::GitSetup => "Git setup",
            Self::Planning => "Planning",
            Self::Scaffold => "Scaffolding",
            Self::Coding => "Coding",
            Self::Testing => "Testing",
            Self::Finalize => "Finalize",
            Self::Done => "Done",
        }
    }

    /// Composite state token for a sub-state of this phase.
    pub fn state(&self, substate: &str) -> String {
        format!("{}{STATE_DELIMITER}{substate}", self.as_str())
    }

    /// `phase_working`.
    pub fn working(&self) -> String {
        self.state(substate::WORKING)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a composite state on its first delimiter.
///
/// A missing delimiter yields the whole string as the phase and
/// [`DEFAULT_SUBSTATE`]; the empty string yields an empty phase.
pub fn split_state(state: &str) -> (&str, &str) {
    match state.split_once(STATE_DELIMITER) {
        Some((phase, substate)) => (phase, substate),
        None => (state, DEFAULT_SUBSTATE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trip_through_token() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_str(phase.as_str()), Some(phase));
        }
        assert_eq!(Phase::from_str("deploy"), None);
    }

    #[test]
    fn test_phase_order_is_strictly_increasing() {
        let orders: Vec<u8> = Phase::ALL.iter().map(Phase::order).collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_phase_serde_uses_token() {
        let json = serde_json::to_string(&Phase::GatherRequirements).unwrap();
        assert_eq!(json, "\"gatherrequirements\"");
    }

    #[test]
    fn test_split_state() {
        assert_eq!(split_state("coding_aireview"), ("coding", "aireview"));
        assert_eq!(split_state("planning_strategydevreview"), ("planning", "strategydevreview"));
        assert_eq!(split_state("done"), ("done", "working"));
        assert_eq!(split_state(""), ("", "working"));
        assert_eq!(split_state("a_b_c"), ("a", "b_c"));
    }
}
