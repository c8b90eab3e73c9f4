//! Triggers and transition rules.

use serde::{Deserialize, Serialize};

/// Named action that attempts to move a task out of its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Hand the working artifact to the AI reviewer.
    SubmitForAiReview,
    /// AI reviewer accepts; hand over to the developer.
    AiApproves,
    /// Either reviewer sends the work back.
    RequestRevision,
    /// Developer accepts.
    HumanApproves,
    /// Requirements skip review and go straight to verified.
    SubmitRequirements,
    /// Move from a verified phase into the next phase.
    Advance,
    /// Leave planning through the scaffolding branch.
    AdvanceToScaffold,
}

impl Trigger {
    pub const ALL: [Self; 7] = [
        Self::SubmitForAiReview,
        Self::AiApproves,
        Self::RequestRevision,
        Self::HumanApproves,
        Self::SubmitRequirements,
        Self::Advance,
        Self::AdvanceToScaffold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmitForAiReview => "submit_for_ai_review",
            Self::AiApproves => "ai_approves",
            Self::RequestRevision => "request_revision",
            Self::HumanApproves => "human_approves",
            Self::SubmitRequirements => "submit_requirements",
            Self::Advance => "advance",
            Self::AdvanceToScaffold => "advance_to_scaffold",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == normalized)
    }

    /// Whether this trigger crosses a phase boundary.
    pub fn is_advance(&self) -> bool {
        matches!(self, Self::Advance | Self::AdvanceToScaffold)
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(trigger, source, destination)` entry of the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionRule {
    pub trigger: Trigger,
    pub source: String,
    pub destination: String,
}

impl TransitionRule {
    pub fn new(trigger: Trigger, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            trigger,
            source: source.into(),
            destination: destination.into(),
        }
    }
}
