//! Artifact write-mode resolution.
//!
//! Most phases produce a self-contained artifact that is fully replaced every
//! time the phase is (re-)entered. Append-only phases accumulate their
//! sub-stages into one running document instead; their first sub-stage still
//! starts fresh so nothing from a previous run leaks in.

use std::collections::HashMap;

use tracing::trace;

use crate::domain::models::{split_state, substate, ArtifactBehavior, Phase};

/// Registration of an append-only phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOnlyPhase {
    pub first_substage: String,
    pub substages: Vec<String>,
}

/// Decides REPLACE vs APPEND_ONLY for a composite state.
///
/// Unregistered phases are [`ArtifactBehavior::Replace`].
#[derive(Debug, Clone)]
pub struct ArtifactBehaviorResolver {
    append_only: HashMap<String, AppendOnlyPhase>,
}

impl Default for ArtifactBehaviorResolver {
    fn default() -> Self {
        let mut resolver = Self::empty();
        resolver.register(
            Phase::Planning.as_str(),
            substate::STRATEGY,
            &substate::PLANNING_STAGES,
        );
        resolver
    }
}

impl ArtifactBehaviorResolver {
    /// Resolver with planning registered as append-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with no append-only phases.
    pub fn empty() -> Self {
        Self {
            append_only: HashMap::new(),
        }
    }

    /// Opt `phase` into accumulation. Re-registering replaces the entry.
    pub fn register(&mut self, phase: &str, first_substage: &str, all_substages: &[&str]) {
        self.append_only.insert(
            phase.to_string(),
            AppendOnlyPhase {
                first_substage: first_substage.to_string(),
                substages: all_substages.iter().map(|s| (*s).to_string()).collect(),
            },
        );
    }

    pub fn registration(&self, phase: &str) -> Option<&AppendOnlyPhase> {
        self.append_only.get(phase)
    }

    /// Split a composite state into `(phase, substage)`.
    pub fn decompose(state: &str) -> (&str, &str) {
        split_state(state)
    }

    pub fn get_behavior(&self, state: &str) -> ArtifactBehavior {
        let (phase, _) = Self::decompose(state);
        if self.append_only.contains_key(phase) {
            ArtifactBehavior::AppendOnly
        } else {
            ArtifactBehavior::Replace
        }
    }

    /// True only for the registered first sub-stage of an append-only phase.
    pub fn is_first_substage(&self, state: &str) -> bool {
        let (phase, substage) = Self::decompose(state);
        self.append_only
            .get(phase)
            .is_some_and(|registration| registration.first_substage == substage)
    }

    /// Whether the next write for `state` appends to the existing artifact.
    pub fn should_append(&self, state: &str) -> bool {
        let append = self.get_behavior(state) == ArtifactBehavior::AppendOnly
            && !self.is_first_substage(state);
        trace!(state, append, "resolved artifact write mode");
        append
    }
}
