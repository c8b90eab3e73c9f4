//! Static workflow transition table.
//!
//! The hierarchical lifecycle is flattened into fully-qualified
//! `phase_substate` tokens plus an explicit `(trigger, source) -> destination`
//! relation. The table is pure data: it is composed once per process and
//! shared read-only by every session.
//!
//! ```text
//! gatherrequirements ─▶ gitsetup ─▶ planning[strategy ▶ solutiondesign ▶ executionplan]
//!                                        │
//!                         ┌──────────────┴─────────────┐
//!                         ▼ advance_to_scaffold        ▼ advance
//!                      scaffold ───── advance ─────▶ coding ─▶ testing ─▶ finalize ─▶ done
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

use crate::domain::errors::DefinitionError;
use crate::domain::models::{substate, Phase, TransitionRule, Trigger};

/// A phase, its ordered sub-states and the sub-state it is entered at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseDefinition {
    pub phase: Phase,
    /// Ordered sub-states. Empty for the terminal phase, whose only state is
    /// the bare phase token.
    pub substates: Vec<String>,
    pub entry: String,
}

impl PhaseDefinition {
    fn new(phase: Phase, substates: &[&str], entry: &str) -> Self {
        Self {
            phase,
            substates: substates.iter().map(|s| (*s).to_string()).collect(),
            entry: entry.to_string(),
        }
    }

    /// Composite state tokens of this phase, in declaration order.
    pub fn states(&self) -> Vec<String> {
        if self.substates.is_empty() {
            return vec![self.phase.as_str().to_string()];
        }
        self.substates.iter().map(|s| self.phase.state(s)).collect()
    }

    /// Composite token of the entry sub-state.
    pub fn entry_state(&self) -> String {
        if self.substates.is_empty() {
            self.phase.as_str().to_string()
        } else {
            self.phase.state(&self.entry)
        }
    }
}

/// Generate the standard five-rule review cycle for `phase`.
///
/// ```text
/// submit_for_ai_review : working   -> aireview
/// ai_approves          : aireview  -> devreview
/// request_revision     : aireview  -> revision_destination
/// request_revision     : devreview -> revision_destination
/// human_approves       : devreview -> verified
/// ```
pub fn generate_review_cycle(phase: Phase, revision_destination: &str) -> Vec<TransitionRule> {
    let working = phase.state(substate::WORKING);
    let ai_review = phase.state(substate::AI_REVIEW);
    let dev_review = phase.state(substate::DEV_REVIEW);
    let verified = phase.state(substate::VERIFIED);

    vec![
        TransitionRule::new(Trigger::SubmitForAiReview, working, ai_review.clone()),
        TransitionRule::new(Trigger::AiApproves, ai_review.clone(), dev_review.clone()),
        TransitionRule::new(Trigger::RequestRevision, ai_review, revision_destination),
        TransitionRule::new(Trigger::RequestRevision, dev_review.clone(), revision_destination),
        TransitionRule::new(Trigger::HumanApproves, dev_review, verified),
    ]
}

/// Review cycle whose revisions return to the phase's own working state.
pub fn review_cycle(phase: Phase) -> Vec<TransitionRule> {
    generate_review_cycle(phase, &phase.working())
}

/// Requirements skip review entirely.
pub fn requirements_rules() -> Vec<TransitionRule> {
    let phase = Phase::GatherRequirements;
    vec![TransitionRule::new(
        Trigger::SubmitRequirements,
        phase.working(),
        phase.state(substate::VERIFIED),
    )]
}

/// Planning's three-stage chain. Each stage gets its own AI and developer
/// review; developer approval of one stage enters the next.
pub fn planning_chain() -> Vec<TransitionRule> {
    let phase = Phase::Planning;
    let stages = substate::PLANNING_STAGES;
    let mut rules = Vec::with_capacity(stages.len() * 5);

    for (i, stage) in stages.iter().enumerate() {
        let working = phase.state(stage);
        let ai_review = phase.state(&format!("{stage}{}", substate::AI_REVIEW));
        let dev_review = phase.state(&format!("{stage}{}", substate::DEV_REVIEW));
        let next = stages
            .get(i + 1)
            .map_or_else(|| phase.state(substate::VERIFIED), |s| phase.state(s));

        rules.push(TransitionRule::new(Trigger::SubmitForAiReview, working.clone(), ai_review.clone()));
        rules.push(TransitionRule::new(Trigger::AiApproves, ai_review.clone(), dev_review.clone()));
        rules.push(TransitionRule::new(Trigger::RequestRevision, ai_review, working.clone()));
        rules.push(TransitionRule::new(Trigger::RequestRevision, dev_review.clone(), working));
        rules.push(TransitionRule::new(Trigger::HumanApproves, dev_review, next));
    }

    rules
}

/// Inter-phase rules, including the scaffold fork and its merge into coding.
pub fn advance_rules() -> Vec<TransitionRule> {
    let verified = |phase: Phase| phase.state(substate::VERIFIED);

    vec![
        TransitionRule::new(Trigger::Advance, verified(Phase::GatherRequirements), Phase::GitSetup.working()),
        TransitionRule::new(
            Trigger::Advance,
            verified(Phase::GitSetup),
            Phase::Planning.state(substate::STRATEGY),
        ),
        TransitionRule::new(Trigger::Advance, verified(Phase::Planning), Phase::Coding.working()),
        TransitionRule::new(Trigger::AdvanceToScaffold, verified(Phase::Planning), Phase::Scaffold.working()),
        TransitionRule::new(Trigger::Advance, verified(Phase::Scaffold), Phase::Coding.working()),
        TransitionRule::new(Trigger::Advance, verified(Phase::Coding), Phase::Testing.working()),
        TransitionRule::new(Trigger::Advance, verified(Phase::Testing), Phase::Finalize.working()),
        TransitionRule::new(Trigger::Advance, verified(Phase::Finalize), Phase::Done.as_str()),
    ]
}

/// Phases, their sub-states and entry points.
pub fn phase_definitions() -> Vec<PhaseDefinition> {
    let standard = [substate::WORKING, substate::AI_REVIEW, substate::DEV_REVIEW, substate::VERIFIED];

    let mut planning: Vec<String> = Vec::new();
    for stage in substate::PLANNING_STAGES {
        planning.push(stage.to_string());
        planning.push(format!("{stage}{}", substate::AI_REVIEW));
        planning.push(format!("{stage}{}", substate::DEV_REVIEW));
    }
    planning.push(substate::VERIFIED.to_string());
    let planning: Vec<&str> = planning.iter().map(String::as_str).collect();

    vec![
        PhaseDefinition::new(
            Phase::GatherRequirements,
            &[substate::WORKING, substate::VERIFIED],
            substate::WORKING,
        ),
        PhaseDefinition::new(Phase::GitSetup, &standard, substate::WORKING),
        PhaseDefinition::new(Phase::Planning, &planning, substate::STRATEGY),
        PhaseDefinition::new(Phase::Scaffold, &standard, substate::WORKING),
        PhaseDefinition::new(Phase::Coding, &standard, substate::WORKING),
        PhaseDefinition::new(Phase::Testing, &standard, substate::WORKING),
        PhaseDefinition::new(Phase::Finalize, &standard, substate::WORKING),
        PhaseDefinition::new(Phase::Done, &[], ""),
    ]
}

/// Concatenate every rule group into the validated lifecycle table.
pub fn compose_full_table() -> Result<StateMachineDefinition, DefinitionError> {
    let mut rules = requirements_rules();
    rules.extend(review_cycle(Phase::GitSetup));
    rules.extend(planning_chain());
    rules.extend(review_cycle(Phase::Scaffold));
    rules.extend(review_cycle(Phase::Coding));
    rules.extend(generate_review_cycle(Phase::Testing, &Phase::Coding.working()));
    rules.extend(review_cycle(Phase::Finalize));
    rules.extend(advance_rules());

    StateMachineDefinition::new(
        phase_definitions(),
        rules,
        Phase::GatherRequirements.working(),
        Phase::Done.as_str().to_string(),
    )
}

/// Process-wide lifecycle table.
///
/// # Panics
///
/// Panics on first use if the built-in table is inconsistent. That can only
/// happen through a change to this module and is meant to fail at startup.
pub fn definition() -> &'static StateMachineDefinition {
    static DEFINITION: OnceLock<StateMachineDefinition> = OnceLock::new();
    DEFINITION.get_or_init(|| {
        compose_full_table().unwrap_or_else(|err| panic!("built-in workflow table is invalid: {err}"))
    })
}

/// Validated, immutable transition table.
#[derive(Debug, Clone)]
pub struct StateMachineDefinition {
    phases: Vec<PhaseDefinition>,
    rules: Vec<TransitionRule>,
    states: Vec<String>,
    by_source: BTreeMap<String, BTreeMap<Trigger, String>>,
    initial: String,
    terminal: String,
}

impl StateMachineDefinition {
    /// Build and validate a table.
    ///
    /// Rejects two rules sharing `(trigger, source)` with different
    /// destinations, rules touching undeclared states, and non-terminal
    /// states without an outbound rule. Exact duplicate rules collapse.
    pub fn new(
        phases: Vec<PhaseDefinition>,
        rules: Vec<TransitionRule>,
        initial: String,
        terminal: String,
    ) -> Result<Self, DefinitionError> {
        let states: Vec<String> = phases.iter().flat_map(PhaseDefinition::states).collect();
        let declared: HashSet<&str> = states.iter().map(String::as_str).collect();

        for endpoint in [&initial, &terminal] {
            if !declared.contains(endpoint.as_str()) {
                return Err(DefinitionError::UnknownState(endpoint.clone()));
            }
        }

        let mut by_source: BTreeMap<String, BTreeMap<Trigger, String>> = BTreeMap::new();
        let mut unique_rules = Vec::with_capacity(rules.len());

        for rule in rules {
            for endpoint in [&rule.source, &rule.destination] {
                if !declared.contains(endpoint.as_str()) {
                    return Err(DefinitionError::UnknownState(endpoint.clone()));
                }
            }

            let outbound = by_source.entry(rule.source.clone()).or_default();
            match outbound.get(&rule.trigger) {
                Some(existing) if *existing == rule.destination => continue,
                Some(existing) => {
                    return Err(DefinitionError::AmbiguousTrigger {
                        trigger: rule.trigger,
                        source_state: rule.source,
                        first: existing.clone(),
                        second: rule.destination,
                    });
                }
                None => {
                    outbound.insert(rule.trigger, rule.destination.clone());
                    unique_rules.push(rule);
                }
            }
        }

        if let Some(dead_end) = states
            .iter()
            .find(|s| **s != terminal && !by_source.contains_key(s.as_str()))
        {
            return Err(DefinitionError::DeadEnd(dead_end.clone()));
        }

        debug!(
            phases = phases.len(),
            states = states.len(),
            rules = unique_rules.len(),
            "composed workflow transition table"
        );

        Ok(Self {
            phases,
            rules: unique_rules,
            states,
            by_source,
            initial,
            terminal,
        })
    }

    /// State every new task starts in.
    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    /// The only state without outbound transitions.
    pub fn terminal_state(&self) -> &str {
        &self.terminal
    }

    pub fn is_terminal(&self, state: &str) -> bool {
        state == self.terminal
    }

    pub fn phases(&self) -> &[PhaseDefinition] {
        &self.phases
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    /// Every declared composite state, phase by phase.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.states.iter().any(|s| s == state)
    }

    /// Destination of `trigger` fired from `state`, if legal.
    pub fn destination(&self, trigger: Trigger, state: &str) -> Option<&str> {
        self.by_source
            .get(state)
            .and_then(|outbound| outbound.get(&trigger))
            .map(String::as_str)
    }

    /// Triggers currently valid from `state`, sorted. Empty for unknown or
    /// terminal states.
    pub fn legal_triggers(&self, state: &str) -> Vec<Trigger> {
        self.by_source
            .get(state)
            .map(|outbound| outbound.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Which trigger leaves a verified phase, given the external scaffolding
    /// flag. Falls back to [`Trigger::Advance`] where no fork exists.
    pub fn advance_trigger(&self, state: &str, scaffolding_mode: bool) -> Trigger {
        if scaffolding_mode && self.destination(Trigger::AdvanceToScaffold, state).is_some() {
            Trigger::AdvanceToScaffold
        } else {
            Trigger::Advance
        }
    }

    /// States reachable from the initial state, in breadth-first order.
    pub fn reachable_states(&self) -> Vec<String> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial.as_str()]);

        while let Some(state) = queue.pop_front() {
            if !seen.insert(state) {
                continue;
            }
            order.push(state.to_string());
            if let Some(outbound) = self.by_source.get(state) {
                queue.extend(outbound.values().map(String::as_str));
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STANDARD_PHASES: [Phase; 5] = [
        Phase::GitSetup,
        Phase::Scaffold,
        Phase::Coding,
        Phase::Testing,
        Phase::Finalize,
    ];

    fn table() -> &'static StateMachineDefinition {
        definition()
    }

    #[test]
    fn test_generate_review_cycle_shape() {
        let rules = generate_review_cycle(Phase::Coding, "coding_working");
        assert_eq!(rules.len(), 5);
        assert_eq!(rules[0], TransitionRule::new(Trigger::SubmitForAiReview, "coding_working", "coding_aireview"));
        assert_eq!(rules[1], TransitionRule::new(Trigger::AiApproves, "coding_aireview", "coding_devreview"));
        assert_eq!(rules[2], TransitionRule::new(Trigger::RequestRevision, "coding_aireview", "coding_working"));
        assert_eq!(rules[3], TransitionRule::new(Trigger::RequestRevision, "coding_devreview", "coding_working"));
        assert_eq!(rules[4], TransitionRule::new(Trigger::HumanApproves, "coding_devreview", "coding_verified"));
    }

    #[test]
    fn test_generate_review_cycle_is_deterministic() {
        assert_eq!(review_cycle(Phase::Finalize), review_cycle(Phase::Finalize));
    }

    #[test]
    fn test_full_table_composes() {
        let table = compose_full_table().expect("built-in table should be valid");
        assert_eq!(table.initial_state(), "gatherrequirements_working");
        assert_eq!(table.terminal_state(), "done");
    }

    #[test]
    fn test_standard_cycle_happy_path() {
        let table = table();
        for phase in STANDARD_PHASES {
            let mut state = phase.working();
            for trigger in [Trigger::SubmitForAiReview, Trigger::AiApproves, Trigger::HumanApproves] {
                state = table
                    .destination(trigger, &state)
                    .unwrap_or_else(|| panic!("{trigger} should be legal from {state}"))
                    .to_string();
            }
            assert_eq!(state, phase.state("verified"));

            let legal = table.legal_triggers(&state);
            assert!(!legal.contains(&Trigger::RequestRevision), "{state}");
            assert!(!legal.contains(&Trigger::HumanApproves), "{state}");
        }
    }

    #[test]
    fn test_revision_destinations() {
        let table = table();
        for phase in STANDARD_PHASES {
            let expected = if phase == Phase::Testing {
                Phase::Coding.working()
            } else {
                phase.working()
            };
            for review in ["aireview", "devreview"] {
                assert_eq!(
                    table.destination(Trigger::RequestRevision, &phase.state(review)),
                    Some(expected.as_str()),
                    "{phase} {review}"
                );
            }
        }
    }

    #[test]
    fn test_requirements_submit_straight_to_verified() {
        let table = table();
        assert_eq!(
            table.legal_triggers("gatherrequirements_working"),
            vec![Trigger::SubmitRequirements]
        );
        assert_eq!(
            table.destination(Trigger::SubmitRequirements, "gatherrequirements_working"),
            Some("gatherrequirements_verified")
        );
    }

    #[test]
    fn test_planning_stages_only_reachable_in_order() {
        let table = table();
        let into = |target: &str| -> Vec<&TransitionRule> {
            table.rules().iter().filter(|r| r.destination == target).collect()
        };

        let design = into("planning_solutiondesign");
        assert!(design
            .iter()
            .filter(|r| r.source != "planning_solutiondesignaireview" && r.source != "planning_solutiondesigndevreview")
            .all(|r| r.trigger == Trigger::HumanApproves && r.source == "planning_strategydevreview"));
        assert!(design.iter().any(|r| r.source == "planning_strategydevreview"));

        let plan = into("planning_executionplan");
        assert!(plan
            .iter()
            .filter(|r| r.source != "planning_executionplanaireview" && r.source != "planning_executionplandevreview")
            .all(|r| r.trigger == Trigger::HumanApproves && r.source == "planning_solutiondesigndevreview"));
        assert!(plan.iter().any(|r| r.source == "planning_solutiondesigndevreview"));

        assert_eq!(
            table.destination(Trigger::HumanApproves, "planning_executionplandevreview"),
            Some("planning_verified")
        );
    }

    #[test]
    fn test_scaffold_fork_and_merge() {
        let table = table();
        assert_eq!(table.destination(Trigger::Advance, "planning_verified"), Some("coding_working"));
        assert_eq!(
            table.destination(Trigger::AdvanceToScaffold, "planning_verified"),
            Some("scaffold_working")
        );
        assert_eq!(table.destination(Trigger::Advance, "scaffold_verified"), Some("coding_working"));

        assert_eq!(table.advance_trigger("planning_verified", true), Trigger::AdvanceToScaffold);
        assert_eq!(table.advance_trigger("planning_verified", false), Trigger::Advance);
        assert_eq!(table.advance_trigger("coding_verified", true), Trigger::Advance);
    }

    #[test]
    fn test_every_state_reachable_and_only_terminal_is_dead_end() {
        let table = table();
        let reachable = table.reachable_states();
        for state in table.states() {
            assert!(reachable.contains(state), "{state} is unreachable");
            if table.is_terminal(state) {
                assert!(table.legal_triggers(state).is_empty());
            } else {
                assert!(!table.legal_triggers(state).is_empty(), "{state} has no exit");
            }
        }
    }

    #[test]
    fn test_ambiguous_rules_rejected() {
        let mut rules = requirements_rules();
        rules.extend(advance_rules());
        rules.push(TransitionRule::new(
            Trigger::SubmitRequirements,
            "gatherrequirements_working",
            "gitsetup_working",
        ));

        let err = StateMachineDefinition::new(
            phase_definitions(),
            rules,
            "gatherrequirements_working".to_string(),
            "done".to_string(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DefinitionError::AmbiguousTrigger { trigger: Trigger::SubmitRequirements, .. }
        ));
    }

    #[test]
    fn test_duplicate_identical_rules_collapse() {
        let phases = vec![
            PhaseDefinition::new(Phase::GatherRequirements, &["working", "verified"], "working"),
            PhaseDefinition::new(Phase::Done, &[], ""),
        ];
        let mut rules = requirements_rules();
        rules.extend(requirements_rules());
        rules.push(TransitionRule::new(Trigger::Advance, "gatherrequirements_verified", "done"));

        let table = StateMachineDefinition::new(
            phases,
            rules,
            "gatherrequirements_working".to_string(),
            "done".to_string(),
        )
        .unwrap();
        assert_eq!(table.rules().len(), 2);
    }

    #[test]
    fn test_dead_end_rejected() {
        let phases = vec![
            PhaseDefinition::new(Phase::GatherRequirements, &["working", "verified"], "working"),
            PhaseDefinition::new(Phase::Done, &[], ""),
        ];
        let err = StateMachineDefinition::new(
            phases,
            requirements_rules(),
            "gatherrequirements_working".to_string(),
            "done".to_string(),
        )
        .unwrap_err();
        assert_eq!(err, DefinitionError::DeadEnd("gatherrequirements_verified".to_string()));
    }

    #[test]
    fn test_unknown_state_rejected() {
        let phases = vec![PhaseDefinition::new(Phase::Done, &[], "")];
        let err = StateMachineDefinition::new(
            phases,
            vec![TransitionRule::new(Trigger::Advance, "nowhere_working", "done")],
            "done".to_string(),
            "done".to_string(),
        )
        .unwrap_err();
        assert_eq!(err, DefinitionError::UnknownState("nowhere_working".to_string()));
    }

    #[test]
    fn test_legal_triggers_for_unknown_state_is_empty() {
        assert!(table().legal_triggers("bogus_state").is_empty());
        assert!(table().legal_triggers("").is_empty());
    }

    #[test]
    fn test_phase_entry_states() {
        let defs = phase_definitions();
        let entry = |phase: Phase| {
            defs.iter().find(|d| d.phase == phase).map(PhaseDefinition::entry_state)
        };
        assert_eq!(entry(Phase::Planning).as_deref(), Some("planning_strategy"));
        assert_eq!(entry(Phase::Coding).as_deref(), Some("coding_working"));
        assert_eq!(entry(Phase::Done).as_deref(), Some("done"));
    }
}
