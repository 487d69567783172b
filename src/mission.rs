//! Mission orchestration: Generator, then Reflector, then maybe Curator.
//!
//! One mission runs strictly in order:
//!
//! ```text
//! generate plan -> await outcome -> reflect -> (curate + append | validate)
//! ```
//!
//! Every phase blocks. Any failure ends the mission at that phase and
//! nothing is written to the playbook; the only durable effect of a mission
//! is the final append, and only when the outcome calls for curation.

pub mod persona;

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    inference::{Inference, InferenceError},
    outcome::{OutcomeError, OutcomeProvider},
    playbook::{Entry, PlaybookError, PlaybookStore},
};

use persona::Prompt;

/// The phases of a mission, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generating,
    AwaitingOutcome,
    Reflecting,
    Curating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generating => "generator",
            Self::AwaitingOutcome => "outcome",
            Self::Reflecting => "reflector",
            Self::Curating => "curator",
        })
    }
}

/// Why a mission stopped early.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("{phase} phase failed: {source}")]
    Inference {
        phase: Phase,
        #[source]
        source: InferenceError,
    },

    #[error("outcome phase failed: {0}")]
    Outcome(#[from] OutcomeError),

    /// The curator produced a lesson but it could not be recorded.
    #[error("curator phase failed: lesson was not recorded: {source}")]
    Persist {
        lesson: String,
        #[source]
        source: PlaybookError,
    },
}

impl MissionError {
    /// The phase the mission was in when it failed.
    pub fn phase(&self) -> Phase {
        match self {
            Self::Inference { phase, .. } => *phase,
            Self::Outcome(_) => Phase::AwaitingOutcome,
            Self::Persist { .. } => Phase::Curating,
        }
    }
}

/// What a completed mission did to the playbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum Verdict {
    /// The outcome did not call for curation; the playbook is unchanged.
    Validated,
    /// A lesson was distilled and appended.
    Curated { entry: Entry },
}

/// Everything a completed mission produced.
#[derive(Debug, Clone, Serialize)]
pub struct MissionReport {
    pub objective: String,
    pub action_plan: String,
    pub outcome: String,
    pub critique: String,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl MissionReport {
    /// The lesson recorded by this mission, if any.
    pub fn lesson(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Validated => None,
            Verdict::Curated { entry } => Some(&entry.insight),
        }
    }
}

/// Whether an outcome calls for curation.
///
/// Case-insensitive substring match on `fail` or `partial`. Negation is not
/// understood: "not a failure at all" still triggers.
pub fn should_curate(outcome: &str) -> bool {
    let outcome = outcome.to_lowercase();
    outcome.contains("fail") || outcome.contains("partial")
}

/// Drives missions against one inference capability and one playbook.
///
/// Missions take `&mut self`, so at most one runs against a given playbook
/// at a time.
pub struct Orchestrator<I> {
    inference: I,
    playbook: PlaybookStore,
}

impl<I: Inference> Orchestrator<I> {
    pub fn new(inference: I, playbook: PlaybookStore) -> Self {
        Self {
            inference,
            playbook,
        }
    }

    pub fn playbook(&self) -> &PlaybookStore {
        &self.playbook
    }

    /// Runs one mission for `objective`, asking `outcomes` what happened.
    pub fn run(
        &mut self,
        objective: &str,
        outcomes: &mut impl OutcomeProvider,
    ) -> Result<MissionReport, MissionError> {
        info!(objective, "mission started");

        let prompt = persona::generator(self.playbook.render(), objective);
        let action_plan = self.invoke(Phase::Generating, &prompt)?;

        info!(phase = %Phase::AwaitingOutcome, "waiting for outcome");
        let outcome = outcomes.obtain_outcome(&action_plan)?;

        let prompt = persona::reflector(&action_plan, &outcome);
        let critique = self.invoke(Phase::Reflecting, &prompt)?;

        let verdict = if should_curate(&outcome) {
            info!(outcome = %outcome, "outcome calls for curation");
            let lesson = self.invoke(Phase::Curating, &persona::curator(&critique))?;
            let entry = self
                .playbook
                .append(&lesson)
                .map_err(|source| MissionError::Persist { lesson, source })?;
            Verdict::Curated { entry }
        } else {
            info!("action successful, existing playbook validated");
            Verdict::Validated
        };

        Ok(MissionReport {
            objective: objective.to_string(),
            action_plan,
            outcome,
            critique,
            verdict,
        })
    }

    fn invoke(&self, phase: Phase, prompt: &Prompt) -> Result<String, MissionError> {
        info!(%phase, role = %prompt.role, "invoking inference");
        self.inference
            .generate(&prompt.instruction, &prompt.context)
            .map_err(|source| {
                warn!(%phase, error = %source, "inference failed");
                MissionError::Inference { phase, source }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{cell::RefCell, collections::VecDeque, fs};

    use tempfile::TempDir;

    use crate::outcome::Fixed;
    use crate::playbook::EMPTY_PLAYBOOK;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<Result<String, InferenceError>>>,
        calls: RefCell<Vec<(String, String)>>,
    }

    impl Scripted {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: RefCell::new(
                    responses.iter().map(|r| Ok((*r).to_string())).collect(),
                ),
                calls: RefCell::default(),
            }
        }

        fn then_fail(self) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(InferenceError::Unavailable("backend down".into())));
            self
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Inference for Scripted {
        fn generate(&self, instruction: &str, context: &str) -> Result<String, InferenceError> {
            self.calls
                .borrow_mut()
                .push((instruction.to_string(), context.to_string()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(InferenceError::Empty))
        }
    }

    fn orchestrator(inference: Scripted) -> (TempDir, Orchestrator<Scripted>) {
        let dir = TempDir::new().unwrap();
        let playbook = PlaybookStore::load(dir.path().join("playbook.md")).unwrap();
        (dir, Orchestrator::new(inference, playbook))
    }

    const SCRIPT: [&str; 3] = [
        "Run port scan",
        "The firewall dropped the probes; evade or enumerate the firewall first.",
        "Always check firewall state before scanning",
    ];

    #[test]
    fn failed_outcome_records_lesson() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));

        let report = orch
            .run(
                "Enumerate open ports",
                &mut Fixed("fail, scan blocked by firewall".into()),
            )
            .unwrap();

        assert_eq!(report.action_plan, "Run port scan");
        assert!(report.critique.contains("firewall"));
        assert_eq!(
            report.lesson(),
            Some("Always check firewall state before scanning")
        );
        assert_eq!(orch.playbook().len(), 1);
        assert!(
            orch.playbook()
                .render()
                .contains("- Always check firewall state before scanning\n")
        );
        assert_eq!(orch.inference.call_count(), 3);
    }

    #[test]
    fn successful_outcome_validates_playbook() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));

        let report = orch
            .run("Enumerate open ports", &mut Fixed("y".into()))
            .unwrap();

        assert_eq!(report.verdict, Verdict::Validated);
        assert_eq!(report.lesson(), None);
        assert_eq!(orch.playbook().render(), EMPTY_PLAYBOOK);
        assert!(!orch.playbook().path().exists());
        assert_eq!(orch.inference.call_count(), 2);
    }

    #[test]
    fn trigger_policy_matches_substrings_case_insensitively() {
        for outcome in [
            "n (it Failed)",
            "partial success",
            "PARTIAL",
            "FAIL",
            "not a failure at all",
        ] {
            assert!(should_curate(outcome), "{outcome:?} should trigger");
        }
        for outcome in ["y", "yes", "worked", "n", "fall back", ""] {
            assert!(!should_curate(outcome), "{outcome:?} should not trigger");
        }
    }

    #[test]
    fn curator_runs_once_per_triggered_mission() {
        for (outcome, curated) in [("y", false), ("n (it Failed)", true), ("partial success", true)] {
            let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));
            orch.run("objective", &mut Fixed(outcome.into())).unwrap();

            let expected_calls = if curated { 3 } else { 2 };
            assert_eq!(orch.inference.call_count(), expected_calls, "{outcome}");
            assert_eq!(orch.playbook().len(), usize::from(curated), "{outcome}");
        }
    }

    #[test]
    fn prompts_carry_memory_plan_outcome_and_critique() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));
        orch.run("Enumerate open ports", &mut Fixed("partial".into()))
            .unwrap();

        let calls = orch.inference.calls.borrow();
        let (generator, generator_ctx) = &calls[0];
        assert!(generator.starts_with("You are the Generator"));
        assert!(generator.contains("Enumerate open ports"));
        assert_eq!(
            generator_ctx,
            &format!("CURRENT PLAYBOOK MEMORY:\n{EMPTY_PLAYBOOK}\n\nOBJECTIVE: Enumerate open ports")
        );

        let (reflector, reflector_ctx) = &calls[1];
        assert!(reflector.contains("'Run port scan'"));
        assert!(reflector.contains("'partial'"));
        assert_eq!(reflector_ctx, "Post-Execution Analysis");

        let (curator, curator_ctx) = &calls[2];
        assert!(curator.contains(SCRIPT[1]));
        assert_eq!(curator_ctx, "Memory Optimization");
    }

    #[test]
    fn next_mission_sees_recorded_lesson() {
        let mut script = SCRIPT.to_vec();
        script.extend(["Check firewall, then scan", "Worked."]);
        let (_dir, mut orch) = orchestrator(Scripted::new(&script));

        orch.run("Enumerate open ports", &mut Fixed("fail".into()))
            .unwrap();
        orch.run("Enumerate open ports", &mut Fixed("y".into()))
            .unwrap();

        let calls = orch.inference.calls.borrow();
        let (_, second_generator_ctx) = &calls[3];
        assert!(second_generator_ctx.contains("## Entry ["));
        assert!(second_generator_ctx.contains("- Always check firewall state before scanning"));
    }

    #[test]
    fn generator_failure_names_phase_and_skips_outcome() {
        struct Unreachable;
        impl OutcomeProvider for Unreachable {
            fn obtain_outcome(&mut self, _: &str) -> Result<String, OutcomeError> {
                panic!("outcome must not be requested after a generator failure");
            }
        }

        let (_dir, mut orch) = orchestrator(Scripted::new(&[]).then_fail());
        let err = orch.run("objective", &mut Unreachable).unwrap_err();

        assert_eq!(err.phase(), Phase::Generating);
        assert!(err.to_string().starts_with("generator phase failed"));
    }

    #[test]
    fn reflector_failure_leaves_playbook_untouched() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&["Run port scan"]).then_fail());
        let err = orch
            .run("objective", &mut Fixed("fail".into()))
            .unwrap_err();

        assert_eq!(err.phase(), Phase::Reflecting);
        assert!(orch.playbook().is_empty());
    }

    #[test]
    fn curator_failure_leaves_playbook_untouched() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT[..2]).then_fail());
        let err = orch
            .run("objective", &mut Fixed("fail".into()))
            .unwrap_err();

        assert_eq!(err.phase(), Phase::Curating);
        assert!(matches!(err, MissionError::Inference { .. }));
        assert!(orch.playbook().is_empty());
    }

    #[test]
    fn outcome_failure_is_reported() {
        struct Closed;
        impl OutcomeProvider for Closed {
            fn obtain_outcome(&mut self, _: &str) -> Result<String, OutcomeError> {
                Err(OutcomeError::Closed)
            }
        }

        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));
        let err = orch.run("objective", &mut Closed).unwrap_err();

        assert_eq!(err.phase(), Phase::AwaitingOutcome);
        assert_eq!(orch.inference.call_count(), 1);
    }

    #[test]
    fn append_failure_reports_lesson_and_keeps_mirror() {
        let (dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));
        // A directory where the playbook file should be makes the append fail.
        fs::create_dir(dir.path().join("playbook.md")).unwrap();

        let err = orch
            .run("objective", &mut Fixed("fail".into()))
            .unwrap_err();

        match err {
            MissionError::Persist { lesson, source } => {
                assert_eq!(lesson, SCRIPT[2]);
                assert!(matches!(source, PlaybookError::Io { .. }));
            }
            other => panic!("expected persist error, got {other:?}"),
        }
        assert_eq!(orch.playbook().render(), EMPTY_PLAYBOOK);
    }

    #[test]
    fn report_serializes_verdict_inline() {
        let (_dir, mut orch) = orchestrator(Scripted::new(&SCRIPT));
        let report = orch.run("objective", &mut Fixed("y".into())).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "validated");
        assert_eq!(json["action_plan"], "Run port scan");
    }
}
