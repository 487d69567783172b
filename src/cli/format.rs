//! Output formatting for CLI display.

use crate::mission::{MissionError, MissionReport, Verdict};

/// Format a completed mission for human-readable display.
///
/// `show_plan` is false when the plan was already shown while asking for
/// the outcome.
pub(super) fn format_report(report: &MissionReport, show_plan: bool) -> String {
    let mut out = String::new();
    if show_plan {
        out.push_str(&format!(
            "\n>>> [GENERATOR ACTION]:\n{}\n\n[?] OUTCOME: {}\n",
            report.action_plan, report.outcome
        ));
    }
    out.push_str(&format!("\n>>> [REFLECTOR INSIGHT]:\n{}\n\n", report.critique));
    out.push_str(&match &report.verdict {
        Verdict::Validated => "[Curator] Action successful. Existing Playbook validated.".to_string(),
        Verdict::Curated { entry } => format!(
            "[Curator] Playbook updated [{}] with: {}",
            entry.timestamp(),
            entry.insight
        ),
    });
    out
}

/// Format a failed mission. The error itself names the failing phase.
pub(super) fn format_failure(err: &MissionError) -> String {
    let mut out = format!("[!] Mission aborted: {err}");
    if let MissionError::Persist { lesson, .. } = err {
        out.push_str(&format!("\n[!] Unrecorded lesson: {lesson}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::inference::InferenceError;
    use crate::mission::Phase;
    use crate::playbook::Entry;

    fn report(verdict: Verdict) -> MissionReport {
        MissionReport {
            objective: "Enumerate open ports".into(),
            action_plan: "Run port scan".into(),
            outcome: "fail, scan blocked by firewall".into(),
            critique: "Probe the firewall first.".into(),
            verdict,
        }
    }

    #[test]
    fn validated_report() {
        let text = format_report(&report(Verdict::Validated), false);

        assert!(!text.contains("GENERATOR ACTION"));
        assert!(text.contains(">>> [REFLECTOR INSIGHT]:\nProbe the firewall first.\n"));
        assert!(text.ends_with("Existing Playbook validated."));
    }

    #[test]
    fn curated_report_shows_entry() {
        let entry = Entry::at(
            date(2026, 3, 14).at(9, 26, 53, 0),
            "Always check firewall state before scanning",
        );
        let text = format_report(&report(Verdict::Curated { entry }), true);

        assert!(text.contains(">>> [GENERATOR ACTION]:\nRun port scan\n"));
        assert!(text.contains("[?] OUTCOME: fail, scan blocked by firewall"));
        assert!(text.ends_with(
            "[Curator] Playbook updated [2026-03-14 09:26:53] with: Always check firewall state before scanning"
        ));
    }

    #[test]
    fn failure_names_phase() {
        let err = MissionError::Inference {
            phase: Phase::Reflecting,
            source: InferenceError::Empty,
        };
        assert!(format_failure(&err).starts_with("[!] Mission aborted: reflector phase failed"));
    }
}
