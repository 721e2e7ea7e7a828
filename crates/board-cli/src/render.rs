//! Plain-text rendering for the CLI

use crate::simulate::{LaneView, SimulationReport};
use board_model::{classify, StatusMatch};
use std::fmt::Write;

/// One line per status: the status, its column and whether it fell back
#[must_use]
pub fn render_normalized(statuses: &[String]) -> String {
    let width = statuses.iter().map(String::len).max().unwrap_or(0);
    let mut out = String::new();
    for status in statuses {
        let _ = match classify(status) {
            StatusMatch::Known(column) => writeln!(out, "{status:<width$}  {column}"),
            StatusMatch::Fallback => writeln!(out, "{status:<width$}  {} (fallback)", StatusMatch::Fallback.column()),
        };
    }
    out
}

fn render_lanes(out: &mut String, lanes: &[LaneView]) {
    for lane in lanes {
        let ids: Vec<String> = lane.tasks.iter().map(|id| format!("#{id}")).collect();
        let _ = writeln!(
            out,
            "  {:<12} {:>2} tasks {:>3} pts  {}",
            lane.column.to_string(),
            lane.tasks.len(),
            lane.story_points,
            ids.join(" ")
        );
    }
}

/// Human-readable simulation report
#[must_use]
pub fn render_report(report: &SimulationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Board {} ===", report.project);
    let _ = writeln!(out, "initial");
    render_lanes(&mut out, &report.initial);

    for step in &report.steps {
        let _ = writeln!(out);
        let _ = write!(out, "{}. {} => {}", step.step, step.action, step.outcome);
        if let Some(error) = &step.error {
            let _ = write!(out, " ({error})");
        }
        let _ = writeln!(out);
        for notice in &step.notices {
            let _ = writeln!(out, "  [{:?}] {}", notice.kind, notice.message);
        }
        render_lanes(&mut out, &step.lanes);
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} committed, {} rolled back, {} superseded, {} rejected; {}",
        report.count("committed"),
        report.count("rolled_back"),
        report.count("superseded"),
        report.count("rejected"),
        if report.converged { "in sync with server" } else { "NOT in sync with server" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_model::{CanonicalColumn, TaskId};
    use pretty_assertions::assert_eq;

    #[test]
    fn normalized_marks_fallbacks() {
        let out = render_normalized(&["In Review".to_string(), "blocked".to_string()]);
        assert_eq!(out, "In Review  IN_PROGRESS\nblocked    TO_DO (fallback)\n");
    }

    #[test]
    fn report_lists_lanes_and_summary() {
        let report = SimulationReport {
            project: "demo".into(),
            initial: vec![LaneView {
                column: CanonicalColumn::ToDo,
                tasks: vec![TaskId(1), TaskId(2)],
                story_points: 3,
            }],
            steps: vec![],
            converged: true,
        };

        let out = render_report(&report);
        assert!(out.starts_with("=== Board demo ===\ninitial\n"));
        assert!(out.contains("#1 #2"));
        assert!(out.ends_with("0 committed, 0 rolled back, 0 superseded, 0 rejected; in sync with server\n"));
    }
}
