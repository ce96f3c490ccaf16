use std::path::PathBuf;

use mia_core::Turn;
use mia_script::{IntegrityReport, IssueSeverity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnEvent {
    Awaiting,
    Complete,
}

pub(crate) fn turn_event(turns: &[Turn]) -> TurnEvent {
    match turns.last() {
        Some(turn) if turn.is_awaiting() => TurnEvent::Awaiting,
        _ => TurnEvent::Complete,
    }
}

pub(crate) fn turn_lines(turns: &[Turn], state_out: Option<&str>) -> Vec<String> {
    let mut lines = vec!["RESULT:OK".to_string()];
    match turn_event(turns) {
        TurnEvent::Awaiting => {
            lines.push("EVENT:AWAITING".to_string());
            if let Some(turn) = turns.last() {
                lines.push(format!("AWAITING_NODE:{}", turn.node_id));
            }
        }
        TurnEvent::Complete => lines.push("EVENT:COMPLETE".to_string()),
    }
    for turn in turns {
        lines.push(format!(
            "TURN_JSON:{}",
            serde_json::to_string(turn).expect("turn should serialize")
        ));
    }
    lines.push(format!("STATE_OUT:{}", state_out.unwrap_or("NONE")));
    lines
}

pub(crate) fn emit_turns(turns: &[Turn], state_out: Option<&str>) {
    for line in turn_lines(turns, state_out) {
        println!("{}", line);
    }
}

pub(crate) fn check_lines(reports: &[(PathBuf, IntegrityReport)]) -> Vec<String> {
    let failing = reports
        .iter()
        .filter(|(_, report)| report.has_errors())
        .count();

    let mut lines = Vec::new();
    if failing == 0 {
        lines.push("RESULT:OK".to_string());
    } else {
        lines.push("RESULT:ERROR".to_string());
        lines.push("ERROR_CODE:CLI_CHECK_FAILED".to_string());
        lines.push(format!(
            "ERROR_MSG_JSON:{}",
            serde_json::to_string(&format!(
                "{} of {} scripts have structural errors.",
                failing,
                reports.len()
            ))
            .expect("string json")
        ));
    }

    for (path, report) in reports {
        lines.push(format!(
            "FILE:{}|nodes={}|errors={}|warnings={}",
            path.display(),
            report.node_count,
            report.errors().count(),
            report.warnings().count()
        ));
        for issue in &report.issues {
            let severity = match issue.severity {
                IssueSeverity::Error => "error",
                IssueSeverity::Warning => "warning",
            };
            lines.push(format!(
                "ISSUE:{}|{}|{}|{}",
                severity,
                issue.code,
                issue.node_id.as_deref().unwrap_or("-"),
                serde_json::to_string(&issue.message).expect("string json")
            ));
        }
    }
    lines
}

pub(crate) fn emit_check(reports: &[(PathBuf, IntegrityReport)]) -> i32 {
    let lines = check_lines(reports);
    let code = if lines[0] == "RESULT:OK" { 0 } else { 1 };
    for line in lines {
        println!("{}", line);
    }
    code
}
