use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use mia_api::{ConsentService, ConsentServiceOptions, FixedClock, MemoryScriptStore};
use mia_script::load_script_graph;

use crate::source::{read_script_from_dir, read_test_case};
use crate::{ExpectedTurn, MiaToolError, TestCase};

const CASE_SCRIPT_VERSION: &str = "testcase";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_turns: Vec<ExpectedTurn>,
    pub accepted_responses: usize,
    pub rejected_responses: usize,
    pub consent_complete: bool,
    pub follow_up_count: usize,
}

pub fn run_case(example_dir: &Path, case: &TestCase) -> Result<RunReport, MiaToolError> {
    let graph = load_script_graph(&read_script_from_dir(example_dir)?)?;
    let store = Arc::new(MemoryScriptStore::new());
    store.insert_script(CASE_SCRIPT_VERSION, graph);
    store.assign(case.participant.clone(), CASE_SCRIPT_VERSION);

    let started_at = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    let service = ConsentService::new(ConsentServiceOptions {
        store: store.clone(),
        clock: Some(Arc::new(FixedClock(started_at))),
    });

    let mut turns = service.get_current_turns(&case.participant)?;
    let mut accepted_responses = 0usize;
    let mut rejected_responses = 0usize;

    for (index, step) in case.responses.iter().enumerate() {
        let result = service.submit_response(&case.participant, &step.node_id, step.response.clone());
        match (result, &step.expect_error) {
            (Ok(next), None) => {
                turns = next;
                accepted_responses += 1;
            }
            (Ok(_), Some(expected_code)) => {
                return Err(MiaToolError::UnexpectedSuccess {
                    index,
                    expected_code: expected_code.clone(),
                })
            }
            (Err(error), Some(expected_code)) if error.code() == expected_code => {
                rejected_responses += 1;
            }
            (Err(error), Some(expected_code)) => {
                return Err(MiaToolError::ErrorCodeMismatch {
                    index,
                    expected: expected_code.clone(),
                    actual: error.code().to_string(),
                })
            }
            (Err(source), None) => return Err(MiaToolError::ResponseFailed { index, source }),
        }
    }

    let session = service.session(&case.participant)?;
    if session.consent_complete != case.expect_complete {
        return Err(MiaToolError::CompletionMismatch {
            expected: case.expect_complete,
            actual: session.consent_complete,
        });
    }

    Ok(RunReport {
        observed_turns: turns.iter().map(ExpectedTurn::from).collect(),
        accepted_responses,
        rejected_responses,
        consent_complete: session.consent_complete,
        follow_up_count: store.follow_up_requests().len(),
    })
}

pub fn assert_case(example_dir: &Path, case_path: &Path) -> Result<RunReport, MiaToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(example_dir, &case)?;

    if report.observed_turns.len() != case.expected_turns.len() {
        let observed = serde_json::to_string_pretty(&report.observed_turns)
            .map_err(MiaToolError::TurnSerialize)?;
        return Err(MiaToolError::TurnCountMismatch {
            expected: case.expected_turns.len(),
            actual: report.observed_turns.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_turns
        .iter()
        .zip(report.observed_turns.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(MiaToolError::TurnSerialize)?;
            let actual = serde_json::to_string(actual).map_err(MiaToolError::TurnSerialize)?;
            return Err(MiaToolError::TurnMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(report)
}
