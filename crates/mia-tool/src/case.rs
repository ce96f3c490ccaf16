use mia_core::{RawResponse, Turn};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "mia-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_participant")]
    pub participant: String,
    #[serde(default)]
    pub responses: Vec<TestResponse>,
    #[serde(default)]
    pub expected_turns: Vec<ExpectedTurn>,
    #[serde(default)]
    pub expect_complete: bool,
}

fn default_participant() -> String {
    "participant".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub node_id: String,
    pub response: RawResponse,
    /// Error code the submission must be rejected with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

/// Compact view of a turn: which node, what was echoed, what is pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedTurn {
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting: Option<String>,
}

impl From<&Turn> for ExpectedTurn {
    fn from(turn: &Turn) -> Self {
        Self {
            node_id: turn.node_id.clone(),
            echo: turn.echoed_user_response.clone(),
            awaiting: turn
                .awaiting_response_spec
                .as_ref()
                .map(|spec| spec.kind_name().to_string()),
        }
    }
}

#[cfg(test)]
mod case_tests {
    use super::*;

    #[test]
    fn test_case_applies_defaults() {
        let case: TestCase = serde_json::from_str(
            r#"{"schemaVersion":"mia-tool-case.v1","expectedTurns":[{"nodeId":"a"}]}"#,
        )
        .expect("case should parse");
        assert_eq!(case.participant, "participant");
        assert!(case.responses.is_empty());
        assert!(!case.expect_complete);
        assert_eq!(case.expected_turns[0].echo, None);
    }

    #[test]
    fn test_response_reads_any_payload_shape() {
        let responses: Vec<TestResponse> = serde_json::from_str(
            r#"[
  {"nodeId":"q","response":"yes"},
  {"nodeId":"c","response":[],"expectError":"VALIDATION_EMPTY_SELECTION"},
  {"nodeId":"f","response":{"email":"a@b.c","times":["x","y"]}}
]"#,
        )
        .expect("responses should parse");
        assert_eq!(responses[0].response.shape_name(), "choice");
        assert_eq!(
            responses[1].expect_error.as_deref(),
            Some("VALIDATION_EMPTY_SELECTION")
        );
        assert_eq!(responses[2].response.shape_name(), "form");
    }
}
