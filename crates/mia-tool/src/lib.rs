mod case;
mod runner;
mod source;

pub use case::{ExpectedTurn, TestCase, TestResponse, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_script_from_dir, read_test_case};

use std::path::PathBuf;

use mia_core::{ConsentError, ScriptError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MiaToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .script.json file under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("Expected one .script.json file under {path}, found {count}.")]
    SourceAmbiguous { path: PathBuf, count: usize },
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Engine error: {0}")]
    Engine(#[from] ConsentError),
    #[error("Response {index} failed: {source}")]
    ResponseFailed { index: usize, source: ConsentError },
    #[error("Response {index} was accepted, expected error {expected_code}.")]
    UnexpectedSuccess { index: usize, expected_code: String },
    #[error("Response {index} failed with {actual}, expected {expected}.")]
    ErrorCodeMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Expected consent_complete={expected}, actual {actual}.")]
    CompletionMismatch { expected: bool, actual: bool },
    #[error("Expected turn count {expected}, actual {actual}. observed={observed}")]
    TurnCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Turn mismatch at index {index}. expected={expected} actual={actual}")]
    TurnMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Failed to serialize turn for diff: {0}")]
    TurnSerialize(serde_json::Error),
}
