use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{MiaToolError, TestCase, TESTCASE_SCHEMA_V1};

const SCRIPT_SUFFIX: &str = ".script.json";

/// Reads the single `*.script.json` file of a demo directory.
pub fn read_script_from_dir(example_dir: &Path) -> Result<String, MiaToolError> {
    let scripts: Vec<PathBuf> = WalkDir::new(example_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().to_string_lossy().ends_with(SCRIPT_SUFFIX))
        .map(|entry| entry.into_path())
        .collect();

    match scripts.as_slice() {
        [] => Err(MiaToolError::SourceEmpty {
            path: example_dir.to_path_buf(),
        }),
        [path] => fs::read_to_string(path).map_err(|source| MiaToolError::ReadFile {
            path: path.clone(),
            source,
        }),
        _ => Err(MiaToolError::SourceAmbiguous {
            path: example_dir.to_path_buf(),
            count: scripts.len(),
        }),
    }
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, MiaToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| MiaToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase =
        serde_json::from_str(&raw).map_err(|source| MiaToolError::ParseCase {
            path: case_path.to_path_buf(),
            source,
        })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(MiaToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
