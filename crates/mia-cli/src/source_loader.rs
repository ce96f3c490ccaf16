use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{
    map_cli_source_path, map_cli_source_read, CliError, LoadedScript, SCRIPT_FILE_REF_PREFIX,
};

pub(crate) fn load_script_file(script: &str) -> Result<LoadedScript, CliError> {
    let path = resolve_script_path(script)?;
    let json = fs::read_to_string(&path).map_err(map_cli_source_read)?;
    Ok(LoadedScript {
        script_ref: make_script_file_ref(&path),
        json,
    })
}

pub(crate) fn load_script_by_ref(script_ref: &str) -> Result<LoadedScript, CliError> {
    let Some(raw) = script_ref.strip_prefix(SCRIPT_FILE_REF_PREFIX) else {
        return Err(CliError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported script ref: {}", script_ref),
        ));
    };
    load_script_file(raw)
}

pub(crate) fn resolve_script_path(script: &str) -> Result<PathBuf, CliError> {
    let absolute = absolute_path(script)?;
    if !absolute.exists() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("script does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("script is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

/// Every `*.json` file under `scripts_dir` except test cases, sorted.
pub(crate) fn collect_script_files(scripts_dir: &str) -> Result<Vec<PathBuf>, CliError> {
    let root = absolute_path(scripts_dir)?;
    if !root.is_dir() {
        return Err(CliError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("scripts-dir is not a directory: {}", root.display()),
        ));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_script_file(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CliError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .json scripts under {}", root.display()),
        ));
    }
    Ok(files)
}

fn is_script_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(".json") && name != "testcase.json"
}

fn absolute_path(raw: &str) -> Result<PathBuf, CliError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn make_script_file_ref(path: &Path) -> String {
    format!("{}{}", SCRIPT_FILE_REF_PREFIX, path.display())
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mia-cli-{}-{}", label, nanos));
        fs::create_dir_all(&dir).expect("temp dir should be created");
        dir
    }

    #[test]
    fn load_script_file_round_trips_through_ref() {
        let dir = temp_dir("ref");
        let path = dir.join("consent.script.json");
        fs::write(&path, "{}").expect("script should be written");

        let loaded = load_script_file(path.to_str().expect("utf-8 path")).expect("load");
        assert!(loaded.script_ref.starts_with(SCRIPT_FILE_REF_PREFIX));
        assert_eq!(loaded.json, "{}");

        let again = load_script_by_ref(&loaded.script_ref).expect("ref should load");
        assert_eq!(again.script_ref, loaded.script_ref);
    }

    #[test]
    fn loaders_report_missing_or_invalid_sources() {
        let dir = temp_dir("missing");
        let missing = load_script_file(dir.join("nope.json").to_str().expect("utf-8"))
            .expect_err("missing file should fail");
        assert_eq!(missing.code(), "CLI_SOURCE_NOT_FOUND");

        let not_file = load_script_file(dir.to_str().expect("utf-8"))
            .expect_err("directory should fail");
        assert_eq!(not_file.code(), "CLI_SOURCE_NOT_FILE");

        let bad_ref = load_script_by_ref("scripts-dir:/tmp").expect_err("foreign ref should fail");
        assert_eq!(bad_ref.code(), "CLI_SOURCE_REF_INVALID");

        let empty = collect_script_files(dir.to_str().expect("utf-8"))
            .expect_err("empty dir should fail");
        assert_eq!(empty.code(), "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn collect_script_files_skips_test_cases() {
        let dir = temp_dir("collect");
        fs::create_dir_all(dir.join("nested")).expect("nested dir");
        fs::write(dir.join("b.json"), "{}").expect("write b");
        fs::write(dir.join("nested").join("a.script.json"), "{}").expect("write a");
        fs::write(dir.join("nested").join("testcase.json"), "{}").expect("write case");
        fs::write(dir.join("notes.txt"), "x").expect("write notes");

        let files = collect_script_files(dir.to_str().expect("utf-8")).expect("collect");
        let names: Vec<String> = files
            .iter()
            .map(|path| {
                path.strip_prefix(&dir)
                    .expect("inside dir")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["b.json".to_string(), "nested/a.script.json".to_string()]);
    }
}
