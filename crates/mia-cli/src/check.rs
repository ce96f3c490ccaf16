use std::fs;
use std::path::{Path, PathBuf};

use mia_script::{check_script_json, export_script_json, load_script_graph, IntegrityReport};

use crate::{
    collect_script_files, emit_check, load_script_file, map_cli_output_write,
    map_cli_source_read, resolve_script_path, CheckArgs, CliError, NormalizeArgs,
};

pub(super) fn run_check(args: CheckArgs) -> Result<i32, CliError> {
    let files = match (&args.script, &args.scripts_dir) {
        (Some(script), None) => vec![resolve_script_path(script)?],
        (None, Some(scripts_dir)) => collect_script_files(scripts_dir)?,
        _ => {
            return Err(CliError::new(
                "CLI_CHECK_ARGS",
                "Pass exactly one of --script or --scripts-dir.",
            ))
        }
    };

    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let report = check_file(&path)?;
        if report.has_errors() {
            tracing::warn!(path = %path.display(), "script failed integrity check");
        }
        reports.push((path, report));
    }
    Ok(emit_check(&reports))
}

fn check_file(path: &Path) -> Result<IntegrityReport, CliError> {
    let json = fs::read_to_string(path).map_err(map_cli_source_read)?;
    Ok(check_script_json(&json).unwrap_or_else(|error| IntegrityReport {
        node_count: 0,
        issues: vec![error.into()],
    }))
}

pub(super) fn run_normalize(args: NormalizeArgs) -> Result<i32, CliError> {
    let loaded = load_script_file(&args.script)?;
    let graph = load_script_graph(&loaded.json)?;
    let out = PathBuf::from(&args.out);
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(map_cli_output_write)?;
    }
    fs::write(&out, export_script_json(&graph)).map_err(map_cli_output_write)?;

    println!("RESULT:OK");
    println!("NODES:{}", graph.len() + graph.unreachable_ids().count());
    println!("SCRIPT_OUT:{}", out.display());
    Ok(0)
}
