use std::ffi::OsString;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod agent;
mod check;
mod cli_args;
mod emit;
mod error_map;
mod file_store;
mod models;
mod source_loader;
mod state_store;

pub(crate) use cli_args::{
    AgentArgs, AgentCommand, CheckArgs, Cli, Mode, NormalizeArgs, RespondArgs, StartArgs,
    TurnsArgs,
};
pub(crate) use emit::{emit_check, emit_turns};
pub(crate) use error_map::{
    emit_error, map_cli_output_write, map_cli_response_invalid, map_cli_source_path,
    map_cli_source_read, map_cli_state_invalid, map_cli_state_read, map_cli_state_write,
    CliError,
};
pub(crate) use models::{LoadedScript, PlayerState, PLAYER_STATE_SCHEMA, SCRIPT_FILE_REF_PREFIX};
pub(crate) use source_loader::{
    collect_script_files, load_script_by_ref, load_script_file, resolve_script_path,
};
pub(crate) use state_store::{load_player_state, save_player_state};

const LOG_ENV: &str = "MIA_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_logging(cli.log.as_deref());
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

/// Logs go to stderr so stdout stays a clean line protocol.
fn init_logging(explicit: Option<&str>) {
    let filter = match explicit {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Check(args) => check::run_check(args),
        Mode::Normalize(args) => check::run_normalize(args),
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(label: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mia-cli-lib-{}-{}", label, nanos));
        fs::create_dir_all(&dir).expect("temp dir should be created");
        dir
    }

    const SCRIPT: &str = r#"{
  "ask":{"type":"bot","messages":["Continue?"],"parent_ids":["start"],"child_ids":["yes"],
         "response_spec":{"kind":"choice_list","choices":[{"id":"yes","label":"Yes"}]}},
  "yes":{"type":"bot","messages":["Done."],"parent_ids":["ask"],"terminal":true}
}"#;

    #[test]
    fn run_cli_from_args_reports_parse_failures() {
        assert_ne!(run_cli_from_args(["mia", "unknown"]), 0);
        assert_eq!(run_cli_from_args(["mia", "--help"]), 0);
    }

    #[test]
    fn run_cli_from_args_drives_start_respond_and_turns() {
        let dir = temp_dir("flow");
        let script = dir.join("consent.json");
        fs::write(&script, SCRIPT).expect("script should be written");
        let state_1 = dir.join("state-1.json");
        let state_2 = dir.join("state-2.json");

        let start = run_cli_from_args([
            "mia",
            "agent",
            "start",
            "--script",
            script.to_str().expect("utf-8"),
            "--participant",
            "p1",
            "--state-out",
            state_1.to_str().expect("utf-8"),
        ]);
        assert_eq!(start, 0);
        let saved = load_player_state(&state_1).expect("state should be saved");
        assert_eq!(saved.session.current_node_id, "ask");
        assert_eq!(saved.session.participant_id, "p1");

        let respond = run_cli_from_args([
            "mia",
            "agent",
            "respond",
            "--state-in",
            state_1.to_str().expect("utf-8"),
            "--node",
            "ask",
            "--choice",
            "yes",
            "--state-out",
            state_2.to_str().expect("utf-8"),
        ]);
        assert_eq!(respond, 0);
        let finished = load_player_state(&state_2).expect("state should be saved");
        assert!(finished.session.consent_complete);

        let stale = run_cli_from_args([
            "mia",
            "agent",
            "respond",
            "--state-in",
            state_2.to_str().expect("utf-8"),
            "--node",
            "ask",
            "--choice",
            "yes",
            "--state-out",
            state_2.to_str().expect("utf-8"),
        ]);
        assert_eq!(stale, 1);

        let turns = run_cli_from_args([
            "mia",
            "agent",
            "turns",
            "--state-in",
            state_2.to_str().expect("utf-8"),
        ]);
        assert_eq!(turns, 0);
    }

    #[test]
    fn run_cli_from_args_checks_and_normalizes() {
        let dir = temp_dir("check");
        let script = dir.join("consent.json");
        fs::write(&script, SCRIPT).expect("script should be written");
        let out = dir.join("out").join("normalized.json");

        assert_eq!(
            run_cli_from_args([
                "mia",
                "check",
                "--scripts-dir",
                dir.to_str().expect("utf-8")
            ]),
            0
        );
        assert_eq!(
            run_cli_from_args([
                "mia",
                "normalize",
                "--script",
                script.to_str().expect("utf-8"),
                "--out",
                out.to_str().expect("utf-8"),
            ]),
            0
        );
        let normalized = fs::read_to_string(&out).expect("normalized script should exist");
        assert_eq!(
            mia_script::load_script_graph(&normalized).expect("normalized should load"),
            mia_script::load_script_graph(SCRIPT).expect("source should load")
        );

        fs::write(dir.join("broken.json"), "{}").expect("broken script");
        assert_eq!(
            run_cli_from_args([
                "mia",
                "check",
                "--scripts-dir",
                dir.to_str().expect("utf-8")
            ]),
            1
        );
    }
}
