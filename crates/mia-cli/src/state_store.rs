use std::fs;
use std::path::Path;

use crate::{
    map_cli_state_invalid, map_cli_state_read, map_cli_state_write, CliError, PlayerState,
    PLAYER_STATE_SCHEMA,
};

pub(crate) fn save_player_state(path: &Path, state: &PlayerState) -> Result<(), CliError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(map_cli_state_write)?;

    let payload = serde_json::to_string_pretty(state).expect("player state should serialize");
    fs::write(path, payload).map_err(map_cli_state_write)
}

pub(crate) fn load_player_state(path: &Path) -> Result<PlayerState, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            "CLI_STATE_NOT_FOUND",
            format!("State file does not exist: {}", path.display()),
        ));
    }

    let raw = fs::read_to_string(path).map_err(map_cli_state_read)?;
    let state: PlayerState = serde_json::from_str(&raw).map_err(map_cli_state_invalid)?;

    if state.schema_version != PLAYER_STATE_SCHEMA {
        return Err(CliError::new(
            "CLI_STATE_SCHEMA",
            format!("Unsupported player state schema: {}", state.schema_version),
        ));
    }
    if state.session.script_version_id != state.script_ref {
        return Err(CliError::new(
            "CLI_STATE_SCHEMA",
            format!(
                "State session belongs to \"{}\", not \"{}\".",
                state.session.script_version_id, state.script_ref
            ),
        ));
    }

    Ok(state)
}

#[cfg(test)]
mod state_store_tests {
    use super::*;
    use mia_core::ParticipantSession;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(label: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("mia-cli-state-{}-{}", label, nanos))
            .join("state.json")
    }

    fn state(schema: &str) -> PlayerState {
        PlayerState {
            schema_version: schema.to_string(),
            script_ref: "script-file:/tmp/consent.json".to_string(),
            session: ParticipantSession {
                participant_id: "p1".to_string(),
                script_version_id: "script-file:/tmp/consent.json".to_string(),
                current_node_id: "ask".to_string(),
                response_history: Vec::new(),
                consent_complete: false,
                follow_ups: Vec::new(),
                revision: 0,
            },
        }
    }

    #[test]
    fn save_then_load_player_state() {
        let path = temp_path("roundtrip");
        let saved = state(PLAYER_STATE_SCHEMA);
        save_player_state(&path, &saved).expect("save should pass");
        let loaded = load_player_state(&path).expect("load should pass");
        assert_eq!(loaded, saved);
    }

    #[test]
    fn load_player_state_rejects_missing_and_foreign_files() {
        let missing = load_player_state(&temp_path("missing")).expect_err("missing should fail");
        assert_eq!(missing.code(), "CLI_STATE_NOT_FOUND");

        let path = temp_path("schema");
        save_player_state(&path, &state("player-state.v3")).expect("save should pass");
        let schema = load_player_state(&path).expect_err("old schema should fail");
        assert_eq!(schema.code(), "CLI_STATE_SCHEMA");

        fs::write(&path, "{").expect("write garbage");
        let invalid = load_player_state(&path).expect_err("garbage should fail");
        assert_eq!(invalid.code(), "CLI_STATE_INVALID");
    }
}
