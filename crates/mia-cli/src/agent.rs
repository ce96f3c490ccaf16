use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use mia_api::{ConsentService, ConsentServiceOptions};
use mia_core::{FieldValue, ParticipantSession, RawResponse, Turn};
use mia_script::load_script_graph;

use crate::file_store::StateFileStore;
use crate::{
    emit_turns, load_player_state, load_script_by_ref, load_script_file,
    map_cli_response_invalid, save_player_state, AgentArgs, AgentCommand, CliError, PlayerState,
    RespondArgs, StartArgs, TurnsArgs, PLAYER_STATE_SCHEMA,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, CliError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Respond(args) => run_respond(args),
        AgentCommand::Turns(args) => run_turns(args),
    }
}

fn service_for(store: &Arc<StateFileStore>) -> ConsentService {
    ConsentService::new(ConsentServiceOptions {
        store: store.clone(),
        clock: None,
    })
}

fn open_store(
    source: ScriptSource<'_>,
    participant_id: &str,
    session: Option<ParticipantSession>,
) -> Result<Arc<StateFileStore>, CliError> {
    let loaded = match source {
        ScriptSource::Path(path) => load_script_file(path)?,
        ScriptSource::Ref(script_ref) => load_script_by_ref(script_ref)?,
    };
    let graph = load_script_graph(&loaded.json)?;
    Ok(Arc::new(StateFileStore::new(
        loaded.script_ref,
        participant_id,
        graph,
        session,
    )))
}

enum ScriptSource<'a> {
    Path(&'a str),
    Ref(&'a str),
}

fn save_and_emit(
    store: &StateFileStore,
    turns: &[Turn],
    state_out: &str,
) -> Result<i32, CliError> {
    let session = store.current_session().ok_or_else(|| {
        CliError::new(
            "CLI_STATE_WRITE",
            format!("No session recorded for \"{}\".", store.participant_id()),
        )
    })?;
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        script_ref: store.script_ref().to_string(),
        session,
    };
    save_player_state(Path::new(state_out), &state)?;
    emit_turns(turns, Some(state_out));
    Ok(0)
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, CliError> {
    let store = open_store(ScriptSource::Path(&args.script), &args.participant, None)?;
    let turns = service_for(&store).get_current_turns(&args.participant)?;
    save_and_emit(&store, &turns, &args.state_out)
}

pub(super) fn run_respond(args: RespondArgs) -> Result<i32, CliError> {
    let response = build_response(&args)?;
    let state = load_player_state(Path::new(&args.state_in))?;
    let participant_id = state.session.participant_id.clone();
    let store = open_store(
        ScriptSource::Ref(&state.script_ref),
        &participant_id,
        Some(state.session),
    )?;
    let turns = service_for(&store).submit_response(&participant_id, &args.node, response)?;
    save_and_emit(&store, &turns, &args.state_out)
}

pub(super) fn run_turns(args: TurnsArgs) -> Result<i32, CliError> {
    let state = load_player_state(Path::new(&args.state_in))?;
    let participant_id = state.session.participant_id.clone();
    let store = open_store(
        ScriptSource::Ref(&state.script_ref),
        &participant_id,
        Some(state.session),
    )?;
    let turns = service_for(&store).get_current_turns(&participant_id)?;
    emit_turns(&turns, None);
    Ok(0)
}

pub(crate) fn build_response(args: &RespondArgs) -> Result<RawResponse, CliError> {
    let given = [
        args.choice.is_some(),
        !args.select.is_empty(),
        !args.field.is_empty(),
        args.response_json.is_some(),
    ]
    .into_iter()
    .filter(|given| *given)
    .count();
    if given != 1 {
        return Err(CliError::new(
            "CLI_RESPONSE_ARGS",
            "Pass exactly one of --choice, --select, --field or --response-json.",
        ));
    }

    if let Some(choice) = &args.choice {
        return Ok(RawResponse::Choice(choice.clone()));
    }
    if !args.select.is_empty() {
        return Ok(RawResponse::Selection(args.select.clone()));
    }
    if let Some(raw) = &args.response_json {
        return serde_json::from_str(raw).map_err(map_cli_response_invalid);
    }

    let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();
    for pair in &args.field {
        let Some((name, value)) = pair.split_once('=') else {
            return Err(CliError::new(
                "CLI_RESPONSE_ARGS",
                format!("--field expects name=value, got \"{}\".", pair),
            ));
        };
        let value = value.to_string();
        match fields.remove(name) {
            None => {
                fields.insert(name.to_string(), FieldValue::Text(value));
            }
            Some(FieldValue::Text(first)) => {
                fields.insert(name.to_string(), FieldValue::Many(vec![first, value]));
            }
            Some(FieldValue::Many(mut values)) => {
                values.push(value);
                fields.insert(name.to_string(), FieldValue::Many(values));
            }
        }
    }
    Ok(RawResponse::Form(fields))
}
