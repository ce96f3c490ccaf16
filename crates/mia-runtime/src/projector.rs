use mia_core::{ConsentError, ParticipantSession, Turn};
use mia_script::ScriptGraph;

use crate::resolver::resolve;
use crate::traversal::{auto_advance, destination};
use crate::validator::validate;

/// Rebuilds the full conversation by replaying `response_history` from the
/// root. Answered turns carry the echo and no pending spec; the final turn is
/// the node the session waits at.
pub fn project(graph: &ScriptGraph, session: &ParticipantSession) -> Result<Vec<Turn>, ConsentError> {
    let walk = auto_advance(graph, graph.root_id())?;
    let mut pending_id = walk.stop_node().id.clone();
    let mut turns = walk.turns();

    for (index, entry) in session.response_history.iter().enumerate() {
        if entry.node_id != pending_id {
            return Err(ConsentError::HistoryMismatch {
                index,
                recorded: entry.node_id.clone(),
                pending: pending_id,
            });
        }
        let node = resolve(graph, &pending_id)?;
        let validated = validate(node, &entry.response)?;
        if let Some(answered) = turns.last_mut() {
            answered.echoed_user_response = Some(validated.echo.clone());
            answered.awaiting_response_spec = None;
        }

        let walk = auto_advance(graph, destination(node, &validated)?)?;
        pending_id = walk.stop_node().id.clone();
        turns.extend(walk.turns());
    }

    if pending_id != session.current_node_id {
        return Err(ConsentError::HistoryMismatch {
            index: session.response_history.len(),
            recorded: session.current_node_id.clone(),
            pending: pending_id,
        });
    }
    Ok(turns)
}
