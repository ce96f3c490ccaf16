use chrono::{DateTime, Utc};
use mia_core::{
    ConsentError, FollowUpRequest, HistoryEntry, ParticipantSession, ScriptError, ScriptNode,
    Speaker, Turn,
};
use mia_script::ScriptGraph;

use crate::resolver::resolve;
use crate::validator::{Answer, ValidatedResponse};

/// Nodes entered by one auto-advance run, in reveal order. The last node is
/// where the run stopped.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    pub visited: Vec<&'a ScriptNode>,
}

impl<'a> Walk<'a> {
    pub fn stop_node(&self) -> &'a ScriptNode {
        self.visited[self.visited.len() - 1]
    }

    pub fn is_terminal(&self) -> bool {
        self.stop_node().terminal
    }

    /// Turns revealed by this run. User-speaker pass-through nodes are left
    /// out; their content is carried by the echo on the answered turn.
    pub fn turns(&self) -> Vec<Turn> {
        self.visited
            .iter()
            .filter(|node| !(node.speaker == Speaker::User && !node.halts_traversal()))
            .map(|node| Turn::from_node(node))
            .collect()
    }

    fn follow_ups(&self, requested_at: DateTime<Utc>) -> Vec<FollowUpRequest> {
        self.visited
            .iter()
            .filter_map(|node| {
                node.follow_up.as_ref().map(|follow_up| FollowUpRequest {
                    node_id: node.id.clone(),
                    reason: follow_up.reason.clone(),
                    info: follow_up.info.clone(),
                    requested_at,
                })
            })
            .collect()
    }
}

/// Follows monologue nodes from `start_id` until a node awaits a response or
/// is terminal. Terminal nodes halt even when they list children.
pub fn auto_advance<'a>(graph: &'a ScriptGraph, start_id: &str) -> Result<Walk<'a>, ConsentError> {
    let mut visited: Vec<&'a ScriptNode> = Vec::new();
    let mut current_id = start_id.to_string();
    loop {
        let node = resolve(graph, &current_id)?;
        if visited.iter().any(|seen| seen.id == node.id) {
            let mut path: Vec<String> = visited.iter().map(|seen| seen.id.clone()).collect();
            path.push(node.id.clone());
            tracing::error!(path = %path.join(" -> "), "cycle detected while auto-advancing");
            return Err(ConsentError::CycleDetected { path });
        }
        visited.push(node);
        if node.halts_traversal() {
            return Ok(Walk { visited });
        }
        current_id = match node.child_ids.as_slice() {
            [next] => next.clone(),
            [] => {
                return Err(ScriptError::DeadEnd {
                    node_id: node.id.clone(),
                }
                .into())
            }
            children => {
                return Err(ScriptError::AmbiguousMonologue {
                    node_id: node.id.clone(),
                    child_count: children.len(),
                }
                .into())
            }
        };
    }
}

/// Child the answer leads to: the chosen id for choice lists, the single
/// declared child otherwise.
pub fn destination<'a>(
    node: &'a ScriptNode,
    validated: &'a ValidatedResponse,
) -> Result<&'a str, ConsentError> {
    match &validated.answer {
        Answer::Choice(choice_id) => Ok(choice_id.as_str()),
        Answer::Checkboxes(_) | Answer::Form(_) => match node.child_ids.as_slice() {
            [next] => Ok(next.as_str()),
            children => Err(ScriptError::SingleEdgeViolation {
                node_id: node.id.clone(),
                child_count: children.len(),
            }
            .into()),
        },
    }
}

/// Creates the session a participant gets on first contact: positioned at the
/// first node reached from the root that awaits input or ends the script.
pub fn bootstrap(
    graph: &ScriptGraph,
    participant_id: &str,
    script_version_id: &str,
    now: DateTime<Utc>,
) -> Result<ParticipantSession, ConsentError> {
    let walk = auto_advance(graph, graph.root_id())?;
    let session = ParticipantSession {
        participant_id: participant_id.to_string(),
        script_version_id: script_version_id.to_string(),
        current_node_id: walk.stop_node().id.clone(),
        response_history: Vec::new(),
        consent_complete: walk.is_terminal(),
        follow_ups: walk.follow_ups(now),
        revision: 0,
    };
    tracing::debug!(
        participant_id,
        script_version_id,
        node_id = %session.current_node_id,
        "session created"
    );
    log_follow_ups(participant_id, &session.follow_ups);
    Ok(session)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub new_node_id: String,
    pub revealed_turns: Vec<Turn>,
    pub consent_complete: bool,
}

/// Applies a validated response to `session`. The session is only touched
/// once the whole transition has been computed.
pub fn advance(
    graph: &ScriptGraph,
    session: &mut ParticipantSession,
    validated: &ValidatedResponse,
    now: DateTime<Utc>,
) -> Result<Advance, ConsentError> {
    if validated.node_id != session.current_node_id {
        return Err(ConsentError::StaleSession {
            participant_id: session.participant_id.clone(),
            expected: validated.node_id.clone(),
            actual: session.current_node_id.clone(),
        });
    }

    let node = resolve(graph, &session.current_node_id)?;
    let walk = auto_advance(graph, destination(node, validated)?)?;
    let new_node_id = walk.stop_node().id.clone();
    let consent_complete = walk.is_terminal();
    let follow_ups = walk.follow_ups(now);

    session.response_history.push(HistoryEntry {
        timestamp: now,
        node_id: validated.node_id.clone(),
        response: validated.response.clone(),
    });
    session.current_node_id = new_node_id.clone();
    session.consent_complete = consent_complete;
    log_follow_ups(&session.participant_id, &follow_ups);
    session.follow_ups.extend(follow_ups);
    session.revision += 1;

    if consent_complete {
        tracing::info!(
            participant_id = %session.participant_id,
            node_id = %new_node_id,
            "consent conversation completed"
        );
    }

    Ok(Advance {
        new_node_id,
        revealed_turns: walk.turns(),
        consent_complete,
    })
}

fn log_follow_ups(participant_id: &str, follow_ups: &[FollowUpRequest]) {
    for follow_up in follow_ups {
        tracing::info!(
            participant_id,
            node_id = %follow_up.node_id,
            reason = %follow_up.reason,
            "follow-up requested"
        );
    }
}
