use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use mia_core::{ConsentError, FollowUpRequest, ParticipantSession};
use mia_script::ScriptGraph;

/// Persistence boundary for script versions and participant sessions.
pub trait ScriptStore: Send + Sync {
    fn load_script_graph(&self, script_version_id: &str) -> Result<Arc<ScriptGraph>, ConsentError>;
    fn assigned_script_version(&self, participant_id: &str) -> Result<String, ConsentError>;
    fn load_session(&self, participant_id: &str)
        -> Result<Option<ParticipantSession>, ConsentError>;
    /// Must reject writes that are not the direct successor of the stored
    /// session (see [`check_session_write`]).
    fn save_session(&self, session: &ParticipantSession) -> Result<(), ConsentError>;
}

/// Optimistic concurrency rule shared by store implementations: a write must
/// carry the next revision and extend the stored history without rewriting it.
pub fn check_session_write(
    stored: Option<&ParticipantSession>,
    next: &ParticipantSession,
) -> Result<(), ConsentError> {
    let stale = |actual: &str| ConsentError::StaleSession {
        participant_id: next.participant_id.clone(),
        expected: next
            .response_history
            .last()
            .map(|entry| entry.node_id.clone())
            .unwrap_or_else(|| next.current_node_id.clone()),
        actual: actual.to_string(),
    };

    let Some(stored) = stored else {
        if next.revision != 0 || !next.response_history.is_empty() {
            return Err(stale(""));
        }
        return Ok(());
    };

    if stored.participant_id != next.participant_id
        || stored.script_version_id != next.script_version_id
    {
        return Err(ConsentError::store(format!(
            "Session of \"{}\" cannot change participant or script version.",
            stored.participant_id
        )));
    }
    if next.revision != stored.revision + 1
        || !next.response_history.starts_with(&stored.response_history)
    {
        return Err(stale(&stored.current_node_id));
    }
    if stored.consent_complete && !next.consent_complete {
        return Err(ConsentError::store(format!(
            "Completed session of \"{}\" cannot be reopened.",
            stored.participant_id
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryScriptStore {
    scripts: RwLock<BTreeMap<String, Arc<ScriptGraph>>>,
    assignments: Mutex<BTreeMap<String, String>>,
    sessions: Mutex<BTreeMap<String, ParticipantSession>>,
}

impl MemoryScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_script(&self, script_version_id: impl Into<String>, graph: ScriptGraph) {
        self.scripts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(script_version_id.into(), Arc::new(graph));
    }

    pub fn assign(&self, participant_id: impl Into<String>, script_version_id: impl Into<String>) {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant_id.into(), script_version_id.into());
    }

    /// Follow-up requests of every stored session, keyed by participant.
    pub fn follow_up_requests(&self) -> Vec<(String, FollowUpRequest)> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .flat_map(|session| {
                session
                    .follow_ups
                    .iter()
                    .map(|request| (session.participant_id.clone(), request.clone()))
            })
            .collect()
    }
}

impl ScriptStore for MemoryScriptStore {
    fn load_script_graph(&self, script_version_id: &str) -> Result<Arc<ScriptGraph>, ConsentError> {
        self.scripts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(script_version_id)
            .cloned()
            .ok_or_else(|| ConsentError::ScriptVersionNotFound {
                script_version_id: script_version_id.to_string(),
            })
    }

    fn assigned_script_version(&self, participant_id: &str) -> Result<String, ConsentError> {
        self.assignments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(participant_id)
            .cloned()
            .ok_or_else(|| ConsentError::ParticipantNotAssigned {
                participant_id: participant_id.to_string(),
            })
    }

    fn load_session(
        &self,
        participant_id: &str,
    ) -> Result<Option<ParticipantSession>, ConsentError> {
        Ok(self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(participant_id)
            .cloned())
    }

    fn save_session(&self, session: &ParticipantSession) -> Result<(), ConsentError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        check_session_write(sessions.get(&session.participant_id), session)?;
        sessions.insert(session.participant_id.clone(), session.clone());
        Ok(())
    }
}
