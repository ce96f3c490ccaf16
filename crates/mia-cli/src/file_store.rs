use std::sync::{Arc, Mutex, PoisonError};

use mia_api::{check_session_write, ScriptStore};
use mia_core::{ConsentError, ParticipantSession};
use mia_script::ScriptGraph;

/// Single-participant store backed by one script file and one state file.
/// The session lives in memory for the duration of a command and is written
/// out by the caller afterwards.
pub(crate) struct StateFileStore {
    script_ref: String,
    participant_id: String,
    graph: Arc<ScriptGraph>,
    session: Mutex<Option<ParticipantSession>>,
}

impl StateFileStore {
    pub(crate) fn new(
        script_ref: impl Into<String>,
        participant_id: impl Into<String>,
        graph: ScriptGraph,
        session: Option<ParticipantSession>,
    ) -> Self {
        Self {
            script_ref: script_ref.into(),
            participant_id: participant_id.into(),
            graph: Arc::new(graph),
            session: Mutex::new(session),
        }
    }

    pub(crate) fn script_ref(&self) -> &str {
        &self.script_ref
    }

    pub(crate) fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub(crate) fn current_session(&self) -> Option<ParticipantSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ScriptStore for StateFileStore {
    fn load_script_graph(&self, script_version_id: &str) -> Result<Arc<ScriptGraph>, ConsentError> {
        if script_version_id != self.script_ref {
            return Err(ConsentError::ScriptVersionNotFound {
                script_version_id: script_version_id.to_string(),
            });
        }
        Ok(self.graph.clone())
    }

    fn assigned_script_version(&self, participant_id: &str) -> Result<String, ConsentError> {
        if participant_id != self.participant_id {
            return Err(ConsentError::ParticipantNotAssigned {
                participant_id: participant_id.to_string(),
            });
        }
        Ok(self.script_ref.clone())
    }

    fn load_session(
        &self,
        participant_id: &str,
    ) -> Result<Option<ParticipantSession>, ConsentError> {
        if participant_id != self.participant_id {
            return Ok(None);
        }
        Ok(self.current_session())
    }

    fn save_session(&self, session: &ParticipantSession) -> Result<(), ConsentError> {
        if session.participant_id != self.participant_id {
            return Err(ConsentError::store(format!(
                "State file holds \"{}\", not \"{}\".",
                self.participant_id, session.participant_id
            )));
        }
        let mut stored = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        check_session_write(stored.as_ref(), session)?;
        *stored = Some(session.clone());
        Ok(())
    }
}
