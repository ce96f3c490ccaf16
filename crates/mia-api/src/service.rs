use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use mia_core::{ConsentError, ParticipantSession, RawResponse, Turn};
use mia_runtime::{advance, bootstrap, project, resolve, validate};
use mia_script::ScriptGraph;

use crate::clock::{Clock, SystemClock};
use crate::store::ScriptStore;

#[derive(Clone)]
pub struct ConsentServiceOptions {
    pub store: Arc<dyn ScriptStore>,
    pub clock: Option<Arc<dyn Clock>>,
}

/// Inbound boundary of the engine. Submissions for one participant are
/// serialized; different participants proceed independently.
pub struct ConsentService {
    store: Arc<dyn ScriptStore>,
    clock: Arc<dyn Clock>,
    participant_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ConsentService {
    pub fn new(options: ConsentServiceOptions) -> Self {
        Self {
            store: options.store,
            clock: options.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            participant_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ScriptStore> {
        &self.store
    }

    /// Runs `operation` under the participant's lock. The lock entry is
    /// dropped again once no other caller holds or waits on it.
    fn with_participant_lock<T>(&self, participant_id: &str, operation: impl FnOnce() -> T) -> T {
        let lock = self
            .participant_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(participant_id.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            operation()
        };
        drop(lock);
        self.release_participant_lock(participant_id);
        result
    }

    fn release_participant_lock(&self, participant_id: &str) {
        let mut locks = self
            .participant_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(participant_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(participant_id);
        }
    }

    fn load_or_bootstrap(
        &self,
        participant_id: &str,
    ) -> Result<(Arc<ScriptGraph>, ParticipantSession), ConsentError> {
        if let Some(session) = self.store.load_session(participant_id)? {
            let graph = self.store.load_script_graph(&session.script_version_id)?;
            return Ok((graph, session));
        }

        let script_version_id = self.store.assigned_script_version(participant_id)?;
        let graph = self.store.load_script_graph(&script_version_id)?;
        let session = bootstrap(&graph, participant_id, &script_version_id, self.clock.now())?;
        self.store.save_session(&session)?;
        Ok((graph, session))
    }

    /// Full turn sequence for the participant, creating the session at the
    /// root of the assigned script on first contact.
    pub fn get_current_turns(&self, participant_id: &str) -> Result<Vec<Turn>, ConsentError> {
        self.with_participant_lock(participant_id, || {
            let (graph, session) = self.load_or_bootstrap(participant_id)?;
            project(&graph, &session)
        })
    }

    /// Validates and applies an answer to `node_id`, returning the updated
    /// turn sequence. Rejected answers leave the stored session unchanged.
    pub fn submit_response(
        &self,
        participant_id: &str,
        node_id: &str,
        raw_response: RawResponse,
    ) -> Result<Vec<Turn>, ConsentError> {
        self.with_participant_lock(participant_id, || {
            self.apply_response(participant_id, node_id, raw_response)
        })
    }

    fn apply_response(
        &self,
        participant_id: &str,
        node_id: &str,
        raw_response: RawResponse,
    ) -> Result<Vec<Turn>, ConsentError> {
        let session = self.store.load_session(participant_id)?.ok_or_else(|| {
            ConsentError::SessionNotFound {
                participant_id: participant_id.to_string(),
            }
        })?;
        if session.current_node_id != node_id {
            tracing::debug!(
                participant_id,
                node_id,
                current_node_id = %session.current_node_id,
                "stale submission"
            );
            return Err(ConsentError::StaleSession {
                participant_id: participant_id.to_string(),
                expected: node_id.to_string(),
                actual: session.current_node_id,
            });
        }

        let graph = self.store.load_script_graph(&session.script_version_id)?;
        let node = resolve(&graph, node_id)?;
        let validated = validate(node, &raw_response).map_err(|error| {
            tracing::warn!(participant_id, node_id, code = error.code(), "response rejected");
            ConsentError::from(error)
        })?;

        let mut next = session.clone();
        advance(&graph, &mut next, &validated, self.clock.now())?;
        self.store.save_session(&next)?;
        project(&graph, &next)
    }

    pub fn session(&self, participant_id: &str) -> Result<ParticipantSession, ConsentError> {
        self.store
            .load_session(participant_id)?
            .ok_or_else(|| ConsentError::SessionNotFound {
                participant_id: participant_id.to_string(),
            })
    }
}
