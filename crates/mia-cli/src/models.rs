use mia_core::ParticipantSession;
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "mia-state.v1";
pub(crate) const SCRIPT_FILE_REF_PREFIX: &str = "script-file:";

#[derive(Debug, Clone)]
pub(crate) struct LoadedScript {
    /// Stable reference stored in state files; doubles as script version id.
    pub(crate) script_ref: String,
    pub(crate) json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) script_ref: String,
    pub(crate) session: ParticipantSession,
}
