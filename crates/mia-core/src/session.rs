use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Media, ResponseSpec, ScriptNode, Speaker};
use crate::value::RawResponse;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub node_id: String,
    pub response: RawResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpRequest {
    pub node_id: String,
    pub reason: String,
    pub info: String,
    pub requested_at: DateTime<Utc>,
}

/// Runtime position of one participant inside one script version.
///
/// `revision` counts applied transitions and is what stores compare to
/// reject a write based on an outdated read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSession {
    pub participant_id: String,
    pub script_version_id: String,
    pub current_node_id: String,
    #[serde(default)]
    pub response_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub consent_complete: bool,
    #[serde(default)]
    pub follow_ups: Vec<FollowUpRequest>,
    #[serde(default)]
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub node_id: String,
    pub speaker: Speaker,
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echoed_user_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awaiting_response_spec: Option<ResponseSpec>,
}

impl Turn {
    pub fn from_node(node: &ScriptNode) -> Self {
        Self {
            node_id: node.id.clone(),
            speaker: node.speaker,
            messages: node.messages.clone(),
            media: node.media.clone(),
            echoed_user_response: None,
            awaiting_response_spec: if node.terminal {
                None
            } else {
                node.response_spec.clone()
            },
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_response_spec.is_some()
    }
}
