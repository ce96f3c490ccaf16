use std::collections::BTreeMap;

use mia_core::{FollowUpSpec, Media, ResponseSpec, ScriptError, ScriptNode, Speaker};
use serde::{Deserialize, Serialize};

/// Interchange form of a script: node id to node body.
pub type ScriptDocument = BTreeMap<String, WireNode>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireNode {
    #[serde(rename = "type")]
    pub speaker: Speaker,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_spec: Option<ResponseSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpSpec>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl WireNode {
    pub fn to_node(&self, id: &str) -> ScriptNode {
        ScriptNode {
            id: id.to_string(),
            speaker: self.speaker,
            messages: self.messages.clone(),
            media: self.media.clone(),
            parent_ids: self.parent_ids.clone(),
            child_ids: self.child_ids.clone(),
            response_spec: self.response_spec.clone(),
            terminal: self.terminal,
            follow_up: self.follow_up.clone(),
        }
    }

    pub fn from_node(node: &ScriptNode) -> Self {
        Self {
            speaker: node.speaker,
            messages: node.messages.clone(),
            parent_ids: node.parent_ids.clone(),
            child_ids: node.child_ids.clone(),
            response_spec: node.response_spec.clone(),
            media: node.media.clone(),
            terminal: node.terminal,
            follow_up: node.follow_up.clone(),
        }
    }
}

pub fn parse_script_document(json: &str) -> Result<ScriptDocument, ScriptError> {
    serde_json::from_str(json).map_err(|error| ScriptError::InvalidJson {
        message: error.to_string(),
    })
}

pub fn render_script_document(document: &ScriptDocument) -> String {
    serde_json::to_string_pretty(document).expect("script document should serialize")
}
