use serde::{Deserialize, Serialize};

/// Parent id that marks the entry node of a script.
pub const START_SENTINEL: &str = "start";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Bot,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Media {
    pub kind: MediaKind,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckboxOption {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Radio,
    Select,
    CheckboxGroup,
}

impl FieldKind {
    pub fn has_options(self) -> bool {
        !matches!(self, Self::Text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub required: bool,
}

impl FormField {
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|option| option.value == value)
    }
}

/// Input affordance a node presents to the participant.
///
/// A node without a spec is a monologue: it is revealed and then passed
/// through without waiting for input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ResponseSpec {
    ChoiceList {
        choices: Vec<ChoiceOption>,
    },
    CheckboxGroup {
        options: Vec<CheckboxOption>,
    },
    StructuredForm {
        fields: Vec<FormField>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        submit_label: Option<String>,
    },
}

impl ResponseSpec {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ChoiceList { .. } => "choice_list",
            Self::CheckboxGroup { .. } => "checkbox_group",
            Self::StructuredForm { .. } => "structured_form",
        }
    }

    /// Keys a submission may reference: choice ids, checkbox names or field names.
    pub fn response_keys(&self) -> Vec<&str> {
        match self {
            Self::ChoiceList { choices } => choices.iter().map(|c| c.id.as_str()).collect(),
            Self::CheckboxGroup { options } => options.iter().map(|o| o.name.as_str()).collect(),
            Self::StructuredForm { fields, .. } => {
                fields.iter().map(|f| f.name.as_str()).collect()
            }
        }
    }

    /// Checkbox-group and structured-form nodes submit along one edge.
    pub fn is_single_edge(&self) -> bool {
        !matches!(self, Self::ChoiceList { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowUpSpec {
    pub reason: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptNode {
    pub id: String,
    pub speaker: Speaker,
    pub messages: Vec<String>,
    pub media: Option<Media>,
    pub parent_ids: Vec<String>,
    pub child_ids: Vec<String>,
    pub response_spec: Option<ResponseSpec>,
    pub terminal: bool,
    pub follow_up: Option<FollowUpSpec>,
}

impl ScriptNode {
    pub fn is_entry(&self) -> bool {
        self.parent_ids.iter().any(|id| id == START_SENTINEL)
    }

    pub fn is_monologue(&self) -> bool {
        self.response_spec.is_none()
    }

    /// True when auto-advance must stop at this node.
    pub fn halts_traversal(&self) -> bool {
        self.terminal || self.response_spec.is_some()
    }
}
