use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Answer payload as delivered by the response channel.
///
/// On the wire a choice is a bare string, a checkbox selection is an array of
/// names and a structured form is an object keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawResponse {
    Choice(String),
    Selection(Vec<String>),
    Form(BTreeMap<String, FieldValue>),
}

impl RawResponse {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Choice(_) => "choice",
            Self::Selection(_) => "selection",
            Self::Form(_) => "form",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Many(Vec<String>),
}

impl FieldValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Text(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(value) => value.trim().is_empty(),
            Self::Many(values) => values.iter().all(|value| value.trim().is_empty()),
        }
    }
}
