use thiserror::Error;

/// Structural defects that make a script unusable for traversal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script JSON is invalid: {message}")]
    InvalidJson { message: String },
    #[error("Script contains no nodes.")]
    EmptyScript,
    #[error("No entry node found (parent_ids must contain \"start\").")]
    NoRoot,
    #[error("Multiple entry nodes found: {}.", .ids.join(", "))]
    MultipleRoots { ids: Vec<String> },
    #[error("Node \"{node_id}\" references non-existent node \"{reference}\".")]
    UnknownReference { node_id: String, reference: String },
    #[error("Link \"{parent_id}\" -> \"{child_id}\" is not mirrored on both nodes.")]
    UnmirroredLink { parent_id: String, child_id: String },
    #[error("Choice \"{choice_id}\" of node \"{node_id}\" is not one of its child ids.")]
    ChoiceNotChild { node_id: String, choice_id: String },
    #[error("Node \"{node_id}\" declares \"{key}\" more than once.")]
    DuplicateResponseKey { node_id: String, key: String },
    #[error("Node \"{node_id}\" declares an empty response spec.")]
    EmptyResponseSpec { node_id: String },
    #[error("Node \"{node_id}\" submits along one edge but has {child_count} children.")]
    SingleEdgeViolation { node_id: String, child_count: usize },
    #[error("Node \"{node_id}\" is a dead end and is not marked terminal.")]
    DeadEnd { node_id: String },
    #[error("Monologue node \"{node_id}\" has {child_count} children.")]
    AmbiguousMonologue { node_id: String, child_count: usize },
    #[error("Terminal node \"{node_id}\" cannot await a response.")]
    TerminalAwaitingResponse { node_id: String },
    #[error("Field \"{field}\" of node \"{node_id}\" needs at least one option.")]
    FieldWithoutOptions { node_id: String, field: String },
}

impl ScriptError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson { .. } => "SCRIPT_INVALID_JSON",
            Self::EmptyScript => "SCRIPT_EMPTY",
            Self::NoRoot => "SCRIPT_NO_ROOT",
            Self::MultipleRoots { .. } => "SCRIPT_MULTIPLE_ROOTS",
            Self::UnknownReference { .. } => "SCRIPT_UNKNOWN_REFERENCE",
            Self::UnmirroredLink { .. } => "SCRIPT_UNMIRRORED_LINK",
            Self::ChoiceNotChild { .. } => "SCRIPT_CHOICE_NOT_CHILD",
            Self::DuplicateResponseKey { .. } => "SCRIPT_DUPLICATE_RESPONSE_KEY",
            Self::EmptyResponseSpec { .. } => "SCRIPT_EMPTY_RESPONSE_SPEC",
            Self::SingleEdgeViolation { .. } => "SCRIPT_SINGLE_EDGE",
            Self::DeadEnd { .. } => "SCRIPT_DEAD_END",
            Self::AmbiguousMonologue { .. } => "SCRIPT_AMBIGUOUS_MONOLOGUE",
            Self::TerminalAwaitingResponse { .. } => "SCRIPT_TERMINAL_AWAITING",
            Self::FieldWithoutOptions { .. } => "SCRIPT_FIELD_WITHOUT_OPTIONS",
        }
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::InvalidJson { .. }
            | Self::EmptyScript
            | Self::NoRoot
            | Self::MultipleRoots { .. } => None,
            Self::UnmirroredLink { parent_id, .. } => Some(parent_id),
            Self::UnknownReference { node_id, .. }
            | Self::ChoiceNotChild { node_id, .. }
            | Self::DuplicateResponseKey { node_id, .. }
            | Self::EmptyResponseSpec { node_id }
            | Self::SingleEdgeViolation { node_id, .. }
            | Self::DeadEnd { node_id }
            | Self::AmbiguousMonologue { node_id, .. }
            | Self::TerminalAwaitingResponse { node_id }
            | Self::FieldWithoutOptions { node_id, .. } => Some(node_id),
        }
    }
}

/// Rejections of a submitted answer. None of these mutate session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"{choice}\" is not a choice of node \"{node_id}\".")]
    InvalidChoice { node_id: String, choice: String },
    #[error("Node \"{node_id}\" requires at least one selection.")]
    EmptySelection { node_id: String },
    #[error("Field \"{field}\" of node \"{node_id}\" is required.")]
    MissingField { node_id: String, field: String },
    #[error("\"{value}\" is not an option of \"{field}\" on node \"{node_id}\".")]
    InvalidOption {
        node_id: String,
        field: String,
        value: String,
    },
    #[error("Field \"{field}\" is not declared on node \"{node_id}\".")]
    UnknownField { node_id: String, field: String },
    #[error("Node \"{node_id}\" does not accept a response.")]
    UnexpectedResponse { node_id: String },
    #[error("Node \"{node_id}\" expects a {expected} response, got a {actual}.")]
    ShapeMismatch {
        node_id: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidChoice { .. } => "VALIDATION_INVALID_CHOICE",
            Self::EmptySelection { .. } => "VALIDATION_EMPTY_SELECTION",
            Self::MissingField { .. } => "VALIDATION_MISSING_FIELD",
            Self::InvalidOption { .. } => "VALIDATION_INVALID_OPTION",
            Self::UnknownField { .. } => "VALIDATION_UNKNOWN_FIELD",
            Self::UnexpectedResponse { .. } => "VALIDATION_UNEXPECTED_RESPONSE",
            Self::ShapeMismatch { .. } => "VALIDATION_SHAPE_MISMATCH",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsentError {
    #[error("Node \"{node_id}\" is not part of the script.")]
    NodeNotFound { node_id: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Cycle detected while auto-advancing: {}.", .path.join(" -> "))]
    CycleDetected { path: Vec<String> },
    #[error(
        "Session of \"{participant_id}\" is stale: expected node \"{expected}\", current node is \"{actual}\"."
    )]
    StaleSession {
        participant_id: String,
        expected: String,
        actual: String,
    },
    #[error("Recorded response {index} answers \"{recorded}\" but the script is waiting at \"{pending}\".")]
    HistoryMismatch {
        index: usize,
        recorded: String,
        pending: String,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("No session exists for participant \"{participant_id}\".")]
    SessionNotFound { participant_id: String },
    #[error("Participant \"{participant_id}\" has no script version assigned.")]
    ParticipantNotAssigned { participant_id: String },
    #[error("Script version \"{script_version_id}\" is not available.")]
    ScriptVersionNotFound { script_version_id: String },
    #[error("Store failure: {message}")]
    Store { message: String },
}

impl ConsentError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound { .. } => "ENGINE_NODE_NOT_FOUND",
            Self::Validation(error) => error.code(),
            Self::CycleDetected { .. } => "ENGINE_CYCLE_DETECTED",
            Self::StaleSession { .. } => "SESSION_STALE",
            Self::HistoryMismatch { .. } => "SESSION_HISTORY_MISMATCH",
            Self::Script(error) => error.code(),
            Self::SessionNotFound { .. } => "SESSION_NOT_FOUND",
            Self::ParticipantNotAssigned { .. } => "STORE_PARTICIPANT_NOT_ASSIGNED",
            Self::ScriptVersionNotFound { .. } => "STORE_SCRIPT_VERSION_NOT_FOUND",
            Self::Store { .. } => "STORE_FAILURE",
        }
    }

    /// Recoverable errors leave the session untouched and can be answered by
    /// re-prompting or re-fetching the current turns.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::StaleSession { .. })
    }
}
