use std::collections::{BTreeSet, VecDeque};
use std::sync::OnceLock;

use mia_core::{FieldKind, ResponseSpec, ScriptError, START_SENTINEL};
use regex::Regex;
use serde::Serialize;

use crate::wire::{ScriptDocument, WireNode};

const NODE_ID_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

fn node_id_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(NODE_ID_PATTERN).expect("node id pattern should compile"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub node_id: Option<String>,
    pub message: String,
}

impl IntegrityIssue {
    fn warning(code: &str, node_id: Option<&str>, message: String) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code: code.to_string(),
            node_id: node_id.map(str::to_string),
            message,
        }
    }
}

impl From<ScriptError> for IntegrityIssue {
    fn from(error: ScriptError) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code: error.code().to_string(),
            node_id: error.node_id().map(str::to_string),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub node_count: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Warning)
    }
}

pub(crate) fn find_roots(document: &ScriptDocument) -> Vec<String> {
    document
        .iter()
        .filter(|(_, node)| node.parent_ids.iter().any(|id| id == START_SENTINEL))
        .map(|(id, _)| id.clone())
        .collect()
}

pub(crate) fn reachable_from(document: &ScriptDocument, root_id: &str) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    let mut queue = VecDeque::from([root_id.to_string()]);
    while let Some(id) = queue.pop_front() {
        let Some(node) = document.get(&id) else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        for child_id in &node.child_ids {
            if !seen.contains(child_id) {
                queue.push_back(child_id.clone());
            }
        }
    }
    seen
}

/// Every defect that prevents the document from being loaded as a graph, in
/// a stable order: root detection, link integrity, then per-node response
/// checks on nodes reachable from the root.
pub fn structural_errors(document: &ScriptDocument) -> Vec<ScriptError> {
    if document.is_empty() {
        return vec![ScriptError::EmptyScript];
    }

    let mut errors = Vec::new();
    let roots = find_roots(document);
    match roots.len() {
        0 => errors.push(ScriptError::NoRoot),
        1 => {}
        _ => errors.push(ScriptError::MultipleRoots { ids: roots.clone() }),
    }

    for (node_id, node) in document {
        check_links(document, node_id, node, &mut errors);
    }

    if let [root_id] = roots.as_slice() {
        for node_id in reachable_from(document, root_id) {
            check_node_shape(&node_id, &document[&node_id], &mut errors);
        }
    }

    errors
}

fn check_links(
    document: &ScriptDocument,
    node_id: &str,
    node: &WireNode,
    errors: &mut Vec<ScriptError>,
) {
    for parent_id in &node.parent_ids {
        if parent_id == START_SENTINEL {
            continue;
        }
        match document.get(parent_id) {
            None => errors.push(ScriptError::UnknownReference {
                node_id: node_id.to_string(),
                reference: parent_id.clone(),
            }),
            Some(parent) if !parent.child_ids.iter().any(|id| id == node_id) => {
                errors.push(ScriptError::UnmirroredLink {
                    parent_id: parent_id.clone(),
                    child_id: node_id.to_string(),
                })
            }
            Some(_) => {}
        }
    }

    for child_id in &node.child_ids {
        match document.get(child_id) {
            None => errors.push(ScriptError::UnknownReference {
                node_id: node_id.to_string(),
                reference: child_id.clone(),
            }),
            Some(child) if !child.parent_ids.iter().any(|id| id == node_id) => {
                errors.push(ScriptError::UnmirroredLink {
                    parent_id: node_id.to_string(),
                    child_id: child_id.clone(),
                })
            }
            Some(_) => {}
        }
    }
}

fn check_node_shape(node_id: &str, node: &WireNode, errors: &mut Vec<ScriptError>) {
    let child_count = node.child_ids.len();
    let Some(spec) = &node.response_spec else {
        if node.terminal {
            return;
        }
        match child_count {
            0 => errors.push(ScriptError::DeadEnd {
                node_id: node_id.to_string(),
            }),
            1 => {}
            _ => errors.push(ScriptError::AmbiguousMonologue {
                node_id: node_id.to_string(),
                child_count,
            }),
        }
        return;
    };

    if node.terminal {
        errors.push(ScriptError::TerminalAwaitingResponse {
            node_id: node_id.to_string(),
        });
    }

    let keys = spec.response_keys();
    if keys.is_empty() {
        errors.push(ScriptError::EmptyResponseSpec {
            node_id: node_id.to_string(),
        });
    }
    let mut seen = BTreeSet::new();
    for key in &keys {
        if !seen.insert(*key) {
            errors.push(ScriptError::DuplicateResponseKey {
                node_id: node_id.to_string(),
                key: key.to_string(),
            });
        }
    }

    match spec {
        ResponseSpec::ChoiceList { choices } => {
            for choice in choices {
                if !node.child_ids.contains(&choice.id) {
                    errors.push(ScriptError::ChoiceNotChild {
                        node_id: node_id.to_string(),
                        choice_id: choice.id.clone(),
                    });
                }
            }
        }
        ResponseSpec::CheckboxGroup { .. } => {}
        ResponseSpec::StructuredForm { fields, .. } => {
            for field in fields {
                if field.kind.has_options() && field.options.is_empty() {
                    errors.push(ScriptError::FieldWithoutOptions {
                        node_id: node_id.to_string(),
                        field: field.name.clone(),
                    });
                }
            }
        }
    }

    if spec.is_single_edge() && child_count != 1 {
        errors.push(ScriptError::SingleEdgeViolation {
            node_id: node_id.to_string(),
            child_count,
        });
    }
}

/// Full authoring report: structural errors plus warnings that do not block
/// loading (unreachable debris, cycles, odd ids, silent nodes).
pub fn check_integrity(document: &ScriptDocument) -> IntegrityReport {
    let mut issues: Vec<IntegrityIssue> = structural_errors(document)
        .into_iter()
        .map(IntegrityIssue::from)
        .collect();

    for (node_id, node) in document {
        if !node_id_regex().is_match(node_id) {
            issues.push(IntegrityIssue::warning(
                "INTEGRITY_ID_FORMAT",
                Some(node_id.as_str()),
                format!("Node id \"{}\" does not match {}.", node_id, NODE_ID_PATTERN),
            ));
        }
        if node.messages.is_empty() && node.media.is_none() && node.response_spec.is_none() {
            issues.push(IntegrityIssue::warning(
                "INTEGRITY_EMPTY_MESSAGES",
                Some(node_id.as_str()),
                format!("Node \"{}\" shows nothing and asks nothing.", node_id),
            ));
        }
        if let Some(ResponseSpec::ChoiceList { choices }) = &node.response_spec {
            for child_id in &node.child_ids {
                if !choices.iter().any(|choice| &choice.id == child_id) {
                    issues.push(IntegrityIssue::warning(
                        "INTEGRITY_UNUSED_CHILD",
                        Some(node_id.as_str()),
                        format!(
                            "Child \"{}\" of node \"{}\" is not offered as a choice.",
                            child_id, node_id
                        ),
                    ));
                }
            }
        }
    }

    let roots = find_roots(document);
    if let [root_id] = roots.as_slice() {
        let reachable = reachable_from(document, root_id);
        for node_id in document.keys() {
            if !reachable.contains(node_id) {
                issues.push(IntegrityIssue::warning(
                    "INTEGRITY_UNREACHABLE",
                    Some(node_id.as_str()),
                    format!("Node \"{}\" is unreachable from \"{}\".", node_id, root_id),
                ));
            }
        }

        for cycle in find_cycles(document, root_id) {
            let monologue_only = cycle.iter().all(|id| {
                document
                    .get(id)
                    .map(|node| node.response_spec.is_none() && !node.terminal)
                    .unwrap_or(false)
            });
            let mut path = cycle.clone();
            path.push(cycle[0].clone());
            let (code, message) = if monologue_only {
                (
                    "INTEGRITY_MONOLOGUE_CYCLE",
                    format!("Cycle without a response point: {}.", path.join(" -> ")),
                )
            } else {
                (
                    "INTEGRITY_CYCLE",
                    format!("Cycle detected: {}.", path.join(" -> ")),
                )
            };
            issues.push(IntegrityIssue::warning(code, Some(cycle[0].as_str()), message));
        }
    }

    IntegrityReport {
        node_count: document.len(),
        issues,
    }
}

fn find_cycles(document: &ScriptDocument, root_id: &str) -> BTreeSet<Vec<String>> {
    let mut cycles = BTreeSet::new();
    let mut finished = BTreeSet::new();
    let mut path = Vec::new();
    visit_for_cycles(document, root_id, &mut path, &mut finished, &mut cycles);
    cycles
}

fn visit_for_cycles(
    document: &ScriptDocument,
    node_id: &str,
    path: &mut Vec<String>,
    finished: &mut BTreeSet<String>,
    cycles: &mut BTreeSet<Vec<String>>,
) {
    if let Some(position) = path.iter().position(|id| id == node_id) {
        cycles.insert(canonical_cycle(&path[position..]));
        return;
    }
    if finished.contains(node_id) {
        return;
    }
    let Some(node) = document.get(node_id) else {
        return;
    };

    path.push(node_id.to_string());
    for child_id in &node.child_ids {
        visit_for_cycles(document, child_id, path, finished, cycles);
    }
    path.pop();
    finished.insert(node_id.to_string());
}

fn canonical_cycle(cycle: &[String]) -> Vec<String> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(index, _)| index)
        .unwrap_or(0);
    cycle[start..]
        .iter()
        .chain(cycle[..start].iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod integrity_tests {
    use super::*;
    use crate::wire::parse_script_document;

    fn document(json: &str) -> ScriptDocument {
        parse_script_document(json).expect("document should parse")
    }

    fn codes(report: &IntegrityReport) -> Vec<&str> {
        report.issues.iter().map(|issue| issue.code.as_str()).collect()
    }

    #[test]
    fn structural_errors_reports_missing_or_duplicate_roots() {
        assert_eq!(
            structural_errors(&ScriptDocument::new()),
            vec![ScriptError::EmptyScript]
        );

        let none = document(
            r#"{"a":{"type":"bot","messages":["x"],"parent_ids":[],"child_ids":[],"terminal":true}}"#,
        );
        assert_eq!(structural_errors(&none), vec![ScriptError::NoRoot]);

        let two = document(
            r#"{
  "a":{"type":"bot","messages":["x"],"parent_ids":["start"],"terminal":true},
  "b":{"type":"bot","messages":["y"],"parent_ids":["start"],"terminal":true}
}"#,
        );
        assert_eq!(
            structural_errors(&two),
            vec![ScriptError::MultipleRoots {
                ids: vec!["a".to_string(), "b".to_string()]
            }]
        );
    }

    #[test]
    fn structural_errors_reports_unknown_and_unmirrored_links() {
        let broken = document(
            r#"{
  "a":{"type":"bot","messages":["x"],"parent_ids":["start"],"child_ids":["b","ghost"]},
  "b":{"type":"bot","messages":["y"],"parent_ids":[],"terminal":true}
}"#,
        );
        let errors = structural_errors(&broken);
        assert!(errors.contains(&ScriptError::UnknownReference {
            node_id: "a".to_string(),
            reference: "ghost".to_string(),
        }));
        assert!(errors.contains(&ScriptError::UnmirroredLink {
            parent_id: "a".to_string(),
            child_id: "b".to_string(),
        }));
    }

    #[test]
    fn structural_errors_checks_response_shapes_on_reachable_nodes() {
        let broken = document(
            r#"{
  "q":{"type":"bot","messages":["Pick"],"parent_ids":["start"],"child_ids":["yes","f"],
       "response_spec":{"kind":"choice_list","choices":[
          {"id":"yes","label":"Yes"},{"id":"yes","label":"Again"},{"id":"nope","label":"No"}]}},
  "yes":{"type":"user","messages":["Yes"],"parent_ids":["q"],"child_ids":[]},
  "f":{"type":"bot","messages":["Form"],"parent_ids":["q"],"child_ids":[],"terminal":true,
       "response_spec":{"kind":"structured_form","fields":[
          {"name":"pick","label":"Pick","kind":"radio","required":true}]}}
}"#,
        );
        let errors = structural_errors(&broken);
        let codes: Vec<&str> = errors.iter().map(ScriptError::code).collect();
        assert!(codes.contains(&"SCRIPT_DUPLICATE_RESPONSE_KEY"));
        assert!(codes.contains(&"SCRIPT_CHOICE_NOT_CHILD"));
        assert!(codes.contains(&"SCRIPT_DEAD_END"));
        assert!(codes.contains(&"SCRIPT_TERMINAL_AWAITING"));
        assert!(codes.contains(&"SCRIPT_FIELD_WITHOUT_OPTIONS"));
        assert!(codes.contains(&"SCRIPT_SINGLE_EDGE"));
    }

    #[test]
    fn structural_errors_ignores_shape_of_unreachable_debris() {
        let debris = document(
            r#"{
  "a":{"type":"bot","messages":["x"],"parent_ids":["start"],"terminal":true},
  "old":{"type":"bot","messages":["stale"],"parent_ids":[],"child_ids":[]}
}"#,
        );
        assert!(structural_errors(&debris).is_empty());

        let report = check_integrity(&debris);
        assert!(!report.has_errors());
        assert_eq!(codes(&report), vec!["INTEGRITY_UNREACHABLE"]);
        assert_eq!(report.node_count, 2);
    }

    #[test]
    fn check_integrity_flags_monologue_cycles_once() {
        let looping = document(
            r#"{
  "a":{"type":"bot","messages":["again"],"parent_ids":["start","b"],"child_ids":["b"]},
  "b":{"type":"bot","messages":["and again"],"parent_ids":["a"],"child_ids":["a"]}
}"#,
        );
        let report = check_integrity(&looping);
        assert!(!report.has_errors());
        let cycles: Vec<&IntegrityIssue> = report
            .warnings()
            .filter(|issue| issue.code == "INTEGRITY_MONOLOGUE_CYCLE")
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(
            cycles[0].message,
            "Cycle without a response point: a -> b -> a."
        );
    }

    #[test]
    fn check_integrity_distinguishes_answerable_cycles_and_id_format() {
        let looping = document(
            r#"{
  "ask me":{"type":"bot","messages":["Again?"],"parent_ids":["start","again"],
       "child_ids":["again","done"],
       "response_spec":{"kind":"choice_list","choices":[
          {"id":"again","label":"Again"},{"id":"done","label":"Done"}]}},
  "again":{"type":"user","messages":["Again"],"parent_ids":["ask me"],"child_ids":["ask me"]},
  "done":{"type":"bot","messages":["Bye"],"parent_ids":["ask me"],"terminal":true}
}"#,
        );
        let report = check_integrity(&looping);
        assert!(!report.has_errors());
        let codes = codes(&report);
        assert!(codes.contains(&"INTEGRITY_CYCLE"));
        assert!(codes.contains(&"INTEGRITY_ID_FORMAT"));
        assert!(!codes.contains(&"INTEGRITY_MONOLOGUE_CYCLE"));
    }

    #[test]
    fn check_integrity_warns_about_children_no_choice_reaches() {
        let extra = document(
            r#"{
  "q":{"type":"bot","messages":["Pick"],"parent_ids":["start"],"child_ids":["yes","hidden"],
       "response_spec":{"kind":"choice_list","choices":[{"id":"yes","label":"Yes"}]}},
  "yes":{"type":"bot","messages":["Ok"],"parent_ids":["q"],"terminal":true},
  "hidden":{"type":"bot","messages":["?"],"parent_ids":["q"],"terminal":true}
}"#,
        );
        let report = check_integrity(&extra);
        assert!(!report.has_errors());
        assert_eq!(codes(&report), vec!["INTEGRITY_UNUSED_CHILD"]);
    }

    #[test]
    fn canonical_cycle_rotates_smallest_id_first() {
        let cycle = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(
            canonical_cycle(&cycle),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
