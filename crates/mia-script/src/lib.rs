mod graph;
mod integrity;
mod wire;

pub use graph::ScriptGraph;
pub use integrity::{
    check_integrity, structural_errors, IntegrityIssue, IntegrityReport, IssueSeverity,
};
pub use wire::{parse_script_document, render_script_document, ScriptDocument, WireNode};

use mia_core::ScriptError;

pub fn load_script_graph(json: &str) -> Result<ScriptGraph, ScriptError> {
    let document = parse_script_document(json)?;
    ScriptGraph::from_document(&document)
}

pub fn export_script_json(graph: &ScriptGraph) -> String {
    render_script_document(&graph.to_document())
}

/// Parses and reports without building a graph, so malformed documents still
/// get every issue listed at once.
pub fn check_script_json(json: &str) -> Result<IntegrityReport, ScriptError> {
    let document = parse_script_document(json)?;
    Ok(check_integrity(&document))
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    const FORM_SCRIPT: &str = r#"{
  "intro":{"type":"bot","messages":["Who is taking part?"],"parent_ids":["start"],
           "child_ids":["details"],
           "media":{"kind":"video","content":"intro.mp4"},
           "response_spec":{"kind":"checkbox_group","options":[
              {"name":"myself","label":"Myself"},{"name":"child","label":"My child"}]}},
  "details":{"type":"bot","messages":["Your details"],"parent_ids":["intro"],
           "child_ids":["thanks"],
           "response_spec":{"kind":"structured_form","submit_label":"Send","fields":[
              {"name":"email","label":"Email","kind":"text","required":true},
              {"name":"contact","label":"Contact","kind":"select","options":[
                 {"value":"phone","label":"Phone"},{"value":"mail","label":"Mail"}]}]}},
  "thanks":{"type":"bot","messages":["Thank you."],"parent_ids":["details"],"terminal":true,
           "follow_up":{"reason":"genetic counselor","info":"call within a week"}}
}"#;

    #[test]
    fn load_then_export_reproduces_equivalent_script() {
        let graph = load_script_graph(FORM_SCRIPT).expect("script should load");
        let exported = export_script_json(&graph);
        let reloaded = load_script_graph(&exported).expect("exported script should load");
        assert_eq!(reloaded, graph);
        assert_eq!(
            parse_script_document(&exported).expect("exported should parse"),
            parse_script_document(FORM_SCRIPT).expect("source should parse")
        );
    }

    #[test]
    fn load_script_graph_surfaces_invalid_json() {
        let error = load_script_graph("{not json").expect_err("garbage should fail");
        assert_eq!(error.code(), "SCRIPT_INVALID_JSON");
    }

    #[test]
    fn check_script_json_collects_all_issues() {
        let report = check_script_json(
            r#"{
  "a":{"type":"bot","messages":["x"],"parent_ids":["start"],"child_ids":["ghost"]},
  "b":{"type":"bot","messages":[],"parent_ids":["start"],"child_ids":[]}
}"#,
        )
        .expect("document should parse");
        assert!(report.has_errors());
        let codes: Vec<&str> = report.errors().map(|issue| issue.code.as_str()).collect();
        assert!(codes.contains(&"SCRIPT_MULTIPLE_ROOTS"));
        assert!(codes.contains(&"SCRIPT_UNKNOWN_REFERENCE"));
        assert!(report
            .warnings()
            .any(|issue| issue.code == "INTEGRITY_EMPTY_MESSAGES"));
    }
}
