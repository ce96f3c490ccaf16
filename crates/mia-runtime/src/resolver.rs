use mia_core::{ConsentError, ScriptNode};
use mia_script::ScriptGraph;

pub fn resolve<'a>(graph: &'a ScriptGraph, node_id: &str) -> Result<&'a ScriptNode, ConsentError> {
    graph.node(node_id).ok_or_else(|| ConsentError::NodeNotFound {
        node_id: node_id.to_string(),
    })
}
