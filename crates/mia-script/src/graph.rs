use std::collections::BTreeMap;

use mia_core::{ScriptError, ScriptNode};

use crate::integrity::{find_roots, reachable_from, structural_errors};
use crate::wire::{ScriptDocument, WireNode};

/// Validated, read-only script. Nodes that cannot be reached from the root
/// are kept aside so the graph still exports losslessly, but they never
/// resolve during traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptGraph {
    root_id: String,
    nodes: BTreeMap<String, ScriptNode>,
    unreachable: BTreeMap<String, ScriptNode>,
}

impl ScriptGraph {
    pub fn from_document(document: &ScriptDocument) -> Result<Self, ScriptError> {
        if let Some(error) = structural_errors(document).into_iter().next() {
            return Err(error);
        }
        let root_id = find_roots(document)
            .into_iter()
            .next()
            .ok_or(ScriptError::NoRoot)?;

        let reachable = reachable_from(document, &root_id);
        let mut nodes = BTreeMap::new();
        let mut unreachable = BTreeMap::new();
        for (id, wire) in document {
            let node = wire.to_node(id);
            if reachable.contains(id) {
                nodes.insert(id.clone(), node);
            } else {
                unreachable.insert(id.clone(), node);
            }
        }

        Ok(Self {
            root_id,
            nodes,
            unreachable,
        })
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn root(&self) -> &ScriptNode {
        &self.nodes[&self.root_id]
    }

    pub fn node(&self, id: &str) -> Option<&ScriptNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ScriptNode> {
        self.nodes.values()
    }

    pub fn unreachable_ids(&self) -> impl Iterator<Item = &str> {
        self.unreachable.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_document(&self) -> ScriptDocument {
        self.nodes
            .iter()
            .chain(self.unreachable.iter())
            .map(|(id, node)| (id.clone(), WireNode::from_node(node)))
            .collect()
    }
}
