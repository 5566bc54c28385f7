use floorgraph_core::{EdgeId, GraphDocument, NodeId};
use std::collections::BTreeSet;

/// What the user currently has selected: any number of nodes plus at most
/// one edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: BTreeSet<NodeId>,
    edge: Option<EdgeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }

    pub fn edge(&self) -> Option<&EdgeId> {
        self.edge.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edge.is_none()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    /// The selected node when exactly one is selected.
    pub fn single_node(&self) -> Option<&NodeId> {
        if self.nodes.len() == 1 {
            self.nodes.iter().next()
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edge = None;
    }

    pub fn clear_nodes(&mut self) {
        self.nodes.clear();
    }

    /// Collapse the node selection to `id`.
    pub fn select_only(&mut self, id: NodeId) {
        self.nodes.clear();
        self.nodes.insert(id);
    }

    pub fn toggle(&mut self, id: NodeId) {
        if !self.nodes.remove(&id) {
            self.nodes.insert(id);
        }
    }

    pub fn replace_nodes<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        self.nodes = ids.into_iter().collect();
    }

    pub fn extend_nodes<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        self.nodes.extend(ids);
    }

    pub fn select_edge(&mut self, id: Option<EdgeId>) {
        self.edge = id;
    }

    /// Drop every id that no longer exists in `doc`. Returns true if anything went.
    pub fn purge(&mut self, doc: &GraphDocument) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|id| doc.contains_node(id));
        let mut changed = self.nodes.len() != before;
        if self.edge.as_ref().is_some_and(|id| !doc.contains_edge(id)) {
            self.edge = None;
            changed = true;
        }
        changed
    }
}
