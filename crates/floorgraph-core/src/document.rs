use crate::{EdgeId, EdgePatch, Floor, FloorId, GraphEdge, GraphNode, NodeId, NodePatch};
use std::collections::HashSet;

/// Ids removed by a cascading node deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

impl Removed {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// The in-memory building graph: floors, nodes and edges.
///
/// Mutations are total over ids. Touching an id that is not present is a
/// no-op reported through the return value, never an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    floors: Vec<Floor>,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(floors: Vec<Floor>, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            floors,
            nodes,
            edges,
        }
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn floor(&self, id: &FloorId) -> Option<&Floor> {
        self.floors.iter().find(|f| &f.id == id)
    }

    pub fn floor_by_level(&self, level: i32) -> Option<&Floor> {
        self.floors.iter().find(|f| f.level == level)
    }

    /// Floors ordered bottom to top.
    pub fn floors_by_level(&self) -> Vec<&Floor> {
        let mut floors: Vec<&Floor> = self.floors.iter().collect();
        floors.sort_by_key(|f| f.level);
        floors
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge(id).is_some()
    }

    /// Adds a floor unless its id or level is already taken.
    pub fn add_floor(&mut self, floor: Floor) -> bool {
        if self
            .floors
            .iter()
            .any(|f| f.id == floor.id || f.level == floor.level)
        {
            return false;
        }
        self.floors.push(floor);
        true
    }

    /// Removes only the floor; nodes and edges drawn on it stay.
    pub fn remove_floor(&mut self, id: &FloorId) -> Option<Floor> {
        let pos = self.floors.iter().position(|f| &f.id == id)?;
        Some(self.floors.remove(pos))
    }

    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: GraphEdge) {
        self.edges.push(edge);
    }

    pub fn update_node(&mut self, id: &NodeId, patch: NodePatch) -> bool {
        match self.nodes.iter_mut().find(|n| &n.id == id) {
            Some(node) => {
                patch.apply(node);
                true
            }
            None => false,
        }
    }

    /// Applies several node patches in one pass. Returns how many ids matched.
    pub fn update_nodes<I>(&mut self, patches: I) -> usize
    where
        I: IntoIterator<Item = (NodeId, NodePatch)>,
    {
        let mut matched = 0;
        for (id, patch) in patches {
            if self.update_node(&id, patch) {
                matched += 1;
            }
        }
        matched
    }

    pub fn update_edge(&mut self, id: &EdgeId, patch: EdgePatch) -> bool {
        match self.edges.iter_mut().find(|e| &e.id == id) {
            Some(edge) => {
                patch.apply(edge);
                true
            }
            None => false,
        }
    }

    /// Deletes the given nodes and every edge that references any of them.
    pub fn remove_nodes<'a, I>(&mut self, ids: I) -> Removed
    where
        I: IntoIterator<Item = &'a NodeId>,
    {
        let doomed: HashSet<&NodeId> = ids.into_iter().collect();
        if doomed.is_empty() {
            return Removed::default();
        }

        let mut removed = Removed::default();
        self.nodes.retain(|node| {
            let keep = !doomed.contains(&node.id);
            if !keep {
                removed.nodes.push(node.id.clone());
            }
            keep
        });
        self.edges.retain(|edge| {
            let keep = !doomed.contains(&edge.source) && !doomed.contains(&edge.target);
            if !keep {
                removed.edges.push(edge.id.clone());
            }
            keep
        });
        removed
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| &e.id != id);
        self.edges.len() != before
    }

    /// Swaps in a whole node/edge set, e.g. a history snapshot. Floors are kept.
    pub fn replace_graph(&mut self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) {
        self.nodes = nodes;
        self.edges = edges;
    }
}
