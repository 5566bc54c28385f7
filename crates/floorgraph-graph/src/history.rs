use floorgraph_core::{GraphEdge, GraphNode};
use std::sync::Arc;

/// Immutable node/edge state captured by one commit. Floors are not versioned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Linear undo/redo stack of whole-document snapshots.
///
/// Always holds at least one snapshot; `index` points at the one matching
/// the live document. Committing after an undo discards the redo suffix.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Arc<Snapshot>>,
    index: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// A history holding only the empty document.
    pub fn new() -> Self {
        Self::with_initial(Snapshot::default())
    }

    pub fn with_initial(initial: Snapshot) -> Self {
        Self {
            snapshots: vec![Arc::new(initial)],
            index: 0,
        }
    }

    /// Throw away every entry and start over from `initial`.
    pub fn reset(&mut self, initial: Snapshot) {
        *self = Self::with_initial(initial);
    }

    pub fn commit(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
        self.snapshots.truncate(self.index + 1);
        self.snapshots.push(Arc::new(Snapshot {
            nodes: nodes.to_vec(),
            edges: edges.to_vec(),
        }));
        self.index = self.snapshots.len() - 1;
        tracing::debug!(index = self.index, "history commit");
    }

    pub fn undo(&mut self) -> Option<Arc<Snapshot>> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        tracing::debug!(index = self.index, "history undo");
        Some(Arc::clone(&self.snapshots[self.index]))
    }

    pub fn redo(&mut self) -> Option<Arc<Snapshot>> {
        if self.index + 1 >= self.snapshots.len() {
            return None;
        }
        self.index += 1;
        tracing::debug!(index = self.index, "history redo");
        Some(Arc::clone(&self.snapshots[self.index]))
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.snapshots.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshots[self.index]
    }
}
