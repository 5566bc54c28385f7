use crate::geometry::{Rect, Vec2};
use crate::spatial::{Corner, handle_rect, is_on_level, point_segment_distance};
use floorgraph_core::{EdgeId, GraphDocument, NodeId};

/// Result of a hit test at a given position.
///
/// Priority order: Handle > Node > Edge > None
#[derive(Debug, Clone, PartialEq)]
pub enum HitResult {
    /// Nothing was hit at the tested position.
    None,
    /// A resize handle of the single selected node.
    Handle { node_id: NodeId, corner: Corner },
    /// A node footprint was hit.
    Node(NodeId),
    /// An edge segment was hit.
    Edge(EdgeId),
}

/// Hit regions of one floor, rebuilt from the document before each query.
#[derive(Debug, Clone)]
pub struct HitTester {
    /// Footprints of nodes on the floor, in document order.
    node_rects: Vec<(NodeId, Rect)>,
    /// Straight segments between endpoint centres.
    edge_segments: Vec<(EdgeId, Vec2, Vec2)>,
    /// Handle owner and its footprint, present only for a single selection.
    handles: Option<(NodeId, Rect)>,
    handle_size: f64,
    edge_tolerance: f64,
}

impl Default for HitTester {
    fn default() -> Self {
        Self::new(8.0, 6.0)
    }
}

impl HitTester {
    pub fn new(handle_size: f64, edge_tolerance: f64) -> Self {
        Self {
            node_rects: Vec::new(),
            edge_segments: Vec::new(),
            handles: None,
            handle_size,
            edge_tolerance,
        }
    }

    /// Refresh hit regions for `level`.
    ///
    /// `handle_owner` is the node whose corner handles are live, if any.
    pub fn update(&mut self, doc: &GraphDocument, level: i32, handle_owner: Option<&NodeId>) {
        self.node_rects.clear();
        self.edge_segments.clear();
        self.handles = None;

        for node in doc.nodes().iter().filter(|n| is_on_level(n, level)) {
            self.node_rects
                .push((node.id.clone(), Rect::from_bbox(&node.bounding_box)));
        }

        for edge in doc.edges() {
            let ends = (self.rect_of(&edge.source), self.rect_of(&edge.target));
            if let (Some(a), Some(b)) = ends {
                self.edge_segments
                    .push((edge.id.clone(), a.center(), b.center()));
            }
        }

        self.handles = handle_owner
            .and_then(|owner| self.rect_of(owner).map(|rect| (owner.clone(), rect)));
    }

    fn rect_of(&self, id: &NodeId) -> Option<Rect> {
        self.node_rects
            .iter()
            .find(|(node_id, _)| node_id == id)
            .map(|(_, rect)| *rect)
    }

    pub fn hit_test(&self, pos: Vec2) -> HitResult {
        if let Some((node_id, corner)) = self.hit_test_handle(pos) {
            return HitResult::Handle { node_id, corner };
        }

        if let Some(node_id) = self.hit_test_node(pos) {
            return HitResult::Node(node_id);
        }

        if let Some(edge_id) = self.hit_test_edge(pos, self.edge_tolerance) {
            return HitResult::Edge(edge_id);
        }

        HitResult::None
    }

    pub fn hit_test_handle(&self, pos: Vec2) -> Option<(NodeId, Corner)> {
        let (node_id, rect) = self.handles.as_ref()?;
        Corner::ALL
            .into_iter()
            .find(|corner| handle_rect(rect, *corner, self.handle_size).contains(pos))
            .map(|corner| (node_id.clone(), corner))
    }

    /// Test if a position hits any node, returning the node ID.
    pub fn hit_test_node(&self, pos: Vec2) -> Option<NodeId> {
        // If multiple nodes overlap, return the one with the smallest area
        // (most specific / innermost node)
        let mut best: Option<(&NodeId, f64)> = None;

        for (node_id, rect) in &self.node_rects {
            if rect.contains(pos) {
                let area = rect.area();
                match &best {
                    Some((_, best_area)) if area >= *best_area => {}
                    _ => best = Some((node_id, area)),
                }
            }
        }

        best.map(|(id, _)| id.clone())
    }

    /// Closest edge within `tolerance` of `pos`.
    pub fn hit_test_edge(&self, pos: Vec2, tolerance: f64) -> Option<EdgeId> {
        let mut best_id = None;
        let mut best_dist = tolerance;

        for (edge_id, a, b) in &self.edge_segments {
            let dist = point_segment_distance(pos, *a, *b);
            if dist < best_dist {
                best_dist = dist;
                best_id = Some(edge_id.clone());
            }
        }

        best_id
    }

    pub fn node_rects(&self) -> &[(NodeId, Rect)] {
        &self.node_rects
    }
}
