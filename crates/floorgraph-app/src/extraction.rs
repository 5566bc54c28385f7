//! Bulk insertion of rooms and connections proposed by a floor-plan
//! extraction service.

use crate::error::ExtractionError;
use floorgraph_core::{
    BoundingBox, EdgeId, Floor, GraphEdge, GraphNode, NodeId, NodeType, floor_extent,
};
use floorgraph_graph::{EdgeDefaults, NodeDefaults};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Scale of `box_2d` coordinates.
pub const NORMALIZED_EXTENT: f64 = 1000.0;

/// Output of the image preprocessing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedImage {
    pub encoded_image: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub image: String,
    pub mime_type: String,
    pub floor_level: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedNode {
    pub label: String,
    /// Free-text room description, mapped onto [`NodeType`] heuristically.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `[ymin, xmin, ymax, xmax]` on a 0..1000 scale.
    pub box_2d: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedConnection {
    pub source_label: String,
    pub target_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub nodes: Vec<ExtractedNode>,
    #[serde(default)]
    pub connections: Vec<ExtractedConnection>,
}

/// The extraction service. `Ok(None)` means it ran but produced nothing.
pub trait FloorPlanExtractor {
    fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Option<ExtractionResult>, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropReason {
    /// A label matched no extracted node.
    Unmatched,
    /// A label matched more than one extracted node.
    Ambiguous,
    SelfLoop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedConnection {
    pub source_label: String,
    pub target_label: String,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub nodes_added: usize,
    pub edges_added: usize,
    pub dropped_connections: Vec<DroppedConnection>,
}

/// New graph elements ready to be added to a document.
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub report: MergeReport,
}

enum LabelMatch {
    One(NodeId),
    Many,
}

/// Convert an extraction result into nodes on `floor` and label-resolved edges.
///
/// Connections are resolved only against nodes from this same result.
pub fn plan_merge(
    result: &ExtractionResult,
    floor: &Floor,
    node_defaults: &NodeDefaults,
    edge_defaults: &EdgeDefaults,
) -> MergePlan {
    let (z1, z2) = floor_extent(floor.level);
    let (width, height) = (floor.width as f64, floor.height as f64);

    let nodes: Vec<GraphNode> = result
        .nodes
        .iter()
        .map(|extracted| {
            let [ymin, xmin, ymax, xmax] = extracted.box_2d;
            let scale_x = |v: f64| v * width / NORMALIZED_EXTENT;
            let scale_y = |v: f64| v * height / NORMALIZED_EXTENT;
            GraphNode {
                id: NodeId::generate(),
                label: extracted.label.clone(),
                node_type: NodeType::infer(&extracted.kind),
                capacity: node_defaults.capacity,
                safety_level: node_defaults.safety_level,
                floor_levels: BTreeSet::from([floor.level]),
                bounding_box: BoundingBox::from_corners(
                    (scale_x(xmin), scale_y(ymin), z1),
                    (scale_x(xmax), scale_y(ymax), z2),
                ),
            }
        })
        .collect();

    let mut by_label: HashMap<&str, LabelMatch> = HashMap::new();
    for node in &nodes {
        by_label
            .entry(node.label.as_str())
            .and_modify(|m| *m = LabelMatch::Many)
            .or_insert_with(|| LabelMatch::One(node.id.clone()));
    }
    let resolve = |label: &str| match by_label.get(label) {
        Some(LabelMatch::One(id)) => Ok(id.clone()),
        Some(LabelMatch::Many) => Err(DropReason::Ambiguous),
        None => Err(DropReason::Unmatched),
    };

    let mut edges = Vec::new();
    let mut dropped = Vec::new();
    for conn in &result.connections {
        let resolved = resolve(&conn.source_label).and_then(|source| {
            let target = resolve(&conn.target_label)?;
            if source == target {
                Err(DropReason::SelfLoop)
            } else {
                Ok((source, target))
            }
        });
        match resolved {
            Ok((source, target)) => edges.push(GraphEdge {
                id: EdgeId::generate(),
                source,
                target,
                traversal_time: edge_defaults.traversal_time,
                capacity: edge_defaults.capacity,
                active: true,
                bidirectional: true,
            }),
            Err(reason) => {
                tracing::warn!(
                    source = %conn.source_label,
                    target = %conn.target_label,
                    ?reason,
                    "dropping extracted connection"
                );
                dropped.push(DroppedConnection {
                    source_label: conn.source_label.clone(),
                    target_label: conn.target_label.clone(),
                    reason,
                });
            }
        }
    }

    let report = MergeReport {
        nodes_added: nodes.len(),
        edges_added: edges.len(),
        dropped_connections: dropped,
    };
    MergePlan {
        nodes,
        edges,
        report,
    }
}
