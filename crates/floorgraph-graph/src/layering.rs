use crate::spatial::layer_level;
use floorgraph_core::{EdgeId, FloorId, GraphDocument, NodeId};
use serde::{Deserialize, Serialize};

/// Nodes and edges drawn with one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorLayer {
    pub floor_id: FloorId,
    pub level: i32,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

/// Floor level a node's z-midpoint lands in, among the document's floors.
pub fn node_layer(doc: &GraphDocument, id: &NodeId) -> Option<i32> {
    let node = doc.node(id)?;
    layer_level(&node.bounding_box, doc.floors().iter().map(|f| f.level))
}

/// Layer of an edge: that of whichever endpoint starts higher (greater `z1`).
/// Edges with a missing endpoint belong to no layer.
pub fn edge_layer(doc: &GraphDocument, id: &EdgeId) -> Option<i32> {
    let edge = doc.edge(id)?;
    let source = doc.node(&edge.source)?;
    let target = doc.node(&edge.target)?;
    let upper = if target.bounding_box.z1 > source.bounding_box.z1 {
        target
    } else {
        source
    };
    node_layer(doc, &upper.id)
}

/// Partition the document into per-floor layers, ordered by ascending level.
///
/// Every floor gets a layer, even an empty one. Within a layer, nodes and
/// edges keep document order.
pub fn assign_layers(doc: &GraphDocument) -> Vec<FloorLayer> {
    let mut layers: Vec<FloorLayer> = doc
        .floors_by_level()
        .into_iter()
        .map(|floor| FloorLayer {
            floor_id: floor.id.clone(),
            level: floor.level,
            nodes: Vec::new(),
            edges: Vec::new(),
        })
        .collect();

    for node in doc.nodes() {
        let level = node_layer(doc, &node.id);
        if let Some(layer) = layers.iter_mut().find(|l| Some(l.level) == level) {
            layer.nodes.push(node.id.clone());
        }
    }

    for edge in doc.edges() {
        match edge_layer(doc, &edge.id) {
            Some(level) => {
                if let Some(layer) = layers.iter_mut().find(|l| l.level == level) {
                    layer.edges.push(edge.id.clone());
                }
            }
            None => tracing::debug!(edge = %edge.id, "edge not assigned to any layer"),
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_core::{BoundingBox, Floor, GraphEdge, GraphNode, NodeType};
    use std::collections::BTreeSet;

    fn floor(level: i32) -> Floor {
        Floor {
            id: FloorId::new(format!("floor-{level}")),
            level,
            name: format!("Level {level}"),
            image_url: String::new(),
            width: 800,
            height: 600,
        }
    }

    fn node(id: &str, z1: f64, z2: f64) -> GraphNode {
        GraphNode {
            id: NodeId::from(id),
            label: id.to_string(),
            node_type: NodeType::Classroom,
            capacity: 30,
            safety_level: 1,
            floor_levels: BTreeSet::new(),
            bounding_box: BoundingBox::from_corners((0.0, 0.0, z1), (50.0, 50.0, z2)),
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            id: EdgeId::from(id),
            source: NodeId::from(source),
            target: NodeId::from(target),
            traversal_time: 10.0,
            capacity: 50,
            active: true,
            bidirectional: true,
        }
    }

    fn building() -> GraphDocument {
        GraphDocument::from_parts(
            vec![floor(1), floor(0), floor(-1)],
            vec![
                node("a", 0.0, 300.0),
                node("b", 300.0, 600.0),
                node("stairs", 250.0, 650.0),
                node("roof", 3000.0, 3300.0),
            ],
            vec![
                edge("ab", "a", "b"),
                edge("ba", "b", "a"),
                edge("dangling", "a", "ghost"),
                edge("to-roof", "roof", "a"),
            ],
        )
    }

    #[test]
    fn test_layers_sorted_by_level() {
        let layers = assign_layers(&building());
        let levels: Vec<i32> = layers.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![-1, 0, 1]);
        assert!(layers[0].nodes.is_empty());
    }

    #[test]
    fn test_node_midpoint_decides_layer() {
        let doc = building();
        assert_eq!(node_layer(&doc, &NodeId::from("a")), Some(0));
        assert_eq!(node_layer(&doc, &NodeId::from("stairs")), Some(1));
        assert_eq!(node_layer(&doc, &NodeId::from("roof")), None);
    }

    #[test]
    fn test_edge_follows_upper_endpoint() {
        let doc = building();
        assert_eq!(edge_layer(&doc, &EdgeId::from("ab")), Some(1));
        assert_eq!(edge_layer(&doc, &EdgeId::from("ba")), Some(1));
        assert_eq!(edge_layer(&doc, &EdgeId::from("dangling")), None);
        // Upper endpoint sits above every floor.
        assert_eq!(edge_layer(&doc, &EdgeId::from("to-roof")), None);

        let layers = assign_layers(&doc);
        assert_eq!(layers[1].nodes, vec![NodeId::from("a")]);
        assert!(layers[1].edges.is_empty());
        assert_eq!(
            layers[2].nodes,
            vec![NodeId::from("b"), NodeId::from("stairs")]
        );
        assert_eq!(layers[2].edges, vec![EdgeId::from("ab"), EdgeId::from("ba")]);
    }

    #[test]
    fn test_no_floors_means_no_layers() {
        let mut doc = building();
        for id in ["floor-1", "floor-0", "floor--1"] {
            doc.remove_floor(&FloorId::from(id));
        }
        assert!(assign_layers(&doc).is_empty());
    }
}
