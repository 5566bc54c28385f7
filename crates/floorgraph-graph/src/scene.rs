use crate::geometry::{Affine2, Vec2};
use crate::layering::assign_layers;
use crate::projection::{Camera, Projection, plan_center};
use floorgraph_core::{
    BoundingBox, EdgeId, FloorId, GraphDocument, GraphNode, NodeId, NodeType, floor_extent,
};
use serde::{Deserialize, Serialize};

/// A node volume in projected space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePrism {
    pub id: NodeId,
    pub label: String,
    pub node_type: NodeType,
    /// Footprint corners at `z1`, clockwise from the top-left.
    pub footprint: [Vec2; 4],
    /// The same corners at `z2`.
    pub top: [Vec2; 4],
    /// Projected footprint centre, where connectors attach.
    pub center: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSegment {
    pub id: EdgeId,
    pub from: Vec2,
    pub to: Vec2,
    pub active: bool,
    pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayer {
    pub floor_id: FloorId,
    pub level: i32,
    pub base_z: f64,
    /// Places the floor image (its own pixel space) into projected space.
    pub plane: Affine2,
    pub image_width: u32,
    pub image_height: u32,
    pub nodes: Vec<NodePrism>,
    pub edges: Vec<EdgeSegment>,
}

/// Everything needed to draw the 3D overview, back to front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub center: Vec2,
    pub camera: Camera,
    pub layers: Vec<SceneLayer>,
}

/// Projects a document under a camera. Holds no state between builds.
pub struct SceneBuilder {
    camera: Camera,
}

impl SceneBuilder {
    pub fn new(camera: Camera) -> Self {
        Self { camera }
    }

    pub fn build(&self, doc: &GraphDocument) -> Scene {
        let center = plan_center(doc.floors());
        let projection = Projection::new(center, self.camera);

        let layers = assign_layers(doc)
            .into_iter()
            .filter_map(|layer| {
                let floor = doc.floor(&layer.floor_id)?;
                let nodes = layer
                    .nodes
                    .iter()
                    .filter_map(|id| doc.node(id))
                    .map(|node| Self::prism(&projection, node))
                    .collect();
                let edges = layer
                    .edges
                    .iter()
                    .filter_map(|id| doc.edge(id))
                    .filter_map(|edge| {
                        let source = doc.node(&edge.source)?;
                        let target = doc.node(&edge.target)?;
                        Some(EdgeSegment {
                            id: edge.id.clone(),
                            from: Self::anchor(&projection, &source.bounding_box),
                            to: Self::anchor(&projection, &target.bounding_box),
                            active: edge.active,
                            bidirectional: edge.bidirectional,
                        })
                    })
                    .collect();

                Some(SceneLayer {
                    floor_id: layer.floor_id,
                    level: layer.level,
                    base_z: floor_extent(layer.level).0,
                    plane: projection.floor_transform(layer.level),
                    image_width: floor.width,
                    image_height: floor.height,
                    nodes,
                    edges,
                })
            })
            .collect();

        Scene {
            center,
            camera: self.camera,
            layers,
        }
    }

    fn quad(projection: &Projection, bbox: &BoundingBox, z: f64) -> [Vec2; 4] {
        [
            projection.project(bbox.x1, bbox.y1, z),
            projection.project(bbox.x2, bbox.y1, z),
            projection.project(bbox.x2, bbox.y2, z),
            projection.project(bbox.x1, bbox.y2, z),
        ]
    }

    // Connectors attach at the node's own base height, not the floor base.
    fn anchor(projection: &Projection, bbox: &BoundingBox) -> Vec2 {
        let (cx, cy) = bbox.center_xy();
        projection.project(cx, cy, bbox.z1)
    }

    fn prism(projection: &Projection, node: &GraphNode) -> NodePrism {
        let bbox = &node.bounding_box;
        NodePrism {
            id: node.id.clone(),
            label: node.label.clone(),
            node_type: node.node_type,
            footprint: Self::quad(projection, bbox, bbox.z1),
            top: Self::quad(projection, bbox, bbox.z2),
            center: Self::anchor(projection, bbox),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_core::{Floor, GraphEdge};
    use std::collections::BTreeSet;

    fn doc() -> GraphDocument {
        let floors = (0..2)
            .rev()
            .map(|level| Floor {
                id: FloorId::new(format!("floor-{level}")),
                level,
                name: format!("Level {level}"),
                image_url: String::new(),
                width: 400,
                height: 200,
            })
            .collect();
        let node = |id: &str, level: i32| GraphNode {
            id: NodeId::from(id),
            label: id.to_uppercase(),
            node_type: NodeType::Corridor,
            capacity: 10,
            safety_level: 1,
            floor_levels: BTreeSet::from([level]),
            bounding_box: BoundingBox {
                x1: 100.0,
                y1: 50.0,
                x2: 200.0,
                y2: 150.0,
                z1: floor_extent(level).0,
                z2: floor_extent(level).1,
            },
        };
        GraphDocument::from_parts(
            floors,
            vec![node("a", 0), node("b", 1)],
            vec![GraphEdge {
                id: EdgeId::from("ab"),
                source: NodeId::from("a"),
                target: NodeId::from("b"),
                traversal_time: 30.0,
                capacity: 20,
                active: true,
                bidirectional: false,
            }],
        )
    }

    #[test]
    fn test_layers_back_to_front() {
        let scene = SceneBuilder::new(Camera::default()).build(&doc());
        assert_eq!(scene.center, Vec2::new(200.0, 100.0));
        let levels: Vec<i32> = scene.layers.iter().map(|l| l.level).collect();
        assert_eq!(levels, vec![0, 1]);
        assert_eq!(scene.layers[1].base_z, 300.0);
        assert_eq!(scene.layers[0].nodes[0].id, NodeId::from("a"));
    }

    #[test]
    fn test_inter_floor_edge_uses_true_heights() {
        let camera = Camera::new(0.0, 1.0, 1.0, 1.0);
        let scene = SceneBuilder::new(camera).build(&doc());

        assert!(scene.layers[0].edges.is_empty());
        let segment = &scene.layers[1].edges[0];
        // Both centres are (150, 100); only the lift differs.
        assert_eq!(segment.from, Vec2::new(-50.0, 0.0));
        assert_eq!(segment.to, Vec2::new(-50.0, -300.0));
        assert!(!segment.bidirectional);
    }

    #[test]
    fn test_prism_top_is_lifted_by_height() {
        let camera = Camera::new(0.0, 1.0, 1.0, 0.5);
        let scene = SceneBuilder::new(camera).build(&doc());
        let prism = &scene.layers[0].nodes[0];
        assert_eq!(prism.footprint[0], Vec2::new(-100.0, -50.0));
        assert_eq!(prism.top[0], Vec2::new(-100.0, -200.0));
        assert_eq!(prism.center, Vec2::new(-50.0, 0.0));
    }

    #[test]
    fn test_plane_places_image_origin() {
        let camera = Camera::new(0.0, 1.0, 1.0, 1.0);
        let scene = SceneBuilder::new(camera).build(&doc());
        let plane = scene.layers[1].plane;
        assert_eq!(plane.apply(Vec2::ZERO), Vec2::new(-200.0, -400.0));
    }
}
