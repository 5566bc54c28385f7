use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub mod document;
pub mod node_type;

pub use document::GraphDocument;
pub use node_type::{NodeType, ParseNodeTypeError};

/// Vertical extent of one floor in world units. Floor `level` occupies
/// `[level * FLOOR_HEIGHT, (level + 1) * FLOOR_HEIGHT)`.
pub const FLOOR_HEIGHT: f64 = 300.0;

/// Inclusive lower bound and exclusive upper bound of a floor's vertical extent.
pub fn floor_extent(level: i32) -> (f64, f64) {
    let base = level as f64 * FLOOR_HEIGHT;
    (base, base + FLOOR_HEIGHT)
}

/// Traversal times must be finite and strictly positive.
pub fn is_valid_traversal_time(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}

macro_rules! string_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// A fresh, globally unique id.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, uuid::Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(FloorId, "floor");
string_id!(NodeId, "node");
string_id!(EdgeId, "edge");

/// One annotated building level with its reference image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    pub id: FloorId,
    pub level: i32,
    pub name: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
}

impl Floor {
    /// World z at which this floor starts.
    pub fn base_z(&self) -> f64 {
        floor_extent(self.level).0
    }

    /// Half-open membership test against the floor's vertical extent.
    pub fn contains_z(&self, z: f64) -> bool {
        let (lo, hi) = floor_extent(self.level);
        z >= lo && z < hi
    }
}

/// Axis-aligned 3D volume of a node. x/y are image pixels of the floor the
/// node was drawn on, z is world height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub z1: f64,
    pub z2: f64,
}

impl BoundingBox {
    /// Build a box from two arbitrary corners, ordering each axis.
    pub fn from_corners(a: (f64, f64, f64), b: (f64, f64, f64)) -> Self {
        Self {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            z1: a.2.min(b.2),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
            z2: a.2.max(b.2),
        }
    }

    /// Same box with every axis ordered so that `min <= max`.
    pub fn normalized(self) -> Self {
        Self::from_corners((self.x1, self.y1, self.z1), (self.x2, self.y2, self.z2))
    }

    pub fn is_ordered(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2 && self.z1 <= self.z2
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn depth(&self) -> f64 {
        self.z2 - self.z1
    }

    pub fn z_mid(&self) -> f64 {
        (self.z1 + self.z2) / 2.0
    }

    pub fn center_xy(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Shift the x/y footprint, leaving the vertical range untouched.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x1: self.x1 + dx,
            x2: self.x2 + dx,
            y1: self.y1 + dy,
            y2: self.y2 + dy,
            ..self
        }
    }
}

/// A zone of the building: room, corridor, stairwell and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub capacity: u32,
    pub safety_level: i32,
    /// Every floor level the node's z-range reaches.
    pub floor_levels: BTreeSet<i32>,
    pub bounding_box: BoundingBox,
}

/// Connectivity between two nodes. Endpoints are weak references by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Seconds needed to traverse the connection.
    pub traversal_time: f64,
    pub capacity: u32,
    pub active: bool,
    pub bidirectional: bool,
}

impl GraphEdge {
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// Partial update for a node; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub capacity: Option<u32>,
    pub safety_level: Option<i32>,
    pub floor_levels: Option<BTreeSet<i32>>,
    pub bounding_box: Option<BoundingBox>,
}

impl NodePatch {
    pub fn bounding_box(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box: Some(bounding_box),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(self, node: &mut GraphNode) {
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(capacity) = self.capacity {
            node.capacity = capacity;
        }
        if let Some(safety_level) = self.safety_level {
            node.safety_level = safety_level;
        }
        if let Some(floor_levels) = self.floor_levels {
            node.floor_levels = floor_levels;
        }
        if let Some(bounding_box) = self.bounding_box {
            node.bounding_box = bounding_box;
        }
    }
}

/// Partial update for an edge. Endpoints are fixed once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgePatch {
    pub traversal_time: Option<f64>,
    pub capacity: Option<u32>,
    pub active: Option<bool>,
    pub bidirectional: Option<bool>,
}

impl EdgePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// False when the patch would store an unusable traversal time.
    pub fn is_valid(&self) -> bool {
        self.traversal_time.is_none_or(is_valid_traversal_time)
    }

    pub fn apply(self, edge: &mut GraphEdge) {
        if let Some(traversal_time) = self.traversal_time {
            edge.traversal_time = traversal_time;
        }
        if let Some(capacity) = self.capacity {
            edge.capacity = capacity;
        }
        if let Some(active) = self.active {
            edge.active = active;
        }
        if let Some(bidirectional) = self.bidirectional {
            edge.bidirectional = bidirectional;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_extent_is_half_open() {
        let floor = Floor {
            id: FloorId::from("f1"),
            level: 1,
            name: "First".to_string(),
            image_url: String::new(),
            width: 800,
            height: 600,
        };
        assert_eq!(floor_extent(1), (300.0, 600.0));
        assert!(floor.contains_z(300.0));
        assert!(floor.contains_z(599.9));
        assert!(!floor.contains_z(600.0));
        assert_eq!(floor_extent(-1), (-300.0, 0.0));
    }

    #[test]
    fn test_bounding_box_normalizes_every_axis() {
        let bbox = BoundingBox {
            x1: 50.0,
            y1: 5.0,
            x2: 10.0,
            y2: 40.0,
            z1: 300.0,
            z2: 0.0,
        }
        .normalized();
        assert!(bbox.is_ordered());
        assert_eq!((bbox.x1, bbox.x2), (10.0, 50.0));
        assert_eq!((bbox.z1, bbox.z2), (0.0, 300.0));
    }

    #[test]
    fn test_translate_keeps_vertical_range() {
        let bbox =
            BoundingBox::from_corners((0.0, 0.0, 0.0), (10.0, 20.0, 300.0)).translated(5.0, -5.0);
        assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (5.0, -5.0, 15.0, 15.0));
        assert_eq!((bbox.z1, bbox.z2), (0.0, 300.0));
    }

    #[test]
    fn test_node_serializes_with_document_field_names() {
        let node = GraphNode {
            id: NodeId::from("n1"),
            label: "Lab".to_string(),
            node_type: NodeType::Classroom,
            capacity: 30,
            safety_level: 1,
            floor_levels: BTreeSet::from([0]),
            bounding_box: BoundingBox::default(),
        };
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "classroom");
        assert_eq!(value["safetyLevel"], 1);
        assert_eq!(value["floorLevels"], serde_json::json!([0]));
        assert!(value.get("boundingBox").is_some());
    }

    #[test]
    fn test_generated_ids_are_unique_and_prefixed() {
        let a = NodeId::generate();
        let b = NodeId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("node-"));
        assert!(EdgeId::generate().as_str().starts_with("edge-"));
    }

    #[test]
    fn test_patches_only_touch_given_fields() {
        let mut edge = GraphEdge {
            id: EdgeId::from("e1"),
            source: NodeId::from("a"),
            target: NodeId::from("b"),
            traversal_time: 10.0,
            capacity: 50,
            active: true,
            bidirectional: true,
        };
        EdgePatch {
            active: Some(false),
            ..Default::default()
        }
        .apply(&mut edge);
        assert!(!edge.active);
        assert_eq!(edge.capacity, 50);
        assert!(EdgePatch::default().is_empty());
    }

    #[test]
    fn test_edge_patch_rejects_unusable_traversal_times() {
        for seconds in [-5.0, 0.0, f64::NAN, f64::INFINITY] {
            let patch = EdgePatch {
                traversal_time: Some(seconds),
                ..Default::default()
            };
            assert!(!patch.is_valid(), "{seconds} should be rejected");
        }
        assert!(EdgePatch::default().is_valid());
        assert!(
            EdgePatch {
                traversal_time: Some(0.5),
                ..Default::default()
            }
            .is_valid()
        );
    }
}
