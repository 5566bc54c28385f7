//! Stateless spatial queries shared by the editor and the projection.

use crate::geometry::{Rect, Vec2};
use floorgraph_core::{BoundingBox, GraphNode, NodeId, floor_extent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resize handle positions on a node's footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// True when this corner owns `x1` (otherwise it owns `x2`).
    pub fn owns_min_x(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    /// True when this corner owns `y1` (otherwise it owns `y2`).
    pub fn owns_min_y(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    pub fn position(&self, rect: &Rect) -> Vec2 {
        Vec2::new(
            if self.owns_min_x() { rect.min.x } else { rect.max.x },
            if self.owns_min_y() { rect.min.y } else { rect.max.y },
        )
    }
}

/// Square grab area around a corner, `half_size` on each side.
pub fn handle_rect(footprint: &Rect, corner: Corner, half_size: f64) -> Rect {
    let p = corner.position(footprint);
    Rect::from_min_max(p, p).expand(half_size)
}

/// Axis-aligned overlap; touching borders count, containment is not required.
pub fn boxes_overlap(a: &Rect, b: &Rect) -> bool {
    a.intersects(b)
}

/// Level whose half-open vertical extent holds the midpoint of `bbox`'s z-range.
pub fn layer_level<I>(bbox: &BoundingBox, levels: I) -> Option<i32>
where
    I: IntoIterator<Item = i32>,
{
    let mid = bbox.z_mid();
    levels.into_iter().find(|&level| {
        let (lo, hi) = floor_extent(level);
        mid >= lo && mid < hi
    })
}

/// Every level among `levels` whose extent the z-range reaches into.
pub fn levels_spanned<I>(bbox: &BoundingBox, levels: I) -> BTreeSet<i32>
where
    I: IntoIterator<Item = i32>,
{
    levels
        .into_iter()
        .filter(|&level| {
            let (lo, hi) = floor_extent(level);
            if bbox.z1 == bbox.z2 {
                bbox.z1 >= lo && bbox.z1 < hi
            } else {
                bbox.z1 < hi && bbox.z2 > lo
            }
        })
        .collect()
}

/// Whether a node is drawn on (and editable from) the given level.
///
/// Listed `floor_levels` are authoritative; nodes without any fall back to
/// z-midpoint classification.
pub fn is_on_level(node: &GraphNode, level: i32) -> bool {
    if node.floor_levels.is_empty() {
        layer_level(&node.bounding_box, [level]).is_some()
    } else {
        node.floor_levels.contains(&level)
    }
}

/// Ids of nodes on `level` whose footprint overlaps `area`, in document order.
pub fn nodes_overlapping<'a, I>(area: &Rect, nodes: I, level: i32) -> Vec<NodeId>
where
    I: IntoIterator<Item = &'a GraphNode>,
{
    nodes
        .into_iter()
        .filter(|node| is_on_level(node, level))
        .filter(|node| boxes_overlap(area, &Rect::from_bbox(&node.bounding_box)))
        .map(|node| node.id.clone())
        .collect()
}

/// Distance from `p` to the segment `a`-`b`.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_core::NodeType;

    fn node_with_z(id: &str, z1: f64, z2: f64, levels: &[i32]) -> GraphNode {
        GraphNode {
            id: NodeId::from(id),
            label: id.to_string(),
            node_type: NodeType::Stairs,
            capacity: 0,
            safety_level: 1,
            floor_levels: levels.iter().copied().collect(),
            bounding_box: BoundingBox {
                x1: 0.0,
                y1: 0.0,
                x2: 50.0,
                y2: 50.0,
                z1,
                z2,
            },
        }
    }

    #[test]
    fn test_layer_level_uses_z_midpoint() {
        let ground = node_with_z("g", 0.0, 300.0, &[0]);
        let stairs = node_with_z("s", 250.0, 650.0, &[0, 1, 2]);
        assert_eq!(layer_level(&ground.bounding_box, [0, 1, 2]), Some(0));
        assert_eq!(layer_level(&stairs.bounding_box, [0, 1, 2]), Some(1));
        assert_eq!(layer_level(&stairs.bounding_box, [0, 2]), None);
    }

    #[test]
    fn test_levels_spanned_excludes_touching_upper_bound() {
        let single = node_with_z("a", 0.0, 300.0, &[]);
        assert_eq!(levels_spanned(&single.bounding_box, -1..=2), BTreeSet::from([0]));

        let stairs = node_with_z("s", 250.0, 650.0, &[]);
        assert_eq!(
            levels_spanned(&stairs.bounding_box, -1..=3),
            BTreeSet::from([0, 1, 2])
        );

        let flat = node_with_z("f", 300.0, 300.0, &[]);
        assert_eq!(levels_spanned(&flat.bounding_box, 0..=1), BTreeSet::from([1]));
    }

    #[test]
    fn test_is_on_level_prefers_listed_levels() {
        let listed = node_with_z("a", 0.0, 300.0, &[1]);
        assert!(listed.floor_levels.contains(&1));
        assert!(is_on_level(&listed, 1));
        assert!(!is_on_level(&listed, 0));

        let unlisted = node_with_z("b", 0.0, 300.0, &[]);
        assert!(is_on_level(&unlisted, 0));
        assert!(!is_on_level(&unlisted, 1));
    }

    #[test]
    fn test_nodes_overlapping_filters_by_level() {
        let a = node_with_z("a", 0.0, 300.0, &[0]);
        let b = node_with_z("b", 300.0, 600.0, &[1]);
        let area = Rect::from_points(Vec2::new(40.0, 40.0), Vec2::new(60.0, 60.0));
        assert_eq!(nodes_overlapping(&area, [&a, &b], 0), vec![NodeId::from("a")]);
        let far = Rect::from_points(Vec2::new(100.0, 100.0), Vec2::new(120.0, 120.0));
        assert!(nodes_overlapping(&far, [&a, &b], 0).is_empty());
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 0.0);
        assert_eq!(point_segment_distance(Vec2::new(50.0, 3.0), a, b), 3.0);
        assert_eq!(point_segment_distance(Vec2::new(-3.0, 4.0), a, b), 5.0);
        assert_eq!(point_segment_distance(Vec2::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn test_corner_ownership() {
        let rect = Rect::from_bbox(&node_with_z("a", 0.0, 1.0, &[]).bounding_box);
        assert_eq!(Corner::TopLeft.position(&rect), Vec2::new(0.0, 0.0));
        assert_eq!(Corner::BottomRight.position(&rect), Vec2::new(50.0, 50.0));
        let handle = handle_rect(&rect, Corner::TopRight, 4.0);
        assert!(handle.contains(Vec2::new(53.0, -3.0)));
        assert!(!handle.contains(Vec2::new(45.0, 0.0)));
    }
}
