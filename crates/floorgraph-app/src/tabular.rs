//! Flat CSV tables of nodes and edges, one row per entity.

use crate::error::ExportError;
use floorgraph_core::{GraphDocument, GraphEdge, GraphNode};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

// Serialized rows emit the header themselves; an empty table still gets one.
const NODE_HEADER: [&str; 11] = [
    "id",
    "label",
    "type",
    "x1",
    "y1",
    "z1",
    "x2",
    "y2",
    "z2",
    "capacity",
    "safetyLevel",
];
const EDGE_HEADER: [&str; 7] = [
    "id",
    "source",
    "target",
    "traversalTime",
    "capacity",
    "active",
    "bidirectional",
];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeRow<'a> {
    id: &'a str,
    label: &'a str,
    #[serde(rename = "type")]
    node_type: &'static str,
    x1: f64,
    y1: f64,
    z1: f64,
    x2: f64,
    y2: f64,
    z2: f64,
    capacity: u32,
    safety_level: i32,
}

impl<'a> From<&'a GraphNode> for NodeRow<'a> {
    fn from(node: &'a GraphNode) -> Self {
        let b = &node.bounding_box;
        Self {
            id: node.id.as_str(),
            label: &node.label,
            node_type: node.node_type.as_str(),
            x1: b.x1,
            y1: b.y1,
            z1: b.z1,
            x2: b.x2,
            y2: b.y2,
            z2: b.z2,
            capacity: node.capacity,
            safety_level: node.safety_level,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRow<'a> {
    id: &'a str,
    source: &'a str,
    target: &'a str,
    traversal_time: f64,
    capacity: u32,
    active: bool,
    bidirectional: bool,
}

impl<'a> From<&'a GraphEdge> for EdgeRow<'a> {
    fn from(edge: &'a GraphEdge) -> Self {
        Self {
            id: edge.id.as_str(),
            source: edge.source.as_str(),
            target: edge.target.as_str(),
            traversal_time: edge.traversal_time,
            capacity: edge.capacity,
            active: edge.active,
            bidirectional: edge.bidirectional,
        }
    }
}

pub fn write_nodes_csv<W: Write>(doc: &GraphDocument, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    for node in doc.nodes() {
        writer.serialize(NodeRow::from(node))?;
    }
    if doc.nodes().is_empty() {
        writer.write_record(NODE_HEADER)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_edges_csv<W: Write>(doc: &GraphDocument, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    for edge in doc.edges() {
        writer.serialize(EdgeRow::from(edge))?;
    }
    if doc.edges().is_empty() {
        writer.write_record(EDGE_HEADER)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write both tables to files.
pub fn export_csv(doc: &GraphDocument, nodes: &Path, edges: &Path) -> Result<(), ExportError> {
    write_nodes_csv(doc, std::fs::File::create(nodes)?)?;
    write_edges_csv(doc, std::fs::File::create(edges)?)?;
    tracing::info!(
        nodes = doc.nodes().len(),
        edges = doc.edges().len(),
        "exported CSV tables"
    );
    Ok(())
}
