//! The on-disk JSON document format.

use crate::error::{ExportError, ImportError};
use chrono::{DateTime, Utc};
use floorgraph_core::{Floor, GraphDocument, GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const REQUIRED_FIELDS: [&str; 3] = ["floors", "nodes", "edges"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub generated: DateTime<Utc>,
    pub app: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDocument {
    #[serde(default)]
    pub metadata: Option<DocumentMetadata>,
    pub floors: Vec<Floor>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl PersistedDocument {
    /// Snapshot `doc` for export, stamped with the current time.
    pub fn from_document(doc: &GraphDocument, app: &str) -> Self {
        Self {
            metadata: Some(DocumentMetadata {
                generated: Utc::now(),
                app: app.to_string(),
            }),
            floors: doc.floors().to_vec(),
            nodes: doc.nodes().to_vec(),
            edges: doc.edges().to_vec(),
        }
    }

    /// Build the in-memory document. Bounding boxes are normalized so every
    /// axis is ordered.
    pub fn into_document(self) -> GraphDocument {
        let nodes = self
            .nodes
            .into_iter()
            .map(|mut node| {
                node.bounding_box = node.bounding_box.normalized();
                node
            })
            .collect();
        GraphDocument::from_parts(self.floors, nodes, self.edges)
    }

    /// Parse and validate a persisted document.
    ///
    /// A missing top-level `floors`, `nodes` or `edges` field is rejected
    /// outright rather than defaulted to empty, as are two floors sharing a level.
    pub fn parse(json: &str) -> Result<Self, ImportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let object = value.as_object().ok_or(ImportError::NotAnObject)?;
        if let Some(missing) = REQUIRED_FIELDS.into_iter().find(|f| !object.contains_key(*f)) {
            return Err(ImportError::MissingField(missing));
        }
        let persisted: Self = serde_json::from_value(value)?;

        let mut levels = HashSet::new();
        if let Some(floor) = persisted.floors.iter().find(|f| !levels.insert(f.level)) {
            return Err(ImportError::DuplicateFloorLevel(floor.level));
        }
        Ok(persisted)
    }

    pub fn read(path: &Path) -> Result<Self, ImportError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ExportError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
