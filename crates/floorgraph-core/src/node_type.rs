use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Classroom,
    Corridor,
    Stairs,
    Outdoor,
    Office,
    Service,
    Bathroom,
}

/// Error type for strict node type parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid node type: {0}")]
pub struct ParseNodeTypeError(pub String);

impl NodeType {
    pub const ALL: [NodeType; 7] = [
        NodeType::Classroom,
        NodeType::Corridor,
        NodeType::Stairs,
        NodeType::Outdoor,
        NodeType::Office,
        NodeType::Service,
        NodeType::Bathroom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Classroom => "classroom",
            NodeType::Corridor => "corridor",
            NodeType::Stairs => "stairs",
            NodeType::Outdoor => "outdoor",
            NodeType::Office => "office",
            NodeType::Service => "service",
            NodeType::Bathroom => "bathroom",
        }
    }

    /// Best-effort mapping of a free-text zone description onto the closed set.
    ///
    /// Matching is case-insensitive substring search, checked in a fixed order;
    /// anything unrecognised is a classroom.
    pub fn infer(description: &str) -> NodeType {
        let text = description.to_lowercase();
        if text.contains("corridor") {
            NodeType::Corridor
        } else if text.contains("stair") {
            NodeType::Stairs
        } else if text.contains("out") {
            NodeType::Outdoor
        } else if text.contains("office") {
            NodeType::Office
        } else if ["bath", "wc", "toilet", "restroom"]
            .iter()
            .any(|needle| text.contains(needle))
        {
            NodeType::Bathroom
        } else if text.contains("service") {
            NodeType::Service
        } else {
            NodeType::Classroom
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = ParseNodeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseNodeTypeError(s.to_string()))
    }
}
