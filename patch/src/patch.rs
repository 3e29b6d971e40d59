//! Typed patch operations.

use canopy_core::{NodeId, Properties};
use std::fmt;

/// Where a node is placed relative to a reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// As the last child of the reference node.
    #[default]
    Into,
    /// As the sibling directly preceding the reference node.
    Before,
    /// As the sibling directly following the reference node.
    After,
}

impl Position {
    /// Parse the wire form (`into`, `before`, `after`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "into" => Some(Position::Into),
            "before" => Some(Position::Before),
            "after" => Some(Position::After),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Into => "into",
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative mutation within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Create a node relative to an existing reference node.
    CreateNode {
        reference_node_id: NodeId,
        position: Position,
        type_name: String,
        /// Explicit node name; generated from the type when absent.
        node_name: Option<String>,
        properties: Properties,
    },
    /// Merge properties into an existing node.
    UpdateNode {
        node_id: NodeId,
        properties: Properties,
    },
    /// Move a node relative to a target node.
    MoveNode {
        node_id: NodeId,
        target_node_id: NodeId,
        position: Position,
    },
    /// Remove a node and its subtree.
    DeleteNode { node_id: NodeId },
}

impl Patch {
    /// Wire name of the operation.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Patch::CreateNode { .. } => "createNode",
            Patch::UpdateNode { .. } => "updateNode",
            Patch::MoveNode { .. } => "moveNode",
            Patch::DeleteNode { .. } => "deleteNode",
        }
    }

    /// The node an error about this patch is reported against.
    pub fn subject(&self) -> &NodeId {
        match self {
            Patch::CreateNode {
                reference_node_id, ..
            } => reference_node_id,
            Patch::UpdateNode { node_id, .. }
            | Patch::MoveNode { node_id, .. }
            | Patch::DeleteNode { node_id } => node_id,
        }
    }
}
