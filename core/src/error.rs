//! Common error types for the content tree.

use crate::{Dimensions, NodeId, WorkspaceName};
use thiserror::Error;

/// Errors that can occur during content tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Workspace does not exist.
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(WorkspaceName),

    /// No subgraph for the dimension point in this workspace.
    #[error("No content for dimensions {dimensions} in workspace {workspace}")]
    SubgraphNotFound {
        workspace: WorkspaceName,
        dimensions: Dimensions,
    },

    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node type not declared in the schema.
    #[error("Node type not found: {0}")]
    TypeNotFound(String),

    /// A sibling with the same name already exists.
    #[error("Node {parent} already has a child named {name}")]
    DuplicateName { parent: NodeId, name: String },

    /// Node name does not follow the naming rules.
    #[error("Invalid node name: {0}")]
    InvalidName(String),

    /// The parent's type forbids the child type.
    #[error("Node type {child_type} is not allowed below node type {parent_type}")]
    ChildNotAllowed {
        parent_type: String,
        child_type: String,
    },

    /// A sibling used for ordering is not a child of the given parent.
    #[error("Node {sibling} is not a child of {parent}")]
    NotASibling { parent: NodeId, sibling: NodeId },

    /// A move would make a node its own ancestor.
    #[error("Cannot move node {node} below itself or its descendant {target}")]
    CycleDetected { node: NodeId, target: NodeId },

    /// The root node cannot be moved or removed.
    #[error("Cannot modify the root node {0}")]
    RootNode(NodeId),

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;
