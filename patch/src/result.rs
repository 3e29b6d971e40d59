//! Patch result and error types.

use canopy_core::{NodeId, Properties};
use serde::Serialize;
use thiserror::Error;

/// Operation name used when a failure has no patch context.
pub const UNKNOWN_OPERATION: &str = "unknown";

/// Which stage of the pipeline rejected the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchErrorKind {
    /// A patch record is structurally malformed.
    Parse,
    /// A well-formed patch is invalid against the tree or schema.
    Validation,
    /// Applying an already validated patch failed.
    Execution,
    /// Any other failure (context, transaction, depth cap).
    System,
}

/// The single error reported for a failed batch.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("patch {patch_index} ({operation}): {message}")]
pub struct PatchError {
    #[serde(skip)]
    pub kind: PatchErrorKind,
    pub message: String,
    pub patch_index: usize,
    pub operation: String,
    pub node_id: Option<NodeId>,
}

impl PatchError {
    pub fn new(
        kind: PatchErrorKind,
        message: impl Into<String>,
        patch_index: usize,
        operation: impl Into<String>,
        node_id: Option<NodeId>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            patch_index,
            operation: operation.into(),
            node_id,
        }
    }

    pub fn parse(
        patch_index: usize,
        operation: impl Into<String>,
        node_id: Option<NodeId>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(PatchErrorKind::Parse, message, patch_index, operation, node_id)
    }

    pub fn validation(
        patch_index: usize,
        operation: impl Into<String>,
        node_id: &NodeId,
        violation: Violation,
    ) -> Self {
        Self::new(
            PatchErrorKind::Validation,
            violation.to_string(),
            patch_index,
            operation,
            Some(node_id.clone()),
        )
    }

    pub fn execution(
        patch_index: usize,
        operation: impl Into<String>,
        node_id: &NodeId,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            PatchErrorKind::Execution,
            message,
            patch_index,
            operation,
            Some(node_id.clone()),
        )
    }

    /// A failure with no specific patch context.
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(PatchErrorKind::System, message, 0, UNKNOWN_OPERATION, None)
    }
}

/// Reasons a patch fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("node type {0} does not exist")]
    TypeNotFound(String),

    #[error("node type {0} is abstract and cannot be created")]
    AbstractType(String),

    #[error("reference node {0} has no parent")]
    NoParent(NodeId),

    #[error("node type {child_type} is not allowed below a node of type {parent_type}")]
    ChildNotAllowed {
        parent_type: String,
        child_type: String,
    },

    #[error("invalid node name {0:?}")]
    InvalidNodeName(String),

    #[error("a node named {name:?} already exists below {parent}")]
    DuplicateNodeName { parent: NodeId, name: String },

    #[error("node {0} cannot be positioned relative to itself")]
    SelfReference(NodeId),

    #[error("node {node} cannot be moved into its own subtree")]
    MoveIntoOwnSubtree { node: NodeId },

    #[error("node {0} is the root node and cannot be moved or deleted")]
    RootNode(NodeId),

    #[error("node {0} is an auto-created child and cannot be moved or deleted")]
    TetheredNode(NodeId),

    #[error("property {0} is internal and cannot be set")]
    InternalProperty(String),

    #[error("property {property} is not declared on node type {type_name}")]
    UndeclaredProperty { type_name: String, property: String },

    #[error("property {property} expects a value of type {expected}, got {actual}")]
    InvalidPropertyType {
        property: String,
        expected: String,
        actual: String,
    },

    #[error("property {property} references node {target} which does not exist")]
    ReferenceNotFound { property: String, target: String },

    #[error("property {property} does not match pattern {pattern}")]
    PatternMismatch { property: String, pattern: String },
}

impl Violation {
    pub fn child_not_allowed(
        parent_type: impl Into<String>,
        child_type: impl Into<String>,
    ) -> Self {
        Self::ChildNotAllowed {
            parent_type: parent_type.into(),
            child_type: child_type.into(),
        }
    }

    pub fn undeclared_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UndeclaredProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    pub fn invalid_property_type(
        property: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidPropertyType {
            property: property.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn reference_not_found(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self::ReferenceNotFound {
            property: property.into(),
            target: target.into(),
        }
    }

    pub fn pattern_mismatch(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::PatternMismatch {
            property: property.into(),
            pattern: pattern.into(),
        }
    }
}

/// A node created by a `createNode` patch, directly or as a descendant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNodeInfo {
    pub id: NodeId,
    #[serde(rename = "nodeType")]
    pub type_name: String,
    #[serde(rename = "nodeName")]
    pub local_name: String,
    pub properties: Properties,
    /// 0 for the requested node, increasing for auto-created descendants.
    pub depth: usize,
}

/// Record of one executed patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOutcome {
    pub index: usize,
    pub operation: String,
    pub node_id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_nodes: Option<Vec<CreatedNodeInfo>>,
}

/// Result of applying a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResult {
    pub success: bool,
    pub dry_run: bool,
    #[serde(rename = "results")]
    pub outcomes: Vec<PatchOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PatchError>,
    pub rolled_back: bool,
}

impl PatchResult {
    pub fn success(dry_run: bool, outcomes: Vec<PatchOutcome>, rolled_back: bool) -> Self {
        Self {
            success: true,
            dry_run,
            outcomes,
            error: None,
            rolled_back,
        }
    }

    /// A failed batch. Nothing was persisted, so no outcomes are reported.
    pub fn failure(dry_run: bool, error: PatchError, rolled_back: bool) -> Self {
        Self {
            success: false,
            dry_run,
            outcomes: Vec::new(),
            error: Some(error),
            rolled_back,
        }
    }

    /// Nodes created by all patches, in execution order.
    pub fn created_nodes(&self) -> impl Iterator<Item = &CreatedNodeInfo> {
        self.outcomes
            .iter()
            .flat_map(|o| o.created_nodes.iter().flatten())
    }
}
