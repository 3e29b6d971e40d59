//! The tree accessor trait.
//!
//! Every read and write goes through a [`TreeContext`], which pins the
//! workspace and dimension point the operation addresses.

use crate::{AssetInfo, NodeView};
use canopy_core::{Dimensions, NodeId, Properties, TreeResult, WorkspaceName};

/// Workspace + dimension point a batch operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeContext {
    pub workspace: WorkspaceName,
    pub dimensions: Dimensions,
}

impl TreeContext {
    pub fn new(workspace: WorkspaceName, dimensions: Dimensions) -> Self {
        Self {
            workspace,
            dimensions,
        }
    }
}

/// Parameters for creating a node.
#[derive(Debug, Clone)]
pub struct CreateNodeCommand {
    /// Parent of the new node.
    pub parent_id: NodeId,
    /// Sibling the new node is inserted before; appended when `None`.
    pub succeeding_sibling: Option<NodeId>,
    /// Node type of the new node.
    pub type_name: String,
    /// Node name, unique among the parent's children.
    pub name: String,
    /// Initial properties (already normalized).
    pub properties: Properties,
}

/// Access to a hierarchical content tree.
///
/// Creating a node also creates the auto-created children and template
/// children its type declares. Removing a node removes its subtree.
pub trait TreeAccessor: Send + Sync {
    /// Open a context for a workspace and dimension point.
    fn open_context(
        &self,
        workspace: &WorkspaceName,
        dimensions: &Dimensions,
    ) -> TreeResult<TreeContext>;

    /// Resolve a node by id.
    fn find_node(&self, ctx: &TreeContext, id: &NodeId) -> Option<NodeView>;

    /// Resolve the parent of a node.
    fn parent_of(&self, ctx: &TreeContext, id: &NodeId) -> Option<NodeView>;

    /// Ordered children of a node.
    fn children(&self, ctx: &TreeContext, id: &NodeId) -> Vec<NodeView>;

    /// Check whether `parent` has a child named `name`.
    fn has_child_named(&self, ctx: &TreeContext, parent: &NodeId, name: &str) -> bool;

    /// Check whether a node of `child_type` may be placed below `parent`.
    fn type_permits_child(&self, ctx: &TreeContext, parent: &NodeView, child_type: &str) -> bool;

    /// Check whether `node` is `ancestor` or lies below it.
    fn is_descendant_or_self(&self, ctx: &TreeContext, node: &NodeId, ancestor: &NodeId) -> bool;

    /// Create a node and return its id.
    fn create_node(&self, ctx: &TreeContext, command: CreateNodeCommand) -> TreeResult<NodeId>;

    /// Merge properties into a node; a `null` value removes the property.
    fn set_properties(&self, ctx: &TreeContext, id: &NodeId, properties: Properties)
        -> TreeResult<()>;

    /// Move a node below `new_parent`, before `succeeding_sibling` or last.
    fn move_node(
        &self,
        ctx: &TreeContext,
        id: &NodeId,
        new_parent: &NodeId,
        succeeding_sibling: Option<&NodeId>,
    ) -> TreeResult<()>;

    /// Remove a node and its subtree.
    fn remove_node(&self, ctx: &TreeContext, id: &NodeId) -> TreeResult<()>;

    /// Look up asset metadata by identifier.
    fn resolve_asset(&self, id: &str) -> Option<AssetInfo>;
}
