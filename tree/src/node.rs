//! Node structures for the content tree.

use canopy_core::{NodeId, Properties};
use serde::Serialize;

/// A node as stored in one subgraph (workspace + dimension point).
#[derive(Debug, Clone)]
pub(crate) struct StoredNode {
    pub(crate) id: NodeId,
    pub(crate) type_name: String,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    /// Ordered child ids.
    pub(crate) children: Vec<NodeId>,
    pub(crate) properties: Properties,
    /// Created automatically as a declared child of its parent's type.
    pub(crate) tethered: bool,
}

impl StoredNode {
    pub(crate) fn view(&self) -> NodeView {
        NodeView {
            id: self.id.clone(),
            type_name: self.type_name.clone(),
            name: self.name.clone(),
            parent_id: self.parent.clone(),
            properties: self.properties.clone(),
            tethered: self.tethered,
        }
    }
}

/// Read-only snapshot of a node handed out by a tree accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Node type name.
    pub type_name: String,
    /// Node name, unique among its siblings.
    pub name: String,
    /// Parent id (`None` for the root).
    pub parent_id: Option<NodeId>,
    /// Property values.
    pub properties: Properties,
    /// Whether the node is an auto-created child of its parent.
    pub tethered: bool,
}

impl NodeView {
    /// Get a property value by name.
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Returns true if this is the root of its subgraph.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Metadata of a media asset referenced from properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    pub id: String,
    pub filename: String,
    pub media_type: String,
}

impl AssetInfo {
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            filename: filename.into(),
            media_type: media_type.into(),
        }
    }
}
