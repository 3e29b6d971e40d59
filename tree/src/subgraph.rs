//! Ordered tree storage for one workspace + dimension point.

use crate::node::StoredNode;
use crate::NodeView;
use canopy_core::{NodeId, Properties, TreeError, TreeResult};
use regex_lite::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Node names: lower-case alphanumerics and dashes, not starting with a dash.
pub fn is_valid_node_name(name: &str) -> bool {
    static NAME: OnceLock<Option<Regex>> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,254}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// One subgraph of the content repository.
#[derive(Debug, Clone)]
pub(crate) struct Subgraph {
    root: NodeId,
    nodes: HashMap<NodeId, StoredNode>,
}

impl Subgraph {
    /// Create a subgraph holding only its root node.
    pub(crate) fn new(root: NodeId, root_type: impl Into<String>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            root.clone(),
            StoredNode {
                id: root.clone(),
                type_name: root_type.into(),
                name: String::new(),
                parent: None,
                children: Vec::new(),
                properties: Properties::new(),
                tethered: false,
            },
        );
        Self { root, nodes }
    }

    pub(crate) fn root(&self) -> &NodeId {
        &self.root
    }

    // ==================== Reads ====================

    pub(crate) fn get(&self, id: &NodeId) -> Option<&StoredNode> {
        self.nodes.get(id)
    }

    pub(crate) fn view(&self, id: &NodeId) -> Option<NodeView> {
        self.nodes.get(id).map(StoredNode::view)
    }

    pub(crate) fn parent_of(&self, id: &NodeId) -> Option<NodeView> {
        let parent = self.nodes.get(id)?.parent.as_ref()?;
        self.view(parent)
    }

    pub(crate) fn children(&self, id: &NodeId) -> Vec<NodeView> {
        self.nodes
            .get(id)
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|child| self.view(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn has_child_named(&self, parent: &NodeId, name: &str) -> bool {
        self.nodes.get(parent).is_some_and(|node| {
            node.children
                .iter()
                .filter_map(|c| self.nodes.get(c))
                .any(|c| c.name == name)
        })
    }

    /// Walks up from `node`; true if `ancestor` is met (including `node` itself).
    pub(crate) fn is_descendant_or_self(&self, node: &NodeId, ancestor: &NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent.as_ref());
        }
        false
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ==================== Writes ====================

    /// Insert a new node below `parent`, before `succeeding_sibling` or last.
    pub(crate) fn insert(
        &mut self,
        node: StoredNode,
        succeeding_sibling: Option<&NodeId>,
    ) -> TreeResult<()> {
        let parent_id = node
            .parent
            .clone()
            .ok_or_else(|| TreeError::InvalidOperation("only the root may lack a parent".into()))?;
        if self.nodes.contains_key(&node.id) {
            return Err(TreeError::InvalidOperation(format!(
                "node {} already exists",
                node.id
            )));
        }
        if !is_valid_node_name(&node.name) {
            return Err(TreeError::InvalidName(node.name));
        }
        if self.has_child_named(&parent_id, &node.name) {
            return Err(TreeError::DuplicateName {
                parent: parent_id,
                name: node.name,
            });
        }
        let index = self.insertion_index(&parent_id, succeeding_sibling)?;

        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.insert(index, id);
        }
        Ok(())
    }

    /// Merge properties; `null` removes a property.
    pub(crate) fn set_properties(&mut self, id: &NodeId, properties: Properties) -> TreeResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        for (name, value) in properties {
            if value == Value::Null {
                node.properties.remove(&name);
            } else {
                node.properties.insert(name, value);
            }
        }
        Ok(())
    }

    /// Move a node below `new_parent`, before `succeeding_sibling` or last.
    pub(crate) fn move_node(
        &mut self,
        id: &NodeId,
        new_parent: &NodeId,
        succeeding_sibling: Option<&NodeId>,
    ) -> TreeResult<()> {
        if id == &self.root {
            return Err(TreeError::RootNode(id.clone()));
        }
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        if !self.nodes.contains_key(new_parent) {
            return Err(TreeError::NodeNotFound(new_parent.clone()));
        }
        if self.is_descendant_or_self(new_parent, id) {
            return Err(TreeError::CycleDetected {
                node: id.clone(),
                target: new_parent.clone(),
            });
        }
        if succeeding_sibling == Some(id) {
            return Err(TreeError::InvalidOperation(format!(
                "node {} cannot precede itself",
                id
            )));
        }
        let old_parent = node.parent.clone();
        let name = node.name.clone();
        if old_parent.as_ref() != Some(new_parent) && self.has_child_named(new_parent, &name) {
            return Err(TreeError::DuplicateName {
                parent: new_parent.clone(),
                name,
            });
        }

        if let Some(sibling) = succeeding_sibling {
            self.insertion_index(new_parent, Some(sibling))?;
        }

        // Detach first so the insertion index is computed without the node
        if let Some(old_parent) = &old_parent {
            if let Some(parent) = self.nodes.get_mut(old_parent) {
                parent.children.retain(|c| c != id);
            }
        }
        let index = self.insertion_index(new_parent, succeeding_sibling)?;
        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.insert(index, id.clone());
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(new_parent.clone());
        }
        Ok(())
    }

    /// Remove a node and its whole subtree. Returns the removed ids.
    pub(crate) fn remove(&mut self, id: &NodeId) -> TreeResult<Vec<NodeId>> {
        if id == &self.root {
            return Err(TreeError::RootNode(id.clone()));
        }
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        if let Some(parent_id) = node.parent.clone() {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
                removed.push(current);
            }
        }
        Ok(removed)
    }

    fn insertion_index(
        &self,
        parent_id: &NodeId,
        succeeding_sibling: Option<&NodeId>,
    ) -> TreeResult<usize> {
        let parent = self
            .nodes
            .get(parent_id)
            .ok_or_else(|| TreeError::NodeNotFound(parent_id.clone()))?;
        match succeeding_sibling {
            None => Ok(parent.children.len()),
            Some(sibling) => parent
                .children
                .iter()
                .position(|c| c == sibling)
                .ok_or_else(|| TreeError::NotASibling {
                    parent: parent_id.clone(),
                    sibling: sibling.clone(),
                }),
        }
    }
}
