//! In-memory content repository.
//!
//! Holds one ordered subgraph per workspace and dimension point plus an
//! asset catalogue. The handle is cheap to clone; all clones share state, so
//! the same repository can serve as tree accessor and transaction store.

use crate::accessor::{CreateNodeCommand, TreeAccessor, TreeContext};
use crate::node::StoredNode;
use crate::subgraph::Subgraph;
use crate::{AssetInfo, NodeView};
use canopy_core::{Dimensions, NodeId, Properties, TreeError, TreeResult, WorkspaceName};
use canopy_registry::{local_type_name, TemplateNode, TypeSchemaProvider};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Auto-created children and templates may not nest deeper than this.
const MAX_AUTO_CREATE_DEPTH: usize = 64;

type Workspaces = HashMap<WorkspaceName, HashMap<Dimensions, Subgraph>>;

#[derive(Debug, Default)]
struct RepositoryState {
    workspaces: Workspaces,
    assets: HashMap<String, AssetInfo>,
}

/// Saved content of all workspaces, used to undo a unit of work.
#[derive(Debug, Clone)]
pub struct RepositorySnapshot {
    workspaces: Workspaces,
}

/// Shared handle to an in-memory content repository.
#[derive(Clone)]
pub struct ContentRepository {
    schema: Arc<dyn TypeSchemaProvider>,
    state: Arc<RwLock<RepositoryState>>,
}

impl std::fmt::Debug for ContentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentRepository")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ContentRepository {
    /// Create an empty repository backed by a type schema.
    pub fn new(schema: Arc<dyn TypeSchemaProvider>) -> Self {
        Self {
            schema,
            state: Arc::new(RwLock::new(RepositoryState::default())),
        }
    }

    /// The type schema nodes are checked against.
    pub fn schema(&self) -> &dyn TypeSchemaProvider {
        self.schema.as_ref()
    }

    // ==================== Setup ====================

    /// Create an empty workspace. Existing workspaces are left untouched.
    pub fn create_workspace(&self, workspace: WorkspaceName) {
        self.state.write().workspaces.entry(workspace).or_default();
    }

    /// Add a subgraph (dimension point) with its root node to a workspace.
    pub fn add_subgraph(
        &self,
        workspace: &WorkspaceName,
        dimensions: Dimensions,
        root: NodeId,
        root_type: &str,
    ) -> TreeResult<()> {
        if !self.schema.has_type(root_type) {
            return Err(TreeError::TypeNotFound(root_type.to_string()));
        }
        let mut state = self.state.write();
        let subgraphs = state
            .workspaces
            .get_mut(workspace)
            .ok_or_else(|| TreeError::WorkspaceNotFound(workspace.clone()))?;
        subgraphs.insert(dimensions, Subgraph::new(root, root_type));
        Ok(())
    }

    /// Create `target` as a copy of every subgraph in `base`.
    pub fn fork_workspace(&self, base: &WorkspaceName, target: WorkspaceName) -> TreeResult<()> {
        let mut state = self.state.write();
        let copy = state
            .workspaces
            .get(base)
            .cloned()
            .ok_or_else(|| TreeError::WorkspaceNotFound(base.clone()))?;
        state.workspaces.insert(target, copy);
        Ok(())
    }

    /// Register asset metadata.
    pub fn register_asset(&self, asset: AssetInfo) {
        self.state.write().assets.insert(asset.id.clone(), asset);
    }

    /// Root node id of a subgraph.
    pub fn root_of(&self, ctx: &TreeContext) -> Option<NodeId> {
        let state = self.state.read();
        subgraph(&state, ctx).ok().map(|s| s.root().clone())
    }

    /// Number of nodes in a subgraph (0 if it does not exist).
    pub fn node_count(&self, ctx: &TreeContext) -> usize {
        let state = self.state.read();
        subgraph(&state, ctx).map(Subgraph::node_count).unwrap_or(0)
    }

    // ==================== Snapshots ====================

    /// Capture the content of every workspace.
    pub fn snapshot(&self) -> RepositorySnapshot {
        RepositorySnapshot {
            workspaces: self.state.read().workspaces.clone(),
        }
    }

    /// Replace the content of every workspace with a snapshot.
    pub fn restore(&self, snapshot: RepositorySnapshot) {
        self.state.write().workspaces = snapshot.workspaces;
    }

    // ==================== Creation ====================

    fn permits_child(&self, subgraph: &Subgraph, parent: &StoredNode, child_type: &str) -> bool {
        if !self.schema.has_type(child_type) {
            return false;
        }
        // Below an auto-created child, the grand parent's declaration wins
        if parent.tethered {
            if let Some(grandparent) = parent.parent.as_ref().and_then(|g| subgraph.get(g)) {
                if let Some(allowed) =
                    self.schema
                        .allows_grandchild(&grandparent.type_name, &parent.name, child_type)
                {
                    return allowed;
                }
            }
        }
        self.schema.allows_child(&parent.type_name, child_type)
    }

    /// Build a node with the type's defaults applied below the given properties.
    fn new_node(
        &self,
        parent: &NodeId,
        type_name: &str,
        name: String,
        properties: Properties,
        tethered: bool,
    ) -> StoredNode {
        let mut merged = Properties::new();
        for def in self.schema.properties(type_name) {
            if let Some(default) = &def.default {
                merged.insert(def.name.clone(), default.clone());
            }
        }
        for (key, value) in properties {
            if !value.is_null() {
                merged.insert(key, value);
            }
        }
        StoredNode {
            id: NodeId::new(uuid::Uuid::new_v4().to_string()),
            type_name: type_name.to_string(),
            name,
            parent: Some(parent.clone()),
            children: Vec::new(),
            properties: merged,
            tethered,
        }
    }

    /// Create the auto-created children and the template of a new node.
    fn populate(
        &self,
        subgraph: &mut Subgraph,
        node_id: &NodeId,
        type_name: &str,
        depth: usize,
    ) -> TreeResult<()> {
        if depth > MAX_AUTO_CREATE_DEPTH {
            return Err(TreeError::InvalidOperation(format!(
                "auto-created children of {} nest deeper than {}",
                type_name, MAX_AUTO_CREATE_DEPTH
            )));
        }

        for child in self.schema.child_nodes(type_name) {
            let node = self.new_node(
                node_id,
                &child.type_name,
                child.name.clone(),
                Properties::new(),
                true,
            );
            let child_id = node.id.clone();
            subgraph.insert(node, None)?;
            self.populate(subgraph, &child_id, &child.type_name, depth + 1)?;
        }

        let template = self.schema.template(type_name).to_vec();
        self.instantiate_template(subgraph, node_id, &template, depth)
    }

    fn instantiate_template(
        &self,
        subgraph: &mut Subgraph,
        parent: &NodeId,
        template: &[TemplateNode],
        depth: usize,
    ) -> TreeResult<()> {
        for entry in template {
            let name = match &entry.name {
                // A template entry naming an auto-created child fills it in
                Some(name) if subgraph.has_child_named(parent, name) => {
                    let existing = subgraph
                        .children(parent)
                        .into_iter()
                        .find(|c| &c.name == name)
                        .map(|c| c.id)
                        .ok_or_else(|| TreeError::InvalidOperation(name.clone()))?;
                    subgraph.set_properties(&existing, entry.properties.clone())?;
                    self.instantiate_template(subgraph, &existing, &entry.children, depth + 1)?;
                    continue;
                }
                Some(name) => name.clone(),
                None => template_node_name(&entry.type_name),
            };
            let node = self.new_node(
                parent,
                &entry.type_name,
                name,
                entry.properties.clone(),
                false,
            );
            let child_id = node.id.clone();
            subgraph.insert(node, None)?;
            self.populate(subgraph, &child_id, &entry.type_name, depth + 1)?;
            self.instantiate_template(subgraph, &child_id, &entry.children, depth + 1)?;
        }
        Ok(())
    }
}

fn template_node_name(type_name: &str) -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        local_type_name(type_name).to_lowercase(),
        &simple[..8]
    )
}

fn subgraph<'a>(state: &'a RepositoryState, ctx: &TreeContext) -> TreeResult<&'a Subgraph> {
    state
        .workspaces
        .get(&ctx.workspace)
        .ok_or_else(|| TreeError::WorkspaceNotFound(ctx.workspace.clone()))?
        .get(&ctx.dimensions)
        .ok_or_else(|| TreeError::SubgraphNotFound {
            workspace: ctx.workspace.clone(),
            dimensions: ctx.dimensions.clone(),
        })
}

fn subgraph_mut<'a>(
    state: &'a mut RepositoryState,
    ctx: &TreeContext,
) -> TreeResult<&'a mut Subgraph> {
    state
        .workspaces
        .get_mut(&ctx.workspace)
        .ok_or_else(|| TreeError::WorkspaceNotFound(ctx.workspace.clone()))?
        .get_mut(&ctx.dimensions)
        .ok_or_else(|| TreeError::SubgraphNotFound {
            workspace: ctx.workspace.clone(),
            dimensions: ctx.dimensions.clone(),
        })
}

impl TreeAccessor for ContentRepository {
    fn open_context(
        &self,
        workspace: &WorkspaceName,
        dimensions: &Dimensions,
    ) -> TreeResult<TreeContext> {
        let ctx = TreeContext::new(workspace.clone(), dimensions.clone());
        let state = self.state.read();
        subgraph(&state, &ctx)?;
        Ok(ctx)
    }

    fn find_node(&self, ctx: &TreeContext, id: &NodeId) -> Option<NodeView> {
        let state = self.state.read();
        subgraph(&state, ctx).ok()?.view(id)
    }

    fn parent_of(&self, ctx: &TreeContext, id: &NodeId) -> Option<NodeView> {
        let state = self.state.read();
        subgraph(&state, ctx).ok()?.parent_of(id)
    }

    fn children(&self, ctx: &TreeContext, id: &NodeId) -> Vec<NodeView> {
        let state = self.state.read();
        subgraph(&state, ctx)
            .map(|s| s.children(id))
            .unwrap_or_default()
    }

    fn has_child_named(&self, ctx: &TreeContext, parent: &NodeId, name: &str) -> bool {
        let state = self.state.read();
        subgraph(&state, ctx).is_ok_and(|s| s.has_child_named(parent, name))
    }

    fn type_permits_child(&self, ctx: &TreeContext, parent: &NodeView, child_type: &str) -> bool {
        let state = self.state.read();
        let Ok(subgraph) = subgraph(&state, ctx) else {
            return false;
        };
        match subgraph.get(&parent.id) {
            Some(stored) => self.permits_child(subgraph, stored, child_type),
            None => false,
        }
    }

    fn is_descendant_or_self(&self, ctx: &TreeContext, node: &NodeId, ancestor: &NodeId) -> bool {
        let state = self.state.read();
        subgraph(&state, ctx).is_ok_and(|s| s.is_descendant_or_self(node, ancestor))
    }

    fn create_node(&self, ctx: &TreeContext, command: CreateNodeCommand) -> TreeResult<NodeId> {
        if !self.schema.has_type(&command.type_name) {
            return Err(TreeError::TypeNotFound(command.type_name));
        }
        let mut state = self.state.write();
        let subgraph = subgraph_mut(&mut state, ctx)?;
        let parent = subgraph
            .get(&command.parent_id)
            .ok_or_else(|| TreeError::NodeNotFound(command.parent_id.clone()))?;
        if !self.permits_child(subgraph, parent, &command.type_name) {
            return Err(TreeError::ChildNotAllowed {
                parent_type: parent.type_name.clone(),
                child_type: command.type_name,
            });
        }

        let node = self.new_node(
            &command.parent_id,
            &command.type_name,
            command.name,
            command.properties,
            false,
        );
        let id = node.id.clone();
        subgraph.insert(node, command.succeeding_sibling.as_ref())?;

        // Leave no half-populated node behind
        if let Err(e) = self.populate(subgraph, &id, &command.type_name, 0) {
            let _ = subgraph.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    fn set_properties(
        &self,
        ctx: &TreeContext,
        id: &NodeId,
        properties: Properties,
    ) -> TreeResult<()> {
        let mut state = self.state.write();
        subgraph_mut(&mut state, ctx)?.set_properties(id, properties)
    }

    fn move_node(
        &self,
        ctx: &TreeContext,
        id: &NodeId,
        new_parent: &NodeId,
        succeeding_sibling: Option<&NodeId>,
    ) -> TreeResult<()> {
        let mut state = self.state.write();
        let subgraph = subgraph_mut(&mut state, ctx)?;
        let moved_type = subgraph
            .get(id)
            .map(|n| n.type_name.clone())
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
        let parent = subgraph
            .get(new_parent)
            .ok_or_else(|| TreeError::NodeNotFound(new_parent.clone()))?;
        if !self.permits_child(subgraph, parent, &moved_type) {
            return Err(TreeError::ChildNotAllowed {
                parent_type: parent.type_name.clone(),
                child_type: moved_type,
            });
        }
        subgraph.move_node(id, new_parent, succeeding_sibling)
    }

    fn remove_node(&self, ctx: &TreeContext, id: &NodeId) -> TreeResult<()> {
        let mut state = self.state.write();
        subgraph_mut(&mut state, ctx)?.remove(id).map(|_| ())
    }

    fn resolve_asset(&self, id: &str) -> Option<AssetInfo> {
        self.state.read().assets.get(id).cloned()
    }
}
