//! Patch executor - runs a validated batch inside one transaction.
//!
//! Pipeline:
//! 1. Parse every record (first malformed record aborts)
//! 2. Open the tree context for workspace + dimensions
//! 3. Validate every patch (first violation aborts, nothing executed)
//! 4. Begin a transaction and apply patches in input order
//! 5. Commit, or roll back on failure and on dry runs

use canopy_core::{Dimensions, NodeId, Properties, TreeError, WorkspaceName};
use canopy_registry::{local_type_name, TypeSchemaProvider};
use canopy_transaction::{TransactionBoundary, TransactionError};
use canopy_tree::{CreateNodeCommand, NodeView, TreeAccessor, TreeContext};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::normalizer::PropertyNormalizer;
use crate::parser::parse_patches;
use crate::patch::Patch;
use crate::request::PatchRequest;
use crate::result::{CreatedNodeInfo, PatchError, PatchOutcome, PatchResult};
use crate::validator::{resolve_placement, PatchValidator};

/// Applies patch batches to a tree.
///
/// The executor holds no state between batches; every collaborator is
/// passed in at construction.
pub struct PatchExecutor<'a> {
    tree: &'a dyn TreeAccessor,
    schema: &'a dyn TypeSchemaProvider,
    transaction: &'a dyn TransactionBoundary,
    config: &'a EngineConfig,
}

impl<'a> PatchExecutor<'a> {
    /// Create a new executor.
    pub fn new(
        tree: &'a dyn TreeAccessor,
        schema: &'a dyn TypeSchemaProvider,
        transaction: &'a dyn TransactionBoundary,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            tree,
            schema,
            transaction,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Apply a decoded request.
    pub fn apply_request(&self, request: &PatchRequest) -> PatchResult {
        self.apply(
            &request.patches,
            &request.workspace,
            &request.dimensions,
            request.dry_run,
        )
    }

    /// Parse, validate and apply a batch of raw patch records.
    pub fn apply(
        &self,
        records: &[Value],
        workspace: &WorkspaceName,
        dimensions: &Dimensions,
        dry_run: bool,
    ) -> PatchResult {
        info!(
            workspace = %workspace,
            dimensions = %dimensions,
            patches = records.len(),
            dry_run,
            "applying patch batch"
        );

        let patches = match parse_patches(records) {
            Ok(patches) => patches,
            Err(error) => return self.rejected(dry_run, error),
        };

        let ctx = match self.tree.open_context(workspace, dimensions) {
            Ok(ctx) => ctx,
            Err(e) => return self.rejected(dry_run, PatchError::system(e.to_string())),
        };

        if let Err(error) = self.validate_all(&patches, &ctx) {
            return self.rejected(dry_run, error);
        }

        self.run_in_transaction(&patches, &ctx, dry_run)
    }

    /// Validate every patch before any executes.
    pub fn validate_all(&self, patches: &[Patch], ctx: &TreeContext) -> Result<(), PatchError> {
        let validator = PatchValidator::new(self.tree, self.schema, self.config);
        patches
            .iter()
            .enumerate()
            .try_for_each(|(index, patch)| validator.validate(patch, index, ctx))
    }

    /// Failure before a transaction was opened: nothing to undo.
    fn rejected(&self, dry_run: bool, error: PatchError) -> PatchResult {
        warn!(
            index = error.patch_index,
            operation = %error.operation,
            node_id = ?error.node_id,
            kind = ?error.kind,
            "patch batch rejected: {}",
            error.message
        );
        PatchResult::failure(dry_run, error, false)
    }

    fn run_in_transaction(
        &self,
        patches: &[Patch],
        ctx: &TreeContext,
        dry_run: bool,
    ) -> PatchResult {
        if let Err(e) = self.transaction.begin() {
            return self.rejected(dry_run, PatchError::system(e.to_string()));
        }

        let executed: Result<Vec<PatchOutcome>, PatchError> = patches
            .iter()
            .enumerate()
            .map(|(index, patch)| {
                debug!(
                    index,
                    operation = patch.operation_name(),
                    node_id = %patch.subject(),
                    "executing patch"
                );
                self.execute(ctx, index, patch)
            })
            .collect();

        match executed {
            Err(error) => {
                warn!(
                    index = error.patch_index,
                    operation = %error.operation,
                    node_id = ?error.node_id,
                    "patch failed, rolling back: {}",
                    error.message
                );
                match self.rollback() {
                    Ok(()) => PatchResult::failure(dry_run, error, true),
                    Err(e) => {
                        let message = format!("{}; rollback failed: {}", error.message, e);
                        PatchResult::failure(dry_run, PatchError { message, ..error }, false)
                    }
                }
            }
            Ok(outcomes) if dry_run => match self.rollback() {
                Ok(()) => {
                    info!(patches = outcomes.len(), "dry run complete, changes discarded");
                    PatchResult::success(true, outcomes, true)
                }
                Err(e) => PatchResult::failure(
                    true,
                    PatchError::system(format!("dry run could not be rolled back: {}", e)),
                    false,
                ),
            },
            Ok(outcomes) => match self.transaction.commit() {
                Ok(()) => {
                    info!(patches = outcomes.len(), "patch batch committed");
                    PatchResult::success(false, outcomes, false)
                }
                Err(e) => {
                    warn!(error = %e, "commit failed, rolling back");
                    match self.rollback() {
                        Ok(()) => {
                            PatchResult::failure(false, PatchError::system(e.to_string()), true)
                        }
                        Err(rollback) => PatchResult::failure(
                            false,
                            PatchError::system(format!("{}; rollback failed: {}", e, rollback)),
                            false,
                        ),
                    }
                }
            },
        }
    }

    fn rollback(&self) -> Result<(), TransactionError> {
        let rolled_back = self.transaction.rollback();
        match &rolled_back {
            Ok(()) => info!("transaction rolled back"),
            Err(e) => warn!(error = %e, "rollback failed"),
        }
        rolled_back
    }

    // ==================== Operations ====================

    fn execute(
        &self,
        ctx: &TreeContext,
        index: usize,
        patch: &Patch,
    ) -> Result<PatchOutcome, PatchError> {
        let operation = patch.operation_name();
        let fail = |node: &NodeId, message: String| {
            PatchError::execution(index, operation, node, message)
        };
        let tree_err = |node: &NodeId, e: TreeError| fail(node, e.to_string());
        let normalizer = PropertyNormalizer::new(self.schema, self.config);

        let (node_id, created_nodes) = match patch {
            Patch::CreateNode {
                reference_node_id,
                position,
                type_name,
                node_name,
                properties,
            } => {
                let reference = self
                    .resolve(ctx, reference_node_id)
                    .map_err(|e| tree_err(reference_node_id, e))?;
                let placement = resolve_placement(self.tree, ctx, &reference, *position, None)
                    .map_err(|v| fail(reference_node_id, v.to_string()))?;
                let name = match node_name {
                    Some(name) => name.clone(),
                    None => self.generate_node_name(ctx, &placement.parent.id, type_name),
                };

                let id = self
                    .tree
                    .create_node(
                        ctx,
                        CreateNodeCommand {
                            parent_id: placement.parent.id.clone(),
                            succeeding_sibling: placement.succeeding_sibling,
                            type_name: type_name.clone(),
                            name,
                            properties: normalizer.normalize(properties, type_name),
                        },
                    )
                    .map_err(|e| tree_err(reference_node_id, e))?;

                let mut created = Vec::new();
                self.collect_created(ctx, &id, 0, &mut created)
                    .map_err(|e| PatchError {
                        patch_index: index,
                        operation: operation.to_string(),
                        node_id: Some(id.clone()),
                        ..e
                    })?;
                (id, Some(created))
            }

            Patch::UpdateNode {
                node_id,
                properties,
            } => {
                let node = self.resolve(ctx, node_id).map_err(|e| tree_err(node_id, e))?;
                let normalized = normalizer.normalize(properties, &node.type_name);
                self.tree
                    .set_properties(ctx, &node.id, normalized)
                    .map_err(|e| tree_err(node_id, e))?;
                (node.id, None)
            }

            Patch::MoveNode {
                node_id,
                target_node_id,
                position,
            } => {
                let node = self.resolve(ctx, node_id).map_err(|e| tree_err(node_id, e))?;
                let target = self
                    .resolve(ctx, target_node_id)
                    .map_err(|e| tree_err(target_node_id, e))?;
                let placement =
                    resolve_placement(self.tree, ctx, &target, *position, Some(&node.id))
                        .map_err(|v| fail(node_id, v.to_string()))?;
                self.tree
                    .move_node(
                        ctx,
                        &node.id,
                        &placement.parent.id,
                        placement.succeeding_sibling.as_ref(),
                    )
                    .map_err(|e| tree_err(node_id, e))?;
                (node.id, None)
            }

            Patch::DeleteNode { node_id } => {
                let node = self.resolve(ctx, node_id).map_err(|e| tree_err(node_id, e))?;
                self.tree
                    .remove_node(ctx, &node.id)
                    .map_err(|e| tree_err(node_id, e))?;
                (node.id, None)
            }
        };

        Ok(PatchOutcome {
            index,
            operation: operation.to_string(),
            node_id,
            created_nodes,
        })
    }

    /// Re-resolve a node; an earlier patch of the batch may have removed it.
    fn resolve(&self, ctx: &TreeContext, id: &NodeId) -> Result<NodeView, TreeError> {
        self.tree
            .find_node(ctx, id)
            .ok_or_else(|| TreeError::NodeNotFound(id.clone()))
    }

    // ==================== Naming ====================

    /// `<local type name>-<random suffix>`, with a counter appended until
    /// no sibling carries the name.
    fn generate_node_name(&self, ctx: &TreeContext, parent: &NodeId, type_name: &str) -> String {
        let base = name_base(type_name);
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.config.name_suffix_length)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        let candidate = if suffix.is_empty() {
            base
        } else {
            format!("{}-{}", base, suffix)
        };
        if !self.tree.has_child_named(ctx, parent, &candidate) {
            return candidate;
        }
        let mut counter = 1;
        loop {
            let name = format!("{}-{}", candidate, counter);
            if !self.tree.has_child_named(ctx, parent, &name) {
                return name;
            }
            counter += 1;
        }
    }

    // ==================== Reporting ====================

    /// Depth-first walk over a created node and its auto-created descendants.
    fn collect_created(
        &self,
        ctx: &TreeContext,
        id: &NodeId,
        depth: usize,
        out: &mut Vec<CreatedNodeInfo>,
    ) -> Result<(), PatchError> {
        if depth > self.config.max_created_depth {
            return Err(PatchError::system(format!(
                "created nodes below {} exceed the maximum depth of {}",
                id, self.config.max_created_depth
            )));
        }
        let node = self
            .tree
            .find_node(ctx, id)
            .ok_or_else(|| PatchError::system(format!("created node {} disappeared", id)))?;

        out.push(CreatedNodeInfo {
            id: node.id.clone(),
            type_name: node.type_name.clone(),
            local_name: node.name.clone(),
            properties: self.report_properties(&node),
            depth,
        });

        for child in self.tree.children(ctx, id) {
            self.collect_created(ctx, &child.id, depth + 1, out)?;
        }
        Ok(())
    }

    /// Properties as reported to the caller: internal properties hidden,
    /// asset identifiers expanded into descriptors.
    fn report_properties(&self, node: &NodeView) -> Properties {
        node.properties
            .iter()
            .filter(|(name, _)| self.config.is_reported_property(name))
            .map(|(name, value)| {
                let declared = self
                    .schema
                    .property(&node.type_name, name)
                    .map(|def| def.type_name.as_str());
                let reported = match (declared, value) {
                    (Some(t), Value::String(id)) if self.config.is_asset_type(t) => {
                        self.describe_asset(id)
                    }
                    (Some(t), Value::Array(items)) if self.config.is_asset_array_type(t) => {
                        Value::Array(
                            items
                                .iter()
                                .map(|item| match item {
                                    Value::String(id) => self.describe_asset(id),
                                    other => other.clone(),
                                })
                                .collect(),
                        )
                    }
                    _ => value.clone(),
                };
                (name.clone(), reported)
            })
            .collect()
    }

    fn describe_asset(&self, id: &str) -> Value {
        match self.tree.resolve_asset(id) {
            Some(asset) => json!({
                "id": asset.id,
                "filename": asset.filename,
                "mediaType": asset.media_type,
            }),
            None => json!({ "id": id, "filename": null, "mediaType": null }),
        }
    }
}

/// Lower-cased local type name reduced to node name characters.
fn name_base(type_name: &str) -> String {
    let mut base = String::new();
    for c in local_type_name(type_name).chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            base.push(c);
        } else if !base.is_empty() && !base.ends_with('-') {
            base.push('-');
        }
    }
    let base = base.trim_end_matches('-');
    if base.is_empty() {
        "node".to_string()
    } else {
        base.to_string()
    }
}
