//! Tree Service - Mutation Engine
//!
//! `TreeService` is the only writer of the navigation tree. Every mutation
//! follows the same sequence:
//!
//! 1. acquire the engine write lock
//! 2. read a [`TreeSnapshot`] from the store
//! 3. compute a [`WriteBatch`]
//! 4. check invariants against `snapshot.with_batch(&batch)`
//! 5. commit the batch atomically
//! 6. release the lock, emit a [`TreeEvent`] and fire an audit record
//!
//! A rejected mutation never reaches step 5, so the store is unchanged. A
//! store failure or timeout at step 5 surfaces as
//! [`TreeError::StoreUnavailable`] and nothing is written either.
//!
//! # Ordering
//!
//! Sibling orders are integers. Whenever a destination list is rewritten
//! (move, reorder) it is renumbered `0..n`; only records whose order or
//! parent actually changed are written. The list a node left is not
//! renumbered and may keep a gap.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::config::TreeConfig;
use crate::db::{NodeStore, Placement, SiblingOrderCalculator, StoreError, TreeEvent, WriteBatch};
use crate::models::{
    validate_labels, DeleteResult, Node, NodeKind, NodeUpdate, TreeNode, TreeSnapshot,
    ValidationError,
};
use crate::operations::{
    CreateNodeParams, DropZoneResolver, MoveNodeParams, MovePosition, ReorderParams,
};
use crate::services::audit::{Actor, AuditRecord, AuditSink, TracingAuditSink, TreeOperation};
use crate::services::error::TreeError;
use crate::services::invariant_checker::{InvariantViolation, TreeInvariantChecker};
use crate::services::tree_projector::TreeProjector;
use crate::utils::{slugify, unique_slug};

/// Tree mutation engine
///
/// Cheap to clone; clones share the store, the write lock and the event
/// channel. Use [`TreeService::with_actor`] to get a clone whose audit
/// records name a specific user.
#[derive(Clone)]
pub struct TreeService {
    store: Arc<dyn NodeStore>,
    config: Arc<TreeConfig>,
    /// Serializes mutations so each one sees the previous one's result
    write_lock: Arc<Mutex<()>>,
    event_tx: broadcast::Sender<TreeEvent>,
    audit: Arc<dyn AuditSink>,
    actor: Actor,
}

impl TreeService {
    /// Create a service over `store`
    ///
    /// # Errors
    ///
    /// `TreeError::Configuration` if `config` fails validation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use navtree_core::config::TreeConfig;
    /// # use navtree_core::db::MemoryStore;
    /// # use navtree_core::services::TreeService;
    /// # use std::sync::Arc;
    /// let service = TreeService::new(Arc::new(MemoryStore::new()), TreeConfig::default()).unwrap();
    /// ```
    pub fn new(store: Arc<dyn NodeStore>, config: TreeConfig) -> Result<Self, TreeError> {
        config.validate().map_err(TreeError::Configuration)?;
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            store,
            config: Arc::new(config),
            write_lock: Arc::new(Mutex::new(())),
            event_tx,
            audit: Arc::new(TracingAuditSink),
            actor: Actor::system(),
        })
    }

    /// Replace the audit sink (default: [`TracingAuditSink`])
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Clone of this service whose audit records carry `actor`
    pub fn with_actor(&self, actor: Actor) -> Self {
        let mut cloned = self.clone();
        cloned.actor = actor;
        cloned
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Drop-zone resolver built from the configured edge ratio
    pub fn drop_zone_resolver(&self) -> DropZoneResolver {
        DropZoneResolver::new(self.config.drop_zone)
    }

    /// Subscribe to tree events emitted after each committed mutation
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a node as the last child of `params.parent_id`
    ///
    /// The key is derived from `label` and disambiguated with `-2`, `-3`, …
    /// until it is unique. New nodes start as `Draft`.
    ///
    /// # Errors
    ///
    /// - `Validation` if either label is blank
    /// - `InvalidParent` if the parent is missing or is a module
    pub async fn add_node(&self, params: CreateNodeParams) -> Result<Node, TreeError> {
        validate_labels(&params.label, &params.label_zh)?;

        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot().await?;
        self.insert_node(&snapshot, params).await
    }

    /// Update display fields in place
    ///
    /// `key`, `kind`, `parent_id` and `sort_order` are not touched. An empty
    /// update returns the stored node without writing.
    pub async fn update_node(&self, id: &str, update: NodeUpdate) -> Result<Node, TreeError> {
        update.validate()?;

        let _guard = self.write_lock.lock().await;
        let mut node = self
            .with_timeout(self.store.get_node(id))
            .await?
            .ok_or_else(|| TreeError::not_found(id))?;

        if update.is_empty() {
            return Ok(node);
        }

        trimmed(update).apply_to(&mut node);
        self.commit(WriteBatch::new().put(node.clone())).await?;

        tracing::info!(node_id = %node.id, "Node updated");
        self.emit_event(TreeEvent::NodeUpdated { node: node.clone() });
        self.record_audit(TreeOperation::UpdateNode, vec![node.id.clone()]);
        Ok(node)
    }

    /// Delete a node; folders take their whole subtree with them
    ///
    /// Returns every removed id, the target first, descendants in pre-order.
    /// Deleting the last remaining nodes re-seeds the placeholder folder.
    pub async fn delete_node(&self, id: &str) -> Result<DeleteResult, TreeError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot().await?;
        let node = snapshot.get(id).ok_or_else(|| TreeError::not_found(id))?;

        let deleted_ids = match node.kind {
            NodeKind::Folder => snapshot.subtree_ids(id),
            NodeKind::Module => vec![node.id.clone()],
        };

        let batch = deleted_ids
            .iter()
            .fold(WriteBatch::new(), |batch, id| batch.delete(id.clone()));
        self.commit(batch).await?;

        tracing::info!(
            node_id = %id,
            deleted = deleted_ids.len(),
            "Node deleted"
        );
        self.emit_event(TreeEvent::NodesDeleted {
            ids: deleted_ids.clone(),
        });
        self.record_audit(TreeOperation::DeleteNode, deleted_ids.clone());

        if deleted_ids.len() == snapshot.len() {
            // the delete is committed; a failed re-seed is retried at next startup
            if let Err(e) = self.seed_placeholder(&TreeSnapshot::default()).await {
                tracing::warn!(error = %e, "Failed to re-seed emptied tree");
            }
        }
        Ok(DeleteResult { deleted_ids })
    }

    /// Move a node relative to a parent (`Into`) or a sibling anchor
    /// (`Before` / `After`)
    ///
    /// Returns the moved node as committed. A move that changes nothing
    /// (same slot, or anchor equal to the node) succeeds without writing.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown node or anchor
    /// - `Validation` when `Before`/`After` has no anchor
    /// - `InvalidRequest` when an explicit target parent disagrees with the
    ///   anchor's parent
    /// - `CycleDetected` when the destination is the node or a descendant
    /// - `InvalidParent` when the destination is missing or a module
    pub async fn move_node(&self, params: MoveNodeParams) -> Result<Node, TreeError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot().await?;

        let node = snapshot
            .get(&params.node_id)
            .cloned()
            .ok_or_else(|| TreeError::not_found(&params.node_id))?;

        let (destination, anchor_id) = match params.position {
            MovePosition::Into => (params.target_parent_id.clone(), None),
            MovePosition::Before | MovePosition::After => {
                let anchor_id = params
                    .anchor_sibling_id
                    .as_deref()
                    .ok_or_else(|| ValidationError::MissingField("anchorSiblingId".to_string()))?;

                if anchor_id == node.id {
                    tracing::debug!(node_id = %node.id, "Move anchored on itself; nothing to do");
                    return Ok(node);
                }

                let anchor = snapshot
                    .get(anchor_id)
                    .ok_or_else(|| TreeError::not_found(anchor_id))?;

                if let Some(expected) = params.target_parent_id.as_deref() {
                    if anchor.parent_id.as_deref() != Some(expected) {
                        return Err(TreeError::invalid_request(format!(
                            "anchor {} is not a child of {}",
                            anchor_id, expected
                        )));
                    }
                }

                (anchor.parent_id.clone(), Some(anchor.id.clone()))
            }
        };

        TreeInvariantChecker::check_acyclic(&snapshot, &node.id, destination.as_deref())?;
        TreeInvariantChecker::check_parent_capacity(&snapshot, destination.as_deref())?;

        let siblings: Vec<String> = snapshot
            .child_ids(destination.as_deref())
            .into_iter()
            .filter(|id| *id != node.id)
            .collect();

        let anchor_index = anchor_id
            .as_deref()
            .and_then(|anchor| siblings.iter().position(|id| id == anchor));
        let index = match (params.position, anchor_index) {
            (MovePosition::Before, Some(i)) => i,
            (MovePosition::After, Some(i)) => i + 1,
            _ => siblings.len(),
        };

        let placements = SiblingOrderCalculator::place(&siblings, &node.id, index);
        let batch = placement_batch(&snapshot, destination.as_deref(), &placements);

        if batch.is_empty() {
            tracing::debug!(node_id = %node.id, "Move leaves node in place");
            return Ok(node);
        }

        let candidate = self.verify_candidate(&snapshot, &batch, destination.as_deref())?;
        self.commit(batch.clone()).await?;

        let moved = candidate
            .get(&node.id)
            .cloned()
            .ok_or_else(|| TreeError::not_found(&node.id))?;

        tracing::info!(
            node_id = %moved.id,
            from = ?node.parent_id,
            to = ?moved.parent_id,
            position = params.position.as_str(),
            sort_order = moved.sort_order,
            "Node moved"
        );
        self.emit_event(TreeEvent::NodeMoved {
            node_id: moved.id.clone(),
            placements: batch
                .puts
                .iter()
                .map(|n| Placement {
                    node_id: n.id.clone(),
                    parent_id: n.parent_id.clone(),
                    sort_order: n.sort_order,
                })
                .collect(),
        });
        self.record_audit(TreeOperation::MoveNode, batch.affected_ids());
        Ok(moved)
    }

    /// Rewrite the order of a parent's children to `params.ordered_ids`
    ///
    /// `ordered_ids` must be exactly the current child set. Returns the
    /// children in their new order.
    pub async fn reorder_nodes(&self, params: ReorderParams) -> Result<Vec<Node>, TreeError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot().await?;
        let parent = params.parent_id.as_deref();

        if let Some(parent_id) = parent {
            let parent_node = snapshot
                .get(parent_id)
                .ok_or_else(|| TreeError::not_found(parent_id))?;
            if !parent_node.can_have_children() {
                return Err(TreeError::invalid_parent(
                    parent_id,
                    "is a module and cannot have children",
                ));
            }
        }

        let current: HashSet<String> = snapshot.child_ids(parent).into_iter().collect();
        let mut requested = HashSet::with_capacity(params.ordered_ids.len());
        for id in &params.ordered_ids {
            if !requested.insert(id.clone()) {
                return Err(TreeError::invalid_request(format!(
                    "orderedIds lists {} more than once",
                    id
                )));
            }
        }
        if requested != current {
            return Err(TreeError::invalid_request(format!(
                "orderedIds must list exactly the {} current children of {}",
                current.len(),
                parent.unwrap_or(crate::models::ROOT_PARENT_ID)
            )));
        }

        let placements = SiblingOrderCalculator::renumber(&params.ordered_ids);
        let batch = placement_batch(&snapshot, parent, &placements);

        if batch.is_empty() {
            return Ok(snapshot.children_of(parent).into_iter().cloned().collect());
        }

        let candidate = self.verify_candidate(&snapshot, &batch, parent)?;
        self.commit(batch.clone()).await?;

        tracing::info!(
            parent_id = ?params.parent_id,
            children = params.ordered_ids.len(),
            rewritten = batch.puts.len(),
            "Children reordered"
        );
        self.emit_event(TreeEvent::ChildrenReordered {
            parent_id: params.parent_id.clone(),
            ordered_ids: params.ordered_ids.clone(),
        });
        self.record_audit(TreeOperation::ReorderNodes, batch.affected_ids());
        Ok(candidate.children_of(parent).into_iter().cloned().collect())
    }

    /// Reorder a parent's children by label (case-insensitive, then id)
    ///
    /// Runs through [`TreeService::reorder_nodes`]; if the child set changes
    /// between the read and the reorder, that call rejects the request.
    pub async fn sort_children_alphabetically(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Node>, TreeError> {
        let snapshot = self.load_snapshot().await?;
        let mut children = snapshot.children_of(parent_id);
        children.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        self.reorder_nodes(ReorderParams {
            parent_id: parent_id.map(str::to_string),
            ordered_ids: children.into_iter().map(|n| n.id.clone()).collect(),
        })
        .await
    }

    /// Seed a placeholder folder when the store is empty
    ///
    /// Returns the created folder, or `None` if the tree already had nodes.
    pub async fn ensure_seeded(&self) -> Result<Option<Node>, TreeError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = self.load_snapshot().await?;
        if !snapshot.is_empty() {
            return Ok(None);
        }
        self.seed_placeholder(&snapshot).await.map(Some)
    }

    /// Insert the placeholder folder as the system actor. Caller holds the
    /// write lock and has checked that `snapshot` is empty.
    async fn seed_placeholder(&self, snapshot: &TreeSnapshot) -> Result<Node, TreeError> {
        let params = CreateNodeParams::new(
            None,
            NodeKind::Folder,
            self.config.placeholder_label.clone(),
            self.config.placeholder_label_zh.clone(),
        );
        let seeded = self
            .with_actor(Actor::system())
            .insert_node(snapshot, params)
            .await?;

        tracing::info!(node_id = %seeded.id, "Seeded empty tree with placeholder folder");
        Ok(seeded)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn get_node(&self, id: &str) -> Result<Option<Node>, TreeError> {
        self.with_timeout(self.store.get_node(id)).await
    }

    /// Children of `parent` (`None` = top level) in sibling order
    pub async fn get_children(&self, parent: Option<&str>) -> Result<Vec<Node>, TreeError> {
        let snapshot = self.load_snapshot().await?;
        Ok(snapshot.children_of(parent).into_iter().cloned().collect())
    }

    /// Nested projection of the whole tree
    pub async fn get_tree(&self) -> Result<Vec<TreeNode>, TreeError> {
        let nodes = self.with_timeout(self.store.get_all_nodes()).await?;
        Ok(TreeProjector::project(nodes))
    }

    pub async fn get_subtree(&self, id: &str) -> Result<TreeNode, TreeError> {
        let nodes = self.with_timeout(self.store.get_all_nodes()).await?;
        TreeProjector::project_subtree(nodes, id).ok_or_else(|| TreeError::not_found(id))
    }

    /// Every invariant violation in the stored tree; empty when healthy
    pub async fn validate(&self) -> Result<Vec<InvariantViolation>, TreeError> {
        let snapshot = self.load_snapshot().await?;
        Ok(TreeInvariantChecker::check_tree(&snapshot))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Shared body of `add_node` and `ensure_seeded`. Caller holds the lock.
    async fn insert_node(
        &self,
        snapshot: &TreeSnapshot,
        params: CreateNodeParams,
    ) -> Result<Node, TreeError> {
        let parent = params.parent_id.as_deref();
        TreeInvariantChecker::check_parent_capacity(snapshot, parent)?;

        let label = params.label.trim().to_string();
        let label_zh = params.label_zh.trim().to_string();

        let taken: HashSet<&str> = snapshot.nodes().map(|n| n.key.as_str()).collect();
        let key = unique_slug(&slugify(&label), |candidate| taken.contains(candidate));
        TreeInvariantChecker::check_key_unique(snapshot, &key, None)?;

        let mut node = Node::new(
            params.kind,
            key,
            params.parent_id.clone(),
            label,
            label_zh,
            snapshot.next_sort_order(parent),
        );
        node.description = params.description;
        node.icon = params.icon;
        node.validate()?;

        let batch = WriteBatch::new().put(node.clone());
        self.verify_candidate(snapshot, &batch, parent)?;
        self.commit(batch).await?;

        tracing::info!(
            node_id = %node.id,
            key = %node.key,
            kind = node.kind.as_str(),
            parent_id = ?node.parent_id,
            "Node added"
        );
        self.emit_event(TreeEvent::NodeCreated { node: node.clone() });
        self.record_audit(TreeOperation::AddNode, vec![node.id.clone()]);
        Ok(node)
    }

    /// Build the candidate state and re-check sibling orders under `parent`
    fn verify_candidate(
        &self,
        snapshot: &TreeSnapshot,
        batch: &WriteBatch,
        parent: Option<&str>,
    ) -> Result<TreeSnapshot, TreeError> {
        let candidate = snapshot.with_batch(batch);
        if let Err(violation) = TreeInvariantChecker::check_sibling_order(&candidate, parent) {
            tracing::error!(
                parent_id = ?parent,
                violation = %violation,
                "Computed sibling orders collide; rejecting mutation"
            );
            return Err(violation.into());
        }
        Ok(candidate)
    }

    async fn load_snapshot(&self) -> Result<TreeSnapshot, TreeError> {
        let nodes = self.with_timeout(self.store.get_all_nodes()).await?;
        Ok(TreeSnapshot::from_nodes(nodes))
    }

    /// Commit under the store deadline. The store owns the timeout here so a
    /// commit is never abandoned between its write and its swap.
    async fn commit(&self, batch: WriteBatch) -> Result<(), TreeError> {
        let writes = batch.puts.len() + batch.deletes.len();
        self.store
            .commit_within(batch, self.config.store_timeout())
            .await
            .map_err(TreeError::from)
            .inspect_err(|e| tracing::warn!(writes, error = %e, "Tree commit failed"))
    }

    /// Run a store read under the configured deadline
    async fn with_timeout<T, F>(&self, call: F) -> Result<T, TreeError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(TreeError::from),
            Err(_) => Err(StoreError::Timeout(timeout).into()),
        }
    }

    /// Emit an event to all subscribers. No subscribers is not an error.
    fn emit_event(&self, event: TreeEvent) {
        let _ = self.event_tx.send(event);
    }

    fn record_audit(&self, operation: TreeOperation, affected_ids: Vec<String>) {
        let record = AuditRecord::new(&self.actor, operation, affected_ids);
        let sink = Arc::clone(&self.audit);
        tokio::spawn(async move {
            if let Err(e) = sink.record(record).await {
                tracing::warn!(
                    operation = operation.as_str(),
                    error = %e,
                    "Failed to record audit entry"
                );
            }
        });
    }
}

/// Records whose parent or order differ from `placements`, updated and touched
fn placement_batch(
    snapshot: &TreeSnapshot,
    parent: Option<&str>,
    placements: &[(String, i64)],
) -> WriteBatch {
    placements
        .iter()
        .filter_map(|(id, order)| {
            let current = snapshot.get(id)?;
            if current.sort_order == *order && current.parent_id.as_deref() == parent {
                return None;
            }
            let mut updated = current.clone();
            updated.parent_id = parent.map(str::to_string);
            updated.sort_order = *order;
            updated.touch();
            Some(updated)
        })
        .fold(WriteBatch::new(), WriteBatch::put)
}

fn trimmed(mut update: NodeUpdate) -> NodeUpdate {
    if let Some(label) = update.label.as_mut() {
        *label = label.trim().to_string();
    }
    if let Some(label_zh) = update.label_zh.as_mut() {
        *label_zh = label_zh.trim().to_string();
    }
    update
}
