//! The `CheckStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `checktree-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  audit::{OverrideOutcome, OverrideRecord, StatusChange},
  node::{NewNode, Node, NodeId, NodeTree, Status},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a check-tree store backend.
///
/// Node statuses only change through the propagation engine, run inside one
/// transaction by [`CheckStore::override_status`] and by the structural
/// operations. Audit records are
/// append-only and outlive the nodes they reference.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CheckStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Nodes ─────────────────────────────────────────────────────────────

  /// Create and persist a node, then re-derive its ancestors in the same
  /// transaction. The new node itself gets no audit record; any ancestor
  /// whose status changes gets a propagated one.
  ///
  /// Fails if the kind/parent pairing is invalid or the parent is missing.
  fn add_node(
    &self,
    input: NewNode,
  ) -> impl Future<Output = Result<Node, Self::Error>> + Send + '_;

  /// Delete a node and its entire subtree, then re-derive the ancestors
  /// above it in the same transaction. Returns `false` if it did not exist.
  fn remove_node(
    &self,
    id: NodeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retrieve a node by id. Returns `None` if not found.
  fn get_node(
    &self,
    id: NodeId,
  ) -> impl Future<Output = Result<Option<Node>, Self::Error>> + Send + '_;

  // ── Trees ─────────────────────────────────────────────────────────────

  /// The node `id` with all of its descendants.
  fn get_tree(
    &self,
    id: NodeId,
  ) -> impl Future<Output = Result<Option<NodeTree>, Self::Error>> + Send + '_;

  /// One root, chosen at random, with its full tree. `None` if the store
  /// holds no roots.
  fn random_tree(
    &self,
  ) -> impl Future<Output = Result<Option<NodeTree>, Self::Error>> + Send + '_;

  /// Every root with its full tree.
  fn all_trees(
    &self,
  ) -> impl Future<Output = Result<Vec<NodeTree>, Self::Error>> + Send + '_;

  // ── Overrides ─────────────────────────────────────────────────────────

  /// Set a node's status as a user override and propagate to its ancestors
  /// atomically. Returns `None` (and writes nothing) if the node does not
  /// exist.
  fn override_status(
    &self,
    id: NodeId,
    status: Status,
  ) -> impl Future<Output = Result<Option<OverrideOutcome>, Self::Error>> + Send + '_;

  // ── Audit ─────────────────────────────────────────────────────────────

  /// User-initiated changes only, most recent override first.
  fn override_history(
    &self,
  ) -> impl Future<Output = Result<Vec<OverrideRecord>, Self::Error>> + Send + '_;

  /// Every recorded transition of one node, oldest first.
  fn node_changes(
    &self,
    id: NodeId,
  ) -> impl Future<Output = Result<Vec<StatusChange>, Self::Error>> + Send + '_;
}
