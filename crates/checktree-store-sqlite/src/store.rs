//! [`SqliteStore`] — the SQLite implementation of [`CheckStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use checktree_core::{
  audit::{OverrideOutcome, OverrideRecord, StatusChange},
  node::{NewNode, Node, NodeId, NodeTree, Status},
  propagate,
  store::CheckStore,
  txn::TreeTxn as _,
};
use rusqlite::Connection;
use tracing::info;

use crate::{Error, Result, query, schema::SCHEMA, txn::SqlTxn};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A check-tree store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All clones
/// share one connection thread, so store calls never run concurrently.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// The current time at the precision timestamp columns hold, so values
/// handed back to callers equal what a later read returns.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// Insert a node and re-derive the ancestors above it in one transaction.
fn insert_in_txn(conn: &mut Connection, input: &NewNode) -> Result<Node> {
  let created_at = now();
  let mut txn = SqlTxn::begin(conn)?;
  let node = txn.insert_node(input, created_at)?;
  propagate::rederive_from(&mut txn, node.parent_id, created_at)?;
  txn.commit()?;
  Ok(node)
}

/// Delete a subtree and re-derive the ancestors it left behind in one
/// transaction.
fn delete_in_txn(conn: &mut Connection, id: NodeId) -> Result<bool> {
  let mut txn = SqlTxn::begin(conn)?;
  let Some(node) = txn.node(id)? else {
    return Ok(false);
  };
  txn.delete_node(id)?;
  propagate::rederive_from(&mut txn, node.parent_id, now())?;
  txn.commit()?;
  Ok(true)
}

/// Run the engine in one transaction, commit, then re-read the whole tree
/// from committed state.
fn override_in_txn(
  conn: &mut Connection,
  id: NodeId,
  status: Status,
) -> Result<Option<OverrideOutcome>> {
  let mut txn = SqlTxn::begin(conn)?;
  let Some(propagation) = propagate::apply_override(&mut txn, id, status, now())?
  else {
    return Ok(None);
  };
  txn.commit()?;

  let root_id = propagation.root_id;
  let tree = query::subtree(conn, root_id)?.ok_or(Error::NodeNotFound(root_id))?;
  Ok(Some(OverrideOutcome { tree, changes: propagation.changes }))
}

// ─── CheckStore impl ─────────────────────────────────────────────────────────

impl CheckStore for SqliteStore {
  type Error = Error;

  // ── Nodes ─────────────────────────────────────────────────────────────────

  async fn add_node(&self, input: NewNode) -> Result<Node> {
    self
      .conn
      .call(move |conn| Ok(insert_in_txn(conn, &input)))
      .await?
  }

  async fn remove_node(&self, id: NodeId) -> Result<bool> {
    self
      .conn
      .call(move |conn| Ok(delete_in_txn(conn, id)))
      .await?
  }

  async fn get_node(&self, id: NodeId) -> Result<Option<Node>> {
    self.conn.call(move |conn| Ok(query::node(conn, id))).await?
  }

  // ── Trees ─────────────────────────────────────────────────────────────────

  async fn get_tree(&self, id: NodeId) -> Result<Option<NodeTree>> {
    self.conn.call(move |conn| Ok(query::subtree(conn, id))).await?
  }

  async fn random_tree(&self) -> Result<Option<NodeTree>> {
    self.conn.call(|conn| Ok(query::random_tree(conn))).await?
  }

  async fn all_trees(&self) -> Result<Vec<NodeTree>> {
    self.conn.call(|conn| Ok(query::all_trees(conn))).await?
  }

  // ── Overrides ─────────────────────────────────────────────────────────────

  async fn override_status(
    &self,
    id: NodeId,
    status: Status,
  ) -> Result<Option<OverrideOutcome>> {
    let outcome = self
      .conn
      .call(move |conn| Ok(override_in_txn(conn, id, status)))
      .await??;

    if let Some(outcome) = &outcome {
      info!(
        node = %id,
        %status,
        root = %outcome.tree.node.id,
        root_status = ?outcome.tree.node.status,
        changes = outcome.changes.len(),
        "override committed"
      );
    }
    Ok(outcome)
  }

  // ── Audit ─────────────────────────────────────────────────────────────────

  async fn override_history(&self) -> Result<Vec<OverrideRecord>> {
    self.conn.call(|conn| Ok(query::override_history(conn))).await?
  }

  async fn node_changes(&self, id: NodeId) -> Result<Vec<StatusChange>> {
    self
      .conn
      .call(move |conn| Ok(query::node_changes(conn, id)))
      .await?
  }
}
