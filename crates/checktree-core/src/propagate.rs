//! The status propagation engine.
//!
//! Given a status write to one node, walk strictly upward through parent
//! links, re-deriving each ancestor from freshly read state and writing only
//! transitions that actually occur. Sibling subtrees are never touched: a
//! change in one branch cannot alter the derived status of another.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
  aggregate::derived_status,
  audit::{ChangeOrigin, NewStatusChange, StatusChange},
  node::{NodeId, Status},
  txn::TreeTxn,
};

/// What one engine run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propagation {
  /// The node the write was requested on.
  pub node_id: NodeId,
  /// The root of the tree containing `node_id`, found by re-reading the
  /// ancestor chain after all writes.
  pub root_id: NodeId,
  /// Records appended, in write order. Empty when nothing changed.
  pub changes: Vec<StatusChange>,
}

/// Apply a caller-requested override. Always recorded as a user change.
///
/// Returns `Ok(None)` if `node_id` does not exist; nothing is written in
/// that case.
pub fn apply_override<T: TreeTxn>(
  txn: &mut T,
  node_id: NodeId,
  status: Status,
  now: DateTime<Utc>,
) -> Result<Option<Propagation>, T::Error> {
  apply_status(txn, node_id, status, ChangeOrigin::User, now)
}

/// The single entry point for status writes.
///
/// A write that leaves the target's status unchanged appends no record, but
/// the ancestor walk still runs so that a re-issued request converges any
/// ancestor left stale. Any error from `txn` aborts the run immediately; the
/// caller must then discard the transaction.
pub fn apply_status<T: TreeTxn>(
  txn: &mut T,
  node_id: NodeId,
  status: Status,
  origin: ChangeOrigin,
  now: DateTime<Utc>,
) -> Result<Option<Propagation>, T::Error> {
  let Some(node) = txn.node(node_id)? else {
    return Ok(None);
  };

  let mut changes = Vec::new();
  if let Some(change) = write_status(txn, node_id, node.status, status, origin, now)? {
    changes.push(change);
  }
  changes.extend(rederive_from(txn, node.parent_id, now)?);

  let root_id = find_root(txn, node_id)?;
  Ok(Some(Propagation { node_id, root_id, changes }))
}

/// Re-derive `start` and every ancestor above it, bottom-up.
///
/// Used after a status write and after the tree's shape changes (a node
/// inserted or a subtree removed beneath `start`). Every transition is
/// recorded as propagated. A node left without children is a leaf again and
/// keeps its own status; the walk continues past it.
pub fn rederive_from<T: TreeTxn>(
  txn: &mut T,
  start: Option<NodeId>,
  now: DateTime<Utc>,
) -> Result<Vec<StatusChange>, T::Error> {
  let mut changes = Vec::new();
  let mut next = start;
  while let Some(current_id) = next {
    // Re-read every step: the decision must see what the store holds, not
    // what an earlier iteration believes it wrote.
    let Some(current) = txn.subtree(current_id)? else {
      debug!(node = %current_id, "ancestor vanished mid-walk; stopping");
      break;
    };
    if !current.is_leaf() {
      let desired = derived_status(&current);
      if let Some(change) = write_status(
        txn,
        current_id,
        current.node.status,
        desired,
        ChangeOrigin::Propagated,
        now,
      )? {
        changes.push(change);
      }
    }
    next = current.node.parent_id;
  }
  Ok(changes)
}

fn write_status<T: TreeTxn>(
  txn: &mut T,
  node_id: NodeId,
  old: Option<Status>,
  new: Status,
  origin: ChangeOrigin,
  now: DateTime<Utc>,
) -> Result<Option<StatusChange>, T::Error> {
  if old == Some(new) {
    return Ok(None);
  }
  txn.set_status(node_id, new)?;
  let change =
    txn.append_change(NewStatusChange::new(node_id, old, new, origin, now))?;
  debug!(
    node = %node_id,
    change = %change.id,
    old = ?old,
    new = %new,
    user = change.is_user_change(),
    "status transition"
  );
  Ok(Some(change))
}

fn find_root<T: TreeTxn>(txn: &mut T, node_id: NodeId) -> Result<NodeId, T::Error> {
  let mut root = node_id;
  let mut cursor = txn.node(node_id)?;
  while let Some(node) = cursor {
    root = node.id;
    cursor = match node.parent_id {
      Some(parent) => txn.node(parent)?,
      None => None,
    };
  }
  Ok(root)
}
