//! An in-memory tree store.
//!
//! `TreeArena` keeps nodes in a flat map keyed by id and the audit log in a
//! vector. It implements [`TreeTxn`] directly, so the propagation engine can
//! run against it without a database, and snapshotting is a `clone()`.

use std::{collections::BTreeMap, convert::Infallible};

use chrono::{DateTime, Utc};

use crate::{
  Error, Result,
  audit::{NewStatusChange, OverrideOutcome, OverrideRecord, ChangeId, StatusChange},
  node::{NewNode, Node, NodeId, NodeTree, Status, TreeRow, assemble},
  propagate,
  txn::TreeTxn,
};

#[derive(Debug, Clone, Default)]
pub struct TreeArena {
  nodes:   BTreeMap<NodeId, Node>,
  changes: Vec<StatusChange>,
  next_id: i64,
}

impl TreeArena {
  pub fn new() -> Self { Self::default() }

  /// Insert a node, assigning the next id, and re-derive its ancestors.
  pub fn insert(&mut self, input: NewNode) -> Result<Node> {
    input.validate()?;
    if let Some(parent) = input.parent_id
      && !self.nodes.contains_key(&parent)
    {
      return Err(Error::ParentNotFound(parent));
    }

    let now = Utc::now();
    self.next_id += 1;
    let node = Node {
      id:         NodeId(self.next_id),
      kind:       input.kind,
      name:       input.name,
      status:     input.status,
      reason:     input.reason,
      parent_id:  input.parent_id,
      created_at: now,
    };
    self.nodes.insert(node.id, node.clone());
    self.rederive(node.parent_id, now);
    Ok(node)
  }

  /// Remove a node and its whole subtree, then re-derive the ancestors it
  /// left behind. Audit records are kept.
  pub fn remove(&mut self, id: NodeId) -> bool {
    let Some(parent_id) = self.nodes.get(&id).map(|n| n.parent_id) else {
      return false;
    };
    let mut doomed = vec![id];
    while let Some(current) = doomed.pop() {
      self.nodes.remove(&current);
      doomed.extend(self.children(current).map(|c| c.id));
    }
    self.rederive(parent_id, Utc::now());
    true
  }

  fn rederive(&mut self, start: Option<NodeId>, now: DateTime<Utc>) {
    match propagate::rederive_from(self, start, now) {
      Ok(_) => {}
      Err(never) => match never {},
    }
  }

  pub fn get(&self, id: NodeId) -> Option<&Node> { self.nodes.get(&id) }

  pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
    self.nodes.values().filter(move |n| n.parent_id == Some(id))
  }

  pub fn roots(&self) -> impl Iterator<Item = &Node> + '_ {
    self.nodes.values().filter(|n| n.is_root())
  }

  /// The full audit log, oldest first.
  pub fn changes(&self) -> &[StatusChange] { &self.changes }

  pub fn tree(&self, id: NodeId) -> Option<NodeTree> {
    let rows = self
      .nodes
      .values()
      .map(|node| TreeRow {
        node:                node.clone(),
        last_user_change_at: self.last_user_change_at(node.id),
      })
      .collect();
    assemble(id, rows)
  }

  /// Every root with its full tree, ordered by id.
  pub fn trees(&self) -> Vec<NodeTree> {
    self.roots().filter_map(|r| self.tree(r.id)).collect()
  }

  /// Apply a user override and return the tree containing the node.
  ///
  /// The engine runs against a snapshot which replaces `self` only once the
  /// whole walk has finished.
  pub fn override_status(
    &mut self,
    id: NodeId,
    status: Status,
  ) -> Option<OverrideOutcome> {
    let mut draft = self.clone();
    let propagation = match propagate::apply_override(&mut draft, id, status, Utc::now()) {
      Ok(p) => p?,
      Err(never) => match never {},
    };
    *self = draft;
    let tree = self.tree(propagation.root_id)?;
    Some(OverrideOutcome { tree, changes: propagation.changes })
  }

  /// User changes only, most recent first.
  pub fn override_history(&self) -> Vec<OverrideRecord> {
    let mut records: Vec<OverrideRecord> = self
      .changes
      .iter()
      .filter_map(|c| {
        let user_change_at = c.user_change_at?;
        let node = self.nodes.get(&c.node_id)?;
        Some(OverrideRecord {
          id: c.id,
          node_id: c.node_id,
          node_name: node.name.clone(),
          old_status: c.old_status,
          new_status: c.new_status,
          changed_at: c.changed_at,
          user_change_at,
        })
      })
      .collect();
    records.sort_by(|a, b| {
      b.user_change_at
        .cmp(&a.user_change_at)
        .then_with(|| b.id.cmp(&a.id))
    });
    records
  }

  fn last_user_change_at(&self, id: NodeId) -> Option<DateTime<Utc>> {
    self
      .changes
      .iter()
      .filter(|c| c.node_id == id)
      .filter_map(|c| c.user_change_at)
      .max()
  }
}

impl TreeTxn for TreeArena {
  type Error = Infallible;

  fn node(&mut self, id: NodeId) -> Result<Option<Node>, Infallible> {
    Ok(self.nodes.get(&id).cloned())
  }

  fn subtree(&mut self, id: NodeId) -> Result<Option<NodeTree>, Infallible> {
    Ok(self.tree(id))
  }

  fn set_status(&mut self, id: NodeId, status: Status) -> Result<(), Infallible> {
    if let Some(node) = self.nodes.get_mut(&id) {
      node.status = Some(status);
    }
    Ok(())
  }

  fn append_change(
    &mut self,
    change: NewStatusChange,
  ) -> Result<StatusChange, Infallible> {
    let id = ChangeId(self.changes.last().map_or(1, |c| c.id.0 + 1));
    let change = change.into_change(id);
    self.changes.push(change.clone());
    Ok(change)
  }
}
