//! Nodes of the check tree and the nested read model built from them.
//!
//! Nodes live in a flat arena addressed by [`NodeId`]; each node stores only
//! its parent's id. Children are found by filtering on `parent_id`, and the
//! nested [`NodeTree`] is assembled on read.

use std::{
  collections::{HashMap, HashSet},
  fmt,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Store-assigned node identifier. Immutable once created.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The level a node occupies in a compliance tree. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
  Root,
  Check,
  SubCheck,
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      NodeKind::Root => "ROOT",
      NodeKind::Check => "CHECK",
      NodeKind::SubCheck => "SUB_CHECK",
    })
  }
}

/// Evaluation outcome of a node. An unevaluated node carries `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
  Pass,
  Fail,
}

impl Status {
  pub fn from_passing(passing: bool) -> Self {
    if passing { Status::Pass } else { Status::Fail }
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Status::Pass => "PASS",
      Status::Fail => "FAIL",
    })
  }
}

// ─── Node ────────────────────────────────────────────────────────────────────

/// A single persisted node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id:         NodeId,
  #[serde(rename = "type")]
  pub kind:       NodeKind,
  pub name:       String,
  pub status:     Option<Status>,
  pub reason:     Option<String>,
  pub parent_id:  Option<NodeId>,
  pub created_at: DateTime<Utc>,
}

impl Node {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }
}

/// Input for creating a node during seeding. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
  pub kind:      NodeKind,
  pub name:      String,
  pub status:    Option<Status>,
  pub reason:    Option<String>,
  pub parent_id: Option<NodeId>,
}

impl NewNode {
  pub fn root(name: impl Into<String>) -> Self {
    Self {
      kind:      NodeKind::Root,
      name:      name.into(),
      status:    None,
      reason:    None,
      parent_id: None,
    }
  }

  pub fn child(kind: NodeKind, name: impl Into<String>, parent: NodeId) -> Self {
    Self {
      kind,
      name: name.into(),
      status: None,
      reason: None,
      parent_id: Some(parent),
    }
  }

  pub fn with_status(mut self, status: Status) -> Self {
    self.status = Some(status);
    self
  }

  /// Exactly the `ROOT` nodes have no parent.
  ///
  /// Whether the parent actually exists is checked by the store.
  pub fn validate(&self) -> Result<()> {
    match (self.kind, self.parent_id) {
      (NodeKind::Root, Some(parent)) => Err(Error::RootWithParent(parent)),
      (NodeKind::Root, None) => Ok(()),
      (kind, None) => Err(Error::MissingParent(kind)),
      (_, Some(_)) => Ok(()),
    }
  }
}

// ─── Nested read model ───────────────────────────────────────────────────────

/// A node together with its full descendant tree. Never stored, always
/// assembled from flat rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTree {
  #[serde(flatten)]
  pub node:                Node,
  /// When a user last overrode this node's status, if ever.
  #[serde(rename = "last_updated_by_user")]
  pub last_user_change_at: Option<DateTime<Utc>>,
  /// Ordered by id.
  pub children:            Vec<NodeTree>,
}

impl NodeTree {
  /// Find a node anywhere in this tree.
  pub fn find(&self, id: NodeId) -> Option<&NodeTree> {
    let mut stack = vec![self];
    while let Some(tree) = stack.pop() {
      if tree.node.id == id {
        return Some(tree);
      }
      stack.extend(tree.children.iter());
    }
    None
  }

  /// Number of nodes in this tree, including the top node.
  pub fn len(&self) -> usize {
    let mut count = 0;
    let mut stack = vec![self];
    while let Some(tree) = stack.pop() {
      count += 1;
      stack.extend(tree.children.iter());
    }
    count
  }

  pub fn is_leaf(&self) -> bool { self.children.is_empty() }
}

/// One flat row of a subtree query.
#[derive(Debug, Clone)]
pub struct TreeRow {
  pub node:                Node,
  pub last_user_change_at: Option<DateTime<Utc>>,
}

/// Assemble the tree rooted at `top` from an unordered set of rows.
///
/// Rows not reachable from `top` are ignored. Returns `None` if `top` is not
/// among the rows. Built bottom-up without recursion so depth is unbounded.
pub fn assemble(top: NodeId, rows: Vec<TreeRow>) -> Option<NodeTree> {
  let mut by_id: HashMap<NodeId, TreeRow> =
    rows.into_iter().map(|r| (r.node.id, r)).collect();
  if !by_id.contains_key(&top) {
    return None;
  }

  let mut child_ids: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
  for row in by_id.values() {
    if let Some(parent) = row.node.parent_id {
      child_ids.entry(parent).or_default().push(row.node.id);
    }
  }
  for ids in child_ids.values_mut() {
    ids.sort_unstable();
  }

  // Breadth-first order from the top; reversed, every child precedes its
  // parent.
  let mut order = vec![top];
  let mut seen = HashSet::from([top]);
  let mut cursor = 0;
  while cursor < order.len() {
    if let Some(ids) = child_ids.get(&order[cursor]) {
      order.extend(ids.iter().copied().filter(|id| seen.insert(*id)));
    }
    cursor += 1;
  }

  let mut built: HashMap<NodeId, NodeTree> = HashMap::new();
  for id in order.into_iter().rev() {
    let row = by_id.remove(&id)?;
    let children = child_ids
      .get(&id)
      .map(|ids| ids.iter().filter_map(|c| built.remove(c)).collect())
      .unwrap_or_default();
    built.insert(id, NodeTree {
      node: row.node,
      last_user_change_at: row.last_user_change_at,
      children,
    });
  }

  built.remove(&top)
}
