//! Audit records for status transitions.
//!
//! Every status write produces exactly one [`StatusChange`]. Records are
//! append-only: no update or delete is ever issued against them. The only
//! thing that distinguishes a user override from a propagated transition is
//! whether `user_change_at` is set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::node::{NodeId, NodeTree, Status};

/// Store-assigned, strictly increasing audit record identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChangeId(pub i64);

impl fmt::Display for ChangeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Who caused a status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
  /// Requested directly by a caller.
  User,
  /// Derived by the ancestor walk.
  Propagated,
}

impl ChangeOrigin {
  /// The `user_change_at` value a record with this origin carries.
  pub fn user_change_at(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match self {
      ChangeOrigin::User => Some(now),
      ChangeOrigin::Propagated => None,
    }
  }
}

/// A persisted status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub id:             ChangeId,
  pub node_id:        NodeId,
  pub old_status:     Option<Status>,
  pub new_status:     Status,
  pub changed_at:     DateTime<Utc>,
  /// Set only on user overrides.
  pub user_change_at: Option<DateTime<Utc>>,
}

impl StatusChange {
  pub fn is_user_change(&self) -> bool { self.user_change_at.is_some() }
}

/// A transition about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStatusChange {
  pub node_id:        NodeId,
  pub old_status:     Option<Status>,
  pub new_status:     Status,
  pub changed_at:     DateTime<Utc>,
  pub user_change_at: Option<DateTime<Utc>>,
}

impl NewStatusChange {
  pub fn new(
    node_id: NodeId,
    old_status: Option<Status>,
    new_status: Status,
    origin: ChangeOrigin,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      node_id,
      old_status,
      new_status,
      changed_at: now,
      user_change_at: origin.user_change_at(now),
    }
  }

  pub fn into_change(self, id: ChangeId) -> StatusChange {
    StatusChange {
      id,
      node_id: self.node_id,
      old_status: self.old_status,
      new_status: self.new_status,
      changed_at: self.changed_at,
      user_change_at: self.user_change_at,
    }
  }
}

/// One row of the override history: a user change joined with the current
/// name of the node it touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
  pub id:             ChangeId,
  pub node_id:        NodeId,
  pub node_name:      String,
  pub old_status:     Option<Status>,
  pub new_status:     Status,
  pub changed_at:     DateTime<Utc>,
  pub user_change_at: DateTime<Utc>,
}

/// Result of a committed override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideOutcome {
  /// The whole tree containing the overridden node, re-read after commit.
  pub tree:    NodeTree,
  /// Records written by this override, in write order.
  pub changes: Vec<StatusChange>,
}
