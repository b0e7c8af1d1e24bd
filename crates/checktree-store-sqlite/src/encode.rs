//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order
//! and `ORDER BY` / `MAX()` work on the raw column. Enumerations are stored
//! as their upper-case wire names.

use chrono::{DateTime, SecondsFormat, Utc};
use checktree_core::{
  audit::{ChangeId, OverrideRecord, StatusChange},
  node::{Node, NodeId, NodeKind, Status, TreeRow},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NodeKind ────────────────────────────────────────────────────────────────

pub fn encode_kind(k: NodeKind) -> &'static str {
  match k {
    NodeKind::Root => "ROOT",
    NodeKind::Check => "CHECK",
    NodeKind::SubCheck => "SUB_CHECK",
  }
}

pub fn decode_kind(s: &str) -> Result<NodeKind> {
  match s {
    "ROOT" => Ok(NodeKind::Root),
    "CHECK" => Ok(NodeKind::Check),
    "SUB_CHECK" => Ok(NodeKind::SubCheck),
    other => Err(Error::Decode { column: "kind", value: other.to_owned() }),
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str {
  match s {
    Status::Pass => "PASS",
    Status::Fail => "FAIL",
  }
}

pub fn decode_status(s: &str) -> Result<Status> {
  match s {
    "PASS" => Ok(Status::Pass),
    "FAIL" => Ok(Status::Fail),
    other => Err(Error::Decode { column: "status", value: other.to_owned() }),
  }
}

fn decode_opt_status(s: Option<String>) -> Result<Option<Status>> {
  s.as_deref().map(decode_status).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawNode::from_row`]; `n` is the `nodes` alias.
pub const NODE_COLUMNS: &str =
  "n.id, n.kind, n.name, n.status, n.reason, n.parent_id, n.created_at";

/// Raw values read directly from a `nodes` row.
pub struct RawNode {
  pub id:         i64,
  pub kind:       String,
  pub name:       String,
  pub status:     Option<String>,
  pub reason:     Option<String>,
  pub parent_id:  Option<i64>,
  pub created_at: String,
}

impl RawNode {
  /// Read the seven [`NODE_COLUMNS`] starting at column 0.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      kind:       row.get(1)?,
      name:       row.get(2)?,
      status:     row.get(3)?,
      reason:     row.get(4)?,
      parent_id:  row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_node(self) -> Result<Node> {
    Ok(Node {
      id:         NodeId(self.id),
      kind:       decode_kind(&self.kind)?,
      name:       self.name,
      status:     decode_opt_status(self.status)?,
      reason:     self.reason,
      parent_id:  self.parent_id.map(NodeId),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A `nodes` row plus the latest user override timestamp for it.
pub struct RawTreeRow {
  pub node:                RawNode,
  pub last_user_change_at: Option<String>,
}

impl RawTreeRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      node:                RawNode::from_row(row)?,
      last_user_change_at: row.get(7)?,
    })
  }

  pub fn into_row(self) -> Result<TreeRow> {
    Ok(TreeRow {
      node:                self.node.into_node()?,
      last_user_change_at: decode_opt_dt(self.last_user_change_at)?,
    })
  }
}

/// Column list matching [`RawChange::from_row`]; `c` is the
/// `status_changes` alias.
pub const CHANGE_COLUMNS: &str =
  "c.id, c.node_id, c.old_status, c.new_status, c.changed_at, c.user_change_at";

/// Raw values read directly from a `status_changes` row.
pub struct RawChange {
  pub id:             i64,
  pub node_id:        i64,
  pub old_status:     Option<String>,
  pub new_status:     String,
  pub changed_at:     String,
  pub user_change_at: Option<String>,
}

impl RawChange {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      node_id:        row.get(1)?,
      old_status:     row.get(2)?,
      new_status:     row.get(3)?,
      changed_at:     row.get(4)?,
      user_change_at: row.get(5)?,
    })
  }

  pub fn into_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      id:             ChangeId(self.id),
      node_id:        NodeId(self.node_id),
      old_status:     decode_opt_status(self.old_status)?,
      new_status:     decode_status(&self.new_status)?,
      changed_at:     decode_dt(&self.changed_at)?,
      user_change_at: decode_opt_dt(self.user_change_at)?,
    })
  }
}

/// A user change joined with the current node name.
pub struct RawOverride {
  pub change:    RawChange,
  pub node_name: String,
}

impl RawOverride {
  /// [`CHANGE_COLUMNS`] followed by the node name.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      change:    RawChange::from_row(row)?,
      node_name: row.get(6)?,
    })
  }

  pub fn into_record(self) -> Result<OverrideRecord> {
    let change = self.change.into_change()?;
    let user_change_at = change.user_change_at.ok_or_else(|| Error::Decode {
      column: "user_change_at",
      value:  "NULL".to_owned(),
    })?;
    Ok(OverrideRecord {
      id: change.id,
      node_id: change.node_id,
      node_name: self.node_name,
      old_status: change.old_status,
      new_status: change.new_status,
      changed_at: change.changed_at,
      user_change_at,
    })
  }
}
