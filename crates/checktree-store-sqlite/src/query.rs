//! Synchronous queries shared by the store and the override transaction.
//!
//! Every function takes a plain `&Connection`; a `rusqlite::Transaction`
//! derefs to one, so the same code serves both read paths and the write
//! path inside an open transaction.

use chrono::{DateTime, Utc};
use checktree_core::{
  Error as CoreError,
  audit::{ChangeId, NewStatusChange, OverrideRecord, StatusChange},
  node::{NewNode, Node, NodeId, NodeTree, Status, assemble},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  encode::{
    CHANGE_COLUMNS, NODE_COLUMNS, RawChange, RawNode, RawOverride, RawTreeRow,
    encode_dt, encode_kind, encode_status,
  },
  Result,
};

// ─── Nodes ───────────────────────────────────────────────────────────────────

pub fn node(conn: &Connection, id: NodeId) -> Result<Option<Node>> {
  let raw = conn
    .query_row(
      &format!("SELECT {NODE_COLUMNS} FROM nodes n WHERE n.id = ?1"),
      params![id.0],
      RawNode::from_row,
    )
    .optional()?;
  raw.map(RawNode::into_node).transpose()
}

pub fn insert_node(
  conn: &Connection,
  input: &NewNode,
  created_at: DateTime<Utc>,
) -> Result<Node> {
  input.validate()?;
  if let Some(parent) = input.parent_id
    && node(conn, parent)?.is_none()
  {
    return Err(CoreError::ParentNotFound(parent).into());
  }

  conn.execute(
    "INSERT INTO nodes (created_at, kind, name, status, reason, parent_id)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      encode_dt(created_at),
      encode_kind(input.kind),
      input.name,
      input.status.map(encode_status),
      input.reason,
      input.parent_id.map(|p| p.0),
    ],
  )?;

  Ok(Node {
    id: NodeId(conn.last_insert_rowid()),
    kind: input.kind,
    name: input.name.clone(),
    status: input.status,
    reason: input.reason.clone(),
    parent_id: input.parent_id,
    created_at,
  })
}

/// Children go with their parent via `ON DELETE CASCADE`. Ancestors are
/// re-derived by the caller.
pub fn delete_node(conn: &Connection, id: NodeId) -> Result<bool> {
  let deleted = conn.execute("DELETE FROM nodes WHERE id = ?1", params![id.0])?;
  Ok(deleted > 0)
}

pub fn set_status(conn: &Connection, id: NodeId, status: Status) -> Result<()> {
  conn.execute(
    "UPDATE nodes SET status = ?1 WHERE id = ?2",
    params![encode_status(status), id.0],
  )?;
  Ok(())
}

// ─── Trees ───────────────────────────────────────────────────────────────────

/// Load `id` and every descendant in one recursive query.
pub fn subtree(conn: &Connection, id: NodeId) -> Result<Option<NodeTree>> {
  let mut stmt = conn.prepare_cached(&format!(
    "WITH RECURSIVE sub(id) AS (
       SELECT id FROM nodes WHERE id = ?1
       UNION
       SELECT child.id FROM nodes child JOIN sub ON child.parent_id = sub.id
     )
     SELECT {NODE_COLUMNS},
            (SELECT MAX(c.user_change_at) FROM status_changes c
              WHERE c.node_id = n.id) AS last_user_change_at
     FROM nodes n
     JOIN sub ON sub.id = n.id"
  ))?;

  let raws = stmt
    .query_map(params![id.0], RawTreeRow::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let rows = raws
    .into_iter()
    .map(RawTreeRow::into_row)
    .collect::<Result<Vec<_>>>()?;

  Ok(assemble(id, rows))
}

fn root_ids(conn: &Connection) -> Result<Vec<NodeId>> {
  let mut stmt = conn.prepare("SELECT id FROM nodes WHERE kind = 'ROOT' ORDER BY id")?;
  let ids = stmt
    .query_map([], |row| row.get(0).map(NodeId))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(ids)
}

fn random_root_id(conn: &Connection) -> Result<Option<NodeId>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM nodes WHERE kind = 'ROOT' ORDER BY RANDOM() LIMIT 1",
        [],
        |row| row.get(0).map(NodeId),
      )
      .optional()?,
  )
}

pub fn random_tree(conn: &Connection) -> Result<Option<NodeTree>> {
  match random_root_id(conn)? {
    Some(id) => subtree(conn, id),
    None => Ok(None),
  }
}

/// Every root with its tree, roots in id order.
pub fn all_trees(conn: &Connection) -> Result<Vec<NodeTree>> {
  let mut trees = Vec::new();
  for id in root_ids(conn)? {
    trees.extend(subtree(conn, id)?);
  }
  Ok(trees)
}

// ─── Audit log ───────────────────────────────────────────────────────────────

pub fn append_change(conn: &Connection, change: NewStatusChange) -> Result<StatusChange> {
  conn.execute(
    "INSERT INTO status_changes
       (node_id, old_status, new_status, changed_at, user_change_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      change.node_id.0,
      change.old_status.map(encode_status),
      encode_status(change.new_status),
      encode_dt(change.changed_at),
      change.user_change_at.map(encode_dt),
    ],
  )?;
  let id = ChangeId(conn.last_insert_rowid());
  Ok(change.into_change(id))
}

pub fn node_changes(conn: &Connection, id: NodeId) -> Result<Vec<StatusChange>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CHANGE_COLUMNS} FROM status_changes c WHERE c.node_id = ?1 ORDER BY c.id"
  ))?;
  let raws = stmt
    .query_map(params![id.0], RawChange::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawChange::into_change).collect()
}

/// User changes joined with node names, newest override first.
pub fn override_history(conn: &Connection) -> Result<Vec<OverrideRecord>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CHANGE_COLUMNS}, n.name
     FROM status_changes c
     JOIN nodes n ON n.id = c.node_id
     WHERE c.user_change_at IS NOT NULL
     ORDER BY c.user_change_at DESC, c.id DESC"
  ))?;
  let raws = stmt
    .query_map([], RawOverride::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawOverride::into_record).collect()
}
