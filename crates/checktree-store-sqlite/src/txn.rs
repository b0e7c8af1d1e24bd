//! [`TreeTxn`] over an open SQLite transaction.

use chrono::{DateTime, Utc};
use checktree_core::{
  audit::{NewStatusChange, StatusChange},
  node::{NewNode, Node, NodeId, NodeTree, Status},
  txn::TreeTxn,
};
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, Result, query};

/// One mutation's worth of reads and writes. Dropping it without calling
/// [`SqlTxn::commit`] rolls everything back.
pub struct SqlTxn<'c> {
  tx: Transaction<'c>,
}

impl<'c> SqlTxn<'c> {
  /// Take the write lock up front so the read-modify-write walk cannot
  /// interleave with another writer.
  pub fn begin(conn: &'c mut Connection) -> Result<Self> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    Ok(Self { tx })
  }

  pub fn insert_node(&mut self, input: &NewNode, now: DateTime<Utc>) -> Result<Node> {
    query::insert_node(&self.tx, input, now)
  }

  pub fn delete_node(&mut self, id: NodeId) -> Result<bool> { query::delete_node(&self.tx, id) }

  pub fn commit(self) -> Result<()> {
    self.tx.commit()?;
    Ok(())
  }
}

impl TreeTxn for SqlTxn<'_> {
  type Error = Error;

  fn node(&mut self, id: NodeId) -> Result<Option<Node>> { query::node(&self.tx, id) }

  fn subtree(&mut self, id: NodeId) -> Result<Option<NodeTree>> {
    query::subtree(&self.tx, id)
  }

  fn set_status(&mut self, id: NodeId, status: Status) -> Result<()> {
    query::set_status(&self.tx, id, status)
  }

  fn append_change(&mut self, change: NewStatusChange) -> Result<StatusChange> {
    query::append_change(&self.tx, change)
  }
}
