//! The transaction seam the propagation engine writes through.
//!
//! A `TreeTxn` is the scope of exactly one override: everything the engine
//! reads and writes goes through it, and the backend commits only if the
//! engine returns `Ok`. Dropping a backend transaction without committing
//! must discard all of its writes.

use crate::{
  audit::{NewStatusChange, StatusChange},
  node::{Node, NodeId, NodeTree, Status},
};

pub trait TreeTxn {
  type Error;

  /// Read one node from the authoritative store.
  fn node(&mut self, id: NodeId) -> Result<Option<Node>, Self::Error>;

  /// Read a node and all of its descendants from the authoritative store.
  fn subtree(&mut self, id: NodeId) -> Result<Option<NodeTree>, Self::Error>;

  /// Overwrite a node's status in place.
  fn set_status(&mut self, id: NodeId, status: Status) -> Result<(), Self::Error>;

  /// Append one audit record and return it with its assigned id.
  fn append_change(
    &mut self,
    change: NewStatusChange,
  ) -> Result<StatusChange, Self::Error>;
}
