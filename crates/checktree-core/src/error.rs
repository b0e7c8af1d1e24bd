//! Error types for `checktree-core`.

use thiserror::Error;

use crate::node::{NodeId, NodeKind};

/// Structural violations caught when creating nodes.
#[derive(Debug, Error)]
pub enum Error {
  #[error("parent node not found: {0}")]
  ParentNotFound(NodeId),

  #[error("a {0} node must have a parent")]
  MissingParent(NodeKind),

  #[error("a ROOT node cannot have a parent (got {0})")]
  RootWithParent(NodeId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
