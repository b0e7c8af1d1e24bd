//! Error type for `checktree-store-sqlite`.

use checktree_core::node::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] checktree_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  Decode { column: &'static str, value: String },

  /// A node that the same transaction just wrote could not be read back.
  #[error("node not found: {0}")]
  NodeNotFound(NodeId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
