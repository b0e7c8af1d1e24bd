//! Handlers for tree reads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | One random root with its tree; 404 if the store is empty |
//! | `GET`  | `/all` | Every root with its tree |
//! | `GET`  | `/trees/:id` | The tree under any node; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use checktree_core::{
  node::{NodeId, NodeTree},
  store::CheckStore,
};

use crate::error::ApiError;

/// `GET /`
pub async fn random<S>(State(store): State<Arc<S>>) -> Result<Json<NodeTree>, ApiError>
where
  S: CheckStore,
{
  let tree = store
    .random_tree()
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::NoRootFound)?;
  Ok(Json(tree))
}

/// `GET /all`
pub async fn all<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<NodeTree>>, ApiError>
where
  S: CheckStore,
{
  let trees = store.all_trees().await.map_err(ApiError::store)?;
  Ok(Json(trees))
}

/// `GET /trees/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<NodeId>,
) -> Result<Json<NodeTree>, ApiError>
where
  S: CheckStore,
{
  let tree = store
    .get_tree(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("node {id} not found")))?;
  Ok(Json(tree))
}
