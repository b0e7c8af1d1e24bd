//! Handlers for status overrides and the audit trail.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/override/:id` | Body: `{"status":"PASS"}`; returns the updated root tree |
//! | `GET`  | `/override-history` | User overrides only, newest first |
//! | `GET`  | `/nodes/:id/changes` | Every transition of one node, oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use checktree_core::{
  audit::{OverrideRecord, StatusChange},
  node::{NodeId, NodeTree, Status},
  store::CheckStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Override ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideBody {
  pub status: Status,
}

/// `POST /override/:id` — returns the whole tree containing the node.
pub async fn override_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<NodeId>,
  Json(body): Json<OverrideBody>,
) -> Result<Json<NodeTree>, ApiError>
where
  S: CheckStore,
{
  let outcome = store
    .override_status(id, body.status)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("node {id} not found")))?;
  Ok(Json(outcome.tree))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /override-history`
pub async fn history<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<OverrideRecord>>, ApiError>
where
  S: CheckStore,
{
  let records = store.override_history().await.map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `GET /nodes/:id/changes`
pub async fn node_changes<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<NodeId>,
) -> Result<Json<Vec<StatusChange>>, ApiError>
where
  S: CheckStore,
{
  store
    .get_node(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("node {id} not found")))?;
  let changes = store.node_changes(id).await.map_err(ApiError::store)?;
  Ok(Json(changes))
}
