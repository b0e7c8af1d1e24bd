//! JSON REST API for the check tree.
//!
//! Exposes an axum [`Router`] backed by any [`checktree_core::store::CheckStore`].
//! Auth, TLS, CORS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = checktree_api::api_router(Arc::new(store));
//! ```

pub mod error;
pub mod overrides;
pub mod trees;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use checktree_core::store::CheckStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CheckStore + Send + Sync + 'static,
{
  Router::new()
    // Trees
    .route("/", get(trees::random::<S>))
    .route("/all", get(trees::all::<S>))
    .route("/trees/{id}", get(trees::get_one::<S>))
    // Overrides
    .route("/override/{id}", post(overrides::override_one::<S>))
    .route("/override-history", get(overrides::history::<S>))
    .route("/nodes/{id}/changes", get(overrides::node_changes::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use checktree_core::{
    audit::{OverrideOutcome, OverrideRecord, StatusChange},
    node::{NewNode, Node, NodeId, NodeKind, NodeTree, Status},
  };
  use checktree_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::open_in_memory().await.unwrap())
  }

  /// Root → Check → two SubChecks.
  async fn seed(store: &SqliteStore) -> (NodeId, NodeId, NodeId, NodeId) {
    let root = store.add_node(NewNode::root("Vendor onboarding")).await.unwrap().id;
    let check = store
      .add_node(NewNode::child(NodeKind::Check, "Security review", root))
      .await
      .unwrap()
      .id;
    let a = store
      .add_node(NewNode::child(NodeKind::SubCheck, "Pen test report", check))
      .await
      .unwrap()
      .id;
    let b = store
      .add_node(NewNode::child(NodeKind::SubCheck, "SOC 2 letter", check))
      .await
      .unwrap()
      .id;
    (root, check, a, b)
  }

  async fn oneshot_raw(
    store:  Arc<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<&str>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_string()))
      .unwrap();
    let resp = api_router(store).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  // ── Reads ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn random_tree_on_empty_store_returns_404() {
    let store = make_store().await;
    let (status, json) = oneshot_raw(store, "GET", "/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("no root node"));
  }

  #[tokio::test]
  async fn random_tree_returns_nested_root() {
    let store = make_store().await;
    let (root, ..) = seed(&store).await;
    let (status, json) = oneshot_raw(store, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], root.0);
    assert_eq!(json["type"], "ROOT");
    assert_eq!(json["children"][0]["type"], "CHECK");
    assert_eq!(json["children"][0]["children"].as_array().unwrap().len(), 2);
    assert!(json["status"].is_null());
  }

  #[tokio::test]
  async fn all_trees_lists_every_root() {
    let store = make_store().await;
    seed(&store).await;
    seed(&store).await;
    let (status, json) = oneshot_raw(store, "GET", "/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn all_trees_on_empty_store_is_empty() {
    let store = make_store().await;
    let (status, json) = oneshot_raw(store, "GET", "/all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn get_tree_unknown_returns_404() {
    let store = make_store().await;
    let (status, _) = oneshot_raw(store, "GET", "/trees/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Overrides ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn override_returns_updated_root_tree() {
    let store = make_store().await;
    let (root, _, a, b) = seed(&store).await;

    let (status, json) = oneshot_raw(
      store.clone(),
      "POST",
      &format!("/override/{a}"),
      Some(r#"{"status":"PASS"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], root.0);
    assert_eq!(json["status"], "FAIL");
    assert_eq!(json["children"][0]["children"][0]["status"], "PASS");
    assert!(json["children"][0]["children"][0]["last_updated_by_user"].is_string());

    let (_, json) = oneshot_raw(
      store,
      "POST",
      &format!("/override/{b}"),
      Some(r#"{"status":"PASS"}"#),
    )
    .await;
    assert_eq!(json["status"], "PASS");
    assert_eq!(json["children"][0]["status"], "PASS");
  }

  #[tokio::test]
  async fn override_unknown_node_returns_404_and_logs_nothing() {
    let store = make_store().await;
    seed(&store).await;
    let (status, _) =
      oneshot_raw(store.clone(), "POST", "/override/999", Some(r#"{"status":"FAIL"}"#)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = oneshot_raw(store, "GET", "/override-history", None).await;
    assert!(history.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn override_rejects_unknown_status() {
    let store = make_store().await;
    let (_, _, a, _) = seed(&store).await;
    let (status, _) = oneshot_raw(
      store,
      "POST",
      &format!("/override/{a}"),
      Some(r#"{"status":"MAYBE"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  }

  // ── Audit ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn history_holds_only_the_user_override() {
    let store = make_store().await;
    let (_, check, a, _) = seed(&store).await;
    oneshot_raw(
      store.clone(),
      "POST",
      &format!("/override/{a}"),
      Some(r#"{"status":"FAIL"}"#),
    )
    .await;

    let (status, json) = oneshot_raw(store.clone(), "GET", "/override-history", None).await;
    assert_eq!(status, StatusCode::OK);
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["node_id"], a.0);
    assert_eq!(records[0]["node_name"], "Pen test report");
    assert!(records[0]["old_status"].is_null());
    assert_eq!(records[0]["new_status"], "FAIL");
    assert!(records[0]["user_change_at"].is_string());

    let (status, json) =
      oneshot_raw(store, "GET", &format!("/nodes/{check}/changes"), None).await;
    assert_eq!(status, StatusCode::OK);
    let changes = json.as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0]["user_change_at"].is_null());
  }

  // ── Storage failures ─────────────────────────────────────────────────────────

  /// A backend whose every call fails, as a locked or corrupt database would.
  struct BrokenStore;

  fn broken<T>() -> Result<T, std::io::Error> {
    Err(std::io::Error::other("disk I/O error"))
  }

  impl CheckStore for BrokenStore {
    type Error = std::io::Error;

    async fn add_node(&self, _: NewNode) -> Result<Node, Self::Error> { broken() }

    async fn remove_node(&self, _: NodeId) -> Result<bool, Self::Error> { broken() }

    async fn get_node(&self, _: NodeId) -> Result<Option<Node>, Self::Error> { broken() }

    async fn get_tree(&self, _: NodeId) -> Result<Option<NodeTree>, Self::Error> {
      broken()
    }

    async fn random_tree(&self) -> Result<Option<NodeTree>, Self::Error> { broken() }

    async fn all_trees(&self) -> Result<Vec<NodeTree>, Self::Error> { broken() }

    async fn override_status(
      &self,
      _: NodeId,
      _: Status,
    ) -> Result<Option<OverrideOutcome>, Self::Error> {
      broken()
    }

    async fn override_history(&self) -> Result<Vec<OverrideRecord>, Self::Error> {
      broken()
    }

    async fn node_changes(&self, _: NodeId) -> Result<Vec<StatusChange>, Self::Error> {
      broken()
    }
  }

  #[tokio::test]
  async fn storage_failures_map_to_500_without_details() {
    let app = api_router(Arc::new(BrokenStore));
    for (method, uri, body) in [
      ("GET", "/", None),
      ("GET", "/all", None),
      ("GET", "/trees/1", None),
      ("POST", "/override/1", Some(r#"{"status":"PASS"}"#)),
      ("GET", "/override-history", None),
      ("GET", "/nodes/1/changes", None),
    ] {
      let mut builder = Request::builder().method(method).uri(uri);
      if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
      }
      let req = builder
        .body(Body::from(body.unwrap_or_default().to_string()))
        .unwrap();
      let resp = app.clone().oneshot(req).await.unwrap();
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      let json: Value = serde_json::from_slice(&bytes).unwrap();
      assert_eq!(json, serde_json::json!({ "error": "database error" }));
    }
  }

  #[tokio::test]
  async fn node_changes_unknown_returns_404() {
    let store = make_store().await;
    let (status, _) = oneshot_raw(store, "GET", "/nodes/7/changes", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
