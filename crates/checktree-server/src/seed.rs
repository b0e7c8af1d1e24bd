//! Seeding a store from a nested JSON description.
//!
//! ```json
//! {"kind": "ROOT", "name": "Vendor onboarding", "children": [
//!   {"kind": "CHECK", "name": "Security review", "children": [
//!     {"kind": "SUB_CHECK", "name": "Pen test report", "status": "PASS"}
//!   ]}
//! ]}
//! ```
//!
//! A file may hold one such tree or an array of them. A `status` given on a
//! node with children is replaced by the derived one as its children are
//! inserted.

use std::path::Path;

use anyhow::Context as _;
use checktree_core::{
  node::{NewNode, NodeId, NodeKind, Status},
  store::CheckStore,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedNode {
  pub kind:     NodeKind,
  pub name:     String,
  #[serde(default)]
  pub status:   Option<Status>,
  #[serde(default)]
  pub reason:   Option<String>,
  #[serde(default)]
  pub children: Vec<SeedNode>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedFile {
  Many(Vec<SeedNode>),
  One(SeedNode),
}

pub fn read(path: &Path) -> anyhow::Result<Vec<SeedNode>> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  let file: SeedFile = serde_json::from_str(&text)
    .with_context(|| format!("failed to parse seed file {path:?}"))?;
  Ok(match file {
    SeedFile::Many(trees) => trees,
    SeedFile::One(tree) => vec![tree],
  })
}

/// Insert every tree, parents before children. Returns the new root ids.
pub async fn insert<S: CheckStore>(
  store: &S,
  trees: Vec<SeedNode>,
) -> anyhow::Result<Vec<NodeId>> {
  let mut roots = Vec::with_capacity(trees.len());
  let mut pending: Vec<(SeedNode, Option<NodeId>)> =
    trees.into_iter().rev().map(|t| (t, None)).collect();

  while let Some((seed, parent_id)) = pending.pop() {
    let name = seed.name.clone();
    let node = store
      .add_node(NewNode {
        kind: seed.kind,
        name: seed.name,
        status: seed.status,
        reason: seed.reason,
        parent_id,
      })
      .await
      .with_context(|| format!("failed to insert {:?} node {name:?}", seed.kind))?;
    if parent_id.is_none() {
      roots.push(node.id);
    }
    pending.extend(seed.children.into_iter().rev().map(|c| (c, Some(node.id))));
  }

  tracing::info!(roots = roots.len(), "seeded store");
  Ok(roots)
}
