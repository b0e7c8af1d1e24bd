//! Derived status of composite nodes.
//!
//! A leaf passes iff its own status is `PASS`; an unset status counts as
//! failing. A node with children passes iff every child passes, and its own
//! stored status plays no part. Unrolled, that is: a tree passes iff every
//! leaf beneath it is `PASS`.

use crate::node::{NodeTree, Status};

pub fn is_passing(tree: &NodeTree) -> bool {
  let mut stack = vec![tree];
  while let Some(current) = stack.pop() {
    if current.is_leaf() {
      if current.node.status != Some(Status::Pass) {
        return false;
      }
    } else {
      stack.extend(current.children.iter());
    }
  }
  true
}

/// The status a node with this subtree should hold.
pub fn derived_status(tree: &NodeTree) -> Status {
  Status::from_passing(is_passing(tree))
}
