//! Core types and the status propagation engine for the check tree.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`txn::TreeTxn`] for the write path and
//! [`store::CheckStore`] for the async façade; everything else builds on
//! those two seams.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod arena;
pub mod audit;
pub mod error;
pub mod node;
pub mod propagate;
pub mod store;
pub mod txn;

pub use error::{Error, Result};
