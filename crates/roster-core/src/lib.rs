//! Core types and trait definitions for the Roster directory mirror.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend, the sync engine and the CLI all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod normalize;
pub mod person;
pub mod run;
pub mod store;

pub use error::{Error, Result};
