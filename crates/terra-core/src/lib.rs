//! Core types and trait definitions for the territory assignment tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::TerritoryStore`]; the API layer
//! depends only on that abstraction.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod blob;
pub mod error;
pub mod export;
pub mod model;
pub mod report;
pub mod store;

pub use error::{AsDomainError, Error, Result};
