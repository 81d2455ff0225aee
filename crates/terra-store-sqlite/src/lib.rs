//! SQLite backend for the territory assignment tracker.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every multi-statement
//! operation runs inside a `rusqlite::Transaction`, which rolls back when
//! dropped without a commit.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
