//! SQLite backend for the Kasama family registry.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. That single thread is also
//! what serializes the duplicate check with its insert: every `submit`
//! executes check-then-insert inside one closure, inside one immediate
//! transaction.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
