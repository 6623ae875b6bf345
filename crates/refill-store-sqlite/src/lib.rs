//! SQLite backend for the refill reminder service.
//!
//! Implements [`refill_core::store::RefillStore`] on a single SQLite file
//! via `tokio-rusqlite`.

pub mod encode;
pub mod error;
pub mod schema;
pub mod store;


pub use error::{Error, Result};
pub use store::SqliteStore;
