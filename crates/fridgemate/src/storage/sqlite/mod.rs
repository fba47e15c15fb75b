//! SQLite storage backend implementation.
//!
//! This module provides a SQLite-based implementation of the repository trait
//! using `rusqlite` for synchronous operations and `tokio-rusqlite` for async wrapping.
//! Every record kind shares one database; rows are stored as JSON bodies next to
//! a key index whose unique partial index enforces key uniqueness.

mod error;
mod repository;
mod schema;

pub use repository::{SqliteDatabase, SqliteRepository};
