//! Storage backend implementations.
//!
//! This module provides concrete implementations of the
//! `fridgemate_core::storage::Repository` trait.
//!
//! # Feature Flags
//!
//! - default: [`InMemoryRepository`], data lives as long as the process
//! - `sqlite`: `SqliteRepository` using `rusqlite` and `tokio-rusqlite`
//!
//! Build with SQLite:
//! ```bash
//! cargo build -p fridgemate --features sqlite
//! ```

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteRepository};
