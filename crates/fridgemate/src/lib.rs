//! FridgeMate: entity services over a multi-index read-through cache.
//!
//! Every record kind (users, budgets, products, recipes, notifications) is
//! stored in a [`Repository`] and cached under each of its unique keys. Reads
//! go through the cache first; writes go to storage first and then refresh or
//! evict every key of the record.
//!
//! [`Repository`]: fridgemate_core::storage::Repository

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod events;
pub mod pool;
pub mod records;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use config::Config;
