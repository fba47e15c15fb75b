//! Functional core of the fridgemate record cache.
//!
//! Pure types, key derivation and the traits implemented by the shell crate:
//! [`cache::Cache`], [`storage::Repository`], [`events::EventEmitter`] and
//! [`token::TokenAuthority`].

pub mod cache;
pub mod entities;
pub mod error;
pub mod events;
pub mod pool;
pub mod record;
pub mod storage;
pub mod token;

pub use error::ServiceError;
pub use record::{Field, Lookup, Record, RecordId};
