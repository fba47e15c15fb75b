use thiserror::Error;

use crate::entities::ValidationError;
use crate::storage::RepositoryError;

/// Errors surfaced to callers of the entity services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed input, rejected before touching storage or cache.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The record a mutation addresses does not exist.
    #[error("{entity_type} not found: {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },
    /// A unique key is already held by another record.
    #[error("{entity_type} {field} already in use: {value}")]
    Conflict {
        entity_type: &'static str,
        field: &'static str,
        value: String,
    },
    /// A business rule refused the mutation.
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Storage error: {0}")]
    Storage(String),
    /// A failure inside the service itself, not attributable to the caller or storage.
    #[error("Internal error: {0}")]
    Internal(String),
    /// Every worker queue is full; retry later.
    #[error("Worker pool saturated, retry after {retry_after_secs}s")]
    PoolSaturated { retry_after_secs: u64 },
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),
    #[error("Worker pool closed")]
    PoolClosed,
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity_type, id } => ServiceError::NotFound {
                entity_type,
                key: format!("id={}", id),
            },
            RepositoryError::ConstraintViolation {
                entity_type,
                field,
                value,
            } => ServiceError::Conflict {
                entity_type,
                field,
                value,
            },
            RepositoryError::StorageUnavailable(msg) => ServiceError::StorageUnavailable(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
