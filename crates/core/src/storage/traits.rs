use async_trait::async_trait;

use crate::record::{Record, RecordId};

use super::Result;

/// Durable store for one record kind. The source of truth for every lookup.
///
/// Implementations must enforce uniqueness of every unique field among live
/// records and report violations as
/// [`RepositoryError::ConstraintViolation`](super::RepositoryError::ConstraintViolation).
#[async_trait]
pub trait Repository<R: Record>: Send + Sync {
    /// Gets a record by its primary key.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>>;

    /// Gets a record by any unique field, the primary key included.
    async fn find_by(&self, field: R::Field, value: &str) -> Result<Option<R>>;

    /// Checks whether a live record holds `field = value`.
    async fn exists_by(&self, field: R::Field, value: &str) -> Result<bool> {
        Ok(self.find_by(field, value).await?.is_some())
    }

    /// Gets every record holding `field = value`, ordered by primary key.
    /// Works for unique and non-unique fields.
    async fn find_all_by(&self, field: R::Field, value: &str) -> Result<Vec<R>>;

    /// Gets every record, ordered by primary key.
    async fn find_all(&self) -> Result<Vec<R>>;

    /// Inserts or replaces a whole record and returns the stored version.
    ///
    /// A record with an unassigned id is inserted under a freshly allocated id.
    /// A record with an assigned id replaces the stored row; if that row no
    /// longer exists the save fails with `NotFound` instead of re-inserting it.
    async fn save(&self, record: &R) -> Result<R>;

    /// Deletes a record by primary key. Returns whether a record was removed.
    async fn delete_by_id(&self, id: RecordId) -> Result<bool>;

    /// Deletes the record holding a unique `field = value`.
    async fn delete_by(&self, field: R::Field, value: &str) -> Result<bool>;

    /// Deletes the given records, returning how many were removed.
    async fn delete_many(&self, ids: &[RecordId]) -> Result<u64>;

    /// Deletes every record of this kind, returning how many were removed.
    async fn delete_all(&self) -> Result<u64>;
}
