//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use fridgemate_core::record::{Field, Record, RecordId};
use fridgemate_core::storage::{Repository, RepositoryError, Result};

#[derive(Debug)]
struct Table<R: Record> {
    rows: BTreeMap<RecordId, R>,
    /// Unique `(field, value)` pairs of live records, the primary key included.
    unique: HashMap<(R::Field, String), RecordId>,
    last_id: i64,
}

impl<R: Record> Table<R> {
    fn resolve(&self, field: R::Field, value: &str) -> Result<Option<RecordId>> {
        if !field.is_unique() {
            return Err(non_unique_field::<R>(field));
        }
        Ok(self.unique.get(&(field, value.to_string())).copied())
    }

    /// Returns the first unique key of `record` held by a different record.
    fn conflict(&self, record: &R, id: RecordId) -> Option<RepositoryError> {
        record.keys().into_iter().find_map(|(field, value)| {
            match self.unique.get(&(field, value.clone())) {
                Some(owner) if *owner != id => Some(RepositoryError::ConstraintViolation {
                    entity_type: R::KIND,
                    field: field.name(),
                    value,
                }),
                _ => None,
            }
        })
    }

    fn index(&mut self, record: &R) {
        for key in record.keys() {
            self.unique.insert(key, record.id());
        }
    }

    fn unindex(&mut self, record: &R) {
        for key in record.keys() {
            self.unique.remove(&key);
        }
    }

    fn remove(&mut self, id: RecordId) -> bool {
        match self.rows.remove(&id) {
            Some(record) => {
                self.unindex(&record);
                true
            }
            None => false,
        }
    }
}

fn non_unique_field<R: Record>(field: R::Field) -> RepositoryError {
    RepositoryError::InvalidData(format!(
        "{} field '{}' is not unique",
        R::KIND,
        field.name()
    ))
}

/// In-memory storage backend for one record kind.
///
/// Uses a `BTreeMap` wrapped in `Arc<RwLock<_>>` for thread-safe access and
/// keeps a unique-key index that enforces the same constraints a database
/// would. Data is not persisted and will be lost when the repository is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryRepository<R: Record> {
    table: Arc<RwLock<Table<R>>>,
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryRepository<R> {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                unique: HashMap::new(),
                last_id: 0,
            })),
        }
    }
}

#[async_trait]
impl<R: Record> Repository<R> for InMemoryRepository<R> {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by(&self, field: R::Field, value: &str) -> Result<Option<R>> {
        let table = self.table.read().await;
        let id = table.resolve(field, value)?;
        Ok(id.and_then(|id| table.rows.get(&id).cloned()))
    }

    async fn find_all_by(&self, field: R::Field, value: &str) -> Result<Vec<R>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|record| {
                record
                    .keys()
                    .into_iter()
                    .chain(record.tags())
                    .any(|(f, v)| f == field && v == value)
            })
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<R>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn save(&self, record: &R) -> Result<R> {
        let mut table = self.table.write().await;
        let mut stored = record.clone();

        if stored.id().is_assigned() {
            let Some(previous) = table.rows.get(&stored.id()).cloned() else {
                return Err(RepositoryError::NotFound {
                    entity_type: R::KIND,
                    id: stored.id().to_string(),
                });
            };
            if let Some(err) = table.conflict(&stored, stored.id()) {
                return Err(err);
            }
            table.unindex(&previous);
        } else {
            // The id is reserved even if the insert fails below.
            table.last_id += 1;
            stored.set_id(RecordId(table.last_id));
            if let Some(err) = table.conflict(&stored, stored.id()) {
                return Err(err);
            }
        }

        table.index(&stored);
        table.rows.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        let mut table = self.table.write().await;
        Ok(table.remove(id))
    }

    async fn delete_by(&self, field: R::Field, value: &str) -> Result<bool> {
        let mut table = self.table.write().await;
        match table.resolve(field, value)? {
            Some(id) => Ok(table.remove(id)),
            None => Ok(false),
        }
    }

    async fn delete_many(&self, ids: &[RecordId]) -> Result<u64> {
        let mut table = self.table.write().await;
        Ok(ids.iter().filter(|id| table.remove(**id)).count() as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut table = self.table.write().await;
        let count = table.rows.len() as u64;
        table.rows.clear();
        table.unique.clear();
        Ok(count)
    }
}
