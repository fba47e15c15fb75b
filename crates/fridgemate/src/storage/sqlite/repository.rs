//! SQLite repository implementation.
//!
//! Implements `fridgemate_core::storage::Repository` for every record kind
//! on top of a single shared connection.

use std::marker::PhantomData;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Transaction};
use tokio_rusqlite::Connection;

use fridgemate_core::record::{Field, Record, RecordId};
use fridgemate_core::storage::{Repository, RepositoryError, Result};

use super::error::{domain_error, is_unique_violation, map_tokio_rusqlite_error};
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// An indexed `(field, value)` pair ready to be written.
struct IndexRow {
    field: &'static str,
    value: String,
    unique: bool,
}

fn index_rows<R: Record>(record: &R) -> Vec<IndexRow> {
    record
        .keys()
        .into_iter()
        .chain(record.tags())
        .map(|(field, value)| IndexRow {
            field: field.name(),
            value,
            unique: field.is_unique(),
        })
        .collect()
}

fn decode<R: Record>(body: &str) -> Result<R> {
    serde_json::from_str(body).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn decode_all<R: Record>(bodies: Vec<String>) -> Result<Vec<R>> {
    bodies.iter().map(|body| decode(body)).collect()
}

fn non_unique_field<R: Record>(field: R::Field) -> RepositoryError {
    RepositoryError::InvalidData(format!(
        "{} field '{}' is not unique",
        R::KIND,
        field.name()
    ))
}

/// Removes a record and its index rows. Returns whether the record existed.
fn remove_record(tx: &Transaction<'_>, kind: &str, id: i64) -> rusqlite::Result<bool> {
    tx.execute(schema::DELETE_KEYS_FOR_RECORD, params![kind, id])?;
    Ok(tx.execute(schema::DELETE_RECORD, params![kind, id])? > 0)
}

/// A SQLite database holding every record kind.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Opens a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::StorageUnavailable(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::StorageUnavailable(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    /// Returns the repository for record kind `R`.
    pub fn repository<R: Record>(&self) -> SqliteRepository<R> {
        SqliteRepository {
            conn: self.conn.clone(),
            _record: PhantomData,
        }
    }
}

/// SQLite-based repository for one record kind.
pub struct SqliteRepository<R> {
    conn: Connection,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SqliteRepository<R> {
    async fn query_bodies(
        &self,
        sql: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<Vec<String>> {
        let value = value.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(params![R::KIND, field, value], |row| row.get::<_, String>(0))
                    .map_err(wrap_err)?;

                let mut bodies = Vec::new();
                for row_result in rows {
                    bodies.push(row_result.map_err(wrap_err)?);
                }
                Ok(bodies)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }
}

#[async_trait]
impl<R: Record> Repository<R> for SqliteRepository<R> {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<R>> {
        let body = self
            .conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_RECORD_BY_ID, params![R::KIND, id.0], |row| {
                    row.get::<_, String>(0)
                })
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))?;

        body.as_deref().map(decode::<R>).transpose()
    }

    async fn find_by(&self, field: R::Field, value: &str) -> Result<Option<R>> {
        if !field.is_unique() {
            return Err(non_unique_field::<R>(field));
        }
        let bodies = self
            .query_bodies(schema::SELECT_RECORD_BY_UNIQUE_KEY, field.name(), value)
            .await?;
        Ok(decode_all(bodies)?.into_iter().next())
    }

    async fn find_all_by(&self, field: R::Field, value: &str) -> Result<Vec<R>> {
        let bodies = self
            .query_bodies(schema::SELECT_RECORDS_BY_KEY, field.name(), value)
            .await?;
        decode_all(bodies)
    }

    async fn find_all(&self) -> Result<Vec<R>> {
        let bodies = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_RECORDS).map_err(wrap_err)?;
                let rows = stmt
                    .query_map([R::KIND], |row| row.get::<_, String>(0))
                    .map_err(wrap_err)?;

                let mut bodies = Vec::new();
                for row_result in rows {
                    bodies.push(row_result.map_err(wrap_err)?);
                }
                Ok(bodies)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))?;

        decode_all(bodies)
    }

    async fn save(&self, record: &R) -> Result<R> {
        let mut stored = record.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let updating = stored.id().is_assigned();

                if updating {
                    let id = stored.id().0;
                    let exists: bool = tx
                        .query_row(schema::SELECT_RECORD_EXISTS, params![R::KIND, id], |row| {
                            row.get(0)
                        })
                        .map_err(wrap_err)?;
                    if !exists {
                        return Err(domain_error(RepositoryError::NotFound {
                            entity_type: R::KIND,
                            id: id.to_string(),
                        }));
                    }
                    tx.execute(schema::DELETE_KEYS_FOR_RECORD, params![R::KIND, id])
                        .map_err(wrap_err)?;
                } else {
                    tx.execute(schema::NEXT_ID, [R::KIND]).map_err(wrap_err)?;
                    let id: i64 = tx
                        .query_row(schema::SELECT_LAST_ID, [R::KIND], |row| row.get(0))
                        .map_err(wrap_err)?;
                    stored.set_id(RecordId(id));
                }

                let id = stored.id().0;
                let body = serde_json::to_string(&stored).map_err(|e| {
                    domain_error(RepositoryError::Serialization(e.to_string()))
                })?;

                if updating {
                    tx.execute(schema::UPDATE_RECORD, params![R::KIND, id, body])
                        .map_err(wrap_err)?;
                } else {
                    tx.execute(schema::INSERT_RECORD, params![R::KIND, id, body])
                        .map_err(wrap_err)?;
                }

                for row in index_rows(&stored) {
                    let inserted = tx.execute(
                        schema::INSERT_KEY,
                        params![R::KIND, row.field, row.value, id, row.unique],
                    );
                    match inserted {
                        Ok(_) => {}
                        Err(e) if is_unique_violation(&e) => {
                            // Dropping the transaction rolls back every write above.
                            return Err(domain_error(RepositoryError::ConstraintViolation {
                                entity_type: R::KIND,
                                field: row.field,
                                value: row.value,
                            }));
                        }
                        Err(e) => return Err(wrap_err(e)),
                    }
                }

                tx.commit().map_err(wrap_err)?;
                Ok(stored)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }

    async fn delete_by_id(&self, id: RecordId) -> Result<bool> {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let removed = remove_record(&tx, R::KIND, id.0).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(removed)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }

    async fn delete_by(&self, field: R::Field, value: &str) -> Result<bool> {
        if !field.is_unique() {
            return Err(non_unique_field::<R>(field));
        }
        let field = field.name();
        let value = value.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let id: Option<i64> = tx
                    .query_row(
                        schema::SELECT_ID_BY_UNIQUE_KEY,
                        params![R::KIND, field, value],
                        |row| row.get(0),
                    )
                    .optional()
                    .map_err(wrap_err)?;
                let removed = match id {
                    Some(id) => remove_record(&tx, R::KIND, id).map_err(wrap_err)?,
                    None => false,
                };
                tx.commit().map_err(wrap_err)?;
                Ok(removed)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }

    async fn delete_many(&self, ids: &[RecordId]) -> Result<u64> {
        let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut removed = 0u64;
                for id in ids {
                    if remove_record(&tx, R::KIND, id).map_err(wrap_err)? {
                        removed += 1;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(removed)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }

    async fn delete_all(&self) -> Result<u64> {
        self.conn
            .call(|conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(schema::DELETE_ALL_KEYS, [R::KIND])
                    .map_err(wrap_err)?;
                let removed = tx
                    .execute(schema::DELETE_ALL_RECORDS, [R::KIND])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(removed as u64)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, R::KIND))
    }
}
