//! Write path: keeps every cached key of a record coherent with storage.

use std::sync::Arc;

use fridgemate_core::error::{Result, ServiceError};
use fridgemate_core::events::{topic, EventEmitter};
use fridgemate_core::record::{Field, Lookup, Record, RecordId};
use fridgemate_core::storage::Repository;

use super::{LookupService, MultiIndexCache};

/// Creates, updates and deletes records of one kind.
///
/// Storage is written first. The cache is only touched after storage
/// succeeded, so a failed write never repopulates or evicts anything.
///
/// There is no per-record lock. Two concurrent updates of the same record
/// race; the one whose storage write lands last also writes the cache last.
pub struct Coordinator<R: Record> {
    repository: Arc<dyn Repository<R>>,
    index: MultiIndexCache<R>,
    lookup: LookupService<R>,
    emitter: Arc<dyn EventEmitter>,
}

impl<R: Record> Clone for Coordinator<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            index: self.index.clone(),
            lookup: self.lookup.clone(),
            emitter: Arc::clone(&self.emitter),
        }
    }
}

impl<R: Record> Coordinator<R> {
    pub fn new(
        repository: Arc<dyn Repository<R>>,
        index: MultiIndexCache<R>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        let lookup = LookupService::new(Arc::clone(&repository), index.clone());
        Self {
            repository,
            index,
            lookup,
            emitter,
        }
    }

    /// Persists a new, already validated record and caches it under every key.
    ///
    /// Secondary keys are checked against storage first. That check is only
    /// an early exit: a constraint violation reported by storage is the
    /// authoritative conflict.
    pub async fn create(&self, record: R) -> Result<R> {
        for (field, value) in record.keys() {
            if field == R::ID {
                continue;
            }
            if self.repository.exists_by(field, &value).await? {
                return Err(conflict::<R>(field, value));
            }
        }

        let mut fresh = record;
        fresh.set_id(RecordId::UNASSIGNED);
        let stored = self.repository.save(&fresh).await?;

        let _ = self.index.put(&stored).await;
        tracing::debug!(kind = R::KIND, id = %stored.id(), "Record created");
        self.publish(&format!("{} {} created", R::KIND, stored.id()));
        Ok(stored)
    }

    /// Applies `mutate` to the record addressed by `lookup` and persists the
    /// whole result.
    ///
    /// The current record is resolved through the cache when possible. Keys
    /// the record no longer holds are evicted and the new snapshot is cached
    /// under all of its keys.
    pub async fn update<F>(&self, lookup: &Lookup<R::Field>, mutate: F) -> Result<R>
    where
        F: FnOnce(&mut R) -> Result<()> + Send,
    {
        let current = self
            .lookup
            .lookup(lookup.field, &lookup.value)
            .await?
            .ok_or_else(|| not_found::<R>(lookup))?;

        let mut next = current.clone();
        mutate(&mut next)?;
        next.set_id(current.id());

        let stale = current.stale_keys(&next);
        for (field, value) in next.stale_keys(&current) {
            if let Some(owner) = self.repository.find_by(field, &value).await? {
                if owner.id() != current.id() {
                    return Err(conflict::<R>(field, value));
                }
            }
        }

        let stored = self.repository.save(&next).await?;

        if !stale.is_empty() {
            let _ = self.index.evict(&stale).await;
        }
        let _ = self.index.put(&stored).await;
        tracing::debug!(kind = R::KIND, id = %stored.id(), via = %lookup, "Record updated");
        self.publish(&format!("{} {} updated", R::KIND, stored.id()));
        Ok(stored)
    }

    /// Deletes the record addressed by `lookup` and evicts all of its keys.
    ///
    /// Returns the deleted record, or `None` when nothing was stored under
    /// that key. Deleting a missing record is not an error.
    pub async fn delete(&self, lookup: &Lookup<R::Field>) -> Result<Option<R>> {
        let cached = self.index.get(lookup.field, &lookup.value).await;
        let stored = if lookup.field == R::ID {
            match lookup.value.parse::<RecordId>() {
                Ok(id) => self.repository.find_by_id(id).await?,
                Err(_) => None,
            }
        } else {
            self.repository.find_by(lookup.field, &lookup.value).await?
        };

        let Some(record) = stored else {
            if let Some(snapshot) = cached {
                // Stale snapshot of a record storage no longer has.
                let _ = self.index.evict_all(&snapshot).await;
            }
            tracing::debug!(kind = R::KIND, via = %lookup, "Nothing to delete");
            return Ok(None);
        };

        let removed = self.repository.delete_by_id(record.id()).await?;

        let _ = self.index.evict_all(&record).await;
        if let Some(snapshot) = cached {
            let extra = snapshot.stale_keys(&record);
            if !extra.is_empty() {
                let _ = self.index.evict(&extra).await;
            }
        }

        if !removed {
            return Ok(None);
        }
        tracing::debug!(kind = R::KIND, id = %record.id(), via = %lookup, "Record deleted");
        self.publish(&format!("{} {} deleted", R::KIND, record.id()));
        Ok(Some(record))
    }

    /// Deletes the given records and evicts their keys.
    ///
    /// Returns how many records storage removed. An empty input is a no-op.
    pub async fn delete_many(&self, records: &[R]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let ids: Vec<RecordId> = records.iter().map(|r| r.id()).collect();

        let removed = self.repository.delete_many(&ids).await?;

        for record in records {
            let _ = self.index.evict_all(record).await;
        }
        tracing::debug!(kind = R::KIND, removed, "Records deleted");
        self.publish(&format!("{} {} records deleted", R::KIND, removed));
        Ok(removed)
    }

    /// Deletes every record of this kind that exists when the call starts.
    pub async fn delete_all(&self) -> Result<u64> {
        let records = self.repository.find_all().await?;
        self.delete_many(&records).await
    }

    fn publish(&self, message: &str) {
        self.emitter.publish(&topic(R::KIND), message);
    }
}

fn conflict<R: Record>(field: R::Field, value: String) -> ServiceError {
    ServiceError::Conflict {
        entity_type: R::KIND,
        field: field.name(),
        value,
    }
}

fn not_found<R: Record>(lookup: &Lookup<R::Field>) -> ServiceError {
    ServiceError::NotFound {
        entity_type: R::KIND,
        key: lookup.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::test_support::Fixture;
    use fridgemate_core::entities::{User, UserField};

    fn coordinator(fixture: &Fixture<User>) -> Coordinator<User> {
        let index = MultiIndexCache::new(fixture.cache.clone(), Duration::from_secs(60));
        Coordinator::new(fixture.repository.clone(), index, fixture.emitter.clone())
    }

    fn user(name: &str) -> User {
        User::new(name, format!("{name}@x.com"), "hash", format!("fm_{name}"))
    }

    #[tokio::test]
    async fn test_create_caches_every_key() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);

        let alice = coordinator.create(user("alice")).await.unwrap();

        assert_eq!(alice.id, RecordId(1));
        assert_eq!(fixture.cache.len().await, 4);
        assert!(fixture.cache.contains("user-by-token: fm_alice").await);
        assert_eq!(
            fixture.emitter.messages(),
            vec![("user-topic".to_string(), "user 1 created".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_taken_key_before_saving() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();

        let mut dup = user("alice2");
        dup.email = "alice@x.com".to_string();
        let result = coordinator.create(dup).await;

        assert_eq!(
            result,
            Err(ServiceError::Conflict {
                entity_type: "user",
                field: "email",
                value: "alice@x.com".to_string(),
            })
        );
        assert_eq!(fixture.repository.save_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_fails_closed() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        fixture.repository.set_failing(true);

        let result = coordinator.create(user("alice")).await;

        assert!(matches!(result, Err(ServiceError::StorageUnavailable(_))));
        assert_eq!(fixture.cache.set_calls(), 0);
        assert!(fixture.emitter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_create_survives_cache_outage() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        fixture.cache.set_failing(true);

        let alice = coordinator.create(user("alice")).await.unwrap();

        assert_eq!(
            fixture.repository.inner().find_by_id(alice.id).await.unwrap(),
            Some(alice)
        );
    }

    #[tokio::test]
    async fn test_update_refreshes_every_key() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();

        let lookup = Lookup::new(UserField::Token, "fm_alice");
        coordinator
            .update(&lookup, |u| {
                u.verified = true;
                Ok(())
            })
            .await
            .unwrap();

        for (field, value) in [
            (UserField::Id, "1"),
            (UserField::Username, "alice"),
            (UserField::Email, "alice@x.com"),
            (UserField::Token, "fm_alice"),
        ] {
            let found = coordinator.lookup.lookup(field, value).await.unwrap().unwrap();
            assert!(found.verified, "stale snapshot under {:?}", field);
        }
    }

    #[tokio::test]
    async fn test_key_change_evicts_old_key() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();

        coordinator
            .update(&Lookup::new(UserField::Id, "1"), |u| {
                u.email = "new@x.com".to_string();
                Ok(())
            })
            .await
            .unwrap();

        assert!(!fixture.cache.contains("user-by-email: alice@x.com").await);
        assert!(fixture.cache.contains("user-by-email: new@x.com").await);
        assert_eq!(
            coordinator
                .lookup
                .lookup(UserField::Email, "alice@x.com")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_key_change_to_taken_value_conflicts() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        coordinator.create(user("bobby")).await.unwrap();

        let result = coordinator
            .update(&Lookup::new(UserField::Username, "alice"), |u| {
                u.email = "bobby@x.com".to_string();
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Conflict { field: "email", .. })));
        assert_eq!(fixture.repository.save_calls(), 2);
    }

    #[tokio::test]
    async fn test_create_conflict_reported_by_storage() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        fixture.repository.set_blind_key_reads(true);
        let cached = fixture.cache.len().await;
        let sets = fixture.cache.set_calls();

        let mut dup = user("alice2");
        dup.email = "alice@x.com".to_string();
        let result = coordinator.create(dup).await;

        assert_eq!(
            result,
            Err(ServiceError::Conflict {
                entity_type: "user",
                field: "email",
                value: "alice@x.com".to_string(),
            })
        );
        assert_eq!(fixture.repository.save_calls(), 2);
        assert_eq!(fixture.cache.len().await, cached);
        assert_eq!(fixture.cache.set_calls(), sets);
        assert_eq!(fixture.emitter.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_key_change_conflict_reported_by_storage() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        coordinator.create(user("bobby")).await.unwrap();
        fixture.repository.set_blind_key_reads(true);
        let cached = fixture.cache.len().await;
        let sets = fixture.cache.set_calls();

        // Resolved through the cache, so blind storage reads do not matter here.
        let result = coordinator
            .update(&Lookup::new(UserField::Token, "fm_alice"), |u| {
                u.email = "bobby@x.com".to_string();
                Ok(())
            })
            .await;

        assert_eq!(
            result,
            Err(ServiceError::Conflict {
                entity_type: "user",
                field: "email",
                value: "bobby@x.com".to_string(),
            })
        );
        assert_eq!(fixture.repository.save_calls(), 3);
        assert_eq!(fixture.cache.len().await, cached);
        assert_eq!(fixture.cache.set_calls(), sets);
        assert!(fixture.cache.contains("user-by-email: alice@x.com").await);
    }

    #[tokio::test]
    async fn test_update_of_missing_record_is_not_found() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);

        let result = coordinator
            .update(&Lookup::new(UserField::Username, "ghost"), |_| Ok(()))
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_rejected_mutation_writes_nothing() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        let sets = fixture.cache.set_calls();

        let result = coordinator
            .update(&Lookup::new(UserField::Id, "1"), |_| {
                Err(ServiceError::Rejected("no".to_string()))
            })
            .await;

        assert_eq!(result, Err(ServiceError::Rejected("no".to_string())));
        assert_eq!(fixture.repository.save_calls(), 1);
        assert_eq!(fixture.cache.set_calls(), sets);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_cache_untouched() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        let (sets, deletes) = (fixture.cache.set_calls(), fixture.cache.delete_calls());
        fixture.repository.set_failing(true);

        let result = coordinator
            .update(&Lookup::new(UserField::Username, "alice"), |u| {
                u.email = "new@x.com".to_string();
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ServiceError::StorageUnavailable(_))));
        assert_eq!(fixture.cache.set_calls(), sets);
        assert_eq!(fixture.cache.delete_calls(), deletes);
        assert!(fixture.cache.contains("user-by-email: alice@x.com").await);
    }

    #[tokio::test]
    async fn test_update_of_deleted_record_does_not_resurrect() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        // Deleted behind the cache's back; the snapshot is still cached.
        fixture.repository.inner().delete_by_id(RecordId(1)).await.unwrap();

        let result = coordinator
            .update(&Lookup::new(UserField::Id, "1"), |u| {
                u.verified = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert!(fixture.repository.inner().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_evicts_every_key() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();

        let deleted = coordinator
            .delete(&Lookup::new(UserField::Email, "alice@x.com"))
            .await
            .unwrap();

        assert_eq!(deleted.map(|u| u.id), Some(RecordId(1)));
        assert_eq!(fixture.cache.len().await, 0);
        assert!(fixture.repository.inner().find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_record_is_a_repeatable_no_op() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        let lookup = Lookup::new(UserField::Id, "999");

        assert_eq!(coordinator.delete(&lookup).await, Ok(None));
        assert_eq!(coordinator.delete(&lookup).await, Ok(None));
        assert_eq!(fixture.repository.delete_calls(), 0);
        assert!(fixture.emitter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        let lookup = Lookup::new(UserField::Username, "alice");

        assert!(coordinator.delete(&lookup).await.unwrap().is_some());
        assert_eq!(coordinator.delete(&lookup).await, Ok(None));
    }

    #[tokio::test]
    async fn test_delete_evicts_keys_of_stale_snapshot() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        let alice = coordinator.create(user("alice")).await.unwrap();
        // Email changed behind the cache's back.
        let mut moved = alice.clone();
        moved.email = "moved@x.com".to_string();
        fixture.repository.inner().save(&moved).await.unwrap();

        coordinator
            .delete(&Lookup::new(UserField::Id, "1"))
            .await
            .unwrap();

        assert!(!fixture.cache.contains("user-by-email: alice@x.com").await);
        assert_eq!(fixture.cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_cache() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        fixture.repository.set_failing(true);

        let result = coordinator
            .delete(&Lookup::new(UserField::Username, "alice"))
            .await;

        assert!(matches!(result, Err(ServiceError::StorageUnavailable(_))));
        assert_eq!(fixture.cache.len().await, 4);
    }

    #[tokio::test]
    async fn test_delete_all() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        coordinator.create(user("bobby")).await.unwrap();

        assert_eq!(coordinator.delete_all().await, Ok(2));
        assert_eq!(fixture.cache.len().await, 0);
        // Nothing left: idempotent zero.
        assert_eq!(coordinator.delete_all().await, Ok(0));
    }

    #[tokio::test]
    async fn test_concurrent_updates_leave_cache_and_storage_agreeing() {
        let fixture = Fixture::<User>::new();
        let coordinator = coordinator(&fixture);
        coordinator.create(user("alice")).await.unwrap();
        fixture.repository.set_save_delay(Duration::from_millis(20));

        let lookup = Lookup::new(UserField::Username, "alice");
        let set_hash = |hash: &'static str| {
            let coordinator = coordinator.clone();
            let lookup = lookup.clone();
            tokio::spawn(async move {
                coordinator
                    .update(&lookup, move |u| {
                        u.password_hash = hash.to_string();
                        Ok(())
                    })
                    .await
            })
        };
        let (a, b) = tokio::join!(set_hash("A"), set_hash("B"));
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let stored = fixture
            .repository
            .inner()
            .find_by_id(RecordId(1))
            .await
            .unwrap()
            .unwrap();
        for (field, value) in [
            (UserField::Id, "1"),
            (UserField::Username, "alice"),
            (UserField::Email, "alice@x.com"),
            (UserField::Token, "fm_alice"),
        ] {
            let cached = coordinator.index.get(field, value).await.unwrap();
            assert_eq!(cached, stored);
        }
    }
}
