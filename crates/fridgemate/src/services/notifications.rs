use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use fridgemate_core::entities::{
    older_than, validate_message, Notification, NotificationField, NotificationLevel,
};
use fridgemate_core::error::Result;
use fridgemate_core::pool::PoolConfig;
use fridgemate_core::record::{Lookup, RecordId};
use fridgemate_core::token::TokenAuthority;

use crate::pool::{PoolStats, WorkerPool};
use crate::records::RecordStore;

use super::{check_token, PooledStore};

/// Short messages addressed to the owner of a token.
pub struct NotificationService {
    notifications: PooledStore<Notification>,
    tokens: Arc<dyn TokenAuthority>,
}

impl NotificationService {
    pub fn new(
        store: RecordStore<Notification>,
        tokens: Arc<dyn TokenAuthority>,
        pool: PoolConfig,
    ) -> Self {
        Self::from_parts(
            PooledStore::new(store, WorkerPool::new("notifications", pool)),
            tokens,
        )
    }

    pub(crate) fn from_parts(
        notifications: PooledStore<Notification>,
        tokens: Arc<dyn TokenAuthority>,
    ) -> Self {
        Self {
            notifications,
            tokens,
        }
    }

    /// Posts a notification for `token`, stamped now unless `timestamp` is given.
    pub async fn post(
        &self,
        token: &str,
        level: NotificationLevel,
        message: &str,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Notification> {
        check_token(self.tokens.as_ref(), token)?;
        validate_message(message)?;

        let timestamp = timestamp.unwrap_or_else(Utc::now);
        self.notifications
            .create(Notification::new(token, level, message, timestamp))
            .await
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<Notification>> {
        self.notifications.get_by_id(id).await
    }

    pub async fn list_for_owner(&self, token: &str) -> Result<Vec<Notification>> {
        check_token(self.tokens.as_ref(), token)?;
        self.notifications
            .list_by(NotificationField::Owner, token)
            .await
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<Option<Notification>> {
        self.notifications
            .delete(Lookup::new(NotificationField::Id, id.to_string()))
            .await
    }

    pub async fn delete_for_owner(&self, token: &str) -> Result<u64> {
        check_token(self.tokens.as_ref(), token)?;
        self.notifications
            .delete_matching(NotificationField::Owner, token, |_| true)
            .await
    }

    pub async fn delete_all(&self) -> Result<u64> {
        self.notifications.delete_all().await
    }

    /// Deletes every notification stamped before `cutoff`.
    pub async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let all = self.notifications.list_all().await?;
        let stale: Vec<Notification> = older_than(&all, cutoff).into_iter().cloned().collect();
        self.notifications.delete_many(stale).await
    }

    pub fn stats(&self) -> PoolStats {
        self.notifications.stats()
    }

    pub async fn shutdown(&self) {
        self.notifications.shutdown().await;
    }
}

/// Background task purging notifications older than the retention window.
///
/// Runs once per retention period until [`Sweeper::stop`] is called. A zero
/// retention disables it.
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    pub fn spawn(service: Arc<NotificationService>, retention: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = if retention.is_zero() {
            tracing::warn!("Notification retention is zero, sweeper disabled");
            None
        } else {
            Some(tokio::spawn(sweep(service, retention, shutdown_rx)))
        };
        Self {
            shutdown_tx,
            handle: Mutex::new(handle),
        }
    }

    /// Signals the task and waits for it to finish. Later calls return immediately.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        let handle = match self.handle.lock() {
            Ok(mut handle) => handle.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Notification sweeper ended abnormally");
            }
        }
    }
}

async fn sweep(
    service: Arc<NotificationService>,
    retention: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(retention);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    tracing::info!(retention_secs = retention.as_secs(), "Notification sweeper started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let Some(cutoff) = cutoff(Utc::now(), retention) else {
                    continue;
                };
                match service.purge_older_than(cutoff).await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Purged old notifications"),
                    Err(e) => tracing::warn!(error = %e, "Notification purge failed"),
                }
            }
        }
    }

    tracing::info!("Notification sweeper stopped");
}

fn cutoff(now: DateTime<Utc>, retention: Duration) -> Option<DateTime<Utc>> {
    let retention = TimeDelta::from_std(retention).ok()?;
    now.checked_sub_signed(retention)
}
