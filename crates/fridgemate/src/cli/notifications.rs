use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use fridgemate_core::entities::NotificationLevel;
use fridgemate_core::record::RecordId;

use crate::app::App;

use super::{deleted, to_json};

#[derive(Debug, clap::Subcommand)]
pub enum NotificationsAction {
    /// Post a notification for TOKEN
    Post {
        token: String,
        /// INF, WAR or ERR
        #[arg(long, default_value = "INF")]
        level: NotificationLevel,
        #[arg(long)]
        message: String,
        /// RFC 3339 timestamp; defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Show one notification
    Get { id: RecordId },

    /// List the notifications of TOKEN
    List { token: String },

    /// Delete one notification
    Delete { id: RecordId },

    /// Delete every notification of TOKEN
    DeleteForOwner { token: String },

    /// Delete notifications older than the given number of hours
    Purge {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },

    /// Delete every notification
    DeleteAll,
}

pub async fn run(app: &App, action: NotificationsAction) -> Result<Value> {
    let notifications = &app.notifications;
    match action {
        NotificationsAction::Post {
            token,
            level,
            message,
            at,
        } => to_json(notifications.post(&token, level, &message, at).await?),
        NotificationsAction::Get { id } => to_json(notifications.get_by_id(id).await?),
        NotificationsAction::List { token } => {
            to_json(notifications.list_for_owner(&token).await?)
        }
        NotificationsAction::Delete { id } => to_json(notifications.delete_by_id(id).await?),
        NotificationsAction::DeleteForOwner { token } => {
            deleted(notifications.delete_for_owner(&token).await?)
        }
        NotificationsAction::Purge { hours } => {
            let cutoff = TimeDelta::try_hours(hours.max(0))
                .and_then(|age| Utc::now().checked_sub_signed(age))
                .ok_or_else(|| anyhow::anyhow!("--hours out of range: {hours}"))?;
            deleted(notifications.purge_older_than(cutoff).await?)
        }
        NotificationsAction::DeleteAll => deleted(notifications.delete_all().await?),
    }
}
