use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Field, Record, RecordId};

use super::ValidationError;

pub const MESSAGE_MAX_LEN: usize = 160;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationLevel {
    #[serde(rename = "INF")]
    Info,
    #[serde(rename = "WAR")]
    Warning,
    #[serde(rename = "ERR")]
    Error,
}

impl NotificationLevel {
    pub fn code(self) -> &'static str {
        match self {
            NotificationLevel::Info => "INF",
            NotificationLevel::Warning => "WAR",
            NotificationLevel::Error => "ERR",
        }
    }
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for NotificationLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INF" | "INFO" => Ok(NotificationLevel::Info),
            "WAR" | "WARN" | "WARNING" => Ok(NotificationLevel::Warning),
            "ERR" | "ERROR" => Ok(NotificationLevel::Error),
            _ => Err(ValidationError::UnknownLevel(s.to_string())),
        }
    }
}

/// A message shown to the owner of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub owner: String,
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        owner: impl Into<String>,
        level: NotificationLevel,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::UNASSIGNED,
            owner: owner.into(),
            level,
            message: message.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationField {
    Id,
    Owner,
}

impl Field for NotificationField {
    fn name(self) -> &'static str {
        match self {
            NotificationField::Id => "id",
            NotificationField::Owner => "owner",
        }
    }

    fn is_unique(self) -> bool {
        matches!(self, NotificationField::Id)
    }
}

impl Record for Notification {
    type Field = NotificationField;
    const KIND: &'static str = "notification";
    const ID: NotificationField = NotificationField::Id;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn keys(&self) -> Vec<(NotificationField, String)> {
        vec![(NotificationField::Id, self.id.to_string())]
    }

    fn tags(&self) -> Vec<(NotificationField, String)> {
        vec![(NotificationField::Owner, self.owner.clone())]
    }
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if message.trim().is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if message.chars().count() > MESSAGE_MAX_LEN {
        return Err(ValidationError::MessageTooLong(MESSAGE_MAX_LEN));
    }
    Ok(())
}

/// Notifications older than `cutoff`.
pub fn older_than(notifications: &[Notification], cutoff: DateTime<Utc>) -> Vec<&Notification> {
    notifications
        .iter()
        .filter(|n| n.timestamp < cutoff)
        .collect()
}
