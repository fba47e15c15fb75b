use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Primary key of a stored record.
///
/// Allocated by the repository on first save and never reused, even after the
/// record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Marker for a record that has not been persisted yet.
    pub const UNASSIGNED: RecordId = RecordId(0);

    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

/// An indexed attribute of a record kind.
pub trait Field: fmt::Debug + Copy + Eq + Hash + Send + Sync + 'static {
    /// Stable name used in cache keys and storage indexes.
    fn name(self) -> &'static str;

    /// Whether live records must hold distinct values for this field.
    ///
    /// Unique fields make up a record's key set and get one cache entry each.
    /// Non-unique fields are only used for list queries.
    fn is_unique(self) -> bool;
}

/// A record kind that can be stored, cached and looked up by several keys.
///
/// Implementors only describe their key set; the lookup and coherence logic
/// is shared across every kind.
pub trait Record:
    fmt::Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Field: Field;

    /// Entity kind, used as the cache key prefix and event topic.
    const KIND: &'static str;

    /// The field holding the primary key.
    const ID: Self::Field;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Every unique `(field, value)` pair addressing this record, primary key first.
    fn keys(&self) -> Vec<(Self::Field, String)>;

    /// Non-unique `(field, value)` pairs used for list queries.
    fn tags(&self) -> Vec<(Self::Field, String)> {
        Vec::new()
    }

    /// Keys held by `self` that `other` no longer holds.
    fn stale_keys(&self, other: &Self) -> Vec<(Self::Field, String)> {
        let current = other.keys();
        self.keys()
            .into_iter()
            .filter(|key| !current.contains(key))
            .collect()
    }
}

/// A single-key address of a record: `field = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<F> {
    pub field: F,
    pub value: String,
}

impl<F: Field> Lookup<F> {
    pub fn new(field: F, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

impl<F: Field> fmt::Display for Lookup<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field.name(), self.value)
    }
}
