//! Cache key, tier and entry types for the aggregate read model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::user::Role;

/// Named expiration class for a cached sub-result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    /// Slow-changing aggregates: status histogram, overdue count.
    Aggregate,
    /// Fast-changing activity lists.
    Activity,
}

impl CacheTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::Activity => "activity",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expiration durations per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTable {
    pub aggregate: Duration,
    pub activity: Duration,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            aggregate: Duration::from_secs(300),
            activity: Duration::from_secs(120),
        }
    }
}

impl TierTable {
    pub fn ttl(&self, tier: CacheTier) -> Duration {
        match tier {
            CacheTier::Aggregate => self.aggregate,
            CacheTier::Activity => self.activity,
        }
    }
}

/// Independently cached part of a dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Status histogram and overdue count.
    Aggregates,
    /// Most recent tasks in scope.
    Activity,
    /// The viewer's own assigned, incomplete tasks.
    Assigned,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Aggregates, Section::Activity, Section::Assigned];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregates => "aggregates",
            Self::Activity => "activity",
            Self::Assigned => "assigned",
        }
    }

    pub fn tier(&self) -> CacheTier {
        match self {
            Self::Aggregates => CacheTier::Aggregate,
            Self::Activity | Self::Assigned => CacheTier::Activity,
        }
    }
}

/// A derived aggregate cache key, without section suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key for one section of this aggregate.
    pub fn section(&self, section: Section) -> String {
        format!("{}/{}", self.0, section.as_str())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generation of a cohort's subject-specific cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionToken {
    pub cohort: Role,
    pub value: u64,
}

/// Envelope persisted under a cache key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
