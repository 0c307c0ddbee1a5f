//! Denormalized per-user counters.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::UserId;

/// The two counters kept per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterName {
    /// Tasks whose `creator_id` is the subject.
    CreatedCount,
    /// Tasks whose `assignee_id` is the subject.
    AssignedCount,
}

impl CounterName {
    pub const ALL: [CounterName; 2] = [CounterName::CreatedCount, CounterName::AssignedCount];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedCount => "created_count",
            Self::AssignedCount => "assigned_count",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "created_count" | "createdcount" | "created" => Some(Self::CreatedCount),
            "assigned_count" | "assignedcount" | "assigned" => Some(Self::AssignedCount),
            _ => None,
        }
    }
}

impl fmt::Display for CounterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A counter value as observed by a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRecord {
    pub subject_id: UserId,
    pub counter_name: CounterName,
    pub value: u64,
}

/// External store key for a counter: `counter/<counter_name>/<subject_id>`.
pub fn counter_key(subject_id: UserId, counter: CounterName) -> String {
    format!("counter/{}/{}", counter.as_str(), subject_id)
}
