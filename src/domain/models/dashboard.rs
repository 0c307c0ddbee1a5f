//! Dashboard payload returned by the aggregate read path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::task::{TaskStatus, TaskSummary};

/// Slow-tier section: histogram and overdue count over the viewer's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSection {
    pub status_counts: BTreeMap<TaskStatus, u64>,
    pub overdue_count: u64,
}

/// The full dashboard, assembled from independently cached sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub status_counts: BTreeMap<TaskStatus, u64>,
    pub overdue_count: u64,
    pub assigned_incomplete: Vec<TaskSummary>,
    pub recent_activity: Vec<TaskSummary>,
}

impl DashboardPayload {
    pub fn assemble(
        aggregates: AggregateSection,
        assigned_incomplete: Vec<TaskSummary>,
        recent_activity: Vec<TaskSummary>,
    ) -> Self {
        Self {
            status_counts: aggregates.status_counts,
            overdue_count: aggregates.overdue_count,
            assigned_incomplete,
            recent_activity,
        }
    }

    pub fn count_for(&self, status: TaskStatus) -> u64 {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }
}
