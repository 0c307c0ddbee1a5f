//! Background work triggered by task mutations.

use serde::{Deserialize, Serialize};

use super::task::TaskId;
use super::user::UserId;

/// Why a task notification is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Assignment,
    Completion,
}

/// A unit of background work. Only the trigger matters here; delivery is
/// up to whatever consumes the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundJob {
    TaskNotification { task_id: TaskId, kind: NotificationKind },
    DataExport { user_id: UserId },
    TaskArchival { archived: u64 },
    TaskReminder { task_id: TaskId },
}

impl BackgroundJob {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskNotification { .. } => "task_notification",
            Self::DataExport { .. } => "data_export",
            Self::TaskArchival { .. } => "task_archival",
            Self::TaskReminder { .. } => "task_reminder",
        }
    }
}
