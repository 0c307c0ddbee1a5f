//! Mutation events emitted after a task change commits.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::task::TaskId;
use super::user::Subject;

/// What happened to the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Created,
    Updated,
    AssigneeChanged,
    Completed,
    Deleted,
    /// A bulk status change whose affected subjects are not enumerated.
    BulkArchived,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::AssigneeChanged => "assignee_changed",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::BulkArchived => "bulk_archived",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed mutation and the subjects whose views it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMutation {
    pub kind: MutationKind,
    pub task_id: Option<TaskId>,
    /// Creator, current assignee and previous assignee, deduplicated.
    /// Empty when the subjects cannot be enumerated.
    pub affected: Vec<Subject>,
}

impl TaskMutation {
    pub fn new(kind: MutationKind, task_id: TaskId) -> Self {
        Self {
            kind,
            task_id: Some(task_id),
            affected: Vec::new(),
        }
    }

    pub fn bulk(kind: MutationKind) -> Self {
        Self {
            kind,
            task_id: None,
            affected: Vec::new(),
        }
    }

    /// Add an affected subject, ignoring duplicates.
    pub fn affecting(mut self, subject: Subject) -> Self {
        if !self.affected.contains(&subject) {
            self.affected.push(subject);
        }
        self
    }

    /// Whether the affected subjects are known individually.
    pub fn is_addressable(&self) -> bool {
        self.task_id.is_some()
    }
}
