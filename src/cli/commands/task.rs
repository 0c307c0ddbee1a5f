//! Implementation of the `taskboard task` commands.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::cli::parse_priority;
use crate::domain::models::{NewTask, Task, TaskId, TaskPriority, UserId};
use crate::infrastructure::AppContext;

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Creating user's id
        #[arg(long, short)]
        creator: i64,

        /// Assignee's user id
        #[arg(long, short)]
        assignee: Option<i64>,

        #[arg(long, short, default_value = "medium", value_parser = parse_priority)]
        priority: TaskPriority,

        /// Due this many days from now
        #[arg(long)]
        due_in_days: Option<i64>,

        #[arg(long, short, default_value = "")]
        description: String,
    },

    /// Mark a task completed
    Complete {
        id: i64,

        /// Acting user's id
        #[arg(long)]
        actor: i64,
    },

    /// Assign a task to a user
    Assign {
        id: i64,

        /// Assignee's user id
        #[arg(long)]
        to: i64,
    },

    /// Delete a task
    Delete { id: i64 },
}

#[derive(Debug, Serialize)]
pub struct TaskOutput {
    pub action: &'static str,
    pub task: Task,
}

impl CommandOutput for TaskOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Task {}", self.action),
            format!("  ID:       {}", self.task.id),
            format!("  Title:    {}", self.task.title),
            format!("  Status:   {}", self.task.status),
            format!("  Priority: {}", self.task.priority),
            format!("  Creator:  {}", self.task.creator_id),
        ];
        if let Some(assignee) = self.task.assignee_id {
            lines.push(format!("  Assignee: {assignee}"));
        }
        if let Some(due) = self.task.due_date {
            lines.push(format!("  Due:      {}", due.format("%Y-%m-%d")));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteOutput {
    pub task_id: TaskId,
    pub deleted: bool,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        format!("Task {} deleted", self.task_id)
    }
}

pub async fn execute(command: TaskCommands, context: &AppContext, json_mode: bool) -> Result<()> {
    let service = &context.task_service;
    match command {
        TaskCommands::Add {
            title,
            creator,
            assignee,
            priority,
            due_in_days,
            description,
        } => {
            let mut new_task = NewTask::with_title(title).with_priority(priority);
            new_task.description = description;
            if let Some(days) = due_in_days {
                new_task = new_task.with_due_date(Utc::now() + Duration::days(days));
            }
            if let Some(assignee) = assignee {
                new_task = new_task.assigned_to(UserId(assignee));
            }

            let task = service
                .create(UserId(creator), new_task)
                .await
                .context("Failed to create task")?;
            output(&TaskOutput { action: "created", task }, json_mode);
        }
        TaskCommands::Complete { id, actor } => {
            let task = service
                .complete(TaskId(id), UserId(actor))
                .await
                .context("Failed to complete task")?;
            output(&TaskOutput { action: "completed", task }, json_mode);
        }
        TaskCommands::Assign { id, to } => {
            let task = service
                .assign(TaskId(id), UserId(to))
                .await
                .context("Failed to assign task")?;
            output(&TaskOutput { action: "assigned", task }, json_mode);
        }
        TaskCommands::Delete { id } => {
            service.delete(TaskId(id)).await.context("Failed to delete task")?;
            output(
                &DeleteOutput {
                    task_id: TaskId(id),
                    deleted: true,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
