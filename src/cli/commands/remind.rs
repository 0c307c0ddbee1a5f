//! Implementation of the `taskboard remind` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{TaskId, UserId};
use crate::infrastructure::AppContext;

#[derive(Debug, Serialize)]
pub struct ReminderEntry {
    pub task_id: TaskId,
    pub title: String,
    pub assignee_id: Option<UserId>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RemindOutput {
    pub reminders: Vec<ReminderEntry>,
}

impl CommandOutput for RemindOutput {
    fn to_human(&self) -> String {
        if self.reminders.is_empty() {
            return "No open tasks due in the next 24 hours".to_string();
        }
        let mut lines = vec![format!("Queued {} reminder(s):", self.reminders.len())];
        for entry in &self.reminders {
            let due = entry
                .due_date
                .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M UTC").to_string());
            let assignee = entry.assignee_id.map_or_else(|| "-".to_string(), |id| id.to_string());
            lines.push(format!("  #{} {} (user {assignee}, due {due})", entry.task_id, truncate(&entry.title, 40)));
        }
        lines.join("\n")
    }
}

pub async fn execute(context: &AppContext, json_mode: bool) -> Result<()> {
    let due = context
        .task_service
        .trigger_due_reminders(Utc::now())
        .await
        .context("Failed to queue reminders")?;

    let reminders = due
        .into_iter()
        .map(|task| ReminderEntry {
            task_id: task.id,
            title: task.title,
            assignee_id: task.assignee_id,
            due_date: task.due_date,
        })
        .collect();
    output(&RemindOutput { reminders }, json_mode);
    Ok(())
}
