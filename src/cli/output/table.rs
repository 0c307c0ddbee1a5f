//! Table output formatting for CLI commands
//!
//! Renders dashboards, task lists, users, and counters with comfy-table.
//! Colors are dropped when `NO_COLOR` is set or the terminal is dumb.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{CounterRecord, DashboardPayload, TaskStatus, TaskSummary, User};

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self { use_colors, max_width }
    }

    /// Status histogram, overdue count, and both task lists.
    pub fn format_dashboard(&self, dashboard: &DashboardPayload) -> String {
        let mut counts = self.create_base_table();
        counts.set_header(vec![
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Tasks").add_attribute(Attribute::Bold),
        ]);
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed, TaskStatus::Archived] {
            counts.add_row(vec![
                self.status_cell(status),
                Cell::new(dashboard.count_for(status).to_string()),
            ]);
        }
        let overdue = if self.use_colors && dashboard.overdue_count > 0 {
            Cell::new(dashboard.overdue_count.to_string()).fg(Color::Red)
        } else {
            Cell::new(dashboard.overdue_count.to_string())
        };
        counts.add_row(vec![Cell::new("overdue").add_attribute(Attribute::Italic), overdue]);

        let mut sections = vec![counts.to_string()];
        sections.push(format!("Assigned to you ({})", dashboard.assigned_incomplete.len()));
        sections.push(self.format_summaries(&dashboard.assigned_incomplete));
        sections.push(format!("Recent activity ({})", dashboard.recent_activity.len()));
        sections.push(self.format_summaries(&dashboard.recent_activity));
        sections.join("\n")
    }

    pub fn format_summaries(&self, tasks: &[TaskSummary]) -> String {
        if tasks.is_empty() {
            return "  (none)".to_string();
        }

        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Creator").add_attribute(Attribute::Bold),
            Cell::new("Assignee").add_attribute(Attribute::Bold),
        ]);

        for task in tasks {
            let due = task
                .due_date
                .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
            let assignee = task.assignee.as_ref().map_or("-", |u| u.name.as_str());

            table.add_row(vec![
                Cell::new(task.id.to_string()),
                Cell::new(truncate(&task.title, 40)),
                self.status_cell(task.status),
                Cell::new(task.priority.as_str()),
                Cell::new(due),
                Cell::new(truncate(&task.creator.name, 20)),
                Cell::new(truncate(assignee, 20)),
            ]);
        }

        table.to_string()
    }

    pub fn format_users(&self, users: &[User]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Email").add_attribute(Attribute::Bold),
            Cell::new("Role").add_attribute(Attribute::Bold),
        ]);

        for user in users {
            let role = if self.use_colors && user.role.is_privileged() {
                Cell::new(user.role.as_str()).fg(Color::Cyan)
            } else {
                Cell::new(user.role.as_str())
            };
            table.add_row(vec![
                Cell::new(user.id.to_string()),
                Cell::new(truncate(&user.name, 30)),
                Cell::new(truncate(&user.email, 40)),
                role,
            ]);
        }

        table.to_string()
    }

    pub fn format_counters(&self, counters: &[CounterRecord]) -> String {
        let mut table = self.create_base_table();
        table.set_header(vec![
            Cell::new("User").add_attribute(Attribute::Bold),
            Cell::new("Counter").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        for record in counters {
            table.add_row(vec![
                Cell::new(record.subject_id.to_string()),
                Cell::new(record.counter_name.as_str()),
                Cell::new(record.value.to_string()),
            ]);
        }

        table.to_string()
    }

    fn status_cell(&self, status: TaskStatus) -> Cell {
        if self.use_colors {
            Cell::new(status.as_str()).fg(status_color(status))
        } else {
            Cell::new(format!("{} {}", status_icon(status), status.as_str()))
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::White,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Archived => Color::DarkGrey,
    }
}

fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "○",
        TaskStatus::InProgress => "⟳",
        TaskStatus::Completed => "✓",
        TaskStatus::Archived => "⊘",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CounterName, Role, TaskId, TaskPriority, UserId, UserRef};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn summary(title: &str) -> TaskSummary {
        TaskSummary {
            id: TaskId(12),
            title: title.to_string(),
            status: TaskStatus::InProgress,
            priority: TaskPriority::High,
            due_date: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            creator: UserRef {
                id: UserId(1),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
            },
            assignee: None,
        }
    }

    #[test]
    fn test_dashboard_table_contains_counts_and_titles() {
        let formatter = TableFormatter::with_config(false, Some(120));
        let dashboard = DashboardPayload {
            status_counts: BTreeMap::from([(TaskStatus::Pending, 4), (TaskStatus::Completed, 2)]),
            overdue_count: 1,
            assigned_incomplete: vec![summary("Fix login")],
            recent_activity: vec![],
        };

        let rendered = formatter.format_dashboard(&dashboard);
        assert!(rendered.contains("○ pending"));
        assert!(rendered.contains("Fix login"));
        assert!(rendered.contains("Recent activity (0)"));
        assert!(rendered.contains("(none)"));
    }

    #[test]
    fn test_users_and_counters_tables() {
        let formatter = TableFormatter::with_config(false, Some(120));
        let users = vec![User {
            id: UserId(3),
            email: "lee@example.com".to_string(),
            name: "Lee".to_string(),
            role: Role::Manager,
            created_at: Utc::now(),
        }];
        assert!(formatter.format_users(&users).contains("lee@example.com"));

        let counters = vec![CounterRecord {
            subject_id: UserId(3),
            counter_name: CounterName::AssignedCount,
            value: 8,
        }];
        assert!(formatter.format_counters(&counters).contains("assigned_count"));
    }
}
