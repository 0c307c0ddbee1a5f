//! Implementation of the `taskboard user` commands.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::cli::parse_role;
use crate::domain::models::{NewUser, Role, User, UserId};
use crate::domain::ports::UserRepository;
use crate::infrastructure::AppContext;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Add {
        email: String,

        name: String,

        /// admin, manager, or member
        #[arg(long, short, default_value = "member", value_parser = parse_role)]
        role: Role,
    },

    /// List users
    List,

    /// Request an export of everything a user owns
    Export {
        #[arg(long, short)]
        user: i64,
    },
}

#[derive(Debug, Serialize)]
pub struct UserOutput {
    pub user: User,
}

impl CommandOutput for UserOutput {
    fn to_human(&self) -> String {
        format!(
            "User created\n  ID:    {}\n  Name:  {}\n  Email: {}\n  Role:  {}",
            self.user.id, self.user.name, self.user.email, self.user.role
        )
    }
}

#[derive(Debug, Serialize)]
pub struct UserListOutput {
    pub users: Vec<User>,
}

impl CommandOutput for UserListOutput {
    fn to_human(&self) -> String {
        if self.users.is_empty() {
            return "No users found.".to_string();
        }
        format!(
            "{}\n\nShowing {} user(s)",
            TableFormatter::new().format_users(&self.users),
            self.users.len()
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    pub user_id: UserId,
    pub requested: bool,
}

impl CommandOutput for ExportOutput {
    fn to_human(&self) -> String {
        format!("Data export requested for user {}", self.user_id)
    }
}

pub async fn execute(command: UserCommands, context: &AppContext, json_mode: bool) -> Result<()> {
    match command {
        UserCommands::Add { email, name, role } => {
            let user = context
                .users
                .create(&NewUser::new(email, name, role))
                .await
                .context("Failed to create user")?;
            output(&UserOutput { user }, json_mode);
        }
        UserCommands::List => {
            let users = context.users.list().await.context("Failed to list users")?;
            output(&UserListOutput { users }, json_mode);
        }
        UserCommands::Export { user } => {
            context
                .task_service
                .request_export(UserId(user))
                .await
                .context("Failed to request export")?;
            output(
                &ExportOutput {
                    user_id: UserId(user),
                    requested: true,
                },
                json_mode,
            );
        }
    }
    Ok(())
}
