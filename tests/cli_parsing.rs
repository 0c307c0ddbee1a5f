use clap::Parser;

use taskboard::cli::commands::counter::CounterCommands;
use taskboard::cli::commands::task::TaskCommands;
use taskboard::cli::commands::user::UserCommands;
use taskboard::cli::{Cli, Commands};
use taskboard::domain::models::{CounterName, Role, TaskPriority};

#[test]
fn test_parse_task_add() {
    let cli = Cli::try_parse_from([
        "taskboard",
        "task",
        "add",
        "Prepare quarterly review",
        "--creator",
        "3",
        "--assignee",
        "7",
        "--priority",
        "high",
        "--due-in-days",
        "5",
    ])
    .unwrap();

    match cli.command {
        Commands::Task(TaskCommands::Add {
            title,
            creator,
            assignee,
            priority,
            due_in_days,
            description,
        }) => {
            assert_eq!(title, "Prepare quarterly review");
            assert_eq!(creator, 3);
            assert_eq!(assignee, Some(7));
            assert_eq!(priority, TaskPriority::High);
            assert_eq!(due_in_days, Some(5));
            assert!(description.is_empty());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_task_add_defaults_priority() {
    let cli = Cli::try_parse_from(["taskboard", "task", "add", "Tidy backlog", "-c", "1"]).unwrap();
    match cli.command {
        Commands::Task(TaskCommands::Add { priority, assignee, .. }) => {
            assert_eq!(priority, TaskPriority::Medium);
            assert!(assignee.is_none());
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_counter_reconcile_full() {
    let cli = Cli::try_parse_from([
        "taskboard",
        "counter",
        "reconcile",
        "--user",
        "5",
        "assigned_count",
        "--full",
    ])
    .unwrap();

    match cli.command {
        Commands::Counter(CounterCommands::Reconcile { user, counter, full }) => {
            assert_eq!(user, 5);
            assert_eq!(counter, Some(CounterName::AssignedCount));
            assert!(full);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_counter_rejects_unknown_name() {
    let result = Cli::try_parse_from(["taskboard", "counter", "get", "--user", "5", "likes"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_user_add_with_role() {
    let cli = Cli::try_parse_from([
        "taskboard",
        "user",
        "add",
        "lead@example.com",
        "Team Lead",
        "--role",
        "manager",
    ])
    .unwrap();

    match cli.command {
        Commands::User(UserCommands::Add { email, name, role }) => {
            assert_eq!(email, "lead@example.com");
            assert_eq!(name, "Team Lead");
            assert_eq!(role, Role::Manager);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_parse_archive_default_window() {
    let cli = Cli::try_parse_from(["taskboard", "archive"]).unwrap();
    match cli.command {
        Commands::Archive(args) => assert_eq!(args.older_than_days, 30),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "taskboard",
        "reconcile-all",
        "--full",
        "--json",
        "--config",
        "/tmp/taskboard.yaml",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/taskboard.yaml")));
    assert!(matches!(cli.command, Commands::ReconcileAll(ref args) if args.full));
}
