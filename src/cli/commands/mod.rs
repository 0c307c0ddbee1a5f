//! CLI command implementations.

pub mod archive;
pub mod counter;
pub mod dashboard;
pub mod init;
pub mod invalidate;
pub mod reconcile;
pub mod remind;
pub mod task;
pub mod user;
