//! Infrastructure adapters for external systems.

pub mod jobs;
pub mod memory;
pub mod redis;
pub mod sqlite;
