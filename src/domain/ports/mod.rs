//! Port trait definitions (Hexagonal Architecture)
//!
//! - KeyValueStore: external cache/counter store
//! - ScopedRecordSource: permission-filtered task reads for aggregation
//! - TaskRepository / UserRepository: relational persistence
//! - JobDispatcher: background work triggers

pub mod job_dispatcher;
pub mod key_value_store;
pub mod record_source;
pub mod task_repository;
pub mod user_repository;

pub use job_dispatcher::JobDispatcher;
pub use key_value_store::KeyValueStore;
pub use record_source::{ScopedRecordSource, TaskScope};
pub use task_repository::TaskRepository;
pub use user_repository::UserRepository;
