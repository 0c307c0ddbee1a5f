pub mod cache;
pub mod config;
pub mod counter;
pub mod dashboard;
pub mod job;
pub mod mutation;
pub mod task;
pub mod user;

pub use cache::{CacheEntry, CacheKey, CacheTier, Section, TierTable, VersionToken};
pub use config::{
    CacheConfig, Config, DatabaseConfig, LoggingConfig, ReconcileConfig, ReconcilePolicy,
    StoreConfig,
};
pub use counter::{counter_key, CounterName, CounterRecord};
pub use dashboard::{AggregateSection, DashboardPayload};
pub use job::{BackgroundJob, NotificationKind};
pub use mutation::{MutationKind, TaskMutation};
pub use task::{NewTask, Task, TaskId, TaskPriority, TaskStatus, TaskSummary, TaskUpdate};
pub use user::{NewUser, Role, Subject, User, UserId, UserRef};
