//! Taskboard - read-model cache and denormalized counters for a task tracker
//!
//! Expensive per-viewer dashboard aggregates are cached in an external
//! key-value store under role-aware keys with tiered expiry, and per-user
//! counters are kept there too. The store is optional at every step: when
//! it is unreachable, reads are computed from the relational database and
//! writes are skipped, so callers never see a store error.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors, and port traits
//! - **Adapters** (`adapters`): `SQLite`, Redis, in-process store, job dispatch
//! - **Service Layer** (`services`): caching, invalidation, counters, mutations
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, wiring
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CacheTier, Config, CounterName, DashboardPayload, ReconcilePolicy, Role, Subject, Task, TaskStatus, UserId,
};
pub use domain::ports::{KeyValueStore, ScopedRecordSource, TaskRepository, UserRepository};
pub use domain::{DomainError, DomainResult, StoreError, StoreResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::AppContext;
pub use services::{
    AggregateCache, CacheKeyDeriver, CounterReconciler, CounterStore, DashboardService, InvalidationCoordinator,
    TaskService,
};
