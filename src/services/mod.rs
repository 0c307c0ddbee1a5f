//! Application services.

pub mod aggregate_cache;
pub mod cache_keys;
pub mod counter_reconciler;
pub mod counter_store;
pub mod dashboard_service;
pub mod invalidation;
pub mod task_service;

pub use aggregate_cache::{AggregateCache, CacheLookup, CacheStatus};
pub use cache_keys::{CacheKeyDeriver, DerivedKeys};
pub use counter_reconciler::{CounterReconciler, ReconcileOutcome, ReconcileSummary};
pub use counter_store::CounterStore;
pub use dashboard_service::DashboardService;
pub use invalidation::{InvalidationCoordinator, InvalidationReport};
pub use task_service::TaskService;
