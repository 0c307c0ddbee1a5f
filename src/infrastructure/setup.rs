//! Project initialization and service wiring.
//!
//! [`AppContext`] is the composition root: it opens the database and the
//! external store exactly once and hands the same instances to every
//! service.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::jobs::TracingJobDispatcher;
use crate::adapters::memory::InMemoryStore;
use crate::adapters::redis::RedisStore;
use crate::adapters::sqlite::{initialize_database, SqliteTaskRepository, SqliteUserRepository};
use crate::domain::models::{Config, StoreConfig};
use crate::domain::ports::{JobDispatcher, KeyValueStore};
use crate::services::{
    AggregateCache, CacheKeyDeriver, CounterReconciler, CounterStore, DashboardService, InvalidationCoordinator,
    TaskService,
};

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Taskboard Configuration
# Override settings by editing this file, adding .taskboard/local.yaml,
# or setting environment variables with the TASKBOARD_ prefix
#
# Example environment variables:
#   export TASKBOARD_STORE__URL=redis://127.0.0.1:6379/0
#   export TASKBOARD_CACHE__AGGREGATE_TTL_SECS=600
#   export TASKBOARD_LOGGING__LEVEL=debug

database:
  # Path to SQLite database file (project-local)
  path: ".taskboard/taskboard.db"
  max_connections: 10

# External cache and counter store. Without a url an in-process store is
# used, which starts empty on every run.
store:
  # url: "redis://127.0.0.1:6379/0"
  namespace: "taskboard"
  pool_size: 16
  operation_timeout_ms: 500

cache:
  # Status histogram and overdue count
  aggregate_ttl_secs: 300
  # Recent activity and assigned-task lists
  activity_ttl_secs: 120
  list_limit: 10

reconcile:
  # zero_only: seed missing or zero counters only
  # full: overwrite any counter that disagrees with the database
  policy: "zero_only"
  on_startup: false

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"
  # Log format: json, pretty
  format: "json"
  # log_dir: ".taskboard/logs"
  rotation: "daily"
"#;

/// Paths used by project initialization
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::under(&current_dir))
    }

    pub fn under(root: &Path) -> Self {
        let config_dir = root.join(".taskboard");
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Write the default configuration file. Existing files are kept unless `force`.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// Open the configured external store.
///
/// Without a url, an in-process store is used. An unreachable Redis server
/// is not an error: every operation degrades on its own until it returns.
pub async fn connect_store(config: &StoreConfig) -> Result<(Arc<dyn KeyValueStore>, bool)> {
    if config.url.is_none() {
        tracing::info!("no store url configured, using in-process store");
        return Ok((Arc::new(InMemoryStore::new()), true));
    }

    let store = RedisStore::from_config(config).context("Failed to configure redis store")?;
    match store.ping().await {
        Ok(()) => tracing::info!(namespace = %config.namespace, "connected to redis store"),
        Err(error) => tracing::warn!(error = %error, "redis store unreachable, running degraded"),
    }
    Ok((Arc::new(store), false))
}

/// Every service, wired over one database pool and one store.
pub struct AppContext {
    pub config: Config,
    pub pool: SqlitePool,
    pub store: Arc<dyn KeyValueStore>,
    pub users: Arc<SqliteUserRepository>,
    pub tasks: Arc<SqliteTaskRepository>,
    pub counters: Arc<CounterStore<SqliteTaskRepository>>,
    pub reconciler: CounterReconciler<SqliteTaskRepository, SqliteUserRepository>,
    pub invalidation: Arc<InvalidationCoordinator>,
    pub dashboard: DashboardService<SqliteTaskRepository>,
    pub task_service: TaskService<SqliteTaskRepository, SqliteUserRepository>,
}

impl AppContext {
    /// Open the database and store named by `config` and wire the services.
    ///
    /// An in-process store starts empty, so its counters are seeded from the
    /// database before returning.
    pub async fn build(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .context("Failed to initialize database")?;
        let (store, in_process) = connect_store(&config.store).await?;

        let context = Self::assemble(config, pool, store, Arc::new(TracingJobDispatcher));
        if in_process || context.config.reconcile.on_startup {
            context.reconciler.reconcile_all().await.context("Startup reconciliation failed")?;
        }
        Ok(context)
    }

    /// Wire services over already-open resources.
    pub fn assemble(
        config: Config,
        pool: SqlitePool,
        store: Arc<dyn KeyValueStore>,
        jobs: Arc<dyn JobDispatcher>,
    ) -> Self {
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let tasks = Arc::new(SqliteTaskRepository::new(pool.clone()));

        let keys = CacheKeyDeriver::new(Arc::clone(&store));
        let cache = Arc::new(AggregateCache::new(Arc::clone(&store), config.cache.tiers()));
        let invalidation = Arc::new(InvalidationCoordinator::new(Arc::clone(&cache), keys.clone()));
        let counters = Arc::new(CounterStore::new(Arc::clone(&store), Arc::clone(&tasks)));
        let reconciler = CounterReconciler::new(
            Arc::clone(&counters),
            Arc::clone(&tasks),
            Arc::clone(&users),
            config.reconcile.policy,
        );
        let dashboard =
            DashboardService::new(Arc::clone(&tasks), cache, keys).with_list_limit(config.cache.list_limit);
        let task_service = TaskService::new(
            Arc::clone(&tasks),
            Arc::clone(&users),
            Arc::clone(&counters),
            Arc::clone(&invalidation),
            jobs,
        );

        Self {
            config,
            pool,
            store,
            users,
            tasks,
            counters,
            reconciler,
            invalidation,
            dashboard,
            task_service,
        }
    }
}
