use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::cache::TierTable;

/// Main configuration structure for taskboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// External cache/counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Aggregate cache tiers
    #[serde(default)]
    pub cache: CacheConfig,

    /// Counter reconciliation
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".taskboard/taskboard.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// External key-value store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Redis URL. When unset an in-process store is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Prefix prepended to every key as `<namespace>:`
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Upper bound on a single store round trip, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_namespace() -> String {
    "taskboard".to_string()
}

const fn default_pool_size() -> usize {
    16
}

const fn default_operation_timeout_ms() -> u64 {
    500
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            namespace: default_namespace(),
            pool_size: default_pool_size(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Aggregate cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Expiration for slow-changing aggregates (status histogram, overdue count)
    #[serde(default = "default_aggregate_ttl_secs")]
    pub aggregate_ttl_secs: u64,

    /// Expiration for fast-changing activity lists
    #[serde(default = "default_activity_ttl_secs")]
    pub activity_ttl_secs: u64,

    /// Number of tasks in each dashboard list
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

const fn default_aggregate_ttl_secs() -> u64 {
    300
}

const fn default_activity_ttl_secs() -> u64 {
    120
}

const fn default_list_limit() -> usize {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            aggregate_ttl_secs: default_aggregate_ttl_secs(),
            activity_ttl_secs: default_activity_ttl_secs(),
            list_limit: default_list_limit(),
        }
    }
}

impl CacheConfig {
    pub fn tiers(&self) -> TierTable {
        TierTable {
            aggregate: Duration::from_secs(self.aggregate_ttl_secs),
            activity: Duration::from_secs(self.activity_ttl_secs),
        }
    }
}

/// How far the reconciler is allowed to go when it finds drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Only seed a missing or zero counter from the relational count.
    #[default]
    ZeroOnly,
    /// Overwrite any value that disagrees with the relational count.
    Full,
}

impl ReconcilePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroOnly => "zero_only",
            Self::Full => "full",
        }
    }
}

/// Counter reconciliation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReconcileConfig {
    /// Repair policy
    #[serde(default)]
    pub policy: ReconcilePolicy,

    /// Reconcile every user's counters once at startup
    #[serde(default)]
    pub on_startup: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
