//! A fully wired service graph over an in-memory database and store, with
//! a task repository that records every aggregate computation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taskboard::adapters::jobs::TracingJobDispatcher;
use taskboard::adapters::memory::InMemoryStore;
use taskboard::adapters::sqlite::{SqliteTaskRepository, SqliteUserRepository};
use taskboard::domain::models::{
    CounterName, NewTask, NewUser, ReconcilePolicy, Role, Task, TaskId, TaskStatus, TaskSummary, TierTable, User,
    UserId,
};
use taskboard::domain::ports::{ScopedRecordSource, TaskRepository, TaskScope, UserRepository};
use taskboard::services::{
    AggregateCache, CacheKeyDeriver, CounterReconciler, CounterStore, DashboardService, InvalidationCoordinator,
    TaskService,
};
use taskboard::DomainResult;

use super::database::setup_test_db;

type ComputeLog = Arc<Mutex<Vec<TaskScope>>>;

/// Delegates to SQLite and logs the scope of every status histogram query,
/// which runs exactly once per aggregate section computation.
pub struct CountingTasks {
    inner: SqliteTaskRepository,
    log: ComputeLog,
}

struct CountingSource {
    inner: Box<dyn ScopedRecordSource>,
    scope: TaskScope,
    log: ComputeLog,
}

#[async_trait]
impl ScopedRecordSource for CountingSource {
    async fn count_by_status(&self) -> DomainResult<BTreeMap<TaskStatus, u64>> {
        self.log.lock().unwrap().push(self.scope);
        self.inner.count_by_status().await
    }

    async fn count_overdue(&self, now: DateTime<Utc>) -> DomainResult<u64> {
        self.inner.count_overdue(now).await
    }

    async fn list_recent(&self, limit: usize) -> DomainResult<Vec<TaskSummary>> {
        self.inner.list_recent(limit).await
    }

    async fn list_assigned_incomplete(&self, assignee: UserId, limit: usize) -> DomainResult<Vec<TaskSummary>> {
        self.inner.list_assigned_incomplete(assignee, limit).await
    }
}

#[async_trait]
impl TaskRepository for CountingTasks {
    async fn create(&self, creator: UserId, task: &NewTask) -> DomainResult<Task> {
        self.inner.create(creator, task).await
    }

    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        self.inner.get(id).await
    }

    async fn update(&self, task: &Task) -> DomainResult<()> {
        self.inner.update(task).await
    }

    async fn delete(&self, id: TaskId) -> DomainResult<()> {
        self.inner.delete(id).await
    }

    async fn count_for_counter(&self, subject: UserId, counter: CounterName) -> DomainResult<u64> {
        self.inner.count_for_counter(subject, counter).await
    }

    async fn archive_completed_before(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        self.inner.archive_completed_before(cutoff).await
    }

    async fn list_due_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DomainResult<Vec<Task>> {
        self.inner.list_due_between(from, to).await
    }

    fn scoped(&self, scope: TaskScope) -> Box<dyn ScopedRecordSource> {
        Box::new(CountingSource {
            inner: self.inner.scoped(scope),
            scope,
            log: Arc::clone(&self.log),
        })
    }
}

pub struct World {
    pub store: Arc<InMemoryStore>,
    pub users: Arc<SqliteUserRepository>,
    pub tasks: Arc<CountingTasks>,
    pub counters: Arc<CounterStore<CountingTasks>>,
    pub invalidation: Arc<InvalidationCoordinator>,
    pub dashboard: DashboardService<CountingTasks>,
    pub tasks_service: TaskService<CountingTasks, SqliteUserRepository>,
    log: ComputeLog,
    next_user: AtomicUsize,
}

impl World {
    pub async fn new() -> Self {
        let pool = setup_test_db().await;
        let log: ComputeLog = Arc::default();

        let store = Arc::new(InMemoryStore::new());
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let tasks = Arc::new(CountingTasks {
            inner: SqliteTaskRepository::new(pool),
            log: Arc::clone(&log),
        });

        let keys = CacheKeyDeriver::new(store.clone());
        let cache = Arc::new(AggregateCache::new(store.clone(), TierTable::default()));
        let invalidation = Arc::new(InvalidationCoordinator::new(cache.clone(), keys.clone()));
        let counters = Arc::new(CounterStore::new(store.clone(), tasks.clone()));
        let dashboard = DashboardService::new(tasks.clone(), cache, keys);
        let tasks_service = TaskService::new(
            tasks.clone(),
            users.clone(),
            counters.clone(),
            invalidation.clone(),
            Arc::new(TracingJobDispatcher),
        );

        Self {
            store,
            users,
            tasks,
            counters,
            invalidation,
            dashboard,
            tasks_service,
            log,
            next_user: AtomicUsize::new(0),
        }
    }

    pub fn reconciler(&self, policy: ReconcilePolicy) -> CounterReconciler<CountingTasks, SqliteUserRepository> {
        CounterReconciler::new(self.counters.clone(), self.tasks.clone(), self.users.clone(), policy)
    }

    pub async fn user(&self, role: Role) -> User {
        let n = self.next_user.fetch_add(1, Ordering::SeqCst);
        self.users
            .create(&NewUser::new(format!("user{n}@example.com"), format!("User {n}"), role))
            .await
            .expect("failed to create user")
    }

    /// Create users until one with id `id` exists and return it.
    pub async fn user_with_id(&self, id: i64, role: Role) -> User {
        loop {
            let user = self.user(role).await;
            if user.id == UserId(id) {
                return user;
            }
            assert!(user.id.0 < id, "user id {id} already taken");
        }
    }

    /// Aggregate computations so far for `scope`.
    pub fn computes_for(&self, scope: TaskScope) -> usize {
        self.log.lock().unwrap().iter().filter(|s| **s == scope).count()
    }
}
