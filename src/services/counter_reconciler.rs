//! Repairs counters that drifted from their relational source.
//!
//! Drift comes from dropped writes while the store was unreachable, or from
//! the store losing its data. Under [`ReconcilePolicy::ZeroOnly`] only
//! missing, zero, or negative counters are seeded; anything else that
//! disagrees is reported but left alone. [`ReconcilePolicy::Full`] overwrites
//! every mismatch.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CounterName, ReconcilePolicy, UserId};
use crate::domain::ports::{TaskRepository, UserRepository};
use crate::services::counter_store::CounterStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Stored value already matched.
    InSync { value: u64 },
    /// Stored value was replaced with the relational count.
    Repaired { previous: Option<i64>, value: u64 },
    /// Mismatch left in place by policy.
    Drifted { stored: i64, actual: u64 },
    /// The store could not be read or written.
    Skipped { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub checked: usize,
    pub in_sync: usize,
    pub repaired: usize,
    pub drifted: usize,
    pub skipped: usize,
}

impl ReconcileSummary {
    fn record(&mut self, outcome: &ReconcileOutcome) {
        self.checked += 1;
        match outcome {
            ReconcileOutcome::InSync { .. } => self.in_sync += 1,
            ReconcileOutcome::Repaired { .. } => self.repaired += 1,
            ReconcileOutcome::Drifted { .. } => self.drifted += 1,
            ReconcileOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

pub struct CounterReconciler<T: TaskRepository, U: UserRepository> {
    counters: Arc<CounterStore<T>>,
    tasks: Arc<T>,
    users: Arc<U>,
    policy: ReconcilePolicy,
}

impl<T: TaskRepository, U: UserRepository> CounterReconciler<T, U> {
    pub fn new(counters: Arc<CounterStore<T>>, tasks: Arc<T>, users: Arc<U>, policy: ReconcilePolicy) -> Self {
        Self {
            counters,
            tasks,
            users,
            policy,
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Compare one counter with its relational count and repair per the
    /// configured policy.
    ///
    /// Only relational failures are errors; store failures yield `Skipped`.
    pub async fn reconcile(&self, subject: UserId, counter: CounterName) -> DomainResult<ReconcileOutcome> {
        self.reconcile_with(subject, counter, self.policy).await
    }

    pub async fn reconcile_with(
        &self,
        subject: UserId,
        counter: CounterName,
        policy: ReconcilePolicy,
    ) -> DomainResult<ReconcileOutcome> {
        let stored = match self.counters.stored_value(subject, counter).await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(subject_id = %subject, counter = %counter, error = %error, "reconcile skipped");
                return Ok(ReconcileOutcome::Skipped { reason: error.to_string() });
            }
        };
        let actual = self.tasks.count_for_counter(subject, counter).await?;

        let current = stored.unwrap_or(0);
        if stored.is_some() && i64::try_from(actual).ok() == Some(current) {
            return Ok(ReconcileOutcome::InSync { value: actual });
        }
        if stored.is_none() && actual == 0 {
            return Ok(ReconcileOutcome::InSync { value: 0 });
        }

        let repairable = match policy {
            ReconcilePolicy::Full => true,
            ReconcilePolicy::ZeroOnly => current <= 0,
        };
        if !repairable {
            tracing::warn!(
                subject_id = %subject,
                counter = %counter,
                stored = current,
                actual,
                policy = policy.as_str(),
                "counter drift left in place"
            );
            return Ok(ReconcileOutcome::Drifted { stored: current, actual });
        }

        if let Err(error) = self.counters.overwrite(subject, counter, actual).await {
            tracing::warn!(subject_id = %subject, counter = %counter, error = %error, "counter repair failed");
            return Ok(ReconcileOutcome::Skipped { reason: error.to_string() });
        }

        tracing::info!(subject_id = %subject, counter = %counter, previous = ?stored, value = actual, "counter repaired");
        Ok(ReconcileOutcome::Repaired { previous: stored, value: actual })
    }

    /// Reconcile every counter of every user.
    pub async fn reconcile_all(&self) -> DomainResult<ReconcileSummary> {
        self.reconcile_all_with(self.policy).await
    }

    pub async fn reconcile_all_with(&self, policy: ReconcilePolicy) -> DomainResult<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();
        for user in self.users.list().await? {
            for counter in CounterName::ALL {
                let outcome = self.reconcile_with(user.id, counter, policy).await?;
                summary.record(&outcome);
            }
        }

        tracing::info!(
            checked = summary.checked,
            repaired = summary.repaired,
            drifted = summary.drifted,
            skipped = summary.skipped,
            policy = policy.as_str(),
            "counter reconciliation finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteTaskRepository, SqliteUserRepository};
    use crate::domain::models::{NewTask, NewUser, Role};

    struct Fixture {
        store: Arc<InMemoryStore>,
        tasks: Arc<SqliteTaskRepository>,
        counters: Arc<CounterStore<SqliteTaskRepository>>,
        reconciler: CounterReconciler<SqliteTaskRepository, SqliteUserRepository>,
        user: UserId,
    }

    async fn fixture(policy: ReconcilePolicy) -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let user = users.create(&NewUser::new("rui@example.com", "Rui", Role::Member)).await.unwrap().id;
        let tasks = Arc::new(SqliteTaskRepository::new(pool));
        let store = Arc::new(InMemoryStore::new());
        let counters = Arc::new(CounterStore::new(store.clone(), tasks.clone()));
        let reconciler = CounterReconciler::new(counters.clone(), tasks.clone(), users, policy);
        Fixture {
            store,
            tasks,
            counters,
            reconciler,
            user,
        }
    }

    #[tokio::test]
    async fn test_zero_only_seeds_missing_counter() {
        let f = fixture(ReconcilePolicy::ZeroOnly).await;
        f.tasks.create(f.user, &NewTask::with_title("a")).await.unwrap();
        f.tasks.create(f.user, &NewTask::with_title("b")).await.unwrap();

        let outcome = f.reconciler.reconcile(f.user, CounterName::CreatedCount).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Repaired { previous: None, value: 2 });
        assert_eq!(f.counters.read(f.user, CounterName::CreatedCount).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_zero_only_leaves_nonzero_drift() {
        let f = fixture(ReconcilePolicy::ZeroOnly).await;
        f.tasks.create(f.user, &NewTask::with_title("a")).await.unwrap();
        f.counters.overwrite(f.user, CounterName::CreatedCount, 4).await.unwrap();

        let outcome = f.reconciler.reconcile(f.user, CounterName::CreatedCount).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Drifted { stored: 4, actual: 1 });
        assert_eq!(f.counters.read(f.user, CounterName::CreatedCount).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_full_policy_repairs_any_drift() {
        let f = fixture(ReconcilePolicy::Full).await;
        f.tasks.create(f.user, &NewTask::with_title("a")).await.unwrap();
        f.counters.overwrite(f.user, CounterName::CreatedCount, 4).await.unwrap();

        let outcome = f.reconciler.reconcile(f.user, CounterName::CreatedCount).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Repaired { previous: Some(4), value: 1 });
    }

    #[tokio::test]
    async fn test_policy_override_per_call() {
        let f = fixture(ReconcilePolicy::ZeroOnly).await;
        f.counters.overwrite(f.user, CounterName::AssignedCount, 3).await.unwrap();

        let outcome = f
            .reconciler
            .reconcile_with(f.user, CounterName::AssignedCount, ReconcilePolicy::Full)
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Repaired { previous: Some(3), value: 0 });
    }

    #[tokio::test]
    async fn test_matching_counter_is_in_sync() {
        let f = fixture(ReconcilePolicy::Full).await;
        let outcome = f.reconciler.reconcile(f.user, CounterName::AssignedCount).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::InSync { value: 0 });
        assert_eq!(f.counters.stored_value(f.user, CounterName::AssignedCount).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_outage_skips() {
        let f = fixture(ReconcilePolicy::Full).await;
        f.store.set_available(false);

        let outcome = f.reconciler.reconcile(f.user, CounterName::CreatedCount).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_all_covers_every_user_and_counter() {
        let f = fixture(ReconcilePolicy::ZeroOnly).await;
        f.tasks.create(f.user, &NewTask::with_title("a").assigned_to(f.user)).await.unwrap();

        let summary = f.reconciler.reconcile_all().await.unwrap();
        assert_eq!(summary.checked, 2);
        assert_eq!(summary.repaired, 2);
    }
}
