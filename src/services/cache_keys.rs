//! Deterministic cache key derivation.
//!
//! Privileged roles share one key per role (`aggregate/admin/all`) because
//! every holder sees the same tasks, and the role is small enough to
//! invalidate by name. Member views are subject-specific and the member
//! cohort is unbounded, so their keys embed the cohort's current generation
//! (`aggregate/member/g3/42`). Advancing the generation orphans every
//! member key at once without enumerating them.

use chrono::Utc;
use std::sync::Arc;

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{CacheKey, Role, Subject, UserId, VersionToken};
use crate::domain::ports::KeyValueStore;

/// Keys for one viewer's dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKeys {
    /// Key for sections computed identically across the viewer's cohort.
    /// `None` when the cohort generation could not be read.
    pub shared: Option<CacheKey>,
    /// Key for sections that depend on the viewer's identity.
    /// `None` when the cohort generation could not be read.
    pub personal: Option<CacheKey>,
}

/// Maps (role, subject, generation) to cache keys and cohorts to their
/// version tokens.
#[derive(Clone)]
pub struct CacheKeyDeriver {
    store: Arc<dyn KeyValueStore>,
}

impl CacheKeyDeriver {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The cohort a role's cache entries belong to.
    pub fn cohort(role: Role) -> &'static str {
        role.as_str()
    }

    /// Store key holding a cohort's generation.
    pub fn version_key(role: Role) -> String {
        format!("version/{}", Self::cohort(role))
    }

    /// Cohort-wide key for a privileged role.
    pub fn shared_key(role: Role) -> CacheKey {
        CacheKey::new(format!("aggregate/{}/all", role.as_str()))
    }

    /// Subject-specific key under a cohort generation.
    pub fn personal_key(role: Role, subject: UserId, generation: u64) -> CacheKey {
        CacheKey::new(format!("aggregate/{}/g{}/{}", role.as_str(), generation, subject))
    }

    /// Key for a viewer's aggregate view. Depends only on the role for
    /// privileged roles, and on subject and generation otherwise.
    pub fn derive_aggregate_key(role: Role, subject: UserId, generation: u64) -> CacheKey {
        if role.is_privileged() {
            Self::shared_key(role)
        } else {
            Self::personal_key(role, subject, generation)
        }
    }

    /// Read a cohort's current generation. A missing token is generation 0.
    pub async fn generation(&self, role: Role) -> StoreResult<u64> {
        let key = Self::version_key(role);
        match self.store.get(&key).await? {
            Some(raw) => Ok(raw.parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(key = %key, value = %raw, "version token is not an integer, using generation 0");
                0
            })),
            None => Ok(0),
        }
    }

    /// Atomically advance a cohort's generation.
    ///
    /// A corrupt token cannot be incremented, so it is replaced with the
    /// current Unix time in milliseconds. That value is above any generation
    /// reached by counting, and it is never 0, which is how corrupt tokens read.
    pub async fn advance(&self, role: Role) -> StoreResult<VersionToken> {
        let key = Self::version_key(role);
        let value = match self.store.increment_by(&key, 1).await {
            Ok(value) => u64::try_from(value).unwrap_or(0),
            Err(StoreError::InvalidValue { reason, .. }) => {
                let fresh = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(1).max(1);
                tracing::warn!(key = %key, reason = %reason, generation = fresh, "replacing corrupt version token");
                self.store.set(&key, &fresh.to_string(), None).await?;
                fresh
            }
            Err(error) => return Err(error),
        };
        Ok(VersionToken { cohort: role, value })
    }

    /// Resolve both keys for a viewer, reading the cohort generation once.
    ///
    /// If the generation cannot be read, generation-dependent keys are
    /// withheld so a transient read failure can never resurrect an
    /// orphaned entry.
    pub async fn resolve(&self, viewer: Subject) -> DerivedKeys {
        let generation = match self.generation(viewer.role).await {
            Ok(generation) => Some(generation),
            Err(error) => {
                tracing::warn!(role = %viewer.role, error = %error, "cohort generation unavailable, bypassing subject cache");
                None
            }
        };

        let personal = generation.map(|g| Self::personal_key(viewer.role, viewer.id, g));
        let shared = if viewer.role.is_privileged() {
            Some(Self::shared_key(viewer.role))
        } else {
            personal.clone()
        };

        DerivedKeys { shared, personal }
    }
}
