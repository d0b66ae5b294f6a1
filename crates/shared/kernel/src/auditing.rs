//! Auditing of relational mutations.
//!
//! [`Audited`] wraps a relational repository and stamps the
//! [`AuditMetadata`](wf_domain::audit::AuditMetadata) of every saved entity with
//! the actor returned by an [`AuditorAware`] provider and the time of a [`Clock`].
//! Providers are looked up by name in [`ActorProviders`].

use crate::repository::{CrudRepository, Entity, RepositoryError};
use crate::security;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use wf_database::UnitOfWork;
use wf_domain::constants::{SECURITY_AUDITOR, SYSTEM_ACTOR};
use wf_domain::paging::{Page, Pageable};

/// Supplies the identity recorded in audit fields.
pub trait AuditorAware: Send + Sync + fmt::Debug {
    /// The acting identity, or `None` when unknown.
    fn current_auditor(&self) -> Option<String>;
}

/// Reads the task-scoped actor of [`security`]; falls back to the system actor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityContextAuditor;

impl AuditorAware for SecurityContextAuditor {
    fn current_auditor(&self) -> Option<String> {
        Some(security::current_actor().unwrap_or_else(|| SYSTEM_ACTOR.to_owned()))
    }
}

/// Always reports the same actor. Useful for batch jobs and tests.
#[derive(Debug, Clone)]
pub struct FixedAuditor(String);

impl FixedAuditor {
    pub fn new(actor: impl Into<String>) -> Self {
        Self(actor.into())
    }
}

impl AuditorAware for FixedAuditor {
    fn current_auditor(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Named registry of actor providers.
#[derive(Debug, Clone, Default)]
pub struct ActorProviders {
    providers: FxHashMap<String, Arc<dyn AuditorAware>>,
}

impl ActorProviders {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`SecurityContextAuditor`] under `security_auditor`.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new().register(SECURITY_AUDITOR, SecurityContextAuditor)
    }

    #[must_use]
    pub fn register(mut self, name: impl Into<String>, provider: impl AuditorAware + 'static) -> Self {
        self.providers.insert(name.into(), Arc::new(provider));
        self
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn AuditorAware>> {
        self.providers.get(name).cloned()
    }

    /// Registered provider names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Source of audit timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

/// Auditing decorator around a relational repository.
///
/// * Create (no id, or an id not yet stored): stamps created-by/date and, when
///   `modify_on_create` is set, last-modified-by/date; otherwise clears them.
/// * Update: keeps the persisted created-by/date and stamps last-modified-*.
///
/// The actor is resolved at the moment of each save. Reads and deletes pass through.
pub struct Audited<R> {
    inner: R,
    auditor: Arc<dyn AuditorAware>,
    clock: Arc<dyn Clock>,
    modify_on_create: bool,
}

impl<R> Audited<R> {
    pub fn new(inner: R, auditor: Arc<dyn AuditorAware>, clock: Arc<dyn Clock>) -> Self {
        Self { inner, auditor, clock, modify_on_create: true }
    }

    #[must_use]
    pub const fn modify_on_create(mut self, enabled: bool) -> Self {
        self.modify_on_create = enabled;
        self
    }

    fn actor(&self) -> String {
        self.auditor.current_auditor().unwrap_or_else(|| SYSTEM_ACTOR.to_owned())
    }
}

impl<R: fmt::Debug> fmt::Debug for Audited<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Audited")
            .field("inner", &self.inner)
            .field("auditor", &self.auditor)
            .field("modify_on_create", &self.modify_on_create)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<E, R> CrudRepository<E> for Audited<R>
where
    E: Entity,
    R: CrudRepository<E>,
{
    async fn save(&self, tx: &mut UnitOfWork, mut entity: E) -> Result<E, RepositoryError> {
        let actor = self.actor();
        let now = self.clock.now();

        let persisted = match entity.id() {
            Some(id) => self.inner.find_by_id(tx, id).await?,
            None => None,
        };

        let audit = entity.audit_mut();
        if let Some(persisted) = persisted {
            audit.preserve_created_from(persisted.audit());
            audit.mark_modified(&actor, now);
        } else {
            audit.mark_created(&actor, now);
            if self.modify_on_create {
                audit.mark_modified(&actor, now);
            } else {
                audit.last_modified_by = None;
                audit.last_modified_date = None;
            }
        }

        trace!(collection = E::COLLECTION, id = ?entity.id(), %actor, "Audit fields stamped");
        self.inner.save(tx, entity).await
    }

    async fn find_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<Option<E>, RepositoryError> {
        self.inner.find_by_id(tx, id).await
    }

    async fn exists_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        self.inner.exists_by_id(tx, id).await
    }

    async fn find_all(&self, tx: &UnitOfWork, pageable: &Pageable) -> Result<Page<E>, RepositoryError> {
        self.inner.find_all(tx, pageable).await
    }

    async fn count(&self, tx: &UnitOfWork) -> Result<u64, RepositoryError> {
        self.inner.count(tx).await
    }

    async fn delete_by_id(&self, tx: &mut UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        self.inner.delete_by_id(tx, id).await
    }
}
