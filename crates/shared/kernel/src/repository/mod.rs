//! Repository ports and their generic adapters.
//!
//! Reads take `&UnitOfWork` and writes `&mut UnitOfWork`: the caller opens
//! the unit of work and decides when it commits, so several repository calls
//! share one atomic boundary.

mod document;
mod error;
mod index;

pub use document::DocumentRepository;
pub use error::{RepositoryError, RepositoryErrorExt};
pub use index::IndexRepository;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use wf_database::UnitOfWork;
use wf_domain::audit::AuditMetadata;
use wf_domain::paging::{Page, Pageable};
use wf_search::IndexMapping;

/// A persistent entity: a JSON document keyed by a numeric id.
///
/// Implement through `#[wf_derive::entity(collection = "...")]`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table) and search index name.
    const COLLECTION: &'static str;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    fn audit(&self) -> &AuditMetadata;
    fn audit_mut(&mut self) -> &mut AuditMetadata;
}

/// An entity that can be stored in the search index.
pub trait SearchableEntity: Entity {
    fn mapping() -> IndexMapping;
}

/// Relational repository port.
#[async_trait]
pub trait CrudRepository<E: Entity>: Send + Sync {
    /// Inserts `entity` (a new key is assigned when it has no id) or replaces
    /// the stored version. Returns the entity as persisted.
    async fn save(&self, tx: &mut UnitOfWork, entity: E) -> Result<E, RepositoryError>;

    async fn find_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<Option<E>, RepositoryError>;

    async fn exists_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.find_by_id(tx, id).await?.is_some())
    }

    async fn find_all(&self, tx: &UnitOfWork, pageable: &Pageable) -> Result<Page<E>, RepositoryError>;

    async fn count(&self, tx: &UnitOfWork) -> Result<u64, RepositoryError>;

    /// Returns whether an entity was deleted.
    async fn delete_by_id(&self, tx: &mut UnitOfWork, id: i64) -> Result<bool, RepositoryError>;
}

/// Search repository port.
#[async_trait]
pub trait SearchRepository<E: SearchableEntity>: Send + Sync {
    /// Adds or replaces `entity` in the index.
    async fn index(&self, entity: &E) -> Result<(), RepositoryError>;

    async fn delete_from_index(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Runs a query string; see `wf_search::Query` for the syntax.
    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;

    async fn clear(&self) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<E, R> CrudRepository<E> for Arc<R>
where
    E: Entity,
    R: CrudRepository<E> + ?Sized,
{
    async fn save(&self, tx: &mut UnitOfWork, entity: E) -> Result<E, RepositoryError> {
        (**self).save(tx, entity).await
    }

    async fn find_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<Option<E>, RepositoryError> {
        (**self).find_by_id(tx, id).await
    }

    async fn exists_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        (**self).exists_by_id(tx, id).await
    }

    async fn find_all(&self, tx: &UnitOfWork, pageable: &Pageable) -> Result<Page<E>, RepositoryError> {
        (**self).find_all(tx, pageable).await
    }

    async fn count(&self, tx: &UnitOfWork) -> Result<u64, RepositoryError> {
        (**self).count(tx).await
    }

    async fn delete_by_id(&self, tx: &mut UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        (**self).delete_by_id(tx, id).await
    }
}

#[async_trait]
impl<E, R> SearchRepository<E> for Arc<R>
where
    E: SearchableEntity,
    R: SearchRepository<E> + ?Sized,
{
    async fn index(&self, entity: &E) -> Result<(), RepositoryError> {
        (**self).index(entity).await
    }

    async fn delete_from_index(&self, id: i64) -> Result<bool, RepositoryError> {
        (**self).delete_from_index(id).await
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>, RepositoryError> {
        (**self).search(query, pageable).await
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        (**self).count().await
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        (**self).clear().await
    }
}
