use super::{RepositoryError, RepositoryErrorExt, SearchRepository, SearchableEntity};
use async_trait::async_trait;
use std::fmt;
use std::marker::PhantomData;
use wf_domain::paging::{Page, Pageable};
use wf_search::{SearchIndex, SearchRequest, SortField};

/// [`SearchRepository`] over a `wf-search` index named after the entity collection.
pub struct IndexRepository<E> {
    index: SearchIndex,
    _entity: PhantomData<fn() -> E>,
}

impl<E: SearchableEntity> IndexRepository<E> {
    /// Creates the entity index (idempotent) and wraps it.
    ///
    /// # Errors
    /// [`RepositoryError::Search`] when the index exists with a different mapping.
    pub fn new(index: SearchIndex) -> Result<Self, RepositoryError> {
        index.create_index(E::COLLECTION, E::mapping()).context(E::COLLECTION)?;
        Ok(Self { index, _entity: PhantomData })
    }
}

impl<E> fmt::Debug for IndexRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexRepository").field("entity", &std::any::type_name::<E>()).finish()
    }
}

#[async_trait]
impl<E: SearchableEntity> SearchRepository<E> for IndexRepository<E> {
    async fn index(&self, entity: &E) -> Result<(), RepositoryError> {
        let id = entity.id().ok_or_else(|| RepositoryError::InvalidEntity {
            message: "an entity without id cannot be indexed".into(),
            context: Some(E::COLLECTION.into()),
        })?;
        let source = serde_json::to_value(entity).context(format!("Encoding {}:{id}", E::COLLECTION))?;
        self.index.index(E::COLLECTION, id, source)?;
        Ok(())
    }

    async fn delete_from_index(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.index.delete(E::COLLECTION, id)?)
    }

    async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<E>, RepositoryError> {
        let offset = usize::try_from(pageable.offset()).unwrap_or(usize::MAX);
        let mut request = SearchRequest::new(query).window(offset, pageable.size() as usize);
        for sort in pageable.sort() {
            request = request.sort_by(SortField {
                field: sort.property.clone(),
                ascending: sort.is_ascending(),
            });
        }

        let hits = self.index.search(E::COLLECTION, &request)?;
        let content = hits
            .hits
            .into_iter()
            .map(|hit| {
                serde_json::from_value(hit.source).context(format!("Decoding {}:{}", E::COLLECTION, hit.id))
            })
            .collect::<Result<Vec<E>, _>>()?;
        Ok(Page::new(content, pageable, hits.total))
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.index.count(E::COLLECTION)?)
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        Ok(self.index.clear(E::COLLECTION)?)
    }
}
