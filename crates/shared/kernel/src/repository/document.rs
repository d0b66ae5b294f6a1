use super::{CrudRepository, Entity, RepositoryError, RepositoryErrorExt};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use wf_database::UnitOfWork;
use wf_domain::paging::{Page, Pageable, Sort};

/// [`CrudRepository`] over the document store of `wf-database`.
///
/// Stateless: every call works through the unit of work it is given.
pub struct DocumentRepository<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> DocumentRepository<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self { _entity: PhantomData }
    }

    fn decode(key: i64, doc: &str) -> Result<E, RepositoryError> {
        serde_json::from_str(doc).context(format!("Decoding {}:{key}", E::COLLECTION))
    }
}

impl<E: Entity> Default for DocumentRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for DocumentRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository").field("entity", &std::any::type_name::<E>()).finish()
    }
}

#[async_trait]
impl<E: Entity> CrudRepository<E> for DocumentRepository<E> {
    async fn save(&self, tx: &mut UnitOfWork, mut entity: E) -> Result<E, RepositoryError> {
        let key = match entity.id() {
            Some(key) => key,
            None => {
                let key = tx.next_key(E::COLLECTION).await?;
                entity.set_id(key);
                key
            },
        };

        let doc = serde_json::to_string(&entity).context(format!("Encoding {}:{key}", E::COLLECTION))?;
        tx.put(E::COLLECTION, key, doc)?;
        Ok(entity)
    }

    async fn find_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<Option<E>, RepositoryError> {
        tx.get(E::COLLECTION, id).await?.map(|doc| Self::decode(id, &doc)).transpose()
    }

    async fn exists_by_id(&self, tx: &UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        Ok(tx.get(E::COLLECTION, id).await?.is_some())
    }

    async fn find_all(&self, tx: &UnitOfWork, pageable: &Pageable) -> Result<Page<E>, RepositoryError> {
        let rows = tx.scan(E::COLLECTION).await?;

        if pageable.sort().is_empty() {
            // Already ordered by key; only decode the requested window.
            let page = Page::from_ordered(rows, pageable);
            let content = page
                .content
                .iter()
                .map(|(key, doc)| Self::decode(*key, doc))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Page::new(content, pageable, page.total_elements));
        }

        let mut values = rows
            .into_iter()
            .map(|(key, doc)| {
                serde_json::from_str::<Value>(&doc)
                    .map(|value| (key, value))
                    .context(format!("Decoding {}:{key}", E::COLLECTION))
            })
            .collect::<Result<Vec<_>, _>>()?;
        values.sort_by(|a, b| compare_documents(a, b, pageable.sort()));

        let page = Page::from_ordered(values, pageable);
        let content = page
            .content
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value(value).context(format!("Decoding {}:{key}", E::COLLECTION))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(content, pageable, page.total_elements))
    }

    async fn count(&self, tx: &UnitOfWork) -> Result<u64, RepositoryError> {
        Ok(tx.scan(E::COLLECTION).await?.len() as u64)
    }

    async fn delete_by_id(&self, tx: &mut UnitOfWork, id: i64) -> Result<bool, RepositoryError> {
        if tx.get(E::COLLECTION, id).await?.is_none() {
            return Ok(false);
        }
        tx.delete(E::COLLECTION, id)?;
        Ok(true)
    }
}

/// Orders documents by the sort properties, then by ascending key.
fn compare_documents(a: &(i64, Value), b: &(i64, Value), sorts: &[Sort]) -> Ordering {
    sorts
        .iter()
        .map(|sort| {
            let ordering = compare_values(a.1.get(&sort.property), b.1.get(&sort.property));
            match ordering {
                Some(ordering) if !sort.is_ascending() => ordering.reverse(),
                Some(ordering) => ordering,
                None => missing_last(a.1.get(&sort.property), b.1.get(&sort.property)),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
        .then(a.0.cmp(&b.0))
}

/// Compares two present values of the same JSON type; `None` otherwise.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Option<Ordering> {
    match (a?, b?) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Missing and null values go last regardless of direction.
fn missing_last(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let is_missing = |v: Option<&Value>| v.is_none_or(Value::is_null);
    match (is_missing(a), is_missing(b)) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
