use crate::error::{DatabaseError, DatabaseErrorExt};
use crate::store::{self, StagedWrite};
use crate::Database;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, instrument};

type Hook = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A caller-scoped unit of work.
///
/// Writes are staged in memory and flushed by [`commit`](Self::commit) in a
/// single `SurrealDB` transaction, so they become visible together or not at
/// all. Reads see the staged writes of the same unit of work. Dropping an
/// uncommitted unit of work discards its writes and hooks.
pub struct UnitOfWork {
    db: Database,
    read_only: bool,
    /// (collection, key) -> `Some(doc)` for a put, `None` for a delete.
    staged: BTreeMap<(String, i64), Option<String>>,
    hooks: Mutex<Vec<Hook>>,
    finished: bool,
}

impl UnitOfWork {
    pub(crate) fn new(db: Database, read_only: bool) -> Self {
        Self { db, read_only, staged: BTreeMap::new(), hooks: Mutex::new(Vec::new()), finished: false }
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of distinct records with a staged write.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.staged.len()
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Stages `doc` as the new version of `collection:key`.
    ///
    /// Keys reserved afterwards by [`next_key`](Self::next_key) are greater than `key`.
    ///
    /// # Errors
    /// * [`DatabaseError::Transaction`] on a read-only unit of work.
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    pub fn put(
        &mut self,
        collection: &str,
        key: i64,
        doc: impl Into<String>,
    ) -> Result<(), DatabaseError> {
        self.stage(collection, key, Some(doc.into()))
    }

    /// Stages the removal of `collection:key`.
    ///
    /// # Errors
    /// * [`DatabaseError::Transaction`] on a read-only unit of work.
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    pub fn delete(&mut self, collection: &str, key: i64) -> Result<(), DatabaseError> {
        self.stage(collection, key, None)
    }

    fn stage(&mut self, collection: &str, key: i64, doc: Option<String>) -> Result<(), DatabaseError> {
        self.ensure_writable()?;
        store::validate_collection(collection)?;
        if doc.is_some() {
            self.db.observe_key(collection, key);
        }
        self.staged.insert((collection.to_owned(), key), doc);
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), DatabaseError> {
        if self.read_only {
            return Err(DatabaseError::Transaction {
                message: "write attempted in a read-only unit of work".into(),
                context: None,
            });
        }
        Ok(())
    }

    /// Reserves a key for a new record of `collection`.
    ///
    /// # Errors
    /// * [`DatabaseError::Transaction`] on a read-only unit of work.
    /// * Errors of [`Database::next_key`].
    pub async fn next_key(&self, collection: &str) -> Result<i64, DatabaseError> {
        self.ensure_writable()?;
        self.db.next_key(collection).await
    }

    /// Reads `collection:key`, staged writes first.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    /// * [`DatabaseError::Surreal`] if the read fails.
    pub async fn get(&self, collection: &str, key: i64) -> Result<Option<String>, DatabaseError> {
        store::validate_collection(collection)?;
        if let Some(staged) = self.staged.get(&(collection.to_owned(), key)) {
            return Ok(staged.clone());
        }
        store::find(&self.db, collection, key).await
    }

    /// All records of `collection` ordered by key, staged writes applied.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    /// * [`DatabaseError::Surreal`] if the read fails.
    pub async fn scan(&self, collection: &str) -> Result<Vec<(i64, String)>, DatabaseError> {
        store::validate_collection(collection)?;
        let mut records: BTreeMap<i64, String> = store::scan(&self.db, collection)
            .await?
            .into_iter()
            .map(|row| (row.key, row.doc))
            .collect();

        let from = (collection.to_owned(), i64::MIN);
        let to = (collection.to_owned(), i64::MAX);
        for ((_, key), doc) in self.staged.range(from..=to) {
            match doc {
                Some(doc) => records.insert(*key, doc.clone()),
                None => records.remove(key),
            };
        }
        Ok(records.into_iter().collect())
    }

    /// Registers `hook` to run after a successful commit, in registration order.
    pub fn after_commit(&self, hook: impl Future<Output = ()> + Send + 'static) {
        self.hooks.lock().push(Box::pin(hook));
    }

    /// Flushes every staged write in one transaction, then runs the after-commit hooks.
    ///
    /// Returns the number of records written. A unit of work without staged
    /// writes commits without touching the database.
    ///
    /// # Errors
    /// [`DatabaseError::Surreal`] if the transaction fails; nothing is applied
    /// and no hook runs.
    #[instrument(skip(self), fields(writes = self.staged.len()))]
    pub async fn commit(mut self) -> Result<usize, DatabaseError> {
        self.finished = true;
        let staged = std::mem::take(&mut self.staged);
        let hooks = std::mem::take(&mut *self.hooks.lock());
        let written = staged.len();

        if written > 0 {
            let sql = store::commit_statement(
                staged.iter().enumerate().map(|(i, ((collection, _), doc))| (i, collection.as_str(), doc.is_some())),
            );
            let writes: Vec<StagedWrite> =
                staged.into_iter().map(|((_, key), doc)| StagedWrite { key, doc }).collect();

            self.db
                .query(&sql)
                .bind(("writes", writes))
                .await
                .context("Committing unit of work")?
                .check()
                .map_err(surrealdb::Error::from)?;
        }

        debug!(written, hooks = hooks.len(), "Unit of work committed");
        for hook in hooks {
            hook.await;
        }
        Ok(written)
    }

    /// Discards staged writes and hooks.
    pub fn rollback(mut self) {
        self.finished = true;
        debug!(discarded = self.staged.len(), "Unit of work rolled back");
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            debug!(discarded = self.staged.len(), "Uncommitted unit of work dropped");
        }
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("read_only", &self.read_only)
            .field("staged", &self.staged.len())
            .field("hooks", &self.hooks.lock().len())
            .finish_non_exhaustive()
    }
}
