//! # Database Infrastructure
//!
//! This crate provides the relational store of the workspace on top of
//! [SurrealDB](https://surrealdb.com): connection management, JSON document
//! storage per collection, key sequences and caller-scoped units of work.
//!
//! ## Key Features
//! - **Engine Agnostic**: Supports `mem://`, `rocksdb://`, `ws://`, and `http://` via the `any` engine.
//! - **Resilient Connectivity**: Built-in retry logic for health checks during engine startup.
//! - **Builder Pattern**: Fluent API for configuring connections, authentication and collections.
//! - **Units of Work**: Staged writes flushed atomically in a single transaction.
//!
//! ## Example
//!
//! ```rust
//! use wf_database::{Database, DatabaseError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("mem://")
//!         .session("workforce", "core")
//!         .collections(["employee"])
//!         .init()
//!         .await?;
//!
//!     let mut tx = db.begin();
//!     let key = tx.next_key("employee").await?;
//!     tx.put("employee", key, r#"{"firstName":"Ada"}"#)?;
//!     tx.commit().await?;
//!
//!     assert!(db.begin_read_only().get("employee", key).await?.is_some());
//!     Ok(())
//! }
//! ```

mod error;
mod store;
mod unit_of_work;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use unit_of_work::UnitOfWork;

use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{debug, info, instrument, warn};

/// Inner state of the [`Database`] wrapper.
#[derive(Debug)]
pub struct DatabaseInner {
    instance: Surreal<Any>,
    sequences: Mutex<FxHashMap<String, Sequence>>,
    ns: String,
    db: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "SurrealDB session handle dropped");
    }
}

/// Key sequence of one collection.
#[derive(Debug, Clone, Copy)]
struct Sequence {
    /// Next key to hand out.
    next: i64,
    /// Whether `next` already accounts for the stored records.
    seeded: bool,
}

/// `SurrealDB` client wrapper that provides thread-safety and contextual error handling.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [`DatabaseBuilder`].
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Opens a unit of work that may stage writes.
    #[must_use]
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(self.clone(), false)
    }

    /// Opens a unit of work that rejects writes.
    #[must_use]
    pub fn begin_read_only(&self) -> UnitOfWork {
        UnitOfWork::new(self.clone(), true)
    }

    /// Defines the table of `collection` and its unique `key` index.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    /// * [`DatabaseError::Surreal`] if the definition statements fail.
    pub async fn define_collection(&self, collection: &str) -> Result<(), DatabaseError> {
        store::validate_collection(collection)?;
        let sql = format!(
            "DEFINE TABLE IF NOT EXISTS {collection} SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS {collection}_key ON TABLE {collection} FIELDS key UNIQUE;"
        );
        self.inner
            .instance
            .query(&sql)
            .await
            .context(format!("Defining collection {collection}"))?
            .check()
            .map_err(surrealdb::Error::from)?;

        debug!(collection, "Collection defined");
        Ok(())
    }

    /// Reserves the next key of `collection`.
    ///
    /// The first call per collection seeds the sequence with `max(key) + 1`
    /// (1 for an empty collection). Reserved keys are never handed out twice,
    /// even when the unit of work that used them is rolled back, and never
    /// collide with an explicit key staged through [`UnitOfWork::put`].
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] for an invalid collection name.
    /// * [`DatabaseError::Surreal`] if seeding the sequence fails.
    pub async fn next_key(&self, collection: &str) -> Result<i64, DatabaseError> {
        store::validate_collection(collection)?;
        if let Some(key) = self.reserve(collection, None) {
            return Ok(key);
        }

        let max = store::max_key(&self.inner.instance, collection).await?;
        self.reserve(collection, Some(max.unwrap_or(0).saturating_add(1)))
            .ok_or_else(|| "Key sequence was not seeded".into())
    }

    fn reserve(&self, collection: &str, seed: Option<i64>) -> Option<i64> {
        let mut sequences = self.inner.sequences.lock();
        let sequence = match seed {
            Some(seed) => {
                let sequence = sequences
                    .entry(collection.to_owned())
                    .or_insert(Sequence { next: seed, seeded: false });
                sequence.next = sequence.next.max(seed);
                sequence.seeded = true;
                sequence
            },
            None => sequences.get_mut(collection).filter(|s| s.seeded)?,
        };
        let key = sequence.next;
        sequence.next = sequence.next.saturating_add(1);
        Some(key)
    }

    /// Moves the sequence of `collection` past an explicitly chosen `key`.
    pub(crate) fn observe_key(&self, collection: &str, key: i64) {
        let floor = key.saturating_add(1);
        let mut sequences = self.inner.sequences.lock();
        let sequence = sequences
            .entry(collection.to_owned())
            .or_insert(Sequence { next: floor, seeded: false });
        sequence.next = sequence.next.max(floor);
    }

    /// Namespace and database of the active session.
    #[must_use]
    pub fn session(&self) -> (&str, &str) {
        (&self.inner.ns, &self.inner.db)
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// A fluent builder for configuring and establishing a `SurrealDB` connection.
///
/// This builder ensures that fundamental parameters like the connection URL,
/// namespace, and database name are provided upfront.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    collections: Vec<String>,
}

impl DatabaseBuilder {
    /// Creates a new [`DatabaseBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Add root credentials to the connection.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Collections to define once the session is active.
    pub fn collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections.extend(collections.into_iter().map(Into::into));
        self
    }

    /// Consumes the builder and attempts to establish a connection to the database.
    ///
    /// # Process
    /// 1. **Validation**: Ensures URL, Namespace, Database name and collection names are valid.
    /// 2. **Engine Initialization**: Connects to the underlying `SurrealDB` engine (Any).
    /// 3. **Resilience**: Performs up to 3 health checks. If the first check fails,
    ///    it retries with exponential backoff (starting at 500ms).
    /// 4. **Authentication**: If credentials were provided via [`auth`](Self::auth), signs in as a Root user.
    /// 5. **Session Activation**: Sets the namespace and database for the connection.
    /// 6. **Collections**: Defines each declared collection with its unique key index.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if required parameters are missing or malformed.
    /// * [`DatabaseError::Connection`] if the engine fails to start or remains unhealthy.
    /// * [`DatabaseError::Auth`] if the provided credentials are rejected.
    /// * [`DatabaseError::Surreal`] if session activation or a collection definition fails.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = self.url.ok_or(DatabaseError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;
        let ns = self.ns.ok_or(DatabaseError::Validation {
            message: "Namespace is required".into(),
            context: None,
        })?;
        let db = self.db.ok_or(DatabaseError::Validation {
            message: "Database is required".into(),
            context: None,
        })?;
        for collection in &self.collections {
            store::validate_collection(collection)?;
        }

        let instance = connect(&url).await.map_err(|e| DatabaseError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        // 1. Connectivity & Health Check with Retries
        let mut delay = Duration::from_millis(500);
        for attempt in 1..=3 {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == 3 {
                return Err(DatabaseError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Database not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        // 2. Authentication
        if let Some((u, p)) = self.auth {
            instance.signin(Root { username: u, password: p }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.into()) }
            })?;
        }

        // 3. Session Initialization
        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        let database = Database {
            inner: Arc::new(DatabaseInner {
                instance,
                sequences: Mutex::new(FxHashMap::default()),
                ns,
                db,
            }),
        };

        // 4. Collections
        for collection in &self.collections {
            database.define_collection(collection).await?;
        }

        Ok(database)
    }
}
