//! Facade crate for the workforce persistence layer.
//!
//! This is where the application declares its persistence: which module paths
//! hold relational and search repository interfaces, which actor provider
//! audits relational writes, and which slices contribute repositories.
//! Keep this crate thin: it composes the other crates, it does not implement
//! persistence logic.
//!
//! ## Usage
//! ```rust,ignore
//! let config: AppConfig = wf::kernel::config::load_config(None::<&str>)?;
//! let database = wf::connect(&config.database).await?;
//! let persistence = wf::init(&config.persistence, database)?;
//! wf::reindex(&persistence).await?;
//! let employees = wf::features::employee::EmployeeService::from_persistence(&persistence)?;
//! ```

use tracing::{debug, info};
use wf_database::{Database, DatabaseError};
use wf_employee::{EmployeeError, EmployeeService};
use wf_domain::config::{DatabaseConfig, PersistenceConfig};
use wf_domain::registry::Backend;
use wf_kernel::persistence::{Persistence, PersistenceBuilder, PersistenceError, RepositoryDeclaration};

pub use wf_domain as domain;
pub use wf_kernel as kernel;

/// Feature slices contributing repositories.
pub mod features {
    pub use wf_employee as employee;

    /// Slices compiled into this build.
    pub const ENABLED: &[&str] = &["employee"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Module path holding the relational repository interfaces of every slice.
pub const RELATIONAL_REPOSITORY_ROOT: &str = features::employee::repository::NAMESPACE;
/// Module path holding the search repository interfaces of every slice.
pub const SEARCH_REPOSITORY_ROOT: &str = features::employee::repository::search::NAMESPACE;

/// Repository declarations of every enabled slice.
#[must_use]
pub fn declarations() -> Vec<RepositoryDeclaration> {
    let mut declarations = Vec::new();

    // Employee
    declarations.extend(features::employee::declarations());

    declarations
}

/// Collections backing the relational repositories, deduplicated.
#[must_use]
pub fn collections() -> Vec<&'static str> {
    let mut collections: Vec<&'static str> = declarations()
        .iter()
        .map(RepositoryDeclaration::registration)
        .filter(|r| r.backend == Backend::Relational)
        .map(|r| r.entity)
        .collect();
    collections.sort_unstable();
    collections.dedup();
    collections
}

/// Connects to the relational store and defines every relational collection.
///
/// # Errors
/// As [`wf_database::DatabaseBuilder::init`].
pub async fn connect(config: &DatabaseConfig) -> Result<Database, DatabaseError> {
    let mut builder = Database::builder()
        .url(&config.url)
        .session(&config.namespace, &config.database)
        .collections(collections());
    if let Some(credentials) = &config.credentials {
        builder = builder.auth(&credentials.username, &credentials.password);
    }
    builder.init().await
}

/// A bootstrap over the application's scan roots with every slice declared,
/// then configured from `config`.
#[must_use]
pub fn configure(config: &PersistenceConfig, database: Database) -> PersistenceBuilder {
    let declarations = declarations();
    debug!(declarations = declarations.len(), "Declaring repositories");
    Persistence::builder()
        .relational_root(RELATIONAL_REPOSITORY_ROOT)
        .search_root(SEARCH_REPOSITORY_ROOT)
        .config(config)
        .database(database)
        .declare_all(declarations)
}

/// Runs the process-wide bootstrap.
///
/// # Errors
/// Any startup-fatal [`PersistenceError`], including
/// [`PersistenceError::AlreadyConfigured`] when called twice.
pub fn init(config: &PersistenceConfig, database: Database) -> Result<Persistence, PersistenceError> {
    configure(config, database).init()
}

/// Rebuilds the search index of every slice from the relational store.
///
/// Search indices live in process memory, so each bootstrap starts with them
/// empty while a persistent relational store keeps its records. Run this once
/// the bootstrap succeeded. Returns the number of indexed entities.
///
/// # Errors
/// Storage or search failures of a slice.
pub async fn reindex(persistence: &Persistence) -> Result<u64, EmployeeError> {
    let tx = persistence.begin_read_only();
    let mut indexed = 0;

    // Employee
    indexed += EmployeeService::from_persistence(persistence)?.reindex(&tx).await?;

    info!(indexed, "Search indices rebuilt");
    Ok(indexed)
}
