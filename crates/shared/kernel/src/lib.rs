//! Persistence kernel shared across slices.
//!
//! * [`persistence`]: the bootstrap that turns repository declarations into a
//!   resolvable registry ([`persistence::Persistence`]).
//! * [`repository`]: the repository ports (`CrudRepository`, `SearchRepository`)
//!   and their generic adapters over `wf-database` and `wf-search`.
//! * [`auditing`]: actor providers, clocks and the auditing decorator.
//! * [`security`]: the task-scoped current actor.
//! * [`config`]: layered configuration loading.
//!
//! ## Declaring repositories
//! ```rust,ignore
//! pub trait EmployeeRepository: CrudRepository<Employee> {}
//! impl<T: CrudRepository<Employee> + ?Sized> EmployeeRepository for T {}
//!
//! pub fn declaration() -> RepositoryDeclaration {
//!     wf_kernel::relational_repository!(EmployeeRepository, Employee)
//! }
//! ```

pub mod auditing;
pub mod config;
pub mod persistence;
pub mod repository;
pub mod security;

pub use async_trait::async_trait;
pub use wf_database as database;
pub use wf_domain as domain;
pub use wf_search as search;

/// Declares a relational repository interface in the current module.
///
/// The interface must be implemented for every `CrudRepository<Entity>`
/// (a blanket impl), so the auditing-wrapped document repository can back it.
#[macro_export]
macro_rules! relational_repository {
    ($interface:path, $entity:ty) => {
        $crate::persistence::RepositoryDeclaration::relational::<dyn $interface, $entity, _>(
            module_path!(),
            |base| Ok(::std::sync::Arc::new(base) as ::std::sync::Arc<dyn $interface>),
        )
    };
}

/// Declares a search repository interface in the current module.
#[macro_export]
macro_rules! search_repository {
    ($interface:path, $entity:ty) => {
        $crate::persistence::RepositoryDeclaration::search::<dyn $interface, $entity, _>(
            module_path!(),
            |base| Ok(::std::sync::Arc::new(base) as ::std::sync::Arc<dyn $interface>),
        )
    };
}
