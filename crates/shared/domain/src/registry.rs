//! Repository registry records.
//! A minimal type-erased container for repositories built during the persistence bootstrap.

use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Storage technology behind a repository interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Relational,
    Search,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Relational => "relational",
            Self::Search => "search",
        })
    }
}

/// Diagnostic description of one registered repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Interface type name, e.g. `dyn wf_employee::repository::EmployeeRepository`.
    pub interface: &'static str,
    /// Collection (relational) or index (search) the repository works on.
    pub entity: &'static str,
    /// Module the interface was declared in.
    pub namespace: &'static str,
    pub backend: Backend,
}

/// A repository instance ready to be resolved by its interface type.
pub struct InitializedRepository {
    pub id: TypeId,
    pub registration: Registration,
    handle: Box<dyn Any + Send + Sync>,
}

impl InitializedRepository {
    /// Wraps `repository`, keyed by the interface type `R` (usually `dyn Trait`).
    pub fn new<R>(registration: Registration, repository: Arc<R>) -> Self
    where
        R: ?Sized + Send + Sync + 'static,
    {
        Self { id: TypeId::of::<R>(), registration, handle: Box::new(repository) }
    }

    /// Returns the repository when `R` is the interface it was registered under.
    #[must_use]
    pub fn get<R>(&self) -> Option<Arc<R>>
    where
        R: ?Sized + Send + Sync + 'static,
    {
        self.handle.downcast_ref::<Arc<R>>().cloned()
    }
}

impl fmt::Debug for InitializedRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializedRepository")
            .field("interface", &self.registration.interface)
            .field("backend", &self.registration.backend)
            .finish_non_exhaustive()
    }
}
