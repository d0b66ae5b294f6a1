use super::PersistenceError;
use crate::auditing::{Audited, AuditorAware, Clock};
use crate::repository::{
    CrudRepository, DocumentRepository, Entity, IndexRepository, SearchRepository, SearchableEntity,
};
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;
use wf_domain::registry::{Backend, InitializedRepository, Registration};
use wf_search::SearchIndex;

/// Shared collaborators handed to every repository factory.
pub(crate) struct FactoryContext<'a> {
    pub(crate) search: &'a SearchIndex,
    /// `None` when auditing is disabled.
    pub(crate) auditor: Option<Arc<dyn AuditorAware>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) modify_on_create: bool,
}

type Factory =
    Box<dyn FnOnce(&FactoryContext<'_>) -> Result<InitializedRepository, PersistenceError> + Send>;

/// One repository interface a feature slice asks the bootstrap to register.
///
/// Usually created with [`relational_repository!`](crate::relational_repository)
/// or [`search_repository!`](crate::search_repository), which record the
/// declaring module as the namespace.
pub struct RepositoryDeclaration {
    pub(crate) registration: Registration,
    pub(crate) interface_id: TypeId,
    pub(crate) factory: Factory,
}

impl RepositoryDeclaration {
    /// Declares relational interface `I` for entity `E`.
    ///
    /// `factory` receives the document repository of `E` (wrapped in the
    /// auditing decorator when auditing is enabled) and returns it as `I`.
    pub fn relational<I, E, F>(namespace: &'static str, factory: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        E: Entity,
        F: FnOnce(Arc<dyn CrudRepository<E>>) -> Result<Arc<I>, PersistenceError> + Send + 'static,
    {
        let registration = Registration {
            interface: type_name::<I>(),
            entity: E::COLLECTION,
            namespace,
            backend: Backend::Relational,
        };
        let record = registration.clone();

        Self {
            registration,
            interface_id: TypeId::of::<I>(),
            factory: Box::new(move |ctx: &FactoryContext<'_>| {
                let document = DocumentRepository::<E>::new();
                let base: Arc<dyn CrudRepository<E>> = match &ctx.auditor {
                    Some(auditor) => Arc::new(
                        Audited::new(document, Arc::clone(auditor), Arc::clone(&ctx.clock))
                            .modify_on_create(ctx.modify_on_create),
                    ),
                    None => Arc::new(document),
                };
                Ok(InitializedRepository::new(record, factory(base)?))
            }),
        }
    }

    /// Declares search interface `I` for entity `E`.
    ///
    /// `factory` receives an index repository whose index was created with
    /// `E::mapping()`.
    pub fn search<I, E, F>(namespace: &'static str, factory: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        E: SearchableEntity,
        F: FnOnce(Arc<dyn SearchRepository<E>>) -> Result<Arc<I>, PersistenceError> + Send + 'static,
    {
        let registration = Registration {
            interface: type_name::<I>(),
            entity: E::COLLECTION,
            namespace,
            backend: Backend::Search,
        };
        let record = registration.clone();

        Self {
            registration,
            interface_id: TypeId::of::<I>(),
            factory: Box::new(move |ctx: &FactoryContext<'_>| {
                let base: Arc<dyn SearchRepository<E>> =
                    Arc::new(IndexRepository::<E>::new(ctx.search.clone())?);
                Ok(InitializedRepository::new(record, factory(base)?))
            }),
        }
    }

    #[must_use]
    pub const fn registration(&self) -> &Registration {
        &self.registration
    }
}

impl fmt::Debug for RepositoryDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryDeclaration")
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}
