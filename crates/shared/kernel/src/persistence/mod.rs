//! Persistence bootstrap.
//!
//! [`PersistenceBuilder`] takes the scan roots, the auditor reference and the
//! repository declarations of every slice, validates them and instantiates one
//! repository per declared interface. The resulting [`Persistence`] handle
//! resolves repositories by interface type and opens units of work.
//!
//! A declaration belongs to the scan root its module path equals or is nested
//! in. With nested roots (`repository` and `repository::search`) the longest
//! matching root wins.

mod declaration;
mod error;

pub use declaration::RepositoryDeclaration;
pub use error::{PersistenceError, PersistenceErrorExt};

use crate::auditing::{ActorProviders, Clock, SystemClock};
use declaration::FactoryContext;
use fxhash::FxHashMap;
use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use wf_database::{Database, UnitOfWork};
use wf_domain::config::{PersistenceConfig, Strictness};
use wf_domain::constants::SECURITY_AUDITOR;
use wf_domain::registry::{Backend, InitializedRepository, Registration};
use wf_search::SearchIndex;

static GLOBAL: OnceLock<Persistence> = OnceLock::new();

#[derive(Debug)]
struct PersistenceInner {
    database: Database,
    search: SearchIndex,
    repositories: FxHashMap<TypeId, InitializedRepository>,
    registrations: Vec<Registration>,
}

/// The configured persistence layer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Persistence {
    inner: Arc<PersistenceInner>,
}

impl Persistence {
    #[must_use]
    pub fn builder() -> PersistenceBuilder {
        PersistenceBuilder::default()
    }

    /// The handle installed by [`PersistenceBuilder::init`], if any.
    #[must_use]
    pub fn global() -> Option<Self> {
        GLOBAL.get().cloned()
    }

    /// Resolves the repository registered for interface `R` (e.g. `dyn EmployeeRepository`).
    #[must_use]
    pub fn repository<R>(&self) -> Option<Arc<R>>
    where
        R: ?Sized + Send + Sync + 'static,
    {
        self.inner.repositories.get(&TypeId::of::<R>()).and_then(InitializedRepository::get::<R>)
    }

    /// Like [`Self::repository`], failing for an unregistered interface.
    ///
    /// # Errors
    /// [`PersistenceError::MissingRepository`] naming the interface.
    pub fn try_repository<R>(&self) -> Result<Arc<R>, PersistenceError>
    where
        R: ?Sized + Send + Sync + 'static,
    {
        self.repository::<R>().ok_or_else(|| PersistenceError::MissingRepository {
            message: type_name::<R>().into(),
            context: None,
        })
    }

    /// Registered repositories in declaration order (for diagnostics).
    #[must_use]
    pub fn registrations(&self) -> &[Registration] {
        &self.inner.registrations
    }

    /// Opens a read-write unit of work.
    #[must_use]
    pub fn begin(&self) -> UnitOfWork {
        self.inner.database.begin()
    }

    #[must_use]
    pub fn begin_read_only(&self) -> UnitOfWork {
        self.inner.database.begin_read_only()
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.inner.database
    }

    #[must_use]
    pub fn search_index(&self) -> &SearchIndex {
        &self.inner.search
    }
}

pub struct PersistenceBuilder {
    relational_root: Option<String>,
    search_root: Option<String>,
    auditor_ref: String,
    auditing: bool,
    modify_on_create: bool,
    strictness: Strictness,
    providers: ActorProviders,
    clock: Arc<dyn Clock>,
    database: Option<Database>,
    search: Option<SearchIndex>,
    declarations: Vec<RepositoryDeclaration>,
}

impl Default for PersistenceBuilder {
    fn default() -> Self {
        Self {
            relational_root: None,
            search_root: None,
            auditor_ref: SECURITY_AUDITOR.to_owned(),
            auditing: true,
            modify_on_create: true,
            strictness: Strictness::default(),
            providers: ActorProviders::with_defaults(),
            clock: Arc::new(SystemClock),
            database: None,
            search: None,
            declarations: Vec::new(),
        }
    }
}

impl fmt::Debug for PersistenceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceBuilder")
            .field("relational_root", &self.relational_root)
            .field("search_root", &self.search_root)
            .field("auditor_ref", &self.auditor_ref)
            .field("auditing", &self.auditing)
            .field("strictness", &self.strictness)
            .field("declarations", &self.declarations.len())
            .finish_non_exhaustive()
    }
}

impl PersistenceBuilder {
    #[must_use]
    pub fn relational_root(mut self, root: impl Into<String>) -> Self {
        self.relational_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn search_root(mut self, root: impl Into<String>) -> Self {
        self.search_root = Some(root.into());
        self
    }

    /// Name of the actor provider used for auditing (`security_auditor` by default).
    #[must_use]
    pub fn auditor_ref(mut self, name: impl Into<String>) -> Self {
        self.auditor_ref = name.into();
        self
    }

    #[must_use]
    pub const fn auditing(mut self, enabled: bool) -> Self {
        self.auditing = enabled;
        self
    }

    #[must_use]
    pub const fn modify_on_create(mut self, enabled: bool) -> Self {
        self.modify_on_create = enabled;
        self
    }

    #[must_use]
    pub const fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Applies a [`PersistenceConfig`] section. Scan roots are only replaced
    /// when the section sets them.
    #[must_use]
    pub fn config(mut self, config: &PersistenceConfig) -> Self {
        if let Some(root) = &config.relational_root {
            self = self.relational_root(root.clone());
        }
        if let Some(root) = &config.search_root {
            self = self.search_root(root.clone());
        }
        self.auditor_ref(config.auditor_ref.clone())
            .auditing(config.auditing)
            .modify_on_create(config.modify_on_create)
            .strictness(config.strictness)
    }

    /// Replaces the actor provider registry (defaults to [`ActorProviders::with_defaults`]).
    #[must_use]
    pub fn actor_providers(mut self, providers: ActorProviders) -> Self {
        self.providers = providers;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Search index store; a fresh one is created when not provided.
    #[must_use]
    pub fn search_index(mut self, search: SearchIndex) -> Self {
        self.search = Some(search);
        self
    }

    #[must_use]
    pub fn declare(mut self, declaration: RepositoryDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    #[must_use]
    pub fn declare_all<I>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = RepositoryDeclaration>,
    {
        self.declarations.extend(declarations);
        self
    }

    /// Validates the declarations and instantiates every repository.
    ///
    /// Checks run in this order and the first failure aborts:
    /// 1. both scan roots are valid module paths,
    /// 2. the roots differ,
    /// 3. the auditor reference resolves (when auditing is on),
    /// 4. each declaration lies under the scan root of its back end,
    /// 5. no interface is declared twice,
    /// 6. no root is empty (only a warning when lenient),
    /// 7. the factories succeed.
    ///
    /// # Errors
    /// The [`PersistenceError`] variant of the first failed check.
    pub fn build(self) -> Result<Persistence, PersistenceError> {
        let relational_root = validate_root(self.relational_root.as_deref(), Backend::Relational)?;
        let search_root = validate_root(self.search_root.as_deref(), Backend::Search)?;
        if relational_root == search_root {
            return Err(PersistenceError::OverlappingScanRoots {
                message: format!("relational and search repositories share `{relational_root}`").into(),
                context: None,
            });
        }
        let roots = [(relational_root, Backend::Relational), (search_root, Backend::Search)];

        let auditor = if self.auditing {
            let name = self.auditor_ref.as_str();
            let provider = self.providers.resolve(name).ok_or_else(|| {
                PersistenceError::UnresolvedAuditor {
                    message: format!("no actor provider named `{name}`").into(),
                    context: Some(format!("known: {}", self.providers.names().join(", ")).into()),
                }
            })?;
            Some(provider)
        } else {
            debug!("Auditing disabled");
            None
        };

        let mut seen: FxHashMap<TypeId, Backend> = FxHashMap::default();
        for declaration in &self.declarations {
            let registration = &declaration.registration;
            let (root, backend) = owning_root(&roots, registration.namespace).ok_or_else(|| {
                PersistenceError::OutsideScanRoots {
                    message: format!("`{}` in `{}`", registration.interface, registration.namespace)
                        .into(),
                    context: Some(format!("roots: `{relational_root}`, `{search_root}`").into()),
                }
            })?;
            if backend != registration.backend {
                return Err(PersistenceError::BackendMismatch {
                    message: format!(
                        "{} repository `{}` declared under {backend} root `{root}`",
                        registration.backend, registration.interface
                    )
                    .into(),
                    context: Some(registration.namespace.into()),
                });
            }

            if let Some(previous) = seen.insert(declaration.interface_id, registration.backend) {
                let message = format!("`{}`", registration.interface).into();
                return Err(if previous == registration.backend {
                    PersistenceError::DuplicateRegistration { message, context: None }
                } else {
                    PersistenceError::ConflictingRegistration {
                        message,
                        context: Some(format!("{previous} and {}", registration.backend).into()),
                    }
                });
            }
        }

        for (root, backend) in roots {
            if seen.values().any(|b| *b == backend) {
                continue;
            }
            match self.strictness {
                Strictness::Strict => {
                    return Err(PersistenceError::EmptyScanRoot {
                        message: format!("no {backend} repository declared under `{root}`").into(),
                        context: None,
                    });
                },
                Strictness::Lenient => {
                    warn!(%root, %backend, "Scan root has no repository declarations");
                },
            }
        }

        let database = self.database.ok_or_else(|| PersistenceError::Validation {
            message: "Database not provided".into(),
            context: None,
        })?;
        let search = self.search.unwrap_or_default();
        let ctx = FactoryContext {
            search: &search,
            auditor,
            clock: self.clock,
            modify_on_create: self.modify_on_create,
        };

        let mut repositories = FxHashMap::default();
        let mut registrations = Vec::with_capacity(self.declarations.len());
        for declaration in self.declarations {
            let interface = declaration.registration.interface;
            let repository = (declaration.factory)(&ctx).context(interface)?;
            debug!(
                interface,
                entity = repository.registration.entity,
                backend = %repository.registration.backend,
                "Repository registered"
            );
            registrations.push(repository.registration.clone());
            repositories.insert(declaration.interface_id, repository);
        }

        info!(
            repositories = registrations.len(),
            relational_root, search_root, "Persistence configured"
        );

        Ok(Persistence {
            inner: Arc::new(PersistenceInner { database, search, repositories, registrations }),
        })
    }

    /// Builds and installs the process-wide handle returned by [`Persistence::global`].
    ///
    /// # Errors
    /// [`PersistenceError::AlreadyConfigured`] on every call after the first
    /// successful one; nothing is built or registered again. Otherwise as
    /// [`Self::build`].
    pub fn init(self) -> Result<Persistence, PersistenceError> {
        if GLOBAL.get().is_some() {
            return Err(already_configured());
        }
        let persistence = self.build()?;
        GLOBAL.set(persistence.clone()).map_err(|_| already_configured())?;
        Ok(persistence)
    }
}

fn already_configured() -> PersistenceError {
    PersistenceError::AlreadyConfigured {
        message: "bootstrap may run once per process".into(),
        context: None,
    }
}

fn validate_root(root: Option<&str>, backend: Backend) -> Result<&str, PersistenceError> {
    let root = root.ok_or_else(|| PersistenceError::InvalidScanRoot {
        message: format!("{backend} scan root not provided").into(),
        context: None,
    })?;
    if is_module_path(root) {
        Ok(root)
    } else {
        Err(PersistenceError::InvalidScanRoot {
            message: format!("`{root}` is not a module path").into(),
            context: Some(backend.to_string().into()),
        })
    }
}

/// `segment(::segment)*`, each segment a Rust identifier.
fn is_module_path(path: &str) -> bool {
    path.split("::").all(|segment| {
        let mut chars = segment.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && segment != "_"
    })
}

/// The most specific root `namespace` lies in.
fn owning_root<'a>(roots: &[(&'a str, Backend)], namespace: &str) -> Option<(&'a str, Backend)> {
    roots
        .iter()
        .filter(|(root, _)| {
            namespace
                .strip_prefix(root)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
        .max_by_key(|(root, _)| root.len())
        .copied()
}
