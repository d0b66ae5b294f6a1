use crate::repository::RepositoryError;
use std::borrow::Cow;

/// Startup-fatal bootstrap errors. Each names the offending namespace or interface.
#[wf_derive::wf_error]
pub enum PersistenceError {
    #[error("Invalid scan root{}: {message}", format_context(.context))]
    InvalidScanRoot { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Overlapping scan roots{}: {message}", format_context(.context))]
    OverlappingScanRoots { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Unresolved auditor reference{}: {message}", format_context(.context))]
    UnresolvedAuditor { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Repository declared outside every scan root{}: {message}", format_context(.context))]
    OutsideScanRoots { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Repository declared under the wrong scan root{}: {message}", format_context(.context))]
    BackendMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The same interface is declared against both storage back ends.
    #[error("Conflicting repository registration{}: {message}", format_context(.context))]
    ConflictingRegistration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Duplicate repository registration{}: {message}", format_context(.context))]
    DuplicateRegistration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Empty scan root{}: {message}", format_context(.context))]
    EmptyScanRoot { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Repository factory failed{}: {source}", format_context(.context))]
    Factory { source: RepositoryError, context: Option<Cow<'static, str>> },

    #[error("Repository not registered{}: {message}", format_context(.context))]
    MissingRepository { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Persistence already configured{}: {message}", format_context(.context))]
    AlreadyConfigured { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Persistence validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal persistence error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
