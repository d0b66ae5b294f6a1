use std::borrow::Cow;
use wf_kernel::persistence::PersistenceError;
use wf_kernel::repository::RepositoryError;

#[wf_derive::wf_error]
pub enum EmployeeError {
    #[error("Employee storage error{}: {source}", format_context(.context))]
    Repository { source: RepositoryError, context: Option<Cow<'static, str>> },

    /// A repository interface of this slice is not registered.
    #[error("Employee wiring error{}: {source}", format_context(.context))]
    Persistence { source: PersistenceError, context: Option<Cow<'static, str>> },

    /// The request is not valid for the current state (e.g. creating with an id).
    #[error("Invalid employee request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Employee not found{}: {id}", format_context(.context))]
    NotFound { id: i64, context: Option<Cow<'static, str>> },

    #[error("Internal employee error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
