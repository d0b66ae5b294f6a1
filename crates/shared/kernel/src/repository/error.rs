use std::borrow::Cow;
use wf_database::DatabaseError;
use wf_search::SearchError;

/// Errors raised by repository adapters and decorators.
#[wf_derive::wf_error]
pub enum RepositoryError {
    #[error("Relational store error{}: {source}", format_context(.context))]
    Database { source: DatabaseError, context: Option<Cow<'static, str>> },

    #[error("Search index error{}: {source}", format_context(.context))]
    Search { source: SearchError, context: Option<Cow<'static, str>> },

    /// An entity could not be converted to or from its JSON document.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// The operation is not valid for the given entity (e.g. indexing one without id).
    #[error("Invalid entity{}: {message}", format_context(.context))]
    InvalidEntity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal repository error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
