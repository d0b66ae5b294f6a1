use std::borrow::Cow;

/// A specialized [`SearchError`] enum of this crate.
#[wf_derive::wf_error]
pub enum SearchError {
    /// The named index has not been created.
    #[error("Index not found{}: {index}", format_context(.context))]
    IndexNotFound { index: String, context: Option<Cow<'static, str>> },

    /// `create_index` was called again with a different mapping.
    #[error("Mapping conflict{}: index '{index}' already exists with another mapping", format_context(.context))]
    MappingConflict { index: String, context: Option<Cow<'static, str>> },

    /// A document does not fit the index mapping.
    #[error("Invalid document{}: {message}", format_context(.context))]
    InvalidDocument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Sorting was requested on an analyzed text field.
    #[error("Field is not sortable{}: {field}", format_context(.context))]
    UnsortableField { field: String, context: Option<Cow<'static, str>> },

    /// A sort referenced a field missing from the mapping.
    #[error("Unknown field{}: {field}", format_context(.context))]
    UnknownField { field: String, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal search error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
