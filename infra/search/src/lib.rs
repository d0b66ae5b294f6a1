//! # Search Infrastructure
//!
//! An in-process, thread-safe full-text index used as the storage back end of
//! search repositories.
//!
//! ## Key Features
//! - **Typed Mappings**: every index declares its fields up front ([`IndexMapping`]).
//! - **Query Strings**: `+must -must_not field:term "phrase" prefix*`, default operator OR.
//! - **Sorted Paging**: offset/limit windows sorted by score or by sortable fields.
//!
//! ## Example
//!
//! ```rust
//! use wf_search::{FieldKind, IndexMapping, SearchIndex, SearchRequest};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), wf_search::SearchError> {
//! let index = SearchIndex::new();
//! index.create_index("employee", IndexMapping::new().field("firstName", FieldKind::Text))?;
//! index.index("employee", 1, json!({ "id": 1, "firstName": "Henriette" }))?;
//!
//! let hits = index.search("employee", &SearchRequest::new("henriette"))?;
//! assert_eq!(hits.total, 1);
//! # Ok(())
//! # }
//! ```

mod analyzer;
mod error;
mod index;
mod mapping;
mod query;

pub use analyzer::analyze;
pub use error::{SearchError, SearchErrorExt};
pub use index::{Hit, SearchHits, SearchIndex, SearchRequest, SortField};
pub use mapping::{FieldKind, IndexMapping};
pub use query::{Clause, Occur, Query, Term};
