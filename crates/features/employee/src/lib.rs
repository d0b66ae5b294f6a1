//! Employee feature slice.
//!
//! Declares the [`Employee`] entity, its relational and search repository
//! interfaces, and the [`EmployeeService`] that keeps both stores in step.

mod domain;
mod error;
pub mod repository;
mod service;

pub use domain::Employee;
pub use error::{EmployeeError, EmployeeErrorExt};
pub use service::EmployeeService;

use wf_kernel::persistence::RepositoryDeclaration;

/// Every repository interface this slice asks the bootstrap to register.
#[must_use]
pub fn declarations() -> Vec<RepositoryDeclaration> {
    vec![repository::declaration(), repository::search::declaration()]
}
