//! Relational repository interfaces of the employee slice.

pub mod search;

use crate::Employee;
use wf_kernel::persistence::RepositoryDeclaration;
use wf_kernel::repository::CrudRepository;

/// Module holding the relational repository interfaces of this slice.
pub const NAMESPACE: &str = module_path!();

/// Relational access to employees.
pub trait EmployeeRepository: CrudRepository<Employee> {}

impl<T: CrudRepository<Employee> + ?Sized> EmployeeRepository for T {}

pub(crate) fn declaration() -> RepositoryDeclaration {
    wf_kernel::relational_repository!(EmployeeRepository, Employee)
}
