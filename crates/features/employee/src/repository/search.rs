//! Search repository interfaces of the employee slice.

use crate::Employee;
use wf_kernel::persistence::RepositoryDeclaration;
use wf_kernel::repository::SearchRepository;

/// Module holding the search repository interfaces of this slice.
pub const NAMESPACE: &str = module_path!();

/// Full-text search over employees.
pub trait EmployeeSearchRepository: SearchRepository<Employee> {}

impl<T: SearchRepository<Employee> + ?Sized> EmployeeSearchRepository for T {}

pub(crate) fn declaration() -> RepositoryDeclaration {
    wf_kernel::search_repository!(EmployeeSearchRepository, Employee)
}
