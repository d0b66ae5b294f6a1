use crate::repository::EmployeeRepository;
use crate::repository::search::EmployeeSearchRepository;
use crate::{Employee, EmployeeError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use wf_kernel::database::UnitOfWork;
use wf_kernel::domain::paging::{MAX_PAGE_SIZE, Page, Pageable, Sort};
use wf_kernel::persistence::Persistence;
use wf_kernel::repository::{CrudRepository, SearchRepository};

/// Employee use cases.
///
/// Writes go to the relational store inside the caller's unit of work. The
/// search index follows through after-commit hooks, so it never sees a write
/// that was rolled back.
#[derive(Clone)]
pub struct EmployeeService {
    employees: Arc<dyn EmployeeRepository>,
    search: Arc<dyn EmployeeSearchRepository>,
}

impl fmt::Debug for EmployeeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmployeeService").finish_non_exhaustive()
    }
}

impl EmployeeService {
    pub fn new(employees: Arc<dyn EmployeeRepository>, search: Arc<dyn EmployeeSearchRepository>) -> Self {
        Self { employees, search }
    }

    /// Resolves both repositories of the slice.
    ///
    /// # Errors
    /// [`EmployeeError::Persistence`] if the slice was not declared to the bootstrap.
    pub fn from_persistence(persistence: &Persistence) -> Result<Self, EmployeeError> {
        Ok(Self::new(
            persistence.try_repository::<dyn EmployeeRepository>()?,
            persistence.try_repository::<dyn EmployeeSearchRepository>()?,
        ))
    }

    /// Stores a new employee.
    ///
    /// # Errors
    /// [`EmployeeError::BadRequest`] if the employee already has an id.
    #[instrument(skip_all)]
    pub async fn create(&self, tx: &mut UnitOfWork, employee: Employee) -> Result<Employee, EmployeeError> {
        if employee.id.is_some() {
            return Err(EmployeeError::BadRequest {
                message: "a new employee cannot already have an id".into(),
                context: None,
            });
        }
        let saved = self.employees.save(tx, employee).await?;
        debug!(id = ?saved.id, "Employee created");
        self.index_after_commit(tx, &saved);
        Ok(saved)
    }

    /// Replaces a stored employee.
    ///
    /// # Errors
    /// [`EmployeeError::BadRequest`] without id, [`EmployeeError::NotFound`] for an unknown id.
    #[instrument(skip_all, fields(id = ?employee.id))]
    pub async fn update(&self, tx: &mut UnitOfWork, employee: Employee) -> Result<Employee, EmployeeError> {
        let id = require_id(&employee)?;
        if !self.employees.exists_by_id(tx, id).await? {
            return Err(EmployeeError::NotFound { id, context: None });
        }
        let saved = self.employees.save(tx, employee).await?;
        self.index_after_commit(tx, &saved);
        Ok(saved)
    }

    /// Applies the fields set in `patch` to the stored employee.
    ///
    /// # Errors
    /// As [`Self::update`].
    #[instrument(skip_all, fields(id = ?patch.id))]
    pub async fn partial_update(&self, tx: &mut UnitOfWork, patch: Employee) -> Result<Employee, EmployeeError> {
        let id = require_id(&patch)?;
        let mut stored =
            self.employees.find_by_id(tx, id).await?.ok_or(EmployeeError::NotFound { id, context: None })?;
        stored.merge(patch);
        let saved = self.employees.save(tx, stored).await?;
        self.index_after_commit(tx, &saved);
        Ok(saved)
    }

    /// # Errors
    /// Storage failures only; an unknown id yields `None`.
    pub async fn find_one(&self, tx: &UnitOfWork, id: i64) -> Result<Option<Employee>, EmployeeError> {
        Ok(self.employees.find_by_id(tx, id).await?)
    }

    /// # Errors
    /// Storage failures only.
    pub async fn find_all(&self, tx: &UnitOfWork, pageable: &Pageable) -> Result<Page<Employee>, EmployeeError> {
        Ok(self.employees.find_all(tx, pageable).await?)
    }

    /// Deletes an employee; returns whether it existed.
    ///
    /// # Errors
    /// Storage failures only.
    #[instrument(skip(self, tx))]
    pub async fn delete(&self, tx: &mut UnitOfWork, id: i64) -> Result<bool, EmployeeError> {
        let deleted = self.employees.delete_by_id(tx, id).await?;
        if deleted {
            let search = Arc::clone(&self.search);
            tx.after_commit(async move {
                if let Err(error) = search.delete_from_index(id).await {
                    warn!(id, %error, "Failed to remove employee from the search index");
                }
            });
        }
        Ok(deleted)
    }

    /// Runs a query-string search.
    ///
    /// Sorting on an analyzed text property is not possible; such sort orders
    /// are dropped. Without any remaining sort order, hits come back by
    /// relevance.
    ///
    /// # Errors
    /// Search failures, e.g. sorting on an unknown property.
    pub async fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<Employee>, EmployeeError> {
        let pageable = searchable(pageable);
        Ok(self.search.search(query, &pageable).await?)
    }

    /// Rebuilds the search index from the relational store; returns the number
    /// of indexed employees.
    ///
    /// # Errors
    /// Storage or search failures. The index may be partially rebuilt.
    #[instrument(skip_all)]
    pub async fn reindex(&self, tx: &UnitOfWork) -> Result<u64, EmployeeError> {
        self.search.clear().await?;

        let mut pageable = Pageable::new(0, MAX_PAGE_SIZE);
        let mut indexed = 0_u64;
        loop {
            let page = self.employees.find_all(tx, &pageable).await?;
            for employee in &page.content {
                self.search.index(employee).await?;
                indexed += 1;
            }
            if !page.has_next() {
                break;
            }
            pageable = Pageable::new(pageable.page() + 1, pageable.size());
        }

        info!(indexed, "Employee search index rebuilt");
        Ok(indexed)
    }

    fn index_after_commit(&self, tx: &UnitOfWork, employee: &Employee) {
        let search = Arc::clone(&self.search);
        let employee = employee.clone();
        tx.after_commit(async move {
            if let Err(error) = search.index(&employee).await {
                warn!(id = ?employee.id, %error, "Failed to index employee");
            }
        });
    }
}

fn require_id(employee: &Employee) -> Result<i64, EmployeeError> {
    employee.id.ok_or_else(|| EmployeeError::BadRequest {
        message: "an employee without id cannot be updated".into(),
        context: None,
    })
}

/// Drops sort orders on text properties.
fn searchable(pageable: &Pageable) -> Pageable {
    let (kept, dropped): (Vec<Sort>, Vec<Sort>) = pageable
        .sort()
        .iter()
        .cloned()
        .partition(|sort| !Employee::TEXT_PROPERTIES.contains(&sort.property.as_str()));
    if dropped.is_empty() {
        return pageable.clone();
    }

    debug!(?dropped, "Text properties cannot order search results");
    pageable.replace_sort(kept)
}
