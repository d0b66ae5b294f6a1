use chrono::{TimeZone, Utc};
use wf_employee::repository::{self, EmployeeRepository};
use wf_employee::repository::search::EmployeeSearchRepository;
use wf_employee::{Employee, EmployeeError, EmployeeService, declarations};
use wf_kernel::database::Database;
use wf_kernel::domain::paging::{Page, Pageable, Sort};
use wf_kernel::persistence::Persistence;
use wf_kernel::repository::SearchRepository;
use wf_kernel::security::with_actor;

async fn persistence(db: &str) -> Persistence {
    let database = Database::builder()
        .url("mem://")
        .session("employee", db)
        .collections(["employee"])
        .init()
        .await
        .expect("connect to mem://");

    Persistence::builder()
        .relational_root(repository::NAMESPACE)
        .search_root(repository::search::NAMESPACE)
        .declare_all(declarations())
        .database(database)
        .build()
        .expect("bootstrap")
}

fn employee(first: &str, last: &str, salary: i64) -> Employee {
    Employee {
        first_name: Some(first.to_owned()),
        last_name: Some(last.to_owned()),
        email: Some(format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase())),
        salary: Some(salary),
        hire_date: Some(Utc.with_ymd_and_hms(2023, 11, 4, 9, 9, 0).unwrap()),
        ..Employee::default()
    }
}

#[tokio::test]
async fn slice_declarations_resolve() {
    let persistence = persistence("resolve").await;
    assert!(persistence.repository::<dyn EmployeeRepository>().is_some());
    assert!(persistence.repository::<dyn EmployeeSearchRepository>().is_some());

    let namespaces: Vec<_> = persistence.registrations().iter().map(|r| r.namespace).collect();
    assert_eq!(namespaces, ["wf_employee::repository", "wf_employee::repository::search"]);
}

#[tokio::test]
async fn create_is_audited_and_indexed_after_commit() {
    let persistence = persistence("create").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    let created = with_actor("admin", service.create(&mut tx, employee("Henriette", "Greenholt", 89015)))
        .await
        .unwrap();
    assert_eq!(created.id, Some(1));
    assert_eq!(created.audit.created_by.as_deref(), Some("admin"));
    assert_eq!(created.audit.last_modified_by.as_deref(), Some("admin"));

    // Not searchable before the commit.
    assert_eq!(service.search("henriette", &Pageable::default()).await.unwrap().total_elements, 0);
    tx.commit().await.unwrap();

    let hits = service.search("henriette", &Pageable::default()).await.unwrap();
    assert_eq!(hits.content, [created]);
}

#[tokio::test]
async fn rolled_back_work_reaches_neither_store() {
    let persistence = persistence("rollback").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    service.create(&mut tx, employee("Henriette", "Greenholt", 89015)).await.unwrap();
    service.create(&mut tx, employee("Harrison", "Kutch", 56543)).await.unwrap();
    tx.rollback();

    let read = persistence.begin_read_only();
    assert_eq!(service.find_all(&read, &Pageable::default()).await.unwrap().total_elements, 0);
    assert_eq!(service.search("*", &Pageable::default()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn operations_in_one_unit_of_work_commit_together() {
    let persistence = persistence("atomic").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    let first = service.create(&mut tx, employee("Henriette", "Greenholt", 89015)).await.unwrap();
    let mut second = service.create(&mut tx, employee("Harrison", "Kutch", 56543)).await.unwrap();
    second.salary = Some(60000);
    let second = service.update(&mut tx, second).await.unwrap();
    assert_eq!(tx.commit().await.unwrap(), 2);

    let read = persistence.begin_read_only();
    let page = service.find_all(&read, &Pageable::default().with_sort(Sort::desc("salary"))).await.unwrap();
    assert_eq!(page.content, [first, second]);
    assert_eq!(service.search("*", &Pageable::default()).await.unwrap().total_elements, 2);
}

#[tokio::test]
async fn create_and_update_validate_ids() {
    let persistence = persistence("ids").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();
    let mut tx = persistence.begin();

    let with_id = Employee { id: Some(7813), ..Employee::default() };
    let err = service.create(&mut tx, with_id.clone()).await.unwrap_err();
    assert!(matches!(err, EmployeeError::BadRequest { .. }), "{err}");

    let err = service.update(&mut tx, with_id).await.unwrap_err();
    assert!(matches!(err, EmployeeError::NotFound { id: 7813, .. }), "{err}");

    let err = service.update(&mut tx, Employee::default()).await.unwrap_err();
    assert!(matches!(err, EmployeeError::BadRequest { .. }), "{err}");

    let err = service.partial_update(&mut tx, Employee { id: Some(1), ..Employee::default() }).await.unwrap_err();
    assert!(matches!(err, EmployeeError::NotFound { id: 1, .. }), "{err}");
    assert_eq!(tx.pending_writes(), 0);
}

#[tokio::test]
async fn partial_update_merges_and_keeps_creation_audit() {
    let persistence = persistence("partial").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    let created = with_actor("alice", service.create(&mut tx, employee("Henriette", "Greenholt", 89015)))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let patch = Employee { id: created.id, slip_no: Some(64922), ..Employee::default() };
    let mut tx = persistence.begin();
    let patched = with_actor("bob", service.partial_update(&mut tx, patch)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(patched.first_name, created.first_name);
    assert_eq!(patched.salary, Some(89015));
    assert_eq!(patched.slip_no, Some(64922));
    assert_eq!(patched.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(patched.audit.created_date, created.audit.created_date);
    assert_eq!(patched.audit.last_modified_by.as_deref(), Some("bob"));

    let hits = service.search("slipNo:64922", &Pageable::default()).await.unwrap();
    assert_eq!(hits.content, [patched]);
}

#[tokio::test]
async fn delete_removes_from_the_index_after_commit() {
    let persistence = persistence("delete").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    let created = service.create(&mut tx, employee("Henriette", "Greenholt", 89015)).await.unwrap();
    tx.commit().await.unwrap();
    let id = created.id.unwrap();

    let mut tx = persistence.begin();
    assert!(service.delete(&mut tx, id).await.unwrap());
    assert!(!service.delete(&mut tx, 999).await.unwrap());
    assert_eq!(service.search("greenholt", &Pageable::default()).await.unwrap().total_elements, 1);
    tx.commit().await.unwrap();

    let read = persistence.begin_read_only();
    assert_eq!(service.find_one(&read, id).await.unwrap(), None);
    assert_eq!(service.search("greenholt", &Pageable::default()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn search_orders_by_relevance_instead_of_text_sorts() {
    let persistence = persistence("search_sort").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();

    let mut tx = persistence.begin();
    for (first, last, salary) in [("Zoe", "Adams", 3), ("Amy", "Zimmer", 1), ("Max", "Zimmer", 2)] {
        service.create(&mut tx, employee(first, last, salary)).await.unwrap();
    }
    tx.commit().await.unwrap();

    let ids = |page: Page<Employee>| page.content.iter().map(|e| e.id).collect::<Vec<_>>();

    // Max Zimmer matches both terms, Amy Zimmer one of them.
    let by_name = Pageable::default().with_sort(Sort::asc("lastName"));
    assert_eq!(ids(service.search("max zimmer", &by_name).await.unwrap()), [Some(3), Some(2)]);
    // Every hit of the match-all query scores the same; ties go by id.
    assert_eq!(ids(service.search("*", &by_name).await.unwrap()), [Some(1), Some(2), Some(3)]);

    let by_salary = Pageable::default().with_sort(Sort::asc("lastName")).with_sort(Sort::desc("salary"));
    assert_eq!(ids(service.search("*", &by_salary).await.unwrap()), [Some(1), Some(3), Some(2)]);

    let paged = service.search("*", &Pageable::new(1, 2)).await.unwrap();
    assert_eq!(paged.total_elements, 3);
    assert_eq!(paged.content.len(), 1);
}

#[tokio::test]
async fn reindex_rebuilds_from_the_relational_store() {
    let persistence = persistence("reindex").await;
    let service = EmployeeService::from_persistence(&persistence).unwrap();
    let search = persistence.try_repository::<dyn EmployeeSearchRepository>().unwrap();

    let mut tx = persistence.begin();
    service.create(&mut tx, employee("Henriette", "Greenholt", 89015)).await.unwrap();
    service.create(&mut tx, employee("Harrison", "Kutch", 56543)).await.unwrap();
    tx.commit().await.unwrap();

    search.clear().await.unwrap();
    assert_eq!(search.count().await.unwrap(), 0);

    let read = persistence.begin_read_only();
    assert_eq!(service.reindex(&read).await.unwrap(), 2);
    assert_eq!(search.count().await.unwrap(), 2);
    assert_eq!(service.search("kutch", &Pageable::default()).await.unwrap().total_elements, 1);
}
