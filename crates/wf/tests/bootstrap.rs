use wf::domain::config::{DatabaseConfig, PersistenceConfig, Strictness};
use wf::domain::paging::Pageable;
use wf::features::employee::{Employee, EmployeeService};
use wf::features::employee::repository::EmployeeRepository;
use wf::features::employee::repository::search::EmployeeSearchRepository;
use wf::kernel::persistence::{Persistence, PersistenceError};

#[test]
fn employee_slice_is_declared() {
    assert!(wf::features::is_enabled("employee"));
    assert!(!wf::features::is_enabled("payroll"));
    assert_eq!(wf::collections(), ["employee"]);
    assert_eq!(wf::declarations().len(), 2);
    assert_eq!(wf::RELATIONAL_REPOSITORY_ROOT, "wf_employee::repository");
    assert_eq!(wf::SEARCH_REPOSITORY_ROOT, "wf_employee::repository::search");
}

#[tokio::test]
async fn default_configuration_bootstraps() {
    let database = wf::connect(&DatabaseConfig::default()).await.expect("connect");
    let persistence = wf::configure(&PersistenceConfig::default(), database).build().expect("bootstrap");

    assert!(persistence.repository::<dyn EmployeeRepository>().is_some());
    assert!(persistence.repository::<dyn EmployeeSearchRepository>().is_some());
    assert!(EmployeeService::from_persistence(&persistence).is_ok());
}

#[tokio::test]
async fn misconfigured_roots_abort_startup() {
    let database = wf::connect(&DatabaseConfig::default()).await.expect("connect");
    let config = PersistenceConfig {
        search_root: Some("wf_employee::search".to_owned()),
        strictness: Strictness::Lenient,
        ..PersistenceConfig::default()
    };
    // The search interface now lies under the relational root.
    let err = wf::configure(&config, database).build().unwrap_err();
    assert!(matches!(err, PersistenceError::BackendMismatch { .. }), "{err}");
}

#[tokio::test]
async fn init_runs_once() {
    let database = wf::connect(&DatabaseConfig::default()).await.expect("connect");
    let persistence = wf::init(&PersistenceConfig::default(), database.clone()).expect("first init");
    assert_eq!(persistence.registrations().len(), 2);
    assert!(Persistence::global().is_some());

    let err = wf::init(&PersistenceConfig::default(), database).unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyConfigured { .. }), "{err}");
}

#[tokio::test]
async fn reindex_restores_search_after_a_restart() {
    let database = wf::connect(&DatabaseConfig::default()).await.expect("connect");
    let config = PersistenceConfig::default();

    let first = wf::configure(&config, database.clone()).build().expect("first bootstrap");
    let employees = EmployeeService::from_persistence(&first).unwrap();
    let mut tx = first.begin();
    let kutch = Employee { last_name: Some("Kutch".to_owned()), ..Employee::default() };
    employees.create(&mut tx, kutch).await.unwrap();
    tx.commit().await.unwrap();

    // A new process over the same store starts with an empty search index.
    let second = wf::configure(&config, database).build().expect("second bootstrap");
    let employees = EmployeeService::from_persistence(&second).unwrap();
    let pageable = Pageable::default();
    assert_eq!(employees.search("kutch", &pageable).await.unwrap().total_elements, 0);

    assert_eq!(wf::reindex(&second).await.unwrap(), 1);
    assert_eq!(employees.search("kutch", &pageable).await.unwrap().total_elements, 1);
}
