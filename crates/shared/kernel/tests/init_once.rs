//! Process-wide bootstrap. Kept in its own test binary: the slot is global.

mod common;

use common::repository::{self, WidgetRepository, search};
use common::connect;
use wf_kernel::persistence::{Persistence, PersistenceError};

#[tokio::test]
async fn second_init_is_rejected() {
    assert!(Persistence::global().is_none());

    let builder = || {
        Persistence::builder()
            .relational_root(repository::root())
            .search_root(search::root())
            .declare(repository::widgets())
            .declare(search::widgets())
    };

    let first = builder().database(connect("init_once").await).init().expect("first init");
    let global = Persistence::global().expect("installed");
    assert_eq!(global.registrations(), first.registrations());
    assert!(global.repository::<dyn WidgetRepository>().is_some());

    let err = builder().database(connect("init_twice").await).init().unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyConfigured { .. }), "{err}");

    // An invalid second bootstrap is still only "already configured".
    let err = Persistence::builder().init().unwrap_err();
    assert!(matches!(err, PersistenceError::AlreadyConfigured { .. }), "{err}");
    assert_eq!(Persistence::global().map(|p| p.registrations().len()), Some(2));
}
