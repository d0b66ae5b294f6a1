#![allow(dead_code, unreachable_pub)]

use serde::{Deserialize, Serialize};
use wf_kernel::database::Database;
use wf_kernel::domain::audit::AuditMetadata;
use wf_kernel::repository::SearchableEntity;
use wf_kernel::search::{FieldKind, IndexMapping};

#[wf_derive::entity(collection = "widget")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub weight: Option<i64>,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl Widget {
    pub fn named(name: &str, code: &str, weight: i64) -> Self {
        Self {
            name: Some(name.to_owned()),
            code: Some(code.to_owned()),
            weight: Some(weight),
            ..Self::default()
        }
    }
}

impl SearchableEntity for Widget {
    fn mapping() -> IndexMapping {
        IndexMapping::new()
            .field("name", FieldKind::Text)
            .field("code", FieldKind::Keyword)
            .field("weight", FieldKind::Long)
    }
}

/// Relational repository interfaces.
pub mod repository {
    use super::Widget;
    use wf_kernel::persistence::RepositoryDeclaration;
    use wf_kernel::repository::CrudRepository;

    pub trait WidgetRepository: CrudRepository<Widget> {}
    impl<T: CrudRepository<Widget> + ?Sized> WidgetRepository for T {}

    pub trait GadgetRepository: CrudRepository<Widget> {}
    impl<T: CrudRepository<Widget> + ?Sized> GadgetRepository for T {}

    /// Satisfied by any repository, so it can be declared for both back ends.
    pub trait Storable: Send + Sync {}
    impl<T: Send + Sync + ?Sized> Storable for T {}

    pub fn root() -> &'static str {
        module_path!()
    }

    pub fn widgets() -> RepositoryDeclaration {
        wf_kernel::relational_repository!(WidgetRepository, Widget)
    }

    pub fn storable() -> RepositoryDeclaration {
        wf_kernel::relational_repository!(Storable, Widget)
    }

    pub fn gadgets() -> RepositoryDeclaration {
        wf_kernel::relational_repository!(GadgetRepository, Widget)
    }

    /// A search interface declared in the relational namespace.
    pub fn misplaced_search() -> RepositoryDeclaration {
        wf_kernel::search_repository!(search::WidgetSearchRepository, Widget)
    }

    /// Search interfaces.
    pub mod search {
        use super::super::Widget;
        use wf_kernel::persistence::RepositoryDeclaration;
        use wf_kernel::repository::SearchRepository;

        pub trait WidgetSearchRepository: SearchRepository<Widget> {}
        impl<T: SearchRepository<Widget> + ?Sized> WidgetSearchRepository for T {}

        pub fn root() -> &'static str {
            module_path!()
        }

        pub fn widgets() -> RepositoryDeclaration {
            wf_kernel::search_repository!(WidgetSearchRepository, Widget)
        }

        /// [`super::Storable`] again, this time as a search repository.
        pub fn storable() -> RepositoryDeclaration {
            wf_kernel::search_repository!(super::Storable, Widget)
        }

        /// A relational interface declared in the search namespace.
        pub fn misplaced_relational() -> RepositoryDeclaration {
            wf_kernel::relational_repository!(super::GadgetRepository, Widget)
        }
    }
}

/// Declarations outside both scan roots.
pub mod elsewhere {
    use super::Widget;
    use wf_kernel::persistence::RepositoryDeclaration;
    use wf_kernel::repository::CrudRepository;

    pub trait StrayRepository: CrudRepository<Widget> {}
    impl<T: CrudRepository<Widget> + ?Sized> StrayRepository for T {}

    pub fn stray() -> RepositoryDeclaration {
        wf_kernel::relational_repository!(StrayRepository, Widget)
    }
}

pub async fn connect(db: &str) -> Database {
    Database::builder()
        .url("mem://")
        .session("kernel", db)
        .collections(["widget"])
        .init()
        .await
        .expect("connect to mem://")
}
