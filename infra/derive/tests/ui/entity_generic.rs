use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wf_kernel::repository::Entity;

#[wf_derive::entity(collection = "tagged_2")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tagged<T>
where
    T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    pub id: Option<i64>,
    pub tag: T,
    #[serde(flatten)]
    pub audit: wf_kernel::domain::audit::AuditMetadata,
}

fn collection<E: Entity>() -> &'static str {
    E::COLLECTION
}

fn main() {
    assert_eq!(collection::<Tagged<String>>(), "tagged_2");

    let mut tagged = Tagged { id: None, tag: 3_u8, audit: Default::default() };
    tagged.set_id(1);
    assert_eq!(tagged.id(), Some(1));
    assert!(tagged.audit().is_empty());
}
