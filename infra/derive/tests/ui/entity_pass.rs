use serde::{Deserialize, Serialize};
use wf_kernel::domain::audit::AuditMetadata;
use wf_kernel::repository::Entity;

#[wf_derive::entity(collection = "pay_order")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayOrder {
    id: Option<i64>,
    number: Option<i64>,
    #[serde(flatten)]
    stamps: AuditMetadata,
}

fn main() {
    assert_eq!(PayOrder::COLLECTION, "pay_order");

    let mut order = PayOrder { number: Some(99788), ..PayOrder::default() };
    assert_eq!(order.id(), None);
    order.set_id(7);
    assert_eq!(order.id(), Some(7));

    order.audit_mut().created_by = Some("alice".to_owned());
    assert_eq!(order.audit().created_by.as_deref(), Some("alice"));
    assert_eq!(order.stamps.created_by.as_deref(), Some("alice"));
}
