use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wf_kernel::domain::audit::AuditMetadata;
use wf_kernel::repository::SearchableEntity;
use wf_kernel::search::{FieldKind, IndexMapping};

/// An employee record. Every field except the audit metadata is optional.
#[wf_derive::entity(collection = "employee")]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_pct: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slip_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_order_number: Option<i64>,
    #[serde(flatten)]
    pub audit: AuditMetadata,
}

impl Employee {
    /// Properties that are analyzed full-text in the search index and therefore
    /// cannot order search results.
    pub const TEXT_PROPERTIES: [&'static str; 4] = ["firstName", "lastName", "email", "phoneNumber"];

    /// Copies every field that is set in `patch`. Id and audit metadata are left alone.
    pub(crate) fn merge(&mut self, patch: Self) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.first_name, patch.first_name);
        take(&mut self.last_name, patch.last_name);
        take(&mut self.email, patch.email);
        take(&mut self.phone_number, patch.phone_number);
        take(&mut self.hire_date, patch.hire_date);
        take(&mut self.salary, patch.salary);
        take(&mut self.commission_pct, patch.commission_pct);
        take(&mut self.slip_no, patch.slip_no);
        take(&mut self.pay_order_number, patch.pay_order_number);
    }
}

impl SearchableEntity for Employee {
    fn mapping() -> IndexMapping {
        IndexMapping::new()
            .field("firstName", FieldKind::Text)
            .field("lastName", FieldKind::Text)
            .field("email", FieldKind::Text)
            .field("phoneNumber", FieldKind::Text)
            .field("hireDate", FieldKind::Date)
            .field("salary", FieldKind::Long)
            .field("commissionPct", FieldKind::Long)
            .field("slipNo", FieldKind::Long)
            .field("payOrderNumber", FieldKind::Long)
    }
}
