//! Audit metadata carried by every entity exposed through a relational repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who created and last modified an entity, and when.
///
/// Serialized in camelCase and meant to be `#[serde(flatten)]`ed into the
/// owning entity, so the persisted document reads
/// `{"createdBy": "...", "createdDate": "...", ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<DateTime<Utc>>,
}

impl AuditMetadata {
    /// Stamps the creation fields.
    pub fn mark_created(&mut self, actor: &str, at: DateTime<Utc>) {
        self.created_by = Some(actor.to_owned());
        self.created_date = Some(at);
    }

    /// Stamps the last-modified fields.
    pub fn mark_modified(&mut self, actor: &str, at: DateTime<Utc>) {
        self.last_modified_by = Some(actor.to_owned());
        self.last_modified_date = Some(at);
    }

    /// Copies the creation fields of an already persisted record.
    pub fn preserve_created_from(&mut self, persisted: &Self) {
        self.created_by.clone_from(&persisted.created_by);
        self.created_date = persisted.created_date;
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.created_by.is_none()
            && self.created_date.is_none()
            && self.last_modified_by.is_none()
            && self.last_modified_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn preserve_keeps_modified_fields() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        let mut persisted = AuditMetadata::default();
        persisted.mark_created("alice", t0);

        let mut incoming = AuditMetadata::default();
        incoming.mark_created("mallory", t1);
        incoming.mark_modified("bob", t1);
        incoming.preserve_created_from(&persisted);

        assert_eq!(incoming.created_by.as_deref(), Some("alice"));
        assert_eq!(incoming.created_date, Some(t0));
        assert_eq!(incoming.last_modified_by.as_deref(), Some("bob"));
        assert!(!incoming.is_empty());
    }
}
