mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{Widget, connect};
use std::sync::Arc;
use wf_kernel::auditing::{Audited, AuditorAware, Clock, FixedAuditor, FixedClock, SecurityContextAuditor};
use wf_kernel::repository::{CrudRepository, DocumentRepository};
use wf_kernel::security::with_actor;

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn audited(
    auditor: impl AuditorAware + 'static,
    clock: &Arc<FixedClock>,
) -> Audited<DocumentRepository<Widget>> {
    Audited::new(DocumentRepository::new(), Arc::new(auditor), Arc::clone(clock) as Arc<dyn Clock>)
}

#[tokio::test]
async fn create_stamps_creation_and_modification() {
    let db = connect("audit_create").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(FixedAuditor::new("alice"), &clock);

    let mut tx = db.begin();
    let saved = repo.save(&mut tx, Widget::named("Sprocket", "SP-1", 3)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(saved.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(saved.audit.created_date, Some(start()));
    assert_eq!(saved.audit.last_modified_by.as_deref(), Some("alice"));
    assert_eq!(saved.audit.last_modified_date, Some(start()));

    let read = db.begin_read_only();
    assert_eq!(repo.find_by_id(&read, 1).await.unwrap(), Some(saved));
}

#[tokio::test]
async fn create_without_modification_stamp() {
    let db = connect("audit_create_only").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(FixedAuditor::new("alice"), &clock).modify_on_create(false);

    let mut widget = Widget::named("Sprocket", "SP-1", 3);
    widget.audit.mark_modified("mallory", start() - Duration::days(1));

    let mut tx = db.begin();
    let saved = repo.save(&mut tx, widget).await.unwrap();
    assert_eq!(saved.audit.created_by.as_deref(), Some("alice"));
    assert!(saved.audit.last_modified_by.is_none());
    assert!(saved.audit.last_modified_date.is_none());
}

#[tokio::test]
async fn update_keeps_creation_and_uses_the_current_actor() {
    let db = connect("audit_update").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(SecurityContextAuditor, &clock);

    let mut tx = db.begin();
    let created = with_actor("alice", repo.save(&mut tx, Widget::named("Sprocket", "SP-1", 3)))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    clock.advance(Duration::hours(2));
    let mut changed = created.clone();
    changed.weight = Some(4);
    // A caller cannot rewrite who created the record.
    changed.audit.created_by = Some("mallory".to_owned());
    changed.audit.created_date = None;

    let mut tx = db.begin();
    let updated = with_actor("bob", repo.save(&mut tx, changed)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(updated.audit.created_date, Some(start()));
    assert_eq!(updated.audit.last_modified_by.as_deref(), Some("bob"));
    assert_eq!(updated.audit.last_modified_date, Some(start() + Duration::hours(2)));
}

#[tokio::test]
async fn missing_actor_falls_back_to_system() {
    let db = connect("audit_system").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(SecurityContextAuditor, &clock);

    let mut tx = db.begin();
    let saved = repo.save(&mut tx, Widget::named("Sprocket", "SP-1", 3)).await.unwrap();
    assert_eq!(saved.audit.created_by.as_deref(), Some("system"));

    let anonymous =
        with_actor("anonymoususer", repo.save(&mut tx, Widget::named("Flange", "FL-2", 7))).await.unwrap();
    assert_eq!(anonymous.audit.created_by.as_deref(), Some("system"));
}

#[tokio::test]
async fn saving_an_unknown_id_counts_as_creation() {
    let db = connect("audit_upsert").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(FixedAuditor::new("alice"), &clock);

    let widget = Widget { id: Some(40), ..Widget::named("Sprocket", "SP-1", 3) };
    let mut tx = db.begin();
    let saved = repo.save(&mut tx, widget).await.unwrap();
    assert_eq!(saved.id, Some(40));
    assert_eq!(saved.audit.created_by.as_deref(), Some("alice"));
    assert_eq!(saved.audit.created_date, Some(start()));
}

#[tokio::test]
async fn reads_and_deletes_pass_through() {
    let db = connect("audit_passthrough").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(FixedAuditor::new("alice"), &clock);

    let mut tx = db.begin();
    let saved = repo.save(&mut tx, Widget::named("Sprocket", "SP-1", 3)).await.unwrap();
    let id = saved.id.unwrap();
    assert!(repo.exists_by_id(&tx, id).await.unwrap());
    assert_eq!(repo.count(&tx).await.unwrap(), 1);
    assert!(repo.delete_by_id(&mut tx, id).await.unwrap());
    assert!(!repo.delete_by_id(&mut tx, id).await.unwrap());
    assert_eq!(repo.count(&tx).await.unwrap(), 0);
}

#[tokio::test]
async fn generated_ids_never_overwrite_explicit_ones() {
    let db = connect("audit_mixed_ids").await;
    let clock = Arc::new(FixedClock::new(start()));
    let repo = audited(FixedAuditor::new("alice"), &clock);

    let mut tx = db.begin();
    let a = repo.save(&mut tx, Widget::named("A", "A-1", 1)).await.unwrap();
    let b = repo.save(&mut tx, Widget { id: Some(2), ..Widget::named("B", "B-1", 2) }).await.unwrap();
    let c = repo.save(&mut tx, Widget::named("C", "C-1", 3)).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!((a.id, b.id, c.id), (Some(1), Some(2), Some(3)));
    let read = db.begin_read_only();
    assert_eq!(repo.count(&read).await.unwrap(), 3);
    let stored = repo.find_by_id(&read, 2).await.unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("B"));
}
