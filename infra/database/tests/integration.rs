use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wf_database::*;

async fn connect(db: &str) -> Database {
    Database::builder()
        .url("mem://")
        .session("test_ns", db)
        .collections(["employee", "audit_log"])
        .init()
        .await
        .expect("connect to mem://")
}

#[tokio::test]
async fn connect_in_memory_and_health_check() {
    let db = connect("health").await;

    // Health should be OK for mem://
    db.health().await.expect("health check");
    assert_eq!(db.session(), ("test_ns", "health"));
}

#[tokio::test]
async fn missing_parameters_fail_validation() {
    let err = Database::builder().init().await.unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));

    let err = Database::builder()
        .url("mem://")
        .session("ns", "db")
        .collections(["Bad-Name"])
        .init()
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Validation { .. }));
}

#[tokio::test]
async fn committed_writes_are_visible() {
    let db = connect("commit").await;

    let mut tx = db.begin();
    let first = tx.next_key("employee").await.unwrap();
    let second = tx.next_key("employee").await.unwrap();
    tx.put("employee", first, r#"{"n":1}"#).unwrap();
    tx.put("employee", second, r#"{"n":2}"#).unwrap();
    assert_eq!(tx.commit().await.unwrap(), 2);

    let read = db.begin_read_only();
    assert_eq!(read.get("employee", first).await.unwrap().as_deref(), Some(r#"{"n":1}"#));
    let keys: Vec<i64> = read.scan("employee").await.unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, [first, second]);
}

#[tokio::test]
async fn rolled_back_and_dropped_writes_are_discarded() {
    let db = connect("rollback").await;

    let mut tx = db.begin();
    tx.put("employee", 1, "{}").unwrap();
    tx.rollback();

    {
        let mut tx = db.begin();
        tx.put("employee", 2, "{}").unwrap();
    }

    assert!(db.begin_read_only().scan("employee").await.unwrap().is_empty());
}

#[tokio::test]
async fn reads_see_staged_writes() {
    let db = connect("overlay").await;
    let mut seed = db.begin();
    seed.put("employee", 1, "old").unwrap();
    seed.put("employee", 2, "gone").unwrap();
    seed.commit().await.unwrap();

    let mut tx = db.begin();
    tx.put("employee", 1, "new").unwrap();
    tx.delete("employee", 2).unwrap();
    tx.put("employee", 3, "fresh").unwrap();
    tx.put("audit_log", 1, "other collection").unwrap();

    assert_eq!(tx.get("employee", 1).await.unwrap().as_deref(), Some("new"));
    assert_eq!(tx.get("employee", 2).await.unwrap(), None);
    assert_eq!(
        tx.scan("employee").await.unwrap(),
        vec![(1, "new".to_owned()), (3, "fresh".to_owned())]
    );

    // Nothing leaked outside the unit of work yet.
    let outside = db.begin_read_only();
    assert_eq!(outside.get("employee", 1).await.unwrap().as_deref(), Some("old"));
    assert_eq!(tx.pending_writes(), 4);
}

#[tokio::test]
async fn repeated_writes_to_one_key_collapse() {
    let db = connect("collapse").await;
    let mut tx = db.begin();
    tx.put("employee", 7, "a").unwrap();
    tx.put("employee", 7, "b").unwrap();
    tx.delete("employee", 7).unwrap();
    tx.put("employee", 7, "c").unwrap();
    assert_eq!(tx.commit().await.unwrap(), 1);

    let rows = db.begin_read_only().scan("employee").await.unwrap();
    assert_eq!(rows, vec![(7, "c".to_owned())]);
}

#[tokio::test]
async fn updates_and_deletes_replace_committed_records() {
    let db = connect("update").await;
    let mut tx = db.begin();
    tx.put("employee", 1, "v1").unwrap();
    tx.put("employee", 2, "v1").unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin();
    tx.put("employee", 1, "v2").unwrap();
    tx.delete("employee", 2).unwrap();
    tx.commit().await.unwrap();

    let rows = db.begin_read_only().scan("employee").await.unwrap();
    assert_eq!(rows, vec![(1, "v2".to_owned())]);
}

#[tokio::test]
async fn read_only_unit_rejects_writes() {
    let db = connect("read_only").await;
    let mut tx = db.begin_read_only();
    assert!(tx.is_read_only());
    assert!(matches!(tx.put("employee", 1, "{}"), Err(DatabaseError::Transaction { .. })));
    assert!(matches!(tx.delete("employee", 1), Err(DatabaseError::Transaction { .. })));
    assert!(matches!(tx.next_key("employee").await, Err(DatabaseError::Transaction { .. })));
    assert_eq!(tx.commit().await.unwrap(), 0);
}

#[tokio::test]
async fn hooks_run_only_after_commit() {
    let db = connect("hooks").await;
    let runs = Arc::new(AtomicUsize::new(0));

    let tx = db.begin();
    let counter = Arc::clone(&runs);
    tx.after_commit(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    tx.rollback();
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let mut tx = db.begin();
    tx.put("employee", 1, "{}").unwrap();
    for _ in 0..2 {
        let counter = Arc::clone(&runs);
        tx.after_commit(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }
    tx.commit().await.unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn key_sequence_continues_after_existing_records_and_skips_rolled_back_keys() {
    let db = connect("sequence").await;
    let mut tx = db.begin();
    tx.put("employee", 41, "{}").unwrap();
    tx.commit().await.unwrap();

    // The first reservation seeds the sequence from max(key) + 1.
    let tx = db.begin();
    let key = tx.next_key("employee").await.unwrap();
    assert_eq!(key, 42);
    tx.rollback();

    let tx = db.begin();
    assert_eq!(tx.next_key("employee").await.unwrap(), 43);
    assert_eq!(tx.next_key("audit_log").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_key_reservations_are_unique() {
    let db = connect("concurrent").await;
    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            let mut keys = Vec::new();
            for _ in 0..10 {
                keys.push(db.next_key("employee").await.unwrap());
            }
            keys
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 80);
    assert_eq!(all.first(), Some(&1));
}

#[tokio::test]
async fn generated_keys_skip_explicitly_staged_keys() {
    let db = connect("explicit_keys").await;

    let mut tx = db.begin();
    let first = tx.next_key("employee").await.unwrap();
    tx.put("employee", first, "A").unwrap();
    tx.put("employee", first + 1, "B").unwrap();
    let third = tx.next_key("employee").await.unwrap();
    tx.put("employee", third, "C").unwrap();
    assert_eq!(tx.commit().await.unwrap(), 3);

    assert_eq!((first, third), (1, 3));
    let rows = db.begin_read_only().scan("employee").await.unwrap();
    assert_eq!(rows, vec![(1, "A".to_owned()), (2, "B".to_owned()), (3, "C".to_owned())]);
}

#[tokio::test]
async fn explicit_key_before_first_reservation_raises_the_seed() {
    let db = connect("explicit_seed").await;
    let mut seed = db.begin();
    seed.put("employee", 3, "stored").unwrap();
    seed.commit().await.unwrap();

    let mut tx = db.begin();
    tx.put("employee", 10, "explicit").unwrap();
    assert_eq!(tx.next_key("employee").await.unwrap(), 11);
    tx.rollback();

    // A staged delete does not move the sequence.
    let mut tx = db.begin();
    tx.delete("employee", 50).unwrap();
    assert_eq!(tx.next_key("employee").await.unwrap(), 12);
}

#[tokio::test]
async fn failed_commit_applies_nothing() {
    let db = connect("atomic").await;
    db.query("DEFINE FIELD doc ON employee ASSERT $value != 'bad'")
        .await
        .unwrap()
        .check()
        .unwrap();

    let mut tx = db.begin();
    tx.put("employee", 1, "good").unwrap();
    tx.put("employee", 2, "bad").unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    tx.after_commit(async move {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(tx.commit().await.is_err());
    assert!(db.begin_read_only().scan("employee").await.unwrap().is_empty());
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}
