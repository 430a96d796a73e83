//! Adapter round-trip tests against the embedded SQLite driver.
//!
//! Schema is provisioned directly in the driver's dialect; the rendered
//! server DDL is covered by the schema module's unit tests.

use std::sync::Arc;

use serde_json::json;
use vigil_core::{Database, StoreConfig, Value};
use vigil_storage::models::{Metadata, Occurrence};
use vigil_storage::{apply_retention, RecordAdapter, SqliteDatabase};

fn setup_db() -> Arc<dyn Database> {
    let db = SqliteDatabase::open_in_memory(&StoreConfig::default()).unwrap();
    db.execute(
        "CREATE TABLE vigil_occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL,
            alert_id INTEGER NOT NULL,
            created_on REAL NOT NULL,
            is_read INTEGER NOT NULL,
            is_migrated INTEGER NOT NULL
        )",
    )
    .unwrap();
    db.execute(
        "CREATE TABLE vigil_metadata (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            occurrence_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            value TEXT NOT NULL
        )",
    )
    .unwrap();
    Arc::new(db)
}

fn occurrence(site_id: i64, alert_id: i64, created_on: f64) -> Occurrence {
    Occurrence {
        id: 0,
        site_id,
        alert_id,
        created_on,
        is_read: false,
        is_migrated: false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SAVE / LOAD
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn save_assigns_identity_and_writes_it_back() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    let mut first = occurrence(1, 4000, 1000.0);
    assert_eq!(adapter.save(&mut first).unwrap(), 1);
    assert!(first.id > 0, "fresh save must assign an identity");

    let mut second = occurrence(1, 4001, 1001.0);
    adapter.save(&mut second).unwrap();
    assert_ne!(first.id, second.id);
}

#[test]
fn save_with_existing_identity_overwrites_without_duplicating() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    let mut record = occurrence(1, 4000, 1000.0);
    adapter.save(&mut record).unwrap();
    let assigned = record.id;

    record.is_read = true;
    record.alert_id = 4005;
    adapter.save(&mut record).unwrap();
    assert_eq!(record.id, assigned, "replace keeps the identity");

    assert_eq!(adapter.count("1 = 1", &[]).unwrap(), 1);
    let reloaded = adapter
        .load_multi("id = ?", &[Value::Int(assigned)])
        .unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded[0].is_read);
    assert_eq!(reloaded[0].alert_id, 4005);
}

#[test]
fn save_then_load_roundtrips_every_column() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    let mut record = Occurrence {
        id: 0,
        site_id: 7,
        alert_id: 4002,
        created_on: 1700000000.25,
        is_read: true,
        is_migrated: true,
    };
    adapter.save(&mut record).unwrap();

    let row = adapter
        .load("id = ?", &[Value::Int(record.id)])
        .unwrap()
        .expect("saved row must load");
    let hydrated = <Occurrence as vigil_core::Record>::from_row(&row).unwrap();
    assert_eq!(hydrated, record);
}

#[test]
fn structured_metadata_roundtrips_by_value() {
    let db = setup_db();
    let adapter = RecordAdapter::<Metadata>::new(db).unwrap();

    let mut record = Metadata {
        id: 0,
        occurrence_id: 3,
        name: "EventContext".to_string(),
        value: json!({"ip": "10.0.0.1", "ports": [80, 443]}),
    };
    adapter.save(&mut record).unwrap();

    let reloaded = adapter
        .load_multi("occurrence_id = ?", &[Value::Int(3)])
        .unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].value, record.value);
}

#[test]
fn load_returns_the_raw_unhydrated_row() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    let mut record = occurrence(2, 4000, 5.0);
    adapter.save(&mut record).unwrap();

    let row = adapter
        .load("site_id = ?", &[Value::Int(2)])
        .unwrap()
        .unwrap();
    assert_eq!(row.get_i64("site_id").unwrap(), 2);

    assert!(adapter
        .load("site_id = ?", &[Value::Int(99)])
        .unwrap()
        .is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// COUNT / ITERATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn count_agrees_with_load_multi() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    for i in 0..10 {
        let mut record = occurrence(i % 2, 4000 + i, i as f64);
        adapter.save(&mut record).unwrap();
    }

    for (cond, args) in [
        ("1 = 1", Vec::new()),
        ("site_id = ?", vec![Value::Int(0)]),
        ("alert_id > ?", vec![Value::Int(4006)]),
        ("site_id = ?", vec![Value::Int(42)]),
    ] {
        let counted = adapter.count(cond, &args).unwrap();
        let loaded = adapter.load_multi(cond, &args).unwrap();
        assert_eq!(counted as usize, loaded.len(), "condition: {cond}");
    }
}

#[test]
fn for_each_visits_every_row_in_load_multi_order() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    for i in 0..5 {
        let mut record = occurrence(1, 4000 + i, (10 - i) as f64);
        adapter.save(&mut record).unwrap();
    }

    let loaded = adapter.load_multi("site_id = ?", &[Value::Int(1)]).unwrap();
    let mut streamed = Vec::new();
    adapter
        .load_and_call_for_each("site_id = ?", &[Value::Int(1)], |record| {
            streamed.push(record);
            Ok(())
        })
        .unwrap();
    assert_eq!(streamed, loaded);
}

#[test]
fn for_each_callback_error_stops_iteration() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    for i in 0..4 {
        let mut record = occurrence(1, i, 0.0);
        adapter.save(&mut record).unwrap();
    }

    let mut visited = 0;
    let result = adapter.load_and_call_for_each("site_id = ?", &[Value::Int(1)], |_| {
        visited += 1;
        if visited == 2 {
            Err(vigil_core::StoreError::Config("stop".to_string()))
        } else {
            Ok(())
        }
    });
    assert!(result.is_err());
    assert_eq!(visited, 2);
}

#[test]
fn load_multi_from_query_runs_a_full_statement() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    for i in 0..3 {
        let mut record = occurrence(i, 4000, i as f64);
        adapter.save(&mut record).unwrap();
    }

    let loaded = adapter
        .load_multi_from_query(
            "SELECT * FROM vigil_occurrences ORDER BY created_on DESC",
            &[],
        )
        .unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].created_on, 2.0);

    let counted = adapter
        .count_from_query(
            "SELECT COUNT(*) FROM vigil_occurrences WHERE site_id > ?",
            &[Value::Int(0)],
        )
        .unwrap();
    assert_eq!(counted, 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// DELETE / RETENTION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn delete_removes_by_identity() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    let mut keep = occurrence(1, 4000, 1.0);
    let mut doomed = occurrence(1, 4001, 2.0);
    adapter.save(&mut keep).unwrap();
    adapter.save(&mut doomed).unwrap();

    assert_eq!(adapter.delete(&doomed).unwrap(), 1);
    assert_eq!(adapter.count("1 = 1", &[]).unwrap(), 1);
    assert_eq!(adapter.delete(&doomed).unwrap(), 0, "already gone");
}

#[test]
fn delete_by_query_supports_the_literal_escape_hatch() {
    let db = setup_db();
    let adapter = RecordAdapter::<Occurrence>::new(db).unwrap();

    for i in 0..4 {
        let mut record = occurrence(i % 2, 4000, i as f64);
        adapter.save(&mut record).unwrap();
    }

    let removed = adapter
        .delete_by_query("DELETE FROM vigil_occurrences WHERE site_id = 0", &[])
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(adapter.count("1 = 1", &[]).unwrap(), 2);
}

#[test]
fn retention_prunes_old_occurrences_and_their_metadata() {
    let db = setup_db();
    let occurrences = RecordAdapter::<Occurrence>::new(Arc::clone(&db)).unwrap();
    let metadata = RecordAdapter::<Metadata>::new(Arc::clone(&db)).unwrap();

    let mut old = occurrence(1, 4000, 100.0);
    let mut recent = occurrence(1, 4001, 900.0);
    occurrences.save(&mut old).unwrap();
    occurrences.save(&mut recent).unwrap();
    for occurrence_id in [old.id, recent.id] {
        let mut meta = Metadata {
            id: 0,
            occurrence_id,
            name: "ClientIP".to_string(),
            value: json!("127.0.0.1"),
        };
        metadata.save(&mut meta).unwrap();
    }

    assert_eq!(apply_retention(&db, 500.0).unwrap(), 1);
    assert_eq!(occurrences.count("1 = 1", &[]).unwrap(), 1);
    assert_eq!(
        metadata.count("occurrence_id = ?", &[Value::Int(old.id)]).unwrap(),
        0
    );
    assert_eq!(
        metadata
            .count("occurrence_id = ?", &[Value::Int(recent.id)])
            .unwrap(),
        1
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// FILE-BACKED POOL
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn file_backed_pool_reads_see_committed_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vigil.db");
    let db: Arc<dyn Database> =
        Arc::new(SqliteDatabase::open(&path, &StoreConfig::default()).unwrap());

    db.execute(
        "CREATE TABLE vigil_occurrences (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            site_id INTEGER NOT NULL,
            alert_id INTEGER NOT NULL,
            created_on REAL NOT NULL,
            is_read INTEGER NOT NULL,
            is_migrated INTEGER NOT NULL
        )",
    )
    .unwrap();

    let adapter = RecordAdapter::<Occurrence>::new(Arc::clone(&db)).unwrap();
    for i in 0..6 {
        let mut record = occurrence(1, 4000 + i, i as f64);
        adapter.save(&mut record).unwrap();
    }

    // More reads than readers, so the round-robin wraps.
    for _ in 0..5 {
        assert_eq!(adapter.count("site_id = ?", &[Value::Int(1)]).unwrap(), 6);
    }
}
