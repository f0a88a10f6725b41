use std::fs;

use beastvault_catalog::ReferenceTables;
use beastvault_db::{catalog_stats, find_file_by_hash, list_files, open_database, open_memory};
use beastvault_import::*;
use beastvault_lib::{sha256_hex, ContentStore};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 17, 12, 0, 0).unwrap()
}

fn entry_json(species: i32, nickname: &str) -> Vec<u8> {
    format!(r#"{{"species": {species}, "nickname": "{nickname}"}}"#).into_bytes()
}

struct Fixture {
    _tmp: TempDir,
    conn: Connection,
    store: ContentStore,
    tables: ReferenceTables,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let store = ContentStore::open(tmp.path().join("vault")).unwrap();
        Self {
            _tmp: tmp,
            conn: open_memory().unwrap(),
            store,
            tables: ReferenceTables::new(),
        }
    }

    fn scan(&self) -> ScanResult {
        self.try_scan().unwrap()
    }

    fn try_scan(&self) -> Result<ScanResult, ReconcileError> {
        DirectoryReconciler::new(&self.conn, &self.store, &JsonEntryParser, &self.tables)
            .scan_at(now(), &SilentProgress)
    }

    fn import(&self, name: &str, bytes: Vec<u8>) -> ItemStatus {
        IngestionPipeline::new(&self.conn, &self.store, &JsonEntryParser, &self.tables)
            .ingest_at(vec![IngestItem::upload(name, bytes)], now(), &SilentProgress)
            .unwrap()
            .items
            .remove(0)
            .status
    }

    fn drop_file(&self, rel: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = self.store.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }
}

#[test]
fn scan_records_new_files_in_place() {
    let fx = Fixture::new();
    let path = fx.drop_file("box1/pika.pk9", &entry_json(25, "Sparky"));

    let result = fx.scan();
    assert_eq!(result.newly_imported, vec![path.clone()]);
    assert_eq!(result.stats.files_found, 1);

    let record = find_file_by_hash(&fx.conn, &sha256_hex(&fs::read(&path).unwrap()))
        .unwrap()
        .unwrap();
    assert_eq!(record.primary_path, path.to_string_lossy());
    assert_eq!(record.display_name, "pika.pk9");
    // No extra primary copy; one backup copy.
    assert_eq!(fx.store.primary_files().files, vec![path]);
    assert_eq!(fx.store.backup_files().len(), 1);
}

#[test]
fn second_scan_without_changes_does_nothing() {
    let fx = Fixture::new();
    fx.drop_file("a.pk9", &entry_json(25, "A"));
    fx.drop_file("b.pk8", &entry_json(26, "B"));
    fx.scan();

    let again = fx.scan();
    assert_eq!(again.stats.newly_imported, 0);
    assert_eq!(again.stats.deleted, 0);
    assert_eq!(again.stats.already_imported, 2);
}

#[test]
fn repeated_content_in_tree_is_recorded_once() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Twin");
    let first = fx.drop_file("a/twin.pk9", &bytes);
    let second = fx.drop_file("b/twin.pk9", &bytes);

    let result = fx.scan();
    assert_eq!(result.newly_imported, vec![first]);
    assert_eq!(result.already_imported, vec![second]);
    assert_eq!(list_files(&fx.conn).unwrap().len(), 1);
}

#[test]
fn removed_file_drops_its_record_but_not_its_backup() {
    let fx = Fixture::new();
    let path = fx.drop_file("gone.pk9", &entry_json(4, "Flame"));
    fx.drop_file("stays.pk9", &entry_json(7, "Shell"));
    fx.scan();

    fs::remove_file(&path).unwrap();
    let result = fx.scan();
    assert_eq!(result.deleted, vec!["gone.pk9".to_string()]);

    let stats = catalog_stats(&fx.conn).unwrap();
    assert_eq!((stats.files, stats.entries, stats.orphaned_rows), (1, 1, 0));
    assert_eq!(fx.store.backup_files().len(), 2);
}

#[test]
fn backup_tree_and_other_files_are_ignored() {
    let fx = Fixture::new();
    fx.drop_file("backup/pk9/2024/old.pk9", &entry_json(1, "Old"));
    fx.drop_file("readme.txt", b"hello");

    let result = fx.scan();
    assert_eq!(result.stats.files_found, 0);
    assert!(list_files(&fx.conn).unwrap().is_empty());
}

#[test]
fn unparseable_file_is_reported_every_scan() {
    let fx = Fixture::new();
    let bad = fx.drop_file("bad.pk9", b"\xff\xfe");

    let first = fx.scan();
    assert_eq!(first.errors.len(), 1);
    assert_eq!(first.errors[0].path, bad);

    let second = fx.scan();
    assert_eq!(second.stats.errors, 1);
    assert_eq!(second.stats.deleted, 0);
}

#[test]
fn concurrent_scan_fails_fast() {
    let fx = Fixture::new();
    let other = fx.store.clone();
    let _held = other.exclusive().unwrap();
    assert!(matches!(fx.try_scan(), Err(ReconcileError::ScanInProgress)));
}

#[test]
fn scan_fails_fast_against_a_separately_opened_store() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("vault");
    let db = tmp.path().join("catalog.db");
    let tables = ReferenceTables::new();

    let holder = ContentStore::open(root.clone()).unwrap();
    let held = holder.exclusive().unwrap();

    let store = ContentStore::open(root.clone()).unwrap();
    let conn = open_database(&db).unwrap();
    fs::write(root.join("pika.pk9"), entry_json(25, "Sparky")).unwrap();
    let scan = DirectoryReconciler::new(&conn, &store, &JsonEntryParser, &tables)
        .scan_at(now(), &SilentProgress);
    assert!(matches!(scan, Err(ReconcileError::ScanInProgress)));
    assert!(list_files(&conn).unwrap().is_empty());

    drop(held);
    let result = DirectoryReconciler::new(&conn, &store, &JsonEntryParser, &tables)
        .scan_at(now(), &SilentProgress)
        .unwrap();
    assert_eq!(result.stats.newly_imported, 1);
}

#[test]
fn moved_content_keeps_its_record_and_survives_sync() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Twin");
    let first = fx.drop_file("a/twin.pk9", &bytes);
    let second = fx.drop_file("b/copy.pk9", &bytes);
    fx.scan();
    let record = find_file_by_hash(&fx.conn, &sha256_hex(&bytes)).unwrap().unwrap();
    let entry = beastvault_db::entry_for_file(&fx.conn, record.id).unwrap().unwrap();
    beastvault_db::set_favorite(&fx.conn, entry.id, true).unwrap();

    fs::remove_file(&first).unwrap();
    let result = fx.scan();
    assert_eq!(result.relocated, vec![second.clone()]);
    assert_eq!(result.stats.deleted, 0);

    let moved = find_file_by_hash(&fx.conn, &sha256_hex(&bytes)).unwrap().unwrap();
    assert_eq!(moved.id, record.id);
    assert_eq!(moved.primary_path, second.to_string_lossy());
    assert_eq!(moved.display_name, "copy.pk9");

    let synced = sync(&fx.conn, &fx.store).unwrap();
    assert!(synced.removed_files.is_empty());
    let kept = beastvault_db::get_entry(&fx.conn, entry.id).unwrap().unwrap();
    assert!(kept.favorite);
    assert_eq!(fx.scan().stats.relocated, 0);
}

#[test]
fn delete_rescan_reimport_gets_new_id_and_reuses_backup() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "A");

    let ItemStatus::Imported { entry_id: first, .. } = fx.import("one.pk9", bytes.clone()) else {
        panic!("expected import");
    };
    assert_eq!(
        fx.import("two.pk9", bytes.clone()),
        ItemStatus::Duplicate {
            entry_id: Some(first)
        }
    );

    let record = find_file_by_hash(&fx.conn, &sha256_hex(&bytes)).unwrap().unwrap();
    fs::remove_file(&record.primary_path).unwrap();
    let result = fx.scan();
    assert_eq!(result.stats.deleted, 1);
    assert!(find_file_by_hash(&fx.conn, &sha256_hex(&bytes)).unwrap().is_none());

    let ItemStatus::Imported { entry_id: second, .. } = fx.import("one.pk9", bytes) else {
        panic!("expected import");
    };
    assert!(second > first);
    assert_eq!(fx.store.backup_files().len(), 1);
}

#[test]
fn status_counts_by_extension() {
    let fx = Fixture::new();
    fx.drop_file("a.pk9", b"1");
    fx.drop_file("b.PK9", b"2");
    fx.drop_file("c.ek8", b"3");
    fx.drop_file("backup/pk9/2025/d.pk9", b"4");

    let status = scan_status(&fx.store);
    assert!(status.exists);
    assert_eq!(status.total_files, 3);
    assert_eq!(status.by_extension.get("pk9"), Some(&2));
    assert_eq!(status.by_extension.get("ek8"), Some(&1));
    assert!(status.last_modified.is_some());
}
