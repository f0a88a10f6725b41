use std::fs;
use std::path::PathBuf;

use beastvault_catalog::ReferenceTables;
use beastvault_db::{catalog_stats, get_file, list_files, open_memory};
use beastvault_import::*;
use beastvault_lib::ContentStore;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 17, 12, 0, 0).unwrap()
}

fn entry_json(species: i32, nickname: &str) -> Vec<u8> {
    format!(
        r#"{{"species": {species}, "nickname": "{nickname}",
            "ivs": [31,31,31,31,31,31], "evs": [0,0,0,0,0,0], "stats": [20,11,11,13,13,11],
            "moves": [{{"id": 33, "pp": 35}}], "relearn_moves": [45]}}"#
    )
    .into_bytes()
}

struct Fixture {
    tmp: TempDir,
    conn: Connection,
    store: ContentStore,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let store = ContentStore::open(tmp.path().join("vault")).unwrap();
        Self {
            tmp,
            conn: open_memory().unwrap(),
            store,
        }
    }

    /// Import and return (entry id, primary path).
    fn import(&self, name: &str, bytes: Vec<u8>) -> (i64, PathBuf) {
        let tables = ReferenceTables::new();
        let report = IngestionPipeline::new(&self.conn, &self.store, &JsonEntryParser, &tables)
            .ingest_at(vec![IngestItem::upload(name, bytes)], now(), &SilentProgress)
            .unwrap();
        let item = &report.items[0];
        match item.status {
            ItemStatus::Imported { entry_id, .. } => (entry_id, item.path.clone().unwrap()),
            ref other => panic!("expected import, got {other:?}"),
        }
    }
}

#[test]
fn sync_removes_only_records_with_missing_primary() {
    let fx = Fixture::new();
    let (_, gone) = fx.import("a.pk9", entry_json(1, "Gone"));
    fx.import("b.pk9", entry_json(2, "Kept"));
    fs::remove_file(&gone).unwrap();

    let before = status(&fx.conn, &fx.store).unwrap();
    assert_eq!(before.orphaned.len(), 1);
    assert!(!before.is_in_sync());

    let result = sync(&fx.conn, &fx.store).unwrap();
    assert_eq!(result.total_files, 2);
    assert_eq!(result.valid_files, 1);
    assert_eq!(result.removed_entries, vec!["Gone".to_string()]);

    let stats = catalog_stats(&fx.conn).unwrap();
    assert_eq!((stats.files, stats.entries, stats.orphaned_rows), (1, 1, 0));
    assert!(status(&fx.conn, &fx.store).unwrap().is_in_sync());
    assert_eq!(fx.store.backup_files().len(), 2);
}

#[test]
fn delete_keeps_backup_unless_asked() {
    let fx = Fixture::new();
    let (keep_backup, keep_path) = fx.import("a.pk9", entry_json(1, "A"));
    let (drop_backup, _) = fx.import("b.pk9", entry_json(2, "B"));

    let outcome = delete_entry(&fx.conn, &fx.store, keep_backup, false).unwrap();
    assert!(outcome.file_deleted);
    assert!(!outcome.backup_deleted);
    assert!(!keep_path.exists());
    assert_eq!(fx.store.backup_files().len(), 2);

    let outcome = delete_entry(&fx.conn, &fx.store, drop_backup, true).unwrap();
    assert!(outcome.backup_deleted);
    assert_eq!(fx.store.backup_files().len(), 1);

    let stats = catalog_stats(&fx.conn).unwrap();
    assert_eq!(
        (stats.files, stats.entries, stats.stats_rows, stats.move_rows, stats.relearn_rows),
        (0, 0, 0, 0, 0)
    );
}

#[test]
fn delete_of_unknown_entry_is_not_found() {
    let fx = Fixture::new();
    assert!(matches!(
        delete_entry(&fx.conn, &fx.store, 42, false),
        Err(MaintenanceError::NotFound(42))
    ));
}

#[test]
fn delete_of_already_missing_primary_still_succeeds() {
    let fx = Fixture::new();
    let (id, path) = fx.import("a.pk9", entry_json(1, "A"));
    fs::remove_file(&path).unwrap();
    let outcome = delete_entry(&fx.conn, &fx.store, id, false).unwrap();
    assert!(!outcome.file_deleted);
    assert!(list_files(&fx.conn).unwrap().is_empty());
}

#[test]
fn total_delete_checks_expected_count() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Copy");
    let (id, primary) = fx.import("a.pk9", bytes.clone());
    let loose = fx.store.root().join("loose.pk9");
    fs::write(&loose, &bytes).unwrap();

    let info = find_duplicates(&fx.conn, &fx.store, id).unwrap();
    assert_eq!(info.primary_paths.len(), 2);
    assert_eq!(info.backup_paths.len(), 1);
    assert!(info.is_in_backup());

    let err = delete_total(&fx.conn, &fx.store, id, 2, true).unwrap_err();
    assert!(matches!(
        err,
        MaintenanceError::FileCountMismatch {
            expected: 2,
            found: 3,
            ..
        }
    ));
    assert!(primary.exists() && loose.exists());

    let result = delete_total(&fx.conn, &fx.store, id, 2, false).unwrap();
    assert_eq!(result.deleted_records, 1);
    assert_eq!(result.deleted_paths.len(), 2);
    assert_eq!(result.preserved_backups.len(), 1);
    assert!(!primary.exists() && !loose.exists());
    assert!(list_files(&fx.conn).unwrap().is_empty());
}

#[test]
fn purge_empties_catalog_and_optionally_backups() {
    let fx = Fixture::new();
    fx.import("a.pk9", entry_json(1, "A"));
    fx.import("b.pk9", entry_json(2, "B"));

    let report = purge(&fx.conn, &fx.store, false).unwrap();
    assert_eq!((report.rows.files, report.rows.entries), (2, 2));
    assert_eq!(report.rows.attribute_rows, 6);
    assert_eq!(report.backups_removed, 0);
    assert_eq!(fx.store.backup_files().len(), 2);

    let (id, _) = fx.import("c.pk9", entry_json(3, "C"));
    assert!(id > 2);

    let report = purge(&fx.conn, &fx.store, true).unwrap();
    assert_eq!(report.backups_removed, 3);
    assert!(fx.store.backup_files().is_empty());
}

#[test]
fn export_falls_back_to_backup() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Out");
    let (id, primary) = fx.import("a.pk9", bytes.clone());
    let out_dir = fx.tmp.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();

    let written = export_entry(&fx.conn, &fx.store, id, &out_dir).unwrap();
    assert_eq!(fs::read(&written).unwrap(), bytes);

    fs::remove_file(&primary).unwrap();
    let target = out_dir.join("again.pk9");
    export_entry(&fx.conn, &fx.store, id, &target).unwrap();
    assert_eq!(fs::read(&target).unwrap(), bytes);

    let file_id = beastvault_db::get_entry(&fx.conn, id).unwrap().unwrap().file_id;
    assert!(get_file(&fx.conn, file_id).unwrap().is_some());
}
