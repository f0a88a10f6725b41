use beastvault_catalog::ReferenceTables;
use beastvault_db::{catalog_stats, find_file_by_hash, list_files, open_memory};
use beastvault_import::*;
use beastvault_lib::{sha256_hex, ContentStore};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 17, 12, 0, 0).unwrap()
}

fn entry_json(species: i32, nickname: &str) -> Vec<u8> {
    format!(r#"{{"species": {species}, "nickname": "{nickname}", "level": 5}}"#).into_bytes()
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

    fn ingest(&self, items: Vec<IngestItem>) -> Result<IngestReport, IngestError> {
        IngestionPipeline::new(&self.conn, &self.store, &JsonEntryParser, &self.tables)
            .ingest_at(items, now(), &SilentProgress)
    }

    fn statuses(&self, items: Vec<IngestItem>) -> Vec<ItemStatus> {
        self.ingest(items)
            .unwrap()
            .items
            .into_iter()
            .map(|i| i.status)
            .collect()
    }
}

#[test]
fn second_import_of_same_bytes_is_duplicate() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Sparky");

    let first = fx.statuses(vec![IngestItem::upload("a.pk9", bytes.clone())]);
    let ItemStatus::Imported { entry_id, .. } = first[0] else {
        panic!("expected import, got {:?}", first[0]);
    };

    let second = fx.statuses(vec![IngestItem::upload("renamed.pk9", bytes.clone())]);
    assert_eq!(
        second,
        vec![ItemStatus::Duplicate {
            entry_id: Some(entry_id)
        }]
    );

    assert_eq!(list_files(&fx.conn).unwrap().len(), 1);
    assert_eq!(fx.store.primary_files().files.len(), 1);
    assert_eq!(fx.store.backup_files().len(), 1);
}

#[test]
fn duplicates_inside_one_batch_resolve_to_first() {
    let fx = Fixture::new();
    let bytes = entry_json(1, "Sprout");
    let statuses = fx.statuses(vec![
        IngestItem::upload("a.pk8", bytes.clone()),
        IngestItem::upload("b.pk8", bytes),
    ]);
    let ItemStatus::Imported { entry_id, .. } = statuses[0] else {
        panic!("expected import");
    };
    assert_eq!(
        statuses[1],
        ItemStatus::Duplicate {
            entry_id: Some(entry_id)
        }
    );
}

#[test]
fn imported_file_is_stored_and_recorded() {
    let fx = Fixture::new();
    let bytes = entry_json(25, "Mr. Sparky");
    let report = fx.ingest(vec![IngestItem::upload("0025 - Pikachu.PK9", bytes.clone())]).unwrap();
    let item = &report.items[0];

    let hash = sha256_hex(&bytes);
    let record = find_file_by_hash(&fx.conn, &hash).unwrap().unwrap();
    assert_eq!(record.format_tag, "pk9");
    assert_eq!(record.original_name.as_deref(), Some("0025 - Pikachu.PK9"));
    assert_eq!(record.imported_at, now().to_rfc3339());
    assert!(record.display_name.starts_with("Mr._Sparky_"));
    assert_eq!(item.path.as_deref(), Some(std::path::Path::new(&record.primary_path)));
    assert_eq!(std::fs::read(&record.primary_path).unwrap(), bytes);
    assert!(
        fx.store
            .backup_dir()
            .join("pk9")
            .join("2025")
            .join("0025 - Pikachu.PK9")
            .is_file()
    );
}

#[test]
fn failures_are_per_item_and_leave_nothing_behind() {
    let fx = Fixture::new();
    let report = fx
        .ingest(vec![
            IngestItem::upload("empty.pk9", Vec::new()),
            IngestItem::upload("garbage.pk9", b"\x00\x01\x02".to_vec()),
            IngestItem::upload("notes.txt", entry_json(4, "Flame")),
            IngestItem::upload("ok.pk9", entry_json(6, "Blaze")),
        ])
        .unwrap();

    let labels: Vec<&str> = report.items.iter().map(|i| i.status.label()).collect();
    assert_eq!(labels, vec!["error", "error", "error", "imported"]);
    assert_eq!(
        report.items[0].status,
        ItemStatus::Error {
            message: "empty file".into()
        }
    );
    assert_eq!(report.errors(), 3);
    assert_eq!(report.imported(), 1);

    let stats = catalog_stats(&fx.conn).unwrap();
    assert_eq!((stats.files, stats.entries), (1, 1));
    assert_eq!(fx.store.primary_files().files.len(), 1);
    assert_eq!(fx.store.backup_files().len(), 1);
}

#[test]
fn persistence_failure_aborts_batch_and_rerun_is_idempotent() {
    let fx = Fixture::new();
    fx.conn
        .execute_batch(
            "CREATE TRIGGER reject_999 BEFORE INSERT ON entries
             WHEN NEW.species_id = 999
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

    let items = vec![
        IngestItem::upload("a.pk9", entry_json(25, "A")),
        IngestItem::upload("b.pk9", entry_json(999, "B")),
        IngestItem::upload("c.pk9", entry_json(26, "C")),
    ];

    let err = fx.ingest(items.clone()).unwrap_err();
    let IngestError::BatchAborted {
        report, file_name, ..
    } = err
    else {
        panic!("expected IngestError::BatchAborted");
    };
    assert_eq!(file_name, "b.pk9");
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.imported(), 1);

    // The failed item's insert rolled back and its copy was removed.
    assert_eq!(list_files(&fx.conn).unwrap().len(), 1);
    assert_eq!(fx.store.primary_files().files.len(), 1);

    fx.conn.execute_batch("DROP TRIGGER reject_999").unwrap();
    let rerun = fx.ingest(items).unwrap();
    let labels: Vec<&str> = rerun.items.iter().map(|i| i.status.label()).collect();
    assert_eq!(labels, vec!["duplicate", "imported", "imported"]);
    assert_eq!(list_files(&fx.conn).unwrap().len(), 3);
}
