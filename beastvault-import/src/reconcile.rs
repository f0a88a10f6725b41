//! Reconcile the catalog with the files under the library root.
//!
//! A scan hashes every eligible file outside the backup tree, removes the
//! records whose content is no longer present, then ingests new content in
//! place. Only one scan runs at a time, and never alongside an ingestion
//! batch on the same store. A scan that could not read the whole tree
//! keeps every record it did not see.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use beastvault_catalog::{FileRecord, ReferenceTables};
use beastvault_db::{delete_file_cascade, list_files, relocate_file, OperationError};
use beastvault_lib::{entry_extension, hash_file, ContentStore, StoreError, TreeListing};
use chrono::{DateTime, Local, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::ingest::{IngestError, IngestItem, IngestionPipeline, ItemStatus};
use crate::parser::EntryParser;
use crate::progress::ImportProgress;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("A scan or import is already running on this library")]
    ScanInProgress,
    #[error("Database error: {0}")]
    Db(#[from] OperationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Statistics from a scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub files_found: usize,
    pub newly_imported: usize,
    pub already_imported: usize,
    /// Records re-pointed at identical content elsewhere in the tree.
    pub relocated: usize,
    pub deleted: usize,
    pub errors: usize,
}

/// A file the scan could not hash or import.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub stats: ScanStats,
    pub newly_imported: Vec<PathBuf>,
    pub already_imported: Vec<PathBuf>,
    /// New primary paths of records whose old copy had moved.
    pub relocated: Vec<PathBuf>,
    /// Display names of the removed file records.
    pub deleted: Vec<String>,
    /// Records missing from disk that were kept because part of the tree
    /// could not be read.
    pub unverified: usize,
    pub errors: Vec<ScanFailure>,
}

impl ScanResult {
    fn fail(&mut self, path: PathBuf, message: impl Into<String>) {
        self.errors.push(ScanFailure {
            path,
            message: message.into(),
        });
    }
}

pub struct DirectoryReconciler<'a> {
    conn: &'a Connection,
    store: &'a ContentStore,
    parser: &'a dyn EntryParser,
    tables: &'a ReferenceTables,
}

impl<'a> DirectoryReconciler<'a> {
    pub fn new(
        conn: &'a Connection,
        store: &'a ContentStore,
        parser: &'a dyn EntryParser,
        tables: &'a ReferenceTables,
    ) -> Self {
        Self {
            conn,
            store,
            parser,
            tables,
        }
    }

    pub fn scan(&self, progress: &dyn ImportProgress) -> Result<ScanResult, ReconcileError> {
        self.scan_at(Utc::now(), progress)
    }

    /// Run a scan with an explicit import time for new entries.
    ///
    /// Fails with [`ReconcileError::ScanInProgress`] instead of waiting when
    /// another scan or import, in this process or another, holds the store.
    pub fn scan_at(
        &self,
        now: DateTime<Utc>,
        progress: &dyn ImportProgress,
    ) -> Result<ScanResult, ReconcileError> {
        let _guard = self
            .store
            .try_exclusive()?
            .ok_or(ReconcileError::ScanInProgress)?;
        self.store.ensure_layout()?;
        let listing = self.store.primary_files();
        self.reconcile(listing, now, progress)
    }

    /// Align the catalog with one listing of the tree. The caller must hold
    /// the store's write guard.
    ///
    /// Records are only removed when every listed path was read; otherwise
    /// content the walk missed would look deleted.
    fn reconcile(
        &self,
        listing: TreeListing,
        now: DateTime<Utc>,
        progress: &dyn ImportProgress,
    ) -> Result<ScanResult, ReconcileError> {
        let mut result = ScanResult::default();
        for err in listing.errors {
            result.fail(self.store.root().to_path_buf(), err);
        }
        result.stats.files_found = listing.files.len();
        progress.on_phase(&format!("Hashing {} file(s)", listing.files.len()));

        // First path (in sorted order) wins for repeated content.
        let mut on_disk: BTreeMap<String, PathBuf> = BTreeMap::new();
        let mut hashed: HashMap<PathBuf, String> = HashMap::new();
        let mut unreadable: HashSet<PathBuf> = HashSet::new();
        let total = listing.files.len();
        for (i, path) in listing.files.into_iter().enumerate() {
            progress.on_item(i + 1, total, &path.display().to_string());
            match hash_file(&path) {
                Ok(hash) => {
                    hashed.insert(path.clone(), hash.clone());
                    if on_disk.contains_key(&hash) {
                        result.already_imported.push(path);
                    } else {
                        on_disk.insert(hash, path);
                    }
                }
                Err(e) => {
                    log::warn!("Could not read {}: {}", path.display(), e);
                    unreadable.insert(path.clone());
                    result.fail(path, e.to_string());
                }
            }
        }
        let complete = result.errors.is_empty();

        // Deletions first: records whose content is gone from disk.
        let records = list_files(self.conn)?;
        let mut known: HashSet<String> = HashSet::with_capacity(records.len());
        for record in records {
            let primary = PathBuf::from(&record.primary_path);
            if let Some(current) = on_disk.get(&record.content_hash) {
                let moved = match hashed.get(&primary) {
                    Some(hash) => *hash != record.content_hash,
                    None => !unreadable.contains(&primary),
                };
                if moved {
                    self.relocate(&record, current)?;
                    result.relocated.push(current.clone());
                }
                known.insert(record.content_hash);
                continue;
            }
            if !complete {
                result.unverified += 1;
                known.insert(record.content_hash);
                continue;
            }
            delete_file_cascade(self.conn, record.id)?;
            log::info!("Removed {} (no longer on disk)", record.display_name);
            result.deleted.push(record.display_name);
        }
        if result.unverified > 0 {
            log::warn!(
                "Kept {} record(s) not found on disk because the tree could not be read fully",
                result.unverified
            );
        }

        // Additions: content on disk with no record, recorded in place.
        let mut items = Vec::new();
        for (hash, path) in on_disk {
            if known.contains(&hash) {
                result.already_imported.push(path);
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => items.push(IngestItem::in_place(path, bytes)),
                Err(e) => result.fail(path, e.to_string()),
            }
        }

        if !items.is_empty() {
            progress.on_phase(&format!("Importing {} new file(s)", items.len()));
            let pipeline = IngestionPipeline::new(self.conn, self.store, self.parser, self.tables);
            let report = pipeline.ingest_locked(items, now, progress)?;
            for item in report.items {
                let path = item
                    .path
                    .unwrap_or_else(|| self.store.root().join(&item.file_name));
                match item.status {
                    ItemStatus::Imported { .. } => result.newly_imported.push(path),
                    ItemStatus::Duplicate { .. } => result.already_imported.push(path),
                    ItemStatus::Error { message } => result.fail(path, message),
                }
            }
        }

        result.already_imported.sort();
        result.stats.newly_imported = result.newly_imported.len();
        result.stats.already_imported = result.already_imported.len();
        result.stats.relocated = result.relocated.len();
        result.stats.deleted = result.deleted.len();
        result.stats.errors = result.errors.len();

        progress.on_complete(&format!(
            "Scan complete: {} new, {} already imported, {} removed, {} error(s)",
            result.stats.newly_imported,
            result.stats.already_imported,
            result.stats.deleted,
            result.stats.errors
        ));
        Ok(result)
    }

    /// Point a record whose primary copy is gone at identical content found
    /// elsewhere in the tree.
    fn relocate(&self, record: &FileRecord, current: &Path) -> Result<(), ReconcileError> {
        let display_name = current
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.display_name.clone());
        relocate_file(
            self.conn,
            record.id,
            &current.to_string_lossy(),
            &display_name,
        )?;
        log::info!(
            "Moved {} from {} to {}",
            record.display_name,
            record.primary_path,
            current.display()
        );
        Ok(())
    }
}

/// What a scan would see, without touching the catalog.
#[derive(Debug, Clone)]
pub struct ScanStatus {
    pub root: PathBuf,
    pub exists: bool,
    pub total_files: usize,
    pub by_extension: BTreeMap<String, usize>,
    pub last_modified: Option<DateTime<Local>>,
}

pub fn scan_status(store: &ContentStore) -> ScanStatus {
    let root = store.root().to_path_buf();
    let exists = root.is_dir();
    let listing = store.primary_files();

    let mut by_extension = BTreeMap::new();
    for path in &listing.files {
        if let Some(ext) = entry_extension(path) {
            *by_extension.entry(ext).or_insert(0) += 1;
        }
    }

    let last_modified = std::fs::metadata(&root)
        .and_then(|m| m.modified())
        .ok()
        .map(|t: SystemTime| DateTime::<Local>::from(t));

    ScanStatus {
        root,
        exists,
        total_files: listing.files.len(),
        by_extension,
        last_modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonEntryParser;
    use crate::progress::SilentProgress;
    use beastvault_db::open_memory;
    use chrono::TimeZone;
    use tempfile::TempDir;

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

        fn reconcile(&self, listing: TreeListing) -> ScanResult {
            let now = Utc.with_ymd_and_hms(2025, 8, 17, 12, 0, 0).unwrap();
            DirectoryReconciler::new(&self.conn, &self.store, &JsonEntryParser, &self.tables)
                .reconcile(listing, now, &SilentProgress)
                .unwrap()
        }

        fn drop_file(&self, rel: &str, species: i32) -> PathBuf {
            let path = self.store.root().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!(r#"{{"species": {species}}}"#)).unwrap();
            path
        }
    }

    #[test]
    fn file_vanishing_before_hashing_keeps_other_records() {
        let fx = Fixture::new();
        let kept = fx.drop_file("box/kept.pk9", 1);
        let flaky = fx.drop_file("box/flaky.pk9", 4);
        fx.reconcile(fx.store.primary_files());
        assert_eq!(list_files(&fx.conn).unwrap().len(), 2);

        // Listed, then gone by the time it is hashed; the other record's
        // file is also gone but must not be judged from a partial read.
        let listing = fx.store.primary_files();
        std::fs::remove_file(&flaky).unwrap();
        std::fs::remove_file(&kept).unwrap();
        let result = fx.reconcile(listing);

        assert_eq!(result.stats.errors, 2);
        assert!(result.deleted.is_empty());
        assert_eq!(result.unverified, 2);
        assert_eq!(list_files(&fx.conn).unwrap().len(), 2);
    }

    #[test]
    fn walk_errors_suspend_removals() {
        let fx = Fixture::new();
        fx.drop_file("a.pk9", 25);
        fx.reconcile(fx.store.primary_files());

        let result = fx.reconcile(TreeListing {
            files: Vec::new(),
            errors: vec!["IO error for operation on box: Permission denied".into()],
        });
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.stats.deleted, 0);
        assert_eq!(result.unverified, 1);
        assert_eq!(list_files(&fx.conn).unwrap().len(), 1);
    }

    #[test]
    fn complete_listing_still_removes_missing_content() {
        let fx = Fixture::new();
        let gone = fx.drop_file("gone.pk9", 7);
        fx.reconcile(fx.store.primary_files());

        std::fs::remove_file(&gone).unwrap();
        let result = fx.reconcile(fx.store.primary_files());
        assert_eq!(result.deleted, vec!["gone.pk9".to_string()]);
        assert_eq!(result.unverified, 0);
        assert!(list_files(&fx.conn).unwrap().is_empty());
    }
}
