//! Maintenance operations: sync, status, deletes, purge and export.
//!
//! Routine deletes remove the primary copy and keep the backup. Backups are
//! only removed when the caller asks for it explicitly.

use std::path::{Path, PathBuf};

use beastvault_catalog::{CatalogEntry, FileRecord};
use beastvault_db::{
    self as db, delete_entry_cascade, delete_file_cascade, get_entry, get_file, list_files,
    OperationError, PurgeStats,
};
use beastvault_lib::{hash_file, ContentStore, StoreError};
use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("Entry {0} not found")]
    NotFound(i64),
    #[error(
        "Expected {expected} file(s) but found {found} ({primary} primary + {backup} backup); \
         re-check and try again"
    )]
    FileCountMismatch {
        expected: usize,
        found: usize,
        primary: usize,
        backup: usize,
    },
    #[error("Database error: {0}")]
    Db(#[from] OperationError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

fn entry_label(entry: &CatalogEntry) -> String {
    entry
        .attributes
        .nickname
        .clone()
        .unwrap_or_else(|| format!("Species #{}", entry.attributes.species_id))
}

fn require_entry(conn: &Connection, entry_id: i64) -> Result<CatalogEntry, MaintenanceError> {
    get_entry(conn, entry_id)?.ok_or(MaintenanceError::NotFound(entry_id))
}

fn require_file(conn: &Connection, entry: &CatalogEntry) -> Result<FileRecord, MaintenanceError> {
    get_file(conn, entry.file_id)?.ok_or(MaintenanceError::NotFound(entry.id))
}

// ── Sync ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct SyncResult {
    pub total_files: usize,
    /// Display names of removed file records.
    pub removed_files: Vec<String>,
    /// Labels of removed entries.
    pub removed_entries: Vec<String>,
    pub valid_files: usize,
}

impl SyncResult {
    pub fn summary(&self) -> String {
        format!(
            "Removed {} orphaned file(s) and {} entr{}. {} file(s) remain valid.",
            self.removed_files.len(),
            self.removed_entries.len(),
            if self.removed_entries.len() == 1 { "y" } else { "ies" },
            self.valid_files
        )
    }
}

/// Remove every record whose primary copy no longer exists on disk.
pub fn sync(conn: &Connection, store: &ContentStore) -> Result<SyncResult, MaintenanceError> {
    let _guard = store.exclusive()?;
    let files = list_files(conn)?;
    let mut result = SyncResult {
        total_files: files.len(),
        ..Default::default()
    };

    for file in files {
        if Path::new(&file.primary_path).is_file() {
            result.valid_files += 1;
            continue;
        }
        let entry = db::entry_for_file(conn, file.id)?;
        delete_file_cascade(conn, file.id)?;
        log::info!(
            "Removed orphaned record {} (path: {})",
            file.display_name,
            file.primary_path
        );
        if let Some(entry) = entry {
            result.removed_entries.push(entry_label(&entry));
        }
        result.removed_files.push(file.display_name);
    }
    Ok(result)
}

// ── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MaintenanceStatus {
    pub entries: i64,
    pub files: i64,
    pub backup_files: usize,
    pub backup_dir: PathBuf,
    /// Records whose primary copy is missing.
    pub orphaned: Vec<FileRecord>,
}

impl MaintenanceStatus {
    pub fn is_in_sync(&self) -> bool {
        self.orphaned.is_empty()
    }
}

pub fn status(
    conn: &Connection,
    store: &ContentStore,
) -> Result<MaintenanceStatus, MaintenanceError> {
    let stats = db::catalog_stats(conn)?;
    let orphaned = list_files(conn)?
        .into_iter()
        .filter(|f| !Path::new(&f.primary_path).is_file())
        .collect();
    Ok(MaintenanceStatus {
        entries: stats.entries,
        files: stats.files,
        backup_files: store.backup_files().len(),
        backup_dir: store.backup_dir(),
        orphaned,
    })
}

// ── Duplicates ──────────────────────────────────────────────────────────────

/// Every record and physical file holding the same content as one entry.
#[derive(Debug, Clone)]
pub struct DuplicateInfo {
    pub entry_id: i64,
    pub label: String,
    pub content_hash: String,
    pub file_ids: Vec<i64>,
    pub primary_paths: Vec<PathBuf>,
    pub backup_paths: Vec<PathBuf>,
}

impl DuplicateInfo {
    pub fn is_in_backup(&self) -> bool {
        !self.backup_paths.is_empty()
    }
}

pub fn find_duplicates(
    conn: &Connection,
    store: &ContentStore,
    entry_id: i64,
) -> Result<DuplicateInfo, MaintenanceError> {
    let entry = require_entry(conn, entry_id)?;
    let file = require_file(conn, &entry)?;

    let file_ids = list_files(conn)?
        .into_iter()
        .filter(|f| f.content_hash == file.content_hash)
        .map(|f| f.id)
        .collect();

    let matches = |paths: Vec<PathBuf>| -> Vec<PathBuf> {
        paths
            .into_iter()
            .filter(|p| match hash_file(p) {
                Ok(h) => h == file.content_hash,
                Err(e) => {
                    log::warn!("Could not read {}: {}", p.display(), e);
                    false
                }
            })
            .collect()
    };

    Ok(DuplicateInfo {
        entry_id,
        label: entry_label(&entry),
        content_hash: file.content_hash.clone(),
        file_ids,
        primary_paths: matches(store.primary_files().files),
        backup_paths: matches(store.backup_files()),
    })
}

// ── Deletes ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub entry_id: i64,
    pub file_name: String,
    pub file_deleted: bool,
    pub backup_deleted: bool,
}

/// Delete one entry, its attribute rows, its file record and its primary
/// copy. The backup copy is removed only with `include_backup`.
pub fn delete_entry(
    conn: &Connection,
    store: &ContentStore,
    entry_id: i64,
    include_backup: bool,
) -> Result<DeleteOutcome, MaintenanceError> {
    let _guard = store.exclusive()?;
    require_entry(conn, entry_id)?;
    let file = delete_entry_cascade(conn, entry_id)?;

    let file_deleted = match store.delete(Path::new(&file.primary_path)) {
        Ok(removed) => removed,
        Err(e) => {
            log::warn!("Could not delete {}: {}", file.primary_path, e);
            false
        }
    };

    let mut backup_deleted = false;
    if include_backup {
        if let Some(backup) = store.find_backup(&file.content_hash, &file.format_tag, None)? {
            backup_deleted = store.delete_backup_file(&backup)?;
        }
    }

    Ok(DeleteOutcome {
        entry_id,
        file_name: file.display_name,
        file_deleted,
        backup_deleted,
    })
}

#[derive(Debug, Default, Clone)]
pub struct TotalDeletion {
    pub deleted_records: usize,
    pub deleted_paths: Vec<PathBuf>,
    pub preserved_backups: Vec<PathBuf>,
    pub errors: Vec<String>,
}

/// Delete an entry's content everywhere: every record with its hash and
/// every physical copy (backups only with `include_backup`).
///
/// `expected_files` must equal the number of physical files that would be
/// removed, as reported by [`find_duplicates`]; otherwise nothing is done.
pub fn delete_total(
    conn: &Connection,
    store: &ContentStore,
    entry_id: i64,
    expected_files: usize,
    include_backup: bool,
) -> Result<TotalDeletion, MaintenanceError> {
    let _guard = store.exclusive()?;
    let info = find_duplicates(conn, store, entry_id)?;

    let primary = info.primary_paths.len();
    let backup = info.backup_paths.len();
    let found = primary + if include_backup { backup } else { 0 };
    if found != expected_files {
        return Err(MaintenanceError::FileCountMismatch {
            expected: expected_files,
            found,
            primary,
            backup,
        });
    }

    let mut result = TotalDeletion::default();
    for file_id in &info.file_ids {
        delete_file_cascade(conn, *file_id)?;
        result.deleted_records += 1;
    }

    for path in info.primary_paths {
        match store.delete(&path) {
            Ok(_) => result.deleted_paths.push(path),
            Err(e) => result.errors.push(e.to_string()),
        }
    }
    for path in info.backup_paths {
        if !include_backup {
            result.preserved_backups.push(path);
            continue;
        }
        match store.delete_backup_file(&path) {
            Ok(_) => result.deleted_paths.push(path),
            Err(e) => result.errors.push(e.to_string()),
        }
    }
    Ok(result)
}

// ── Purge ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct PurgeReport {
    pub rows: PurgeStats,
    pub backups_removed: usize,
}

/// Empty the catalog. Files under the root stay where they are (a later
/// scan re-imports them); the backup tree is cleared only with
/// `include_backup`.
pub fn purge(
    conn: &Connection,
    store: &ContentStore,
    include_backup: bool,
) -> Result<PurgeReport, MaintenanceError> {
    let _guard = store.exclusive()?;
    let rows = db::purge_all(conn)?;
    let backups_removed = if include_backup {
        store.purge_backups()?
    } else {
        0
    };
    Ok(PurgeReport {
        rows,
        backups_removed,
    })
}

// ── Export ──────────────────────────────────────────────────────────────────

/// Copy an entry's bytes to `dest` (a file path, or a directory to place the
/// stored file name in). Falls back to the backup copy when the primary is
/// gone. Returns the written path.
pub fn export_entry(
    conn: &Connection,
    store: &ContentStore,
    entry_id: i64,
    dest: &Path,
) -> Result<PathBuf, MaintenanceError> {
    let entry = require_entry(conn, entry_id)?;
    let file = require_file(conn, &entry)?;

    let primary = PathBuf::from(&file.primary_path);
    let source = if primary.is_file() {
        primary
    } else {
        store
            .find_backup(&file.content_hash, &file.format_tag, None)?
            .ok_or_else(|| StoreError::Io {
                path: primary.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no stored copy"),
            })?
    };

    let target = if dest.is_dir() {
        dest.join(&file.display_name)
    } else {
        dest.to_path_buf()
    };
    let bytes = store.read(&source)?;
    std::fs::write(&target, bytes).map_err(|source| StoreError::Io {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}
