//! Content-addressed file store for primary and backup copies.
//!
//! Layout under the library root:
//!
//! ```text
//! root/
//!   Pikachu_3fa9c1d2.pk9          primary copies, one per import
//!   ...
//!   backup/
//!     pk9/
//!       2025/
//!         0025 - Pikachu.pk9      backups, deduplicated by content per partition
//! ```
//!
//! Primary copies are named from a sanitized name hint plus a short hash
//! prefix. Backups keep the uploader's file name and are never removed by
//! routine deletes; only [`ContentStore::purge_backups`] clears them.
//!
//! Writers serialize on `<root>/.beastvault.lock`, so two processes opening
//! the same root exclude each other as well as clones within one process.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use chrono::Datelike;
use fs4::FileExt;
use thiserror::Error;
use walkdir::WalkDir;

use crate::formats::is_entry_file;
use crate::hasher::{hash_file, sha256_hex, short_hash};
use crate::util::{sanitize_name, DEFAULT_NAME};

/// Name of the excluded backup subtree directly under the root.
pub const BACKUP_DIR_NAME: &str = "backup";

/// Lock file directly under the root, held by whichever writer owns the store.
pub const LOCK_FILE_NAME: &str = ".beastvault.lock";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Refusing to delete backup file through a primary delete: {0}")]
    BackupProtected(PathBuf),
    #[error("Not a backup file: {0}")]
    NotInBackup(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Result of [`ContentStore::save_backup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new backup file was written.
    Written(PathBuf),
    /// A byte-identical file already existed in the partition.
    Existing(PathBuf),
}

impl BackupOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Written(p) | Self::Existing(p) => p,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }
}

/// Write access to a store, released on drop.
#[derive(Debug)]
pub struct StoreLock<'a> {
    _file: File,
    _gate: MutexGuard<'a, ()>,
}

/// Catalog-eligible files found under the root, outside the backup tree.
#[derive(Debug, Default)]
pub struct TreeListing {
    /// Sorted by path.
    pub files: Vec<PathBuf>,
    /// Directory entries that could not be read during the walk.
    pub errors: Vec<String>,
}

/// The file store for one library root.
///
/// Clones share an in-process gate that is taken before the lock file, so
/// threads of one process queue on the mutex instead of the file.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    gate: Arc<Mutex<()>>,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store and make sure the root and backup directories exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(root);
        store.ensure_layout()?;
        Ok(store)
    }

    pub fn ensure_layout(&self) -> Result<(), StoreError> {
        let backup = self.backup_dir();
        fs::create_dir_all(&backup).map_err(io_err(&backup))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR_NAME)
    }

    pub fn is_in_backup(&self, path: &Path) -> bool {
        path.starts_with(self.backup_dir())
    }

    // ── Exclusive Gate ──────────────────────────────────────────────────────

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// Block until no other writer, in this process or another, holds the
    /// store.
    pub fn exclusive(&self) -> Result<StoreLock<'_>, StoreError> {
        let gate = self.gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let file = self.open_lock_file()?;
        let path = self.lock_path();
        file.lock_exclusive().map_err(io_err(&path))?;
        Ok(StoreLock {
            _file: file,
            _gate: gate,
        })
    }

    /// Take the store only if nobody else holds it.
    pub fn try_exclusive(&self) -> Result<Option<StoreLock<'_>>, StoreError> {
        let gate = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Ok(None),
        };
        let file = self.open_lock_file()?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(StoreLock {
                _file: file,
                _gate: gate,
            })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(StoreError::Io {
                path: self.lock_path(),
                source: e,
            }),
        }
    }

    fn open_lock_file(&self) -> Result<File, StoreError> {
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(io_err(&path))
    }

    // ── Primary Copies ──────────────────────────────────────────────────────

    /// Deterministic primary path: `<root>/<sanitized hint>_<hash8>.<ext>`.
    pub fn primary_path(&self, hash: &str, ext: &str, name_hint: &str) -> PathBuf {
        self.root.join(format!(
            "{}_{}.{}",
            sanitize_name(name_hint),
            short_hash(hash),
            ext.to_ascii_lowercase()
        ))
    }

    /// Write a primary copy and return its path. Not deduplicated: an
    /// existing file at the same path is replaced.
    pub fn save(
        &self,
        hash: &str,
        ext: &str,
        bytes: &[u8],
        name_hint: &str,
    ) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let path = self.primary_path(hash, ext, name_hint);
        write_atomic(&path, bytes)?;
        log::debug!("Stored primary copy {}", path.display());
        Ok(path)
    }

    /// Remove a primary copy. A missing file counts as success; returns
    /// whether anything was removed.
    pub fn delete(&self, path: &Path) -> Result<bool, StoreError> {
        if self.is_in_backup(path) {
            return Err(StoreError::BackupProtected(path.to_path_buf()));
        }
        remove_if_present(path)
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>, StoreError> {
        fs::read(path).map_err(io_err(path))
    }

    /// Walk the root for catalog-eligible files, skipping the backup tree.
    pub fn primary_files(&self) -> TreeListing {
        let backup = self.backup_dir();
        let mut listing = TreeListing::default();
        if !self.root.is_dir() {
            return listing;
        }
        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.path() != backup.as_path())
        {
            match entry {
                Ok(e) if e.file_type().is_file() && is_entry_file(e.path()) => {
                    listing.files.push(e.into_path());
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("Skipping unreadable path during walk: {}", err);
                    listing.errors.push(err.to_string());
                }
            }
        }
        listing.files.sort();
        listing
    }

    // ── Backup Copies ───────────────────────────────────────────────────────

    /// The `backup/<ext>/<year>/` partition for a format and date.
    pub fn backup_partition(&self, ext: &str, date: &impl Datelike) -> PathBuf {
        self.backup_dir()
            .join(ext.to_ascii_lowercase())
            .join(date.year().to_string())
    }

    /// The deterministic backup path for an original file name.
    pub fn backup_path(&self, original_name: &str, ext: &str, date: &impl Datelike) -> PathBuf {
        self.backup_partition(ext, date)
            .join(backup_file_name(original_name, ext))
    }

    /// Write a backup copy unless a byte-identical file already sits in the
    /// same partition.
    ///
    /// A different file already using the original name is kept; the new
    /// backup gets a short hash suffix instead.
    pub fn save_backup(
        &self,
        original_name: &str,
        ext: &str,
        bytes: &[u8],
        date: &impl Datelike,
    ) -> Result<BackupOutcome, StoreError> {
        let ext = ext.to_ascii_lowercase();
        let partition = self.backup_partition(&ext, date);
        let hash = sha256_hex(bytes);

        if let Some(existing) = find_in_partition(&partition, &hash, &ext)? {
            log::debug!("Backup already present at {}", existing.display());
            return Ok(BackupOutcome::Existing(existing));
        }

        fs::create_dir_all(&partition).map_err(io_err(&partition))?;
        let mut target = partition.join(backup_file_name(original_name, &ext));
        if target.exists() {
            let stem = target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_NAME.to_string());
            target = partition.join(format!("{}_{}.{}", stem, short_hash(&hash), ext));
        }
        write_atomic(&target, bytes)?;
        log::debug!("Stored backup copy {}", target.display());
        Ok(BackupOutcome::Written(target))
    }

    /// Find a backup whose content hashes to `hash`.
    ///
    /// With a year, only that partition is searched; without one, every
    /// year partition for the format is.
    pub fn find_backup(
        &self,
        hash: &str,
        ext: &str,
        year: Option<i32>,
    ) -> Result<Option<PathBuf>, StoreError> {
        let ext = ext.to_ascii_lowercase();
        let format_dir = self.backup_dir().join(&ext);
        let partitions: Vec<PathBuf> = match year {
            Some(y) => vec![format_dir.join(y.to_string())],
            None => {
                if !format_dir.is_dir() {
                    return Ok(None);
                }
                let mut dirs: Vec<PathBuf> = fs::read_dir(&format_dir)
                    .map_err(io_err(&format_dir))?
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.is_dir())
                    .collect();
                dirs.sort();
                dirs
            }
        };
        for partition in partitions {
            if let Some(found) = find_in_partition(&partition, hash, &ext)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Delete the deterministic backup path for an original name, if present.
    pub fn delete_backup(
        &self,
        original_name: &str,
        ext: &str,
        date: &impl Datelike,
    ) -> Result<bool, StoreError> {
        remove_if_present(&self.backup_path(original_name, ext, date))
    }

    /// Delete one specific file inside the backup tree.
    pub fn delete_backup_file(&self, path: &Path) -> Result<bool, StoreError> {
        if !self.is_in_backup(path) {
            return Err(StoreError::NotInBackup(path.to_path_buf()));
        }
        remove_if_present(path)
    }

    /// Every catalog-eligible file in the backup tree, sorted.
    pub fn backup_files(&self) -> Vec<PathBuf> {
        let backup = self.backup_dir();
        if !backup.is_dir() {
            return Vec::new();
        }
        let mut files: Vec<PathBuf> = WalkDir::new(&backup)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_entry_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        files
    }

    /// Remove the whole backup tree and recreate it empty. Returns the
    /// number of backup files removed.
    pub fn purge_backups(&self) -> Result<usize, StoreError> {
        let backup = self.backup_dir();
        let count = self.backup_files().len();
        if backup.exists() {
            fs::remove_dir_all(&backup).map_err(io_err(&backup))?;
        }
        fs::create_dir_all(&backup).map_err(io_err(&backup))?;
        log::info!("Removed {} backup file(s)", count);
        Ok(count)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn backup_file_name(original_name: &str, ext: &str) -> String {
    Path::new(original_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("{}.{}", DEFAULT_NAME, ext))
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs4::lock_contended_error().raw_os_error()
}

/// Hash each `*.ext` file in a partition until one matches.
fn find_in_partition(
    partition: &Path,
    hash: &str,
    ext: &str,
) -> Result<Option<PathBuf>, StoreError> {
    if !partition.is_dir() {
        return Ok(None);
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(partition)
        .map_err(io_err(partition))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
        .collect();
    candidates.sort();

    for candidate in candidates {
        match hash_file(&candidate) {
            Ok(h) if h == hash => return Ok(Some(candidate)),
            Ok(_) => {}
            Err(e) => log::warn!("Could not hash backup {}: {}", candidate.display(), e),
        }
    }
    Ok(None)
}

/// Write through a temporary sibling and rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(io_err(&tmp))?;
    fs::rename(&tmp, path).map_err(io_err(path))
}

fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
