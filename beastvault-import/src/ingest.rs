//! Ingestion: the only path that creates file records and entries.
//!
//! Each item is parsed, hashed and checked against the catalog. New content
//! gets a primary copy (unless the file is already in place inside the
//! library root), a backup copy and one atomic insert of its file record,
//! entry and attribute rows. Content that is already cataloged resolves to
//! `duplicate` without writing anything.

use std::path::{Path, PathBuf};

use beastvault_catalog::{NewFileRecord, ReferenceTables};
use beastvault_db::{find_entry_by_hash, find_file_by_hash, insert_catalog_item, OperationError};
use beastvault_lib::{entry_extension, sha256_hex, ContentStore, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

use crate::attributes::{display_name_hint, map_entry};
use crate::parser::{EntryParser, StructuredEntry};
use crate::progress::ImportProgress;

#[derive(Debug, Error)]
pub enum IngestError {
    /// A persistence failure other than a hash conflict stopped the batch.
    /// Items before `file_name` completed; re-running the batch is safe.
    #[error("Import stopped at {file_name}: {source}")]
    BatchAborted {
        report: IngestReport,
        file_name: String,
        #[source]
        source: OperationError,
    },
    /// The store's write lock could not be taken; nothing was processed.
    #[error("Could not lock the library: {0}")]
    Lock(#[from] StoreError),
}

/// One artifact handed to the pipeline.
#[derive(Debug, Clone)]
pub struct IngestItem {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Set when the file already lives inside the library root and should
    /// be recorded where it is instead of copied.
    pub in_place: Option<PathBuf>,
}

impl IngestItem {
    pub fn upload(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            in_place: None,
        }
    }

    pub fn in_place(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_name,
            bytes,
            in_place: Some(path),
        }
    }
}

/// Outcome of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Imported { entry_id: i64, file_id: i64 },
    /// The content is already cataloged under `entry_id`.
    Duplicate { entry_id: Option<i64> },
    Error { message: String },
}

impl ItemStatus {
    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Imported { .. } => "imported",
            Self::Duplicate { .. } => "duplicate",
            Self::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub file_name: String,
    pub content_hash: Option<String>,
    pub path: Option<PathBuf>,
    pub status: ItemStatus,
}

/// Per-item outcomes of a batch, in input order.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub items: Vec<ItemReport>,
}

impl IngestReport {
    fn count(&self, label: &str) -> usize {
        self.items.iter().filter(|i| i.status.label() == label).count()
    }

    pub fn imported(&self) -> usize {
        self.count("imported")
    }

    pub fn duplicates(&self) -> usize {
        self.count("duplicate")
    }

    pub fn errors(&self) -> usize {
        self.count("error")
    }

    pub fn summary(&self) -> String {
        format!(
            "{} imported, {} duplicate, {} error(s)",
            self.imported(),
            self.duplicates(),
            self.errors()
        )
    }
}

/// Creates catalog entries from artifacts.
pub struct IngestionPipeline<'a> {
    conn: &'a Connection,
    store: &'a ContentStore,
    parser: &'a dyn EntryParser,
    tables: &'a ReferenceTables,
}

impl<'a> IngestionPipeline<'a> {
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

    /// Ingest a batch, holding the store's write guard for its duration.
    pub fn ingest(
        &self,
        items: Vec<IngestItem>,
        progress: &dyn ImportProgress,
    ) -> Result<IngestReport, IngestError> {
        self.ingest_at(items, Utc::now(), progress)
    }

    /// Like [`ingest`](Self::ingest) with an explicit import time.
    pub fn ingest_at(
        &self,
        items: Vec<IngestItem>,
        now: DateTime<Utc>,
        progress: &dyn ImportProgress,
    ) -> Result<IngestReport, IngestError> {
        let _guard = self.store.exclusive()?;
        let result = self.ingest_locked(items, now, progress);
        match &result {
            Ok(report) => progress.on_complete(&report.summary()),
            Err(e) => progress.on_complete(&e.to_string()),
        }
        result
    }

    /// Batch body. The caller must hold the store's write guard.
    pub(crate) fn ingest_locked(
        &self,
        items: Vec<IngestItem>,
        now: DateTime<Utc>,
        progress: &dyn ImportProgress,
    ) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        let total = items.len();

        for (i, item) in items.into_iter().enumerate() {
            progress.on_item(i + 1, total, &item.file_name);
            match self.ingest_one(&item, now) {
                Ok(item_report) => {
                    progress.on_result(&item_report.file_name, &item_report.status);
                    report.items.push(item_report);
                }
                Err(source) => {
                    log::error!("Aborting import at {}: {}", item.file_name, source);
                    return Err(IngestError::BatchAborted {
                        report,
                        file_name: item.file_name,
                        source,
                    });
                }
            }
        }

        log::debug!("Ingested batch of {}: {}", total, report.summary());
        Ok(report)
    }

    /// Process one item. Only persistence failures that are not hash
    /// conflicts come back as `Err`.
    fn ingest_one(
        &self,
        item: &IngestItem,
        now: DateTime<Utc>,
    ) -> Result<ItemReport, OperationError> {
        let mut report = ItemReport {
            file_name: item.file_name.clone(),
            content_hash: None,
            path: None,
            status: ItemStatus::error(""),
        };

        if item.bytes.is_empty() {
            report.status = ItemStatus::error("empty file");
            return Ok(report);
        }

        let parsed = match self.parser.parse(&item.bytes) {
            Ok(p) => p,
            Err(e) => {
                report.status = ItemStatus::error(e.to_string());
                return Ok(report);
            }
        };

        let hash = sha256_hex(&item.bytes);
        report.content_hash = Some(hash.clone());

        if let Some(status) = self.existing_status(&hash)? {
            report.status = status;
            return Ok(report);
        }

        self.persist(item, &parsed, hash, now, report)
    }

    /// Write the copies and insert the rows for content the pre-check did
    /// not find. A hash conflict here means another writer got there first.
    fn persist(
        &self,
        item: &IngestItem,
        parsed: &StructuredEntry,
        hash: String,
        now: DateTime<Utc>,
        mut report: ItemReport,
    ) -> Result<ItemReport, OperationError> {
        let name_source = item
            .in_place
            .clone()
            .unwrap_or_else(|| PathBuf::from(&item.file_name));
        let Some(ext) = entry_extension(&name_source) else {
            report.status = ItemStatus::error("not a recognized entry file");
            return Ok(report);
        };

        // Primary copy.
        let (primary, written) = match &item.in_place {
            Some(path) => (path.clone(), false),
            None => {
                let hint = display_name_hint(parsed, self.tables);
                match self.store.save(&hash, &ext, &item.bytes, &hint) {
                    Ok(path) => (path, true),
                    Err(e) => {
                        report.status = ItemStatus::error(e.to_string());
                        return Ok(report);
                    }
                }
            }
        };
        report.path = Some(primary.clone());

        // Backup copy.
        if let Err(e) = self
            .store
            .save_backup(&item.file_name, &ext, &item.bytes, &now.date_naive())
        {
            if written {
                self.discard_primary(&primary, None);
            }
            report.status = ItemStatus::error(e.to_string());
            return Ok(report);
        }

        let file = NewFileRecord {
            content_hash: hash.clone(),
            display_name: primary
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| item.file_name.clone()),
            original_name: Some(item.file_name.clone()),
            format_tag: ext,
            byte_size: item.bytes.len() as i64,
            primary_path: primary.to_string_lossy().into_owned(),
            imported_at: now.to_rfc3339(),
        };

        match insert_catalog_item(self.conn, &file, &map_entry(parsed)) {
            Ok(ids) => {
                log::debug!("Imported {} as entry {}", item.file_name, ids.entry_id);
                report.status = ItemStatus::Imported {
                    entry_id: ids.entry_id,
                    file_id: ids.file_id,
                };
                Ok(report)
            }
            Err(OperationError::DuplicateHash(_)) => {
                // Another writer committed the same content first.
                let winner = find_file_by_hash(self.conn, &hash)?;
                if written {
                    let referenced = winner.as_ref().map(|f| f.primary_path.as_str());
                    self.discard_primary(&primary, referenced);
                }
                report.path = None;
                report.status = self
                    .existing_status(&hash)?
                    .unwrap_or(ItemStatus::Duplicate { entry_id: None });
                Ok(report)
            }
            Err(e) => {
                if written {
                    self.discard_primary(&primary, None);
                }
                Err(e)
            }
        }
    }

    fn existing_status(&self, hash: &str) -> Result<Option<ItemStatus>, OperationError> {
        if let Some(entry) = find_entry_by_hash(self.conn, hash)? {
            return Ok(Some(ItemStatus::Duplicate {
                entry_id: Some(entry.id),
            }));
        }
        if find_file_by_hash(self.conn, hash)?.is_some() {
            return Ok(Some(ItemStatus::Duplicate { entry_id: None }));
        }
        Ok(None)
    }

    /// Remove a primary copy this batch wrote, unless a record points at it.
    fn discard_primary(&self, path: &Path, referenced: Option<&str>) {
        if referenced.is_some_and(|r| Path::new(r) == path) {
            return;
        }
        if let Err(e) = self.store.delete(path) {
            log::warn!("Could not remove unused copy {}: {}", path.display(), e);
        }
    }
}
