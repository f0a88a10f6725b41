//! Ingestion, reconciliation and maintenance for the entry library.
//!
//! - [`ingest`]: the import pipeline, sole creator of catalog rows
//! - [`reconcile`]: directory scans that align the catalog with the disk
//! - [`maintenance`]: sync, status, deletes, purge and export
//! - [`parser`] / [`attributes`]: decoding and row mapping
//! - [`showdown`] / [`compare`]: text export and entry comparison

pub mod attributes;
pub mod compare;
pub mod ingest;
pub mod maintenance;
pub mod parser;
pub mod progress;
pub mod reconcile;
pub mod showdown;

pub use attributes::{display_name_hint, map_entry};
pub use compare::{compare_entries, Difference};
pub use ingest::{IngestError, IngestItem, IngestReport, IngestionPipeline, ItemReport, ItemStatus};
pub use maintenance::{
    delete_entry, delete_total, export_entry, find_duplicates, purge, status, sync,
    DeleteOutcome, DuplicateInfo, MaintenanceError, MaintenanceStatus, PurgeReport, SyncResult,
    TotalDeletion,
};
pub use parser::{DecodedMove, EntryParser, JsonEntryParser, ParseFailure, StructuredEntry};
pub use progress::{ImportProgress, LogProgress, SilentProgress};
pub use reconcile::{
    scan_status, DirectoryReconciler, ReconcileError, ScanFailure, ScanResult, ScanStats,
    ScanStatus,
};
pub use showdown::{nature_name, showdown_text};
