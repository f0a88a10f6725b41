//! SQLite persistence layer for the entry catalog.
//!
//! Provides schema creation, atomic create and cascade-delete operations,
//! and read queries backed by SQLite (via rusqlite with bundled feature).

pub mod operations;
pub mod queries;
pub mod schema;

pub use operations::{
    delete_entry_cascade, delete_file_cascade, insert_catalog_item, insert_entry,
    insert_file_record, is_unique_violation, purge_all, relocate_file, set_favorite, set_notes,
    InsertedIds, OperationError, PurgeStats,
};
pub use queries::{
    catalog_stats, entry_for_file, find_entry_by_hash, find_file_by_hash, get_entry,
    get_entry_detail, get_file, list_entries, list_files, row_to_entry, CatalogStats,
    ENTRY_COLUMNS,
};
pub use schema::{open_database, open_memory, SchemaError};
