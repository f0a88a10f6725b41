pub(crate) mod config;
pub(crate) mod entry;
pub(crate) mod import;
pub(crate) mod list;
pub(crate) mod maintenance;
pub(crate) mod scan;

use std::path::PathBuf;

use beastvault_catalog::ReferenceTables;
use beastvault_lib::settings::{resolve_paths, PathOverrides, ResolvedPaths};
use beastvault_lib::ContentStore;
use rusqlite::Connection;

use crate::CliError;

/// Default path for species reference YAML data.
pub(crate) fn default_reference_dir() -> PathBuf {
    // Look for reference/ relative to the current directory
    PathBuf::from("reference")
}

/// An opened library: catalog connection, content store and reference data.
pub(crate) struct Library {
    pub paths: ResolvedPaths,
    pub conn: Connection,
    pub store: ContentStore,
    pub tables: ReferenceTables,
}

impl Library {
    pub(crate) fn open(overrides: &PathOverrides) -> Result<Self, CliError> {
        let paths = resolve_paths(overrides);
        log::debug!("Library root: {}", paths.root.display());
        log::debug!("Catalog database: {}", paths.database.display());

        if let Some(parent) = paths.database.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = beastvault_db::open_database(&paths.database)
            .map_err(|e| CliError::database(format!("Failed to open catalog database: {}", e)))?;
        let store = ContentStore::open(&paths.root)
            .map_err(|e| CliError::storage(format!("Failed to open library: {}", e)))?;
        let tables = load_tables(paths.reference_dir.clone())?;

        Ok(Self {
            paths,
            conn,
            store,
            tables,
        })
    }
}

/// Load species reference data, falling back to built-in step tables only
/// when no reference directory is configured and `reference/` is absent.
fn load_tables(dir: Option<PathBuf>) -> Result<ReferenceTables, CliError> {
    let (dir, explicit) = match dir {
        Some(d) => (d, true),
        None => (default_reference_dir(), false),
    };
    if !explicit && !dir.is_dir() {
        log::debug!(
            "No reference data at {}; species names and types unavailable",
            dir.display()
        );
        return Ok(ReferenceTables::new());
    }
    let tables = beastvault_catalog::load_reference(&dir).map_err(|e| {
        CliError::config(format!(
            "Failed to load reference data from {}: {}",
            dir.display(),
            e
        ))
    })?;
    log::debug!("Loaded {} species from {}", tables.species_count(), dir.display());
    Ok(tables)
}

/// Truncate a string to a maximum width, appending "..." if needed.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max).collect()
    }
}

/// Format a file size in human-readable form.
pub(crate) fn format_file_size(bytes: i64) -> String {
    beastvault_lib::util::format_bytes(bytes.max(0) as u64)
}
