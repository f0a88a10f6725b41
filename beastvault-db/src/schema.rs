//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Create all tables and indexes if they don't exist.
///
/// Idempotent; safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a catalog database at the given path.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version != CURRENT_VERSION {
        migrate(&conn, version)?;
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: from_version,
        });
    }

    let mut version = from_version;
    while version < CURRENT_VERSION {
        if version == 1 {
            // v2 keeps the uploader's file name so backups can be located.
            conn.execute_batch("ALTER TABLE files ADD COLUMN original_name TEXT;")?;
        }
        version += 1;
        set_schema_version(conn, version)?;
        log::debug!("Catalog schema migrated to version {}", version);
    }

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Stored artifacts. AUTOINCREMENT so ids of deleted rows are never reused.
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_hash TEXT NOT NULL,
    display_name TEXT NOT NULL,
    original_name TEXT,
    format_tag TEXT NOT NULL,
    byte_size INTEGER NOT NULL,
    primary_path TEXT NOT NULL,
    imported_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_files_content_hash ON files(content_hash);

-- One catalog entry per file
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL UNIQUE REFERENCES files(id),
    species_id INTEGER NOT NULL,
    nickname TEXT,
    ot_name TEXT NOT NULL DEFAULT '',
    tid INTEGER NOT NULL DEFAULT 0,
    sid INTEGER NOT NULL DEFAULT 0,
    level INTEGER NOT NULL DEFAULT 1,
    is_shiny BOOLEAN NOT NULL DEFAULT 0,
    nature INTEGER NOT NULL DEFAULT 0,
    ability_id INTEGER NOT NULL DEFAULT 0,
    ball_id INTEGER NOT NULL DEFAULT 0,
    tera_type INTEGER,
    held_item_id INTEGER NOT NULL DEFAULT 0,
    origin_game INTEGER NOT NULL DEFAULT 0,
    language TEXT NOT NULL DEFAULT '',
    met_date TEXT,
    met_location TEXT,
    gender INTEGER NOT NULL DEFAULT 0,
    form INTEGER NOT NULL DEFAULT 0,
    is_egg BOOLEAN NOT NULL DEFAULT 0,
    favorite BOOLEAN NOT NULL DEFAULT 0,
    notes TEXT
);

CREATE INDEX IF NOT EXISTS idx_entries_species ON entries(species_id);
CREATE INDEX IF NOT EXISTS idx_entries_level ON entries(level);
CREATE INDEX IF NOT EXISTS idx_entries_origin_game ON entries(origin_game);

-- Attribute sub-rows. No ON DELETE CASCADE: deletes are applied explicitly,
-- children first, inside one transaction.
CREATE TABLE IF NOT EXISTS entry_stats (
    entry_id INTEGER PRIMARY KEY REFERENCES entries(id),
    iv_hp INTEGER NOT NULL,
    iv_atk INTEGER NOT NULL,
    iv_def INTEGER NOT NULL,
    iv_spa INTEGER NOT NULL,
    iv_spd INTEGER NOT NULL,
    iv_spe INTEGER NOT NULL,
    ev_hp INTEGER NOT NULL,
    ev_atk INTEGER NOT NULL,
    ev_def INTEGER NOT NULL,
    ev_spa INTEGER NOT NULL,
    ev_spd INTEGER NOT NULL,
    ev_spe INTEGER NOT NULL,
    stat_hp INTEGER NOT NULL,
    stat_atk INTEGER NOT NULL,
    stat_def INTEGER NOT NULL,
    stat_spa INTEGER NOT NULL,
    stat_spd INTEGER NOT NULL,
    stat_spe INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS entry_moves (
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    slot INTEGER NOT NULL CHECK (slot BETWEEN 1 AND 4),
    move_id INTEGER NOT NULL,
    pp_ups INTEGER NOT NULL DEFAULT 0,
    current_pp INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (entry_id, slot)
);

CREATE TABLE IF NOT EXISTS entry_relearn_moves (
    entry_id INTEGER NOT NULL REFERENCES entries(id),
    slot INTEGER NOT NULL CHECK (slot BETWEEN 1 AND 4),
    move_id INTEGER NOT NULL,
    PRIMARY KEY (entry_id, slot)
);
"#;
