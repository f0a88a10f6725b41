//! Read queries for the catalog database.
//!
//! Provides lookup by hash and id, listing, and summary counts.

use beastvault_catalog::types::*;
use rusqlite::{params, Connection, OptionalExtension};

use crate::operations::OperationError;

/// Column list for entry rows, in the order [`row_to_entry`] reads them.
pub const ENTRY_COLUMNS: &str = "e.id, e.file_id, e.species_id, e.nickname, e.ot_name, e.tid, \
     e.sid, e.level, e.is_shiny, e.nature, e.ability_id, e.ball_id, e.tera_type, \
     e.held_item_id, e.origin_game, e.language, e.met_date, e.met_location, e.gender, \
     e.form, e.is_egg, e.favorite, e.notes";

const FILE_COLUMNS: &str = "id, content_hash, display_name, original_name, format_tag, \
     byte_size, primary_path, imported_at";

// ── File Lookups ────────────────────────────────────────────────────────────

/// Find the file record with the given content hash.
pub fn find_file_by_hash(
    conn: &Connection,
    content_hash: &str,
) -> Result<Option<FileRecord>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE content_hash = ?1"
    ))?;
    let result = stmt.query_row(params![content_hash], row_to_file);
    match result {
        Ok(f) => Ok(Some(f)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_file(conn: &Connection, file_id: i64) -> Result<Option<FileRecord>, OperationError> {
    let mut stmt = conn.prepare(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"))?;
    stmt.query_row(params![file_id], row_to_file)
        .optional()
        .map_err(Into::into)
}

/// All file records, oldest first.
pub fn list_files(conn: &Connection) -> Result<Vec<FileRecord>, OperationError> {
    let mut stmt = conn.prepare(&format!("SELECT {FILE_COLUMNS} FROM files ORDER BY id"))?;
    let rows = stmt.query_map([], row_to_file)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Entry Lookups ───────────────────────────────────────────────────────────

pub fn get_entry(conn: &Connection, entry_id: i64) -> Result<Option<CatalogEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.id = ?1"
    ))?;
    stmt.query_row(params![entry_id], row_to_entry)
        .optional()
        .map_err(Into::into)
}

/// The entry that owns the given file record, if any.
pub fn entry_for_file(
    conn: &Connection,
    file_id: i64,
) -> Result<Option<CatalogEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e WHERE e.file_id = ?1"
    ))?;
    stmt.query_row(params![file_id], row_to_entry)
        .optional()
        .map_err(Into::into)
}

/// The entry whose file has the given content hash, if any.
pub fn find_entry_by_hash(
    conn: &Connection,
    content_hash: &str,
) -> Result<Option<CatalogEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e
         JOIN files f ON f.id = e.file_id
         WHERE f.content_hash = ?1"
    ))?;
    stmt.query_row(params![content_hash], row_to_entry)
        .optional()
        .map_err(Into::into)
}

/// Every entry, in id order.
pub fn list_entries(conn: &Connection) -> Result<Vec<CatalogEntry>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e ORDER BY e.id"
    ))?;
    let rows = stmt.query_map([], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// An entry with its file record, stats, moves and relearn moves.
pub fn get_entry_detail(
    conn: &Connection,
    entry_id: i64,
) -> Result<Option<EntryDetail>, OperationError> {
    let Some(entry) = get_entry(conn, entry_id)? else {
        return Ok(None);
    };
    let file = get_file(conn, entry.file_id)?
        .ok_or_else(|| OperationError::not_found("file", entry.file_id))?;

    let stats = conn
        .query_row(
            "SELECT iv_hp, iv_atk, iv_def, iv_spa, iv_spd, iv_spe,
                    ev_hp, ev_atk, ev_def, ev_spa, ev_spd, ev_spe,
                    stat_hp, stat_atk, stat_def, stat_spa, stat_spd, stat_spe
             FROM entry_stats WHERE entry_id = ?1",
            params![entry_id],
            |row| {
                let block = |o: usize| -> rusqlite::Result<StatBlock> {
                    Ok(StatBlock {
                        hp: row.get(o)?,
                        atk: row.get(o + 1)?,
                        def: row.get(o + 2)?,
                        spa: row.get(o + 3)?,
                        spd: row.get(o + 4)?,
                        spe: row.get(o + 5)?,
                    })
                };
                Ok(EntryStats {
                    ivs: block(0)?,
                    evs: block(6)?,
                    stats: block(12)?,
                })
            },
        )
        .optional()?;

    let mut stmt = conn.prepare(
        "SELECT slot, move_id, pp_ups, current_pp FROM entry_moves
         WHERE entry_id = ?1 ORDER BY slot",
    )?;
    let moves = stmt
        .query_map(params![entry_id], |row| {
            Ok(MoveSlot {
                slot: row.get(0)?,
                move_id: row.get(1)?,
                pp_ups: row.get(2)?,
                current_pp: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT slot, move_id FROM entry_relearn_moves WHERE entry_id = ?1 ORDER BY slot",
    )?;
    let relearn_moves = stmt
        .query_map(params![entry_id], |row| {
            Ok(RelearnSlot {
                slot: row.get(0)?,
                move_id: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(EntryDetail {
        entry,
        file,
        stats,
        moves,
        relearn_moves,
    }))
}

// ── Stats ───────────────────────────────────────────────────────────────────

/// Row counts across the catalog tables.
#[derive(Debug, Default)]
pub struct CatalogStats {
    pub files: i64,
    pub entries: i64,
    pub stats_rows: i64,
    pub move_rows: i64,
    pub relearn_rows: i64,
    pub total_bytes: i64,
    /// Attribute rows whose entry no longer exists. Always 0 unless a
    /// delete was applied non-atomically.
    pub orphaned_rows: i64,
    /// Files with no entry.
    pub files_without_entry: i64,
}

pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats, OperationError> {
    let count = |sql: &str| -> Result<i64, rusqlite::Error> {
        conn.query_row(sql, [], |row| row.get(0))
    };
    Ok(CatalogStats {
        files: count("SELECT COUNT(*) FROM files")?,
        entries: count("SELECT COUNT(*) FROM entries")?,
        stats_rows: count("SELECT COUNT(*) FROM entry_stats")?,
        move_rows: count("SELECT COUNT(*) FROM entry_moves")?,
        relearn_rows: count("SELECT COUNT(*) FROM entry_relearn_moves")?,
        total_bytes: count("SELECT COALESCE(SUM(byte_size), 0) FROM files")?,
        orphaned_rows: count(
            "SELECT
                (SELECT COUNT(*) FROM entry_stats WHERE entry_id NOT IN (SELECT id FROM entries))
              + (SELECT COUNT(*) FROM entry_moves WHERE entry_id NOT IN (SELECT id FROM entries))
              + (SELECT COUNT(*) FROM entry_relearn_moves
                 WHERE entry_id NOT IN (SELECT id FROM entries))",
        )?,
        files_without_entry: count(
            "SELECT COUNT(*) FROM files WHERE id NOT IN (SELECT file_id FROM entries)",
        )?,
    })
}

// ── Row Mapping Helpers ─────────────────────────────────────────────────────

fn row_to_file(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        content_hash: row.get(1)?,
        display_name: row.get(2)?,
        original_name: row.get(3)?,
        format_tag: row.get(4)?,
        byte_size: row.get(5)?,
        primary_path: row.get(6)?,
        imported_at: row.get(7)?,
    })
}

/// Map a row selected with [`ENTRY_COLUMNS`].
pub fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogEntry> {
    let gender: i32 = row.get(18)?;
    Ok(CatalogEntry {
        id: row.get(0)?,
        file_id: row.get(1)?,
        attributes: EntryAttributes {
            species_id: row.get(2)?,
            nickname: row.get(3)?,
            ot_name: row.get(4)?,
            tid: row.get(5)?,
            sid: row.get(6)?,
            level: row.get(7)?,
            is_shiny: row.get(8)?,
            nature: row.get(9)?,
            ability_id: row.get(10)?,
            ball_id: row.get(11)?,
            tera_type: row.get(12)?,
            held_item_id: row.get(13)?,
            origin_game: row.get(14)?,
            language: row.get(15)?,
            met_date: row.get(16)?,
            met_location: row.get(17)?,
            gender: Gender::from_code(gender),
            form: row.get(19)?,
            is_egg: row.get(20)?,
        },
        favorite: row.get(21)?,
        notes: row.get(22)?,
    })
}
