//! Write operations: atomic create, cascade delete, purge and entry edits.

use beastvault_catalog::types::*;
use rusqlite::{params, Connection};
use thiserror::Error;

use crate::queries;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
    #[error("A file with content hash {0} is already stored")]
    DuplicateHash(String),
}

impl OperationError {
    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

/// Ids assigned to a newly created file record and its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertedIds {
    pub file_id: i64,
    pub entry_id: i64,
}

// ── Create ──────────────────────────────────────────────────────────────────

/// Insert a file record, its catalog entry and all attribute sub-rows as one
/// atomic unit.
///
/// A uniqueness conflict on the content hash comes back as
/// [`OperationError::DuplicateHash`] with nothing written.
pub fn insert_catalog_item(
    conn: &Connection,
    file: &NewFileRecord,
    entry: &NewCatalogEntry,
) -> Result<InsertedIds, OperationError> {
    let tx = conn.unchecked_transaction()?;
    let file_id = insert_file_record(&tx, file)?;
    let entry_id = insert_entry(&tx, file_id, entry)?;
    tx.commit()?;
    Ok(InsertedIds { file_id, entry_id })
}

/// Insert a file record. Returns the generated id.
pub fn insert_file_record(
    conn: &Connection,
    file: &NewFileRecord,
) -> Result<i64, OperationError> {
    let result = conn.execute(
        "INSERT INTO files (content_hash, display_name, original_name, format_tag,
             byte_size, primary_path, imported_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            file.content_hash,
            file.display_name,
            file.original_name,
            file.format_tag,
            file.byte_size,
            file.primary_path,
            file.imported_at,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => {
            Err(OperationError::DuplicateHash(file.content_hash.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Insert a catalog entry and its sub-rows for an existing file record.
/// Returns the generated entry id.
pub fn insert_entry(
    conn: &Connection,
    file_id: i64,
    entry: &NewCatalogEntry,
) -> Result<i64, OperationError> {
    let a = &entry.attributes;
    conn.execute(
        "INSERT INTO entries (file_id, species_id, nickname, ot_name, tid, sid, level,
             is_shiny, nature, ability_id, ball_id, tera_type, held_item_id, origin_game,
             language, met_date, met_location, gender, form, is_egg)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
             ?16, ?17, ?18, ?19, ?20)",
        params![
            file_id,
            a.species_id,
            a.nickname,
            a.ot_name,
            a.tid,
            a.sid,
            a.level,
            a.is_shiny,
            a.nature,
            a.ability_id,
            a.ball_id,
            a.tera_type,
            a.held_item_id,
            a.origin_game,
            a.language,
            a.met_date,
            a.met_location,
            a.gender.code(),
            a.form,
            a.is_egg,
        ],
    )?;
    let entry_id = conn.last_insert_rowid();

    if let Some(stats) = &entry.stats {
        let (iv, ev, st) = (&stats.ivs, &stats.evs, &stats.stats);
        conn.execute(
            "INSERT INTO entry_stats (entry_id,
                 iv_hp, iv_atk, iv_def, iv_spa, iv_spd, iv_spe,
                 ev_hp, ev_atk, ev_def, ev_spa, ev_spd, ev_spe,
                 stat_hp, stat_atk, stat_def, stat_spa, stat_spd, stat_spe)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                entry_id, iv.hp, iv.atk, iv.def, iv.spa, iv.spd, iv.spe, ev.hp, ev.atk,
                ev.def, ev.spa, ev.spd, ev.spe, st.hp, st.atk, st.def, st.spa, st.spd,
                st.spe,
            ],
        )?;
    }

    for m in &entry.moves {
        conn.execute(
            "INSERT INTO entry_moves (entry_id, slot, move_id, pp_ups, current_pp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry_id, m.slot, m.move_id, m.pp_ups, m.current_pp],
        )?;
    }

    for r in &entry.relearn_moves {
        conn.execute(
            "INSERT INTO entry_relearn_moves (entry_id, slot, move_id) VALUES (?1, ?2, ?3)",
            params![entry_id, r.slot, r.move_id],
        )?;
    }

    Ok(entry_id)
}

// ── Delete ──────────────────────────────────────────────────────────────────

/// Delete an entry, its attribute rows and its file record in one
/// transaction. Returns the file record that was removed.
pub fn delete_entry_cascade(
    conn: &Connection,
    entry_id: i64,
) -> Result<FileRecord, OperationError> {
    let tx = conn.unchecked_transaction()?;
    let entry = queries::get_entry(&tx, entry_id)?
        .ok_or_else(|| OperationError::not_found("entry", entry_id))?;
    let file = queries::get_file(&tx, entry.file_id)?
        .ok_or_else(|| OperationError::not_found("file", entry.file_id))?;
    delete_rows(&tx, Some(entry_id), file.id)?;
    tx.commit()?;
    Ok(file)
}

/// Delete a file record and whatever entry and attribute rows hang off it,
/// in one transaction.
pub fn delete_file_cascade(
    conn: &Connection,
    file_id: i64,
) -> Result<FileRecord, OperationError> {
    let tx = conn.unchecked_transaction()?;
    let file = queries::get_file(&tx, file_id)?
        .ok_or_else(|| OperationError::not_found("file", file_id))?;
    let entry_id = queries::entry_for_file(&tx, file_id)?.map(|e| e.id);
    delete_rows(&tx, entry_id, file_id)?;
    tx.commit()?;
    Ok(file)
}

/// Children first, so foreign keys never see a dangling reference.
fn delete_rows(
    conn: &Connection,
    entry_id: Option<i64>,
    file_id: i64,
) -> Result<(), OperationError> {
    if let Some(id) = entry_id {
        conn.execute("DELETE FROM entry_relearn_moves WHERE entry_id = ?1", [id])?;
        conn.execute("DELETE FROM entry_moves WHERE entry_id = ?1", [id])?;
        conn.execute("DELETE FROM entry_stats WHERE entry_id = ?1", [id])?;
        conn.execute("DELETE FROM entries WHERE id = ?1", [id])?;
    }
    conn.execute("DELETE FROM files WHERE id = ?1", [file_id])?;
    Ok(())
}

/// Row counts removed by [`purge_all`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeStats {
    pub files: usize,
    pub entries: usize,
    pub attribute_rows: usize,
}

/// Remove every row from every catalog table in one transaction.
///
/// Id sequences are left alone, so ids are not reused after a purge.
pub fn purge_all(conn: &Connection) -> Result<PurgeStats, OperationError> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = PurgeStats::default();
    stats.attribute_rows += tx.execute("DELETE FROM entry_relearn_moves", [])?;
    stats.attribute_rows += tx.execute("DELETE FROM entry_moves", [])?;
    stats.attribute_rows += tx.execute("DELETE FROM entry_stats", [])?;
    stats.entries = tx.execute("DELETE FROM entries", [])?;
    stats.files = tx.execute("DELETE FROM files", [])?;
    tx.commit()?;
    Ok(stats)
}

/// Point a file record at a new primary copy; the display name follows the
/// file name.
pub fn relocate_file(
    conn: &Connection,
    file_id: i64,
    primary_path: &str,
    display_name: &str,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE files SET primary_path = ?2, display_name = ?3 WHERE id = ?1",
        params![file_id, primary_path, display_name],
    )?;
    if changed == 0 {
        return Err(OperationError::not_found("file", file_id));
    }
    Ok(())
}

// ── Entry Edits ─────────────────────────────────────────────────────────────

pub fn set_favorite(
    conn: &Connection,
    entry_id: i64,
    favorite: bool,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE entries SET favorite = ?2 WHERE id = ?1",
        params![entry_id, favorite],
    )?;
    if changed == 0 {
        return Err(OperationError::not_found("entry", entry_id));
    }
    Ok(())
}

/// Set or clear (`None`) an entry's notes.
pub fn set_notes(
    conn: &Connection,
    entry_id: i64,
    notes: Option<&str>,
) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE entries SET notes = ?2 WHERE id = ?1",
        params![entry_id, notes],
    )?;
    if changed == 0 {
        return Err(OperationError::not_found("entry", entry_id));
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// True if `e` is a UNIQUE (or primary key) constraint failure.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => {
            err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
