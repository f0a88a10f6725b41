//! Data model types for the entry catalog.
//!
//! These types represent the persistent catalog schema: stored files, the
//! catalog entries decoded from them, and the per-entry stat and move rows.

use serde::{Deserialize, Serialize};

// ── File Record ─────────────────────────────────────────────────────────────

/// A stored artifact, identified by the SHA-256 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    /// Lowercase hex SHA-256 of the raw bytes. Unique across all records.
    pub content_hash: String,
    /// File name of the primary copy (e.g. `Pikachu_3fa9c1d2.pk9`).
    pub display_name: String,
    /// Name the file had when it was handed to the importer.
    pub original_name: Option<String>,
    /// Lowercase extension of the source file (`pk9`, `pb8`, `ekx`, ...).
    pub format_tag: String,
    pub byte_size: i64,
    pub primary_path: String,
    pub imported_at: String,
}

/// A file record that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub content_hash: String,
    pub display_name: String,
    pub original_name: Option<String>,
    pub format_tag: String,
    pub byte_size: i64,
    pub primary_path: String,
    pub imported_at: String,
}

// ── Catalog Entry ───────────────────────────────────────────────────────────

/// Gender as stored in exported records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

impl Gender {
    /// Numeric code used in the database (0 unknown, 1 male, 2 female).
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Male,
            2 => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "male" | "m" | "1" => Self::Male,
            "female" | "f" | "2" => Self::Female,
            _ => Self::Unknown,
        }
    }
}

/// Domain attributes decoded from one artifact.
///
/// The ingestion and reconciliation engines never look inside this struct;
/// only the query engine and presentation code do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAttributes {
    pub species_id: i32,
    pub nickname: Option<String>,
    pub ot_name: String,
    pub tid: i32,
    pub sid: i32,
    pub level: i32,
    pub is_shiny: bool,
    pub nature: i32,
    pub ability_id: i32,
    pub ball_id: i32,
    /// Only present for formats that carry a tera type.
    pub tera_type: Option<i32>,
    pub held_item_id: i32,
    /// Numeric origin game identifier as written by the source game.
    pub origin_game: i32,
    pub language: String,
    pub met_date: Option<String>,
    pub met_location: Option<String>,
    pub gender: Gender,
    pub form: i32,
    pub is_egg: bool,
}

/// A persisted catalog entry. Owns exactly one [`FileRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub file_id: i64,
    pub attributes: EntryAttributes,
    pub favorite: bool,
    pub notes: Option<String>,
}

/// Six-value stat spread (HP, Atk, Def, SpA, SpD, Spe).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub hp: i32,
    pub atk: i32,
    pub def: i32,
    pub spa: i32,
    pub spd: i32,
    pub spe: i32,
}

/// Individual values, effort values and computed stats of one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryStats {
    pub ivs: StatBlock,
    pub evs: StatBlock,
    pub stats: StatBlock,
}

/// A learned move in slot 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub slot: u8,
    pub move_id: i32,
    pub pp_ups: i32,
    pub current_pp: i32,
}

/// A relearnable move in slot 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelearnSlot {
    pub slot: u8,
    pub move_id: i32,
}

/// Everything persisted for an entry at creation time, minus its file record.
#[derive(Debug, Clone, Default)]
pub struct NewCatalogEntry {
    pub attributes: EntryAttributes,
    pub stats: Option<EntryStats>,
    pub moves: Vec<MoveSlot>,
    pub relearn_moves: Vec<RelearnSlot>,
}

/// A catalog entry with its file record and attribute sub-rows.
#[derive(Debug, Clone)]
pub struct EntryDetail {
    pub entry: CatalogEntry,
    pub file: FileRecord,
    pub stats: Option<EntryStats>,
    pub moves: Vec<MoveSlot>,
    pub relearn_moves: Vec<RelearnSlot>,
}
