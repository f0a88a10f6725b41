//! The decoder seam: turn raw artifact bytes into a typed entry.
//!
//! Binary decoders plug in by implementing [`EntryParser`]. The crate ships
//! [`JsonEntryParser`], which reads JSON-encoded entry exports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("empty file")]
    Empty,
    #[error("malformed entry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid entry: {0}")]
    Invalid(String),
}

/// One learned move as decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedMove {
    pub id: i32,
    pub pp_ups: i32,
    pub pp: i32,
}

/// Typed view of one decoded artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredEntry {
    pub species: i32,
    pub nickname: Option<String>,
    pub ot_name: String,
    pub tid: i32,
    pub sid: i32,
    pub level: i32,
    pub is_shiny: bool,
    pub nature: i32,
    pub ability: i32,
    pub ball: i32,
    pub tera_type: Option<i32>,
    pub held_item: i32,
    /// Origin game identifier.
    pub version: i32,
    pub language: String,
    pub met_date: Option<String>,
    pub met_location: Option<String>,
    /// 0 male, 1 female, 2 genderless, as the source games number it.
    pub gender: i32,
    pub form: i32,
    pub is_egg: bool,
    /// HP, Atk, Def, SpA, SpD, Spe.
    pub ivs: Option<[i32; 6]>,
    pub evs: Option<[i32; 6]>,
    pub stats: Option<[i32; 6]>,
    pub moves: Vec<DecodedMove>,
    pub relearn_moves: Vec<i32>,
}

/// Decode artifact bytes. Implementations must be pure and deterministic.
pub trait EntryParser {
    fn parse(&self, bytes: &[u8]) -> Result<StructuredEntry, ParseFailure>;
}

/// Reads entries exported as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEntryParser;

impl EntryParser for JsonEntryParser {
    fn parse(&self, bytes: &[u8]) -> Result<StructuredEntry, ParseFailure> {
        if bytes.is_empty() {
            return Err(ParseFailure::Empty);
        }
        let entry: StructuredEntry = serde_json::from_slice(bytes)?;
        if entry.species <= 0 {
            return Err(ParseFailure::Invalid("missing species".into()));
        }
        if entry.moves.len() > 4 || entry.relearn_moves.len() > 4 {
            return Err(ParseFailure::Invalid("more than four move slots".into()));
        }
        Ok(entry)
    }
}
