//! Mapping from decoded entries to catalog rows.

use beastvault_catalog::{
    EntryAttributes, EntryStats, Gender, MoveSlot, NewCatalogEntry, ReferenceTables, RelearnSlot,
    StatBlock,
};

use crate::parser::StructuredEntry;

fn stat_block(v: [i32; 6]) -> StatBlock {
    let [hp, atk, def, spa, spd, spe] = v;
    StatBlock {
        hp,
        atk,
        def,
        spa,
        spd,
        spe,
    }
}

fn gender(code: i32) -> Gender {
    match code {
        0 => Gender::Male,
        1 => Gender::Female,
        _ => Gender::Unknown,
    }
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the catalog rows for a decoded entry.
///
/// Empty move slots (id 0) are dropped; slot numbers follow the position in
/// the decoded list. Stats are stored only when all three spreads decoded.
pub fn map_entry(parsed: &StructuredEntry) -> NewCatalogEntry {
    let attributes = EntryAttributes {
        species_id: parsed.species,
        nickname: non_blank(&parsed.nickname),
        ot_name: parsed.ot_name.trim().to_string(),
        tid: parsed.tid,
        sid: parsed.sid,
        level: parsed.level,
        is_shiny: parsed.is_shiny,
        nature: parsed.nature,
        ability_id: parsed.ability,
        ball_id: parsed.ball,
        tera_type: parsed.tera_type,
        held_item_id: parsed.held_item,
        origin_game: parsed.version,
        language: parsed.language.clone(),
        met_date: non_blank(&parsed.met_date),
        met_location: non_blank(&parsed.met_location),
        gender: gender(parsed.gender),
        form: parsed.form,
        is_egg: parsed.is_egg,
    };

    let stats = match (parsed.ivs, parsed.evs, parsed.stats) {
        (Some(ivs), Some(evs), Some(stats)) => Some(EntryStats {
            ivs: stat_block(ivs),
            evs: stat_block(evs),
            stats: stat_block(stats),
        }),
        _ => None,
    };

    let moves = parsed
        .moves
        .iter()
        .zip(1u8..=4)
        .filter(|(m, _)| m.id != 0)
        .map(|(m, slot)| MoveSlot {
            slot,
            move_id: m.id,
            pp_ups: m.pp_ups,
            current_pp: m.pp,
        })
        .collect();

    let relearn_moves = parsed
        .relearn_moves
        .iter()
        .zip(1u8..=4)
        .filter(|(id, _)| **id != 0)
        .map(|(id, slot)| RelearnSlot {
            slot,
            move_id: *id,
        })
        .collect();

    NewCatalogEntry {
        attributes,
        stats,
        moves,
        relearn_moves,
    }
}

/// Name used for the primary copy: the nickname, else the species name,
/// else `species-<id>`.
pub fn display_name_hint(parsed: &StructuredEntry, tables: &ReferenceTables) -> String {
    non_blank(&parsed.nickname)
        .or_else(|| tables.species_name(parsed.species).map(str::to_string))
        .unwrap_or_else(|| format!("species-{}", parsed.species))
}
