//! Plain-text team-builder export of one entry.
//!
//! The layout follows the usual set format:
//!
//! ```text
//! Sparky (Pikachu) (M) @ Item #4
//! Ability: Ability #9
//! Tera Type: Electric
//! Level: 25
//! Timid Nature
//! ...
//! - Move #85
//! ```
//!
//! Only species, nature and tera type have names here; other ids print as
//! `<Kind> #<id>`.

use beastvault_catalog::{ElementType, EntryDetail, Gender, ReferenceTables, StatBlock};

/// Nature names in game id order.
const NATURES: [&str; 25] = [
    "Hardy", "Lonely", "Brave", "Adamant", "Naughty", "Bold", "Docile", "Relaxed", "Impish",
    "Lax", "Timid", "Hasty", "Serious", "Jolly", "Naive", "Modest", "Mild", "Quiet", "Bashful",
    "Rash", "Calm", "Gentle", "Sassy", "Careful", "Quirky",
];

pub fn nature_name(nature: i32) -> Option<&'static str> {
    usize::try_from(nature).ok().and_then(|i| NATURES.get(i).copied())
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn spread(b: &StatBlock) -> String {
    format!(
        "{} HP / {} Atk / {} Def / {} SpA / {} SpD / {} Spe",
        b.hp, b.atk, b.def, b.spa, b.spd, b.spe
    )
}

/// Render an entry as a team-builder set, one field per line.
pub fn showdown_text(detail: &EntryDetail, tables: &ReferenceTables) -> String {
    let a = &detail.entry.attributes;
    let species = tables
        .species_name(a.species_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Species #{}", a.species_id));

    let mut header = match a.nickname.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        Some(nick) => format!("{} ({})", nick, species),
        None => species,
    };
    header.push_str(match a.gender {
        Gender::Male => " (M)",
        Gender::Female => " (F)",
        Gender::Unknown => "",
    });
    if a.held_item_id > 0 {
        header.push_str(&format!(" @ Item #{}", a.held_item_id));
    }

    let mut lines = vec![header, format!("Ability: Ability #{}", a.ability_id)];
    if let Some(tera) = a.tera_type {
        let name = ElementType::from_code(tera)
            .map(|t| capitalized(t.as_str()))
            .unwrap_or_else(|| format!("Type #{}", tera));
        lines.push(format!("Tera Type: {}", name));
    }
    lines.push(format!("Level: {}", a.level));
    if a.is_shiny {
        lines.push("Shiny: Yes".to_string());
    }
    lines.push(match nature_name(a.nature) {
        Some(name) => format!("{} Nature", name),
        None => format!("Nature #{}", a.nature),
    });
    lines.push(format!("Ball: Ball #{}", a.ball_id));
    lines.push(format!("OT: {}", a.ot_name));
    lines.push(format!("TID: {}", a.tid));
    lines.push(format!("SID: {}", a.sid));
    if !a.language.is_empty() {
        lines.push(format!("Language: {}", a.language));
    }
    if let Some(stats) = &detail.stats {
        lines.push(format!("IVs: {}", spread(&stats.ivs)));
        lines.push(format!("EVs: {}", spread(&stats.evs)));
    }

    let mut moves: Vec<_> = detail.moves.iter().filter(|m| m.move_id > 0).collect();
    moves.sort_by_key(|m| m.slot);
    lines.extend(moves.iter().map(|m| format!("- Move #{}", m.move_id)));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
