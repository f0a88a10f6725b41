use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_catalog::{EntryDetail, StatBlock, TypePair};
use beastvault_db::OperationError;
use beastvault_lib::settings::PathOverrides;

use super::{format_file_size, Library};
use crate::CliError;

fn not_found(id: i64) -> CliError {
    CliError::other(format!("Entry {} not found", id))
}

fn edit_err(id: i64, e: OperationError) -> CliError {
    match e {
        OperationError::NotFound { .. } => not_found(id),
        other => CliError::database(other.to_string()),
    }
}

fn format_block(b: &StatBlock) -> String {
    format!(
        "{:>3} {:>3} {:>3} {:>3} {:>3} {:>3}",
        b.hp, b.atk, b.def, b.spa, b.spd, b.spe
    )
}

fn format_types(pair: &TypePair) -> String {
    pair.types()
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn load_detail(lib: &Library, id: i64) -> Result<EntryDetail, CliError> {
    beastvault_db::get_entry_detail(&lib.conn, id)
        .map_err(|e| CliError::database(e.to_string()))?
        .ok_or_else(|| not_found(id))
}

/// Show one entry in detail, or as a team-builder set with `showdown`.
pub(crate) fn run_show(overrides: &PathOverrides, id: i64, showdown: bool) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let detail = load_detail(&lib, id)?;
    if showdown {
        print!("{}", beastvault_import::showdown_text(&detail, &lib.tables));
        return Ok(());
    }
    let entry = &detail.entry;
    let a = &entry.attributes;
    let tables = &lib.tables;

    let species = tables
        .species_name(a.species_id)
        .map(|n| format!("{} (#{})", n, a.species_id))
        .unwrap_or_else(|| format!("#{}", a.species_id));
    log::info!(
        "{} {}",
        format!("Entry #{}", entry.id).if_supports_color(Stdout, |t| t.bold()),
        a.nickname.as_deref().unwrap_or(""),
    );
    log::info!("  Species:    {}", species);
    if let Some(pair) = tables.type_pair(a.species_id) {
        log::info!("  Types:      {}", format_types(&pair));
    }
    log::info!(
        "  Level:      {}{}{}",
        a.level,
        if a.is_shiny {
            format!(" {}", "shiny".if_supports_color(Stdout, |t| t.yellow()))
        } else {
            String::new()
        },
        if a.is_egg { " (egg)" } else { "" },
    );
    log::info!("  Gender:     {}", a.gender.as_str());
    log::info!("  Form:       {}", a.form);
    log::info!("  Trainer:    {} ({}/{})", a.ot_name, a.tid, a.sid);
    log::info!(
        "  Origin:     game {} (generation {})",
        a.origin_game,
        tables.origin_generation(a.origin_game)
    );
    log::info!(
        "  Nature:     {}   Ability: {}",
        beastvault_import::nature_name(a.nature)
            .map(str::to_string)
            .unwrap_or_else(|| a.nature.to_string()),
        a.ability_id
    );
    log::info!("  Ball:       {}   Held item: {}", a.ball_id, a.held_item_id);
    if let Some(tera) = a.tera_type {
        log::info!("  Tera type:  {}", tera);
    }
    if let Some(date) = &a.met_date {
        log::info!(
            "  Met:        {} {}",
            date,
            a.met_location.as_deref().unwrap_or("")
        );
    }
    log::info!("  Language:   {}", a.language);
    log::info!(
        "  Favorite:   {}",
        if entry.favorite { "yes" } else { "no" }
    );
    if let Some(notes) = &entry.notes {
        log::info!("  Notes:      {}", notes);
    }

    if let Some(stats) = &detail.stats {
        crate::log_blank();
        log::info!("                HP Atk Def SpA SpD Spe");
        log::info!("  IVs:        {}", format_block(&stats.ivs));
        log::info!("  EVs:        {}", format_block(&stats.evs));
        log::info!("  Stats:      {}", format_block(&stats.stats));
    }
    if !detail.moves.is_empty() {
        crate::log_blank();
        log::info!("  Moves:");
        for m in &detail.moves {
            log::info!(
                "    {}. move {} (PP {}, {} PP up)",
                m.slot,
                m.move_id,
                m.current_pp,
                m.pp_ups
            );
        }
    }
    if !detail.relearn_moves.is_empty() {
        let ids: Vec<String> = detail
            .relearn_moves
            .iter()
            .map(|m| m.move_id.to_string())
            .collect();
        log::info!("  Relearn:    {}", ids.join(", "));
    }

    let file = &detail.file;
    crate::log_blank();
    log::info!("  File:       {}", file.primary_path);
    if let Some(original) = &file.original_name {
        log::info!("  Imported as {}", original);
    }
    log::info!(
        "  Format:     {}  ({})",
        file.format_tag,
        format_file_size(file.byte_size)
    );
    log::info!(
        "  Hash:       {}",
        file.content_hash.if_supports_color(Stdout, |t| t.dimmed())
    );
    log::info!("  Imported:   {}", file.imported_at);
    Ok(())
}

/// Print the attributes that differ between two entries.
pub(crate) fn run_compare(
    overrides: &PathOverrides,
    first: i64,
    second: i64,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let left = load_detail(&lib, first)?;
    let right = load_detail(&lib, second)?;

    let label = |d: &EntryDetail| {
        let a = &d.entry.attributes;
        let species = lib
            .tables
            .species_name(a.species_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", a.species_id));
        match &a.nickname {
            Some(nick) => format!("#{} {} ({})", d.entry.id, nick, species),
            None => format!("#{} {}", d.entry.id, species),
        }
    };
    log::info!(
        "{} {} / {}",
        "Comparing".if_supports_color(Stdout, |t| t.bold()),
        label(&left),
        label(&right)
    );

    let diffs = beastvault_import::compare_entries(&left.entry.attributes, &right.entry.attributes);
    if diffs.is_empty() {
        log::info!("  {}", "Identical".if_supports_color(Stdout, |t| t.green()));
        return Ok(());
    }
    for diff in &diffs {
        if diff.unexpected {
            log::info!("  {}", diff.to_string().if_supports_color(Stdout, |t| t.yellow()));
        } else {
            log::info!("  {}", diff);
        }
    }
    crate::log_blank();
    log::info!("  {} difference(s)", diffs.len());
    Ok(())
}

/// Copy an entry's file out of the library.
pub(crate) fn run_export(
    overrides: &PathOverrides,
    id: i64,
    dest: PathBuf,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let written = beastvault_import::export_entry(&lib.conn, &lib.store, id, &dest).map_err(
        |e| match e {
            beastvault_import::MaintenanceError::NotFound(id) => not_found(id),
            other => CliError::storage(other.to_string()),
        },
    )?;
    log::info!(
        "Exported #{} to {}",
        id,
        written.display().if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}

/// Mark or unmark an entry as favorite.
pub(crate) fn run_favorite(
    overrides: &PathOverrides,
    id: i64,
    favorite: bool,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    beastvault_db::set_favorite(&lib.conn, id, favorite).map_err(|e| edit_err(id, e))?;
    if favorite {
        log::info!("Marked #{} as favorite", id);
    } else {
        log::info!("Unmarked #{} as favorite", id);
    }
    Ok(())
}

/// Set or clear an entry's notes.
pub(crate) fn run_note(overrides: &PathOverrides, id: i64, text: String) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let text = text.trim();
    let notes = (!text.is_empty()).then_some(text);
    beastvault_db::set_notes(&lib.conn, id, notes).map_err(|e| edit_err(id, e))?;
    match notes {
        Some(_) => log::info!("Updated notes for #{}", id),
        None => log::info!("Cleared notes for #{}", id),
    }
    Ok(())
}
