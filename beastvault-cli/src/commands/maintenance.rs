use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_import::{self as import, MaintenanceError};
use beastvault_lib::settings::PathOverrides;

use super::Library;
use crate::CliError;

fn maintenance_err(e: MaintenanceError) -> CliError {
    match e {
        MaintenanceError::Db(_) => CliError::database(e.to_string()),
        MaintenanceError::Store(_) => CliError::storage(e.to_string()),
        _ => CliError::other(e.to_string()),
    }
}

/// Drop catalog rows whose primary file is gone.
pub(crate) fn run_sync(overrides: &PathOverrides) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let result = import::sync(&lib.conn, &lib.store).map_err(maintenance_err)?;

    for name in &result.removed_entries {
        log::info!("  {} {}", "-".if_supports_color(Stdout, |t| t.red()), name);
    }
    log::info!("{}", result.summary());
    Ok(())
}

/// Show catalog and backup counts.
pub(crate) fn run_status(overrides: &PathOverrides) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let status = import::status(&lib.conn, &lib.store).map_err(maintenance_err)?;
    let stats = beastvault_db::catalog_stats(&lib.conn)
        .map_err(|e| CliError::database(format!("Failed to query catalog stats: {}", e)))?;

    log::info!("{}", "Library Status".if_supports_color(Stdout, |t| t.bold()));
    log::info!("  Root:     {}", lib.paths.root.display());
    log::info!("  Database: {}", lib.paths.database.display());
    log::info!("  Backups:  {}", status.backup_dir.display());
    crate::log_blank();
    log::info!("  Entries:        {:>8}", status.entries);
    log::info!("  Files:          {:>8}", status.files);
    log::info!(
        "  Stored size:    {:>8}",
        super::format_file_size(stats.total_bytes)
    );
    log::info!("  Backup copies:  {:>8}", status.backup_files);
    crate::log_blank();

    if status.is_in_sync() {
        log::info!(
            "  {}",
            "Catalog is in sync with the disk".if_supports_color(Stdout, |t| t.green())
        );
    } else {
        log::info!(
            "  {} record(s) point at missing files:",
            status
                .orphaned
                .len()
                .if_supports_color(Stdout, |t| t.yellow())
        );
        for file in &status.orphaned {
            log::info!("    {}", file.primary_path);
        }
        log::info!("  Run 'beastvault sync' to remove them.");
    }
    Ok(())
}

/// Delete one entry and its primary file.
pub(crate) fn run_delete(
    overrides: &PathOverrides,
    id: i64,
    include_backup: bool,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let outcome =
        import::delete_entry(&lib.conn, &lib.store, id, include_backup).map_err(maintenance_err)?;

    log::info!(
        "Deleted #{} ({})",
        outcome.entry_id,
        outcome.file_name.if_supports_color(Stdout, |t| t.bold())
    );
    if !outcome.file_deleted {
        log::info!("  Primary file was already missing");
    }
    if include_backup {
        if outcome.backup_deleted {
            log::info!("  Backup copy removed");
        } else {
            log::info!("  No backup copy found");
        }
    }
    Ok(())
}

/// List every record and file holding the same content as an entry.
pub(crate) fn run_duplicates(overrides: &PathOverrides, id: i64) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let info = import::find_duplicates(&lib.conn, &lib.store, id).map_err(maintenance_err)?;

    log::info!(
        "{} {}",
        "Copies of".if_supports_color(Stdout, |t| t.bold()),
        info.label.if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  Hash: {}",
        info.content_hash.if_supports_color(Stdout, |t| t.dimmed())
    );
    log::info!("  Records: {}", info.file_ids.len());
    log::info!("  Primary files:");
    for path in &info.primary_paths {
        log::info!("    {}", path.display());
    }
    if info.is_in_backup() {
        log::info!("  Backup files:");
        for path in &info.backup_paths {
            log::info!("    {}", path.display());
        }
    }
    crate::log_blank();
    log::info!(
        "  delete-total expects {} file(s), or {} with --include-backup",
        info.primary_paths.len(),
        info.primary_paths.len() + info.backup_paths.len()
    );
    Ok(())
}

/// Delete an entry's content everywhere.
pub(crate) fn run_delete_total(
    overrides: &PathOverrides,
    id: i64,
    expected_files: usize,
    include_backup: bool,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let result = import::delete_total(&lib.conn, &lib.store, id, expected_files, include_backup)
        .map_err(maintenance_err)?;

    log::info!(
        "Removed {} record(s) and {} file(s)",
        result.deleted_records,
        result.deleted_paths.len()
    );
    for path in &result.deleted_paths {
        log::info!("  {} {}", "-".if_supports_color(Stdout, |t| t.red()), path.display());
    }
    for path in &result.preserved_backups {
        log::info!(
            "  {} {} (backup kept)",
            "=".if_supports_color(Stdout, |t| t.dimmed()),
            path.display()
        );
    }
    for err in &result.errors {
        log::warn!("  {}", err);
    }
    Ok(())
}

/// Remove every catalog row.
pub(crate) fn run_purge(
    overrides: &PathOverrides,
    confirm: bool,
    include_backup: bool,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;

    if !confirm {
        let stats = beastvault_db::catalog_stats(&lib.conn)
            .map_err(|e| CliError::database(format!("Failed to query catalog stats: {}", e)))?;
        log::warn!(
            "This will remove {} entries and {} file records from {}",
            stats.entries,
            stats.files,
            lib.paths.database.display()
        );
        if include_backup {
            log::warn!(
                "and every backup copy under {}",
                lib.store.backup_dir().display()
            );
        }
        log::info!("Re-run with --confirm to proceed.");
        return Ok(());
    }

    let report = import::purge(&lib.conn, &lib.store, include_backup).map_err(maintenance_err)?;
    log::info!("{}", "Catalog purged".if_supports_color(Stdout, |t| t.bold()));
    log::info!("  Files:          {:>8}", report.rows.files);
    log::info!("  Entries:        {:>8}", report.rows.entries);
    log::info!("  Attribute rows: {:>8}", report.rows.attribute_rows);
    if include_backup {
        log::info!("  Backup copies:  {:>8}", report.backups_removed);
    }
    Ok(())
}
