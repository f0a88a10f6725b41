use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_import::{
    scan_status, DirectoryReconciler, ImportProgress, JsonEntryParser, ReconcileError,
};
use beastvault_lib::settings::PathOverrides;

use super::Library;
use crate::CliError;

/// Reconcile the catalog with the library directory.
pub(crate) fn run_scan(
    overrides: &PathOverrides,
    progress: &dyn ImportProgress,
) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    log::info!(
        "Scanning {}",
        lib.store.root().display().if_supports_color(Stdout, |t| t.cyan())
    );

    let reconciler = DirectoryReconciler::new(&lib.conn, &lib.store, &JsonEntryParser, &lib.tables);
    let result = reconciler.scan(progress).map_err(|e| match e {
        ReconcileError::ScanInProgress => CliError::other(e.to_string()),
        ReconcileError::Store(_) => CliError::storage(e.to_string()),
        _ => CliError::database(e.to_string()),
    })?;

    for path in &result.newly_imported {
        log::info!(
            "  {} {}",
            "+".if_supports_color(Stdout, |t| t.green()),
            path.display(),
        );
    }
    for name in &result.deleted {
        log::info!(
            "  {} {}",
            "-".if_supports_color(Stdout, |t| t.red()),
            name,
        );
    }
    for path in &result.relocated {
        log::info!(
            "  {} {}",
            "~".if_supports_color(Stdout, |t| t.yellow()),
            path.display(),
        );
    }
    for failure in &result.errors {
        log::warn!("  {}: {}", failure.path.display(), failure.message);
    }

    crate::log_blank();
    log::info!("{}", "Scan Summary".if_supports_color(Stdout, |t| t.bold()));
    let s = &result.stats;
    log::info!("  Files found:       {:>6}", s.files_found);
    log::info!("  Newly imported:    {:>6}", s.newly_imported);
    log::info!("  Already imported:  {:>6}", s.already_imported);
    log::info!("  Relocated:         {:>6}", s.relocated);
    log::info!("  Removed:           {:>6}", s.deleted);
    if result.unverified > 0 {
        log::warn!(
            "{} record(s) were not found but kept: the library could not be read completely",
            result.unverified
        );
    }
    if s.errors > 0 {
        log::info!(
            "  Errors:            {:>6}",
            s.errors.if_supports_color(Stdout, |t| t.red())
        );
    }

    Ok(())
}

/// Show what a scan would see, without touching the catalog.
pub(crate) fn run_scan_status(overrides: &PathOverrides) -> Result<(), CliError> {
    let paths = beastvault_lib::settings::resolve_paths(overrides);
    let store = beastvault_lib::ContentStore::new(&paths.root);
    let status = scan_status(&store);

    log::info!("{}", "Library Directory".if_supports_color(Stdout, |t| t.bold()));
    log::info!(
        "  Root: {} {}",
        status.root.display().if_supports_color(Stdout, |t| t.cyan()),
        if status.exists {
            "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
        } else {
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()).to_string()
        },
    );
    if !status.exists {
        return Ok(());
    }

    log::info!("  Entry files: {}", status.total_files);
    for (ext, count) in &status.by_extension {
        log::info!("    .{:<6} {:>6}", ext, count);
    }
    if let Some(modified) = status.last_modified {
        log::info!("  Last modified: {}", modified.format("%Y-%m-%d %H:%M:%S"));
    }

    Ok(())
}
