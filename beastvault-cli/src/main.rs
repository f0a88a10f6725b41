//! beastvault CLI
//!
//! Command-line interface for a deduplicated library of exported creature
//! records.

mod cli_types;
mod commands;
mod error;
mod progress;

use std::io::Write;

use clap::Parser;

use crate::cli_types::{Cli, Commands, ConfigAction};
pub(crate) use crate::error::CliError;

/// Log an empty line at info level (separates output sections).
pub(crate) fn log_blank() {
    log::info!("");
}

/// Install the logger.
///
/// Normal output goes through `log::info!` with bare messages; `--verbose`
/// adds timestamps and debug messages, `--quiet` keeps only warnings and
/// errors. `RUST_LOG` still overrides per-module levels.
fn init_logging(quiet: bool, verbose: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();
    if !verbose {
        builder.format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        });
    }
    builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let overrides = beastvault_lib::settings::PathOverrides {
        root: cli.root,
        database: cli.db,
        reference_dir: cli.reference_dir,
    };
    let progress = progress::reporter(cli.quiet, cli.verbose);

    let result = match cli.command {
        Commands::Import { files } => {
            commands::import::run_import(&overrides, files, progress.as_ref())
        }
        Commands::Scan => commands::scan::run_scan(&overrides, progress.as_ref()),
        Commands::ScanStatus => commands::scan::run_scan_status(&overrides),
        Commands::Sync => commands::maintenance::run_sync(&overrides),
        Commands::Status => commands::maintenance::run_status(&overrides),
        Commands::List(args) => commands::list::run_list(&overrides, args),
        Commands::Show { id, showdown } => commands::entry::run_show(&overrides, id, showdown),
        Commands::Compare { first, second } => {
            commands::entry::run_compare(&overrides, first, second)
        }
        Commands::Export { id, dest } => commands::entry::run_export(&overrides, id, dest),
        Commands::Favorite { id, off } => commands::entry::run_favorite(&overrides, id, !off),
        Commands::Note { id, text } => commands::entry::run_note(&overrides, id, text),
        Commands::Delete { id, include_backup } => {
            commands::maintenance::run_delete(&overrides, id, include_backup)
        }
        Commands::Duplicates { id } => commands::maintenance::run_duplicates(&overrides, id),
        Commands::DeleteTotal {
            id,
            expected_files,
            include_backup,
        } => {
            commands::maintenance::run_delete_total(&overrides, id, expected_files, include_backup)
        }
        Commands::Purge {
            confirm,
            include_backup,
        } => commands::maintenance::run_purge(&overrides, confirm, include_backup),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(&overrides),
            ConfigAction::Path => commands::config::run_config_path(),
            ConfigAction::Set { key, path } => commands::config::run_config_set(&key, Some(path)),
            ConfigAction::Unset { key } => commands::config::run_config_set(&key, None),
        },
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
