use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_lib::settings::{self, LibraryKey, PathOverrides};

use crate::CliError;

/// Show the settings file and the paths it resolves to.
pub(crate) fn run_config_show(overrides: &PathOverrides) -> Result<(), CliError> {
    let path = settings::settings_path();

    log::info!(
        "{}",
        "BeastVault Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
        if let Some(contents) = settings::load_settings_string() {
            for line in contents.lines() {
                log::info!("    {}", line);
            }
        }
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();

    let resolved = settings::resolve_paths(overrides);
    log::info!("  Library root:   {}", resolved.root.display());
    log::info!("  Database:       {}", resolved.database.display());
    match &resolved.reference_dir {
        Some(dir) => log::info!("  Reference data: {}", dir.display()),
        None => log::info!(
            "  Reference data: {}",
            "./reference (default)".if_supports_color(Stdout, |t| t.dimmed())
        ),
    }
    Ok(())
}

/// Print the settings file path.
pub(crate) fn run_config_path() -> Result<(), CliError> {
    log::info!("{}", settings::settings_path().display());
    Ok(())
}

fn parse_key(key: &str) -> Result<LibraryKey, CliError> {
    LibraryKey::from_str_loose(key).ok_or_else(|| {
        let known: Vec<&str> = LibraryKey::ALL.iter().map(|k| k.as_str()).collect();
        CliError::invalid(format!("Unknown key '{}' (expected one of: {})", key, known.join(", ")))
    })
}

/// Save (or with `None`, remove) one library path in the settings file.
pub(crate) fn run_config_set(key: &str, path: Option<PathBuf>) -> Result<(), CliError> {
    let key = parse_key(key)?;
    let path = match path {
        Some(p) if p.is_absolute() => Some(p),
        Some(p) => Some(std::env::current_dir()?.join(p)),
        None => None,
    };
    settings::set_library_path(key, path.as_deref())
        .map_err(|e| CliError::config(format!("Failed to save settings: {}", e)))?;
    match &path {
        Some(p) => log::info!(
            "{} set to {}",
            key.as_str(),
            p.display().if_supports_color(Stdout, |t| t.cyan())
        ),
        None => log::info!("{} removed from settings", key.as_str()),
    }
    Ok(())
}
