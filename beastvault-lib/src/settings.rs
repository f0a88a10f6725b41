//! Shared application settings (library root, database path, reference data).
//!
//! The settings file lives at `~/.config/beastvault/settings.toml`:
//!
//! ```toml
//! [library]
//! root = "/home/me/Documents/BeastVault"
//! database = "/home/me/.local/share/beastvault/catalog.db"
//! reference_dir = "/home/me/beastvault/reference"
//! ```
//!
//! Every path resolves through the same priority chain: CLI override, then
//! environment variable, then settings file, then a platform default.

use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const ENV_ROOT: &str = "BEASTVAULT_ROOT";
pub const ENV_DATABASE: &str = "BEASTVAULT_DB";
pub const ENV_REFERENCE: &str = "BEASTVAULT_REFERENCE";

/// The `[library]` table of `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LibrarySettings {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    library: LibrarySettings,
}

/// Path overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub root: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub reference_dir: Option<PathBuf>,
}

/// Fully resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub database: PathBuf,
    pub reference_dir: Option<PathBuf>,
}

/// Canonical path to the settings file: `~/.config/beastvault/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("beastvault").join("settings.toml")
}

pub fn default_library_root() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("BeastVault")
}

pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beastvault")
        .join("catalog.db")
}

/// Read the `[library]` table from a settings file.
///
/// A missing file is empty settings; an unreadable or malformed one is
/// logged and treated as empty.
pub fn load_library_settings_from(path: &Path) -> LibrarySettings {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return LibrarySettings::default(),
        Err(e) => {
            log::warn!("Could not read {}: {}", path.display(), e);
            return LibrarySettings::default();
        }
    };
    match toml::from_str::<SettingsFile>(&contents) {
        Ok(file) => file.library,
        Err(e) => {
            log::warn!("Ignoring malformed {}: {}", path.display(), e);
            LibrarySettings::default()
        }
    }
}

pub fn load_library_settings() -> LibrarySettings {
    load_library_settings_from(&settings_path())
}

/// Resolve paths from CLI overrides, the process environment and the
/// settings file.
pub fn resolve_paths(overrides: &PathOverrides) -> ResolvedPaths {
    resolve_paths_with(
        overrides,
        |key| std::env::var(key).ok(),
        &load_library_settings(),
    )
}

/// Resolve paths with an explicit environment lookup and settings table.
pub fn resolve_paths_with(
    overrides: &PathOverrides,
    env: impl Fn(&str) -> Option<String>,
    file: &LibrarySettings,
) -> ResolvedPaths {
    let pick = |cli: &Option<PathBuf>, var: &str, saved: &Option<PathBuf>| -> Option<PathBuf> {
        cli.clone()
            .or_else(|| env(var).filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| saved.clone().filter(|p| !p.as_os_str().is_empty()))
    };

    ResolvedPaths {
        root: pick(&overrides.root, ENV_ROOT, &file.root).unwrap_or_else(default_library_root),
        database: pick(&overrides.database, ENV_DATABASE, &file.database)
            .unwrap_or_else(default_database_path),
        reference_dir: pick(&overrides.reference_dir, ENV_REFERENCE, &file.reference_dir),
    }
}

/// One path key of the `[library]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKey {
    Root,
    Database,
    ReferenceDir,
}

impl LibraryKey {
    pub const ALL: [Self; 3] = [Self::Root, Self::Database, Self::ReferenceDir];

    /// Key name as written in `settings.toml`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Database => "database",
            Self::ReferenceDir => "reference_dir",
        }
    }

    /// Accepts the TOML key or its dashed form (`reference-dir`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.as_str().eq_ignore_ascii_case(&s))
    }
}

/// Set or clear (`None`) one library path in `settings.toml`.
pub fn set_library_path(key: LibraryKey, value: Option<&Path>) -> io::Result<()> {
    set_library_path_in(&settings_path(), key, value)
}

/// Set or clear one library path in the given settings file, keeping every
/// other key and table. A file that is not valid TOML is left untouched
/// and reported as `InvalidData`.
pub fn set_library_path_in(
    settings: &Path,
    key: LibraryKey,
    value: Option<&Path>,
) -> io::Result<()> {
    let mut doc = match std::fs::read_to_string(settings) {
        Ok(contents) => contents
            .parse::<toml::Table>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => toml::Table::new(),
        Err(e) => return Err(e),
    };

    let library = doc
        .entry("library")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "[library] is not a table"))?;
    match value {
        Some(p) => {
            let path = toml::Value::String(p.to_string_lossy().into_owned());
            library.insert(key.as_str().to_string(), path);
        }
        None => {
            library.remove(key.as_str());
        }
    }

    if let Some(parent) = settings.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = settings.with_extension("toml.tmp");
    std::fs::write(&tmp, serialized)?;
    std::fs::rename(&tmp, settings)
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let contents = std::fs::read_to_string(settings_path()).ok()?;
    let doc: toml::Value = contents.parse().ok()?;
    toml::to_string_pretty(&doc).ok()
}
