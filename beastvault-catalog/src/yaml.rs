//! YAML loading for species reference data.
//!
//! A reference directory holds any number of `.yaml`/`.yml` files, each
//! containing a sequence of [`SpeciesInfo`] rows. Files are read in name
//! order so later files can override earlier rows.

use crate::reference::{ReferenceTables, SpeciesInfo};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum YamlError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yml::Error,
    },
    #[error("Directory not found: {0}")]
    DirNotFound(String),
}

/// Load species rows from a single YAML file.
pub fn load_species_file(path: &Path) -> Result<Vec<SpeciesInfo>, YamlError> {
    let contents = std::fs::read_to_string(path).map_err(|e| YamlError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yml::from_str(&contents).map_err(|e| YamlError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load species rows from every YAML file in a directory.
///
/// A missing directory yields an empty list; a path that exists but is not
/// a directory is an error.
pub fn load_species(dir: &Path) -> Result<Vec<SpeciesInfo>, YamlError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(YamlError::DirNotFound(dir.display().to_string()));
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| YamlError::Io {
            path: dir.display().to_string(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut all = Vec::new();
    for entry in entries {
        all.extend(load_species_file(&entry.path())?);
    }
    Ok(all)
}

/// Build reference tables from a directory of species YAML.
pub fn load_reference(dir: &Path) -> Result<ReferenceTables, YamlError> {
    Ok(ReferenceTables::with_species(load_species(dir)?))
}
