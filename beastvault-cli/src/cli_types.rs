//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beastvault")]
#[command(about = "Deduplicated library of exported creature records", long_about = None)]
pub(crate) struct Cli {
    /// Library root (default: BEASTVAULT_ROOT, settings file, ~/Documents/BeastVault)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Catalog database file (default: BEASTVAULT_DB, settings file, platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Directory of species reference YAML files
    #[arg(long, global = true)]
    pub reference_dir: Option<PathBuf>,

    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Import entry files into the library
    Import {
        /// Files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Reconcile the catalog with the files under the library root
    Scan,

    /// Show what a scan would see under the library root
    ScanStatus,

    /// Drop catalog rows whose primary file no longer exists
    Sync,

    /// Show catalog counts, backup counts and orphaned records
    Status,

    /// Query the catalog
    List(ListArgs),

    /// Show one entry in detail
    Show {
        id: i64,
        /// Print the entry as a team-builder set instead
        #[arg(long)]
        showdown: bool,
    },

    /// List the attributes that differ between two entries
    Compare {
        first: i64,
        second: i64,
    },

    /// Copy an entry's file out of the library
    Export {
        id: i64,
        /// Destination file or directory
        dest: PathBuf,
    },

    /// Mark (or with --off, unmark) an entry as favorite
    Favorite {
        id: i64,
        #[arg(long)]
        off: bool,
    },

    /// Set an entry's notes (empty text clears them)
    Note {
        id: i64,
        text: String,
    },

    /// Delete an entry and its primary file (the backup is kept)
    Delete {
        id: i64,
        /// Also delete the backup copy
        #[arg(long)]
        include_backup: bool,
    },

    /// List every record and file holding the same content as an entry
    Duplicates {
        id: i64,
    },

    /// Delete an entry's content everywhere
    DeleteTotal {
        id: i64,
        /// Number of physical files expected to be removed (see `duplicates`)
        #[arg(long)]
        expected_files: usize,
        /// Also delete backup copies
        #[arg(long)]
        include_backup: bool,
    },

    /// Remove every catalog row
    Purge {
        /// Actually perform the purge
        #[arg(long)]
        confirm: bool,
        /// Also clear the backup tree
        #[arg(long)]
        include_backup: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Filter, sort and paging arguments for `list`.
#[derive(Args, Clone, Default)]
pub(crate) struct ListArgs {
    /// Substring of nickname, trainer name or notes
    #[arg(long)]
    pub search: Option<String>,

    /// Species id
    #[arg(long)]
    pub species: Option<i32>,

    /// Substring of the species name
    #[arg(long)]
    pub species_name: Option<String>,

    #[arg(long)]
    pub nickname: Option<String>,

    #[arg(long)]
    pub shiny: Option<bool>,

    #[arg(long)]
    pub favorite: Option<bool>,

    #[arg(long)]
    pub egg: Option<bool>,

    #[arg(long)]
    pub form: Option<i32>,

    /// male, female or unknown
    #[arg(long)]
    pub gender: Option<String>,

    #[arg(long)]
    pub ball: Option<i32>,

    #[arg(long)]
    pub held_item: Option<i32>,

    #[arg(long)]
    pub origin_game: Option<i32>,

    #[arg(long)]
    pub tera_type: Option<i32>,

    #[arg(long)]
    pub min_level: Option<i32>,

    #[arg(long)]
    pub max_level: Option<i32>,

    #[arg(long)]
    pub origin_generation: Option<u8>,

    #[arg(long)]
    pub species_generation: Option<u8>,

    /// Type name or code
    #[arg(long)]
    pub primary_type: Option<String>,

    #[arg(long)]
    pub secondary_type: Option<String>,

    /// any, all, only, primary-only, exact or pair
    #[arg(long)]
    pub type_mode: Option<String>,

    /// With --type-mode only, require the types in the given order
    #[arg(long)]
    pub enforce_type_order: bool,

    /// Sort key as field[:asc|desc]; repeat for secondary keys
    #[arg(long)]
    pub sort: Vec<String>,

    #[arg(long, default_value_t = 0)]
    pub skip: usize,

    #[arg(long, default_value_t = beastvault_query::DEFAULT_TAKE)]
    pub take: usize,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the settings file and resolved paths
    Show,

    /// Print the settings file path
    Path,

    /// Save a library path (root, database or reference-dir)
    Set {
        key: String,
        path: PathBuf,
    },

    /// Remove a saved library path
    Unset {
        key: String,
    },
}
