//! Catalog data model types and reference tables.
//!
//! This crate defines the persistent data model for the entry catalog without
//! any database dependencies, plus the immutable reference tables (generation
//! step tables, species names and type pairs) consulted by the query engine.

pub mod reference;
pub mod types;
pub mod yaml;

pub use reference::{ElementType, ReferenceTables, SpeciesInfo, StepTable, TypePair};
pub use types::*;
pub use yaml::{load_reference, load_species, load_species_file, YamlError};
