//! Filter intermediate representation and in-memory evaluation.
//!
//! A [`Filter`] is one predicate over a catalog entry. Filters compose by
//! intersection inside a [`CompositeSpecification`]; the same value can be
//! applied to an in-memory collection here or lowered to SQL by
//! [`crate::sql`]. Both paths select the same entries.

use beastvault_catalog::{CatalogEntry, ElementType, Gender, ReferenceTables, TypePair};
use serde::{Deserialize, Serialize};

// ── Type Filters ────────────────────────────────────────────────────────────

/// How a requested type pair is compared against a species' type pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMode {
    /// The species has at least one of the requested types.
    #[default]
    AnyOf,
    /// The species has every requested type.
    AllOf,
    /// The species has exactly the requested types and nothing else. A
    /// single requested type matches only single-typed species.
    OnlyTypes { enforce_order: bool },
    /// Single-typed species whose only type is the requested primary.
    PrimaryOnly,
    /// Dual-typed species with exactly (primary, secondary) in that order.
    ExactOrder,
    /// Dual-typed species with the requested two types in either order.
    UnorderedPair,
}

impl TypeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnyOf => "any",
            Self::AllOf => "all",
            Self::OnlyTypes {
                enforce_order: false,
            } => "only",
            Self::OnlyTypes {
                enforce_order: true,
            } => "only-ordered",
            Self::PrimaryOnly => "primary-only",
            Self::ExactOrder => "exact",
            Self::UnorderedPair => "pair",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "any" | "any-of" | "has-any" => Some(Self::AnyOf),
            "all" | "all-of" | "has-all" => Some(Self::AllOf),
            "only" | "only-types" => Some(Self::OnlyTypes {
                enforce_order: false,
            }),
            "only-ordered" => Some(Self::OnlyTypes {
                enforce_order: true,
            }),
            "primary-only" | "primary" => Some(Self::PrimaryOnly),
            "exact" | "exact-order" => Some(Self::ExactOrder),
            "pair" | "unordered" | "both" => Some(Self::UnorderedPair),
            _ => None,
        }
    }
}

/// A type filter: up to two requested types and a comparison mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeFilter {
    pub primary: Option<ElementType>,
    pub secondary: Option<ElementType>,
    pub mode: TypeMode,
}

impl TypeFilter {
    pub fn new(
        primary: Option<ElementType>,
        secondary: Option<ElementType>,
        mode: TypeMode,
    ) -> Self {
        // A repeated type is the same request as a single one.
        let secondary = secondary.filter(|s| Some(*s) != primary);
        Self {
            primary,
            secondary,
            mode,
        }
    }

    fn requested(&self) -> Vec<ElementType> {
        self.primary.into_iter().chain(self.secondary).collect()
    }

    /// True when the filter constrains nothing and so accepts every entry,
    /// including species missing from the reference tables.
    pub fn accepts_everything(&self) -> bool {
        self.primary.is_none()
            && self.secondary.is_none()
            && matches!(self.mode, TypeMode::AnyOf | TypeMode::AllOf)
    }

    pub fn matches(&self, pair: &TypePair) -> bool {
        let (p, s) = (self.primary, self.secondary);
        match self.mode {
            TypeMode::AnyOf => {
                let requested = self.requested();
                requested.is_empty() || requested.iter().any(|t| pair.contains(*t))
            }
            TypeMode::AllOf => self.requested().iter().all(|t| pair.contains(*t)),
            TypeMode::OnlyTypes { enforce_order } => {
                if !pair.is_dual() {
                    p == Some(pair.primary) && s.is_none()
                } else {
                    (p == Some(pair.primary) && s == pair.secondary)
                        || (!enforce_order && p == pair.secondary && s == Some(pair.primary))
                }
            }
            TypeMode::PrimaryOnly => !pair.is_dual() && p == Some(pair.primary),
            TypeMode::ExactOrder => {
                pair.is_dual() && p == Some(pair.primary) && s == pair.secondary
            }
            TypeMode::UnorderedPair => {
                pair.is_dual()
                    && ((p == Some(pair.primary) && s == pair.secondary)
                        || (p == pair.secondary && s == Some(pair.primary)))
            }
        }
    }

    /// Evaluate against a species id. Species without a type pair only match
    /// a filter that accepts everything.
    pub fn matches_species(&self, species_id: i32, tables: &ReferenceTables) -> bool {
        match tables.type_pair(species_id) {
            Some(pair) => self.matches(&pair),
            None => self.accepts_everything(),
        }
    }
}

// ── Filter IR ───────────────────────────────────────────────────────────────

/// One predicate over a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Case-insensitive substring over nickname, trainer name and notes.
    TextSearch(String),
    Species(i32),
    /// Case-insensitive substring over the species name.
    SpeciesName(String),
    /// Case-insensitive substring over the nickname.
    Nickname(String),
    Shiny(bool),
    Favorite(bool),
    Egg(bool),
    Form(i32),
    Gender(Gender),
    Ball(i32),
    HeldItem(i32),
    OriginGame(i32),
    TeraType(i32),
    /// Inclusive level bounds; either side may be open.
    LevelRange { min: Option<i32>, max: Option<i32> },
    OriginGeneration(u8),
    SpeciesGeneration(u8),
    Types(TypeFilter),
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle_lower)
}

impl Filter {
    /// Evaluate this filter against one entry.
    pub fn matches(&self, entry: &CatalogEntry, tables: &ReferenceTables) -> bool {
        let a = &entry.attributes;
        match self {
            Filter::TextSearch(needle) => {
                let needle = needle.to_ascii_lowercase();
                contains_ignore_case(a.nickname.as_deref().unwrap_or(""), &needle)
                    || contains_ignore_case(&a.ot_name, &needle)
                    || contains_ignore_case(entry.notes.as_deref().unwrap_or(""), &needle)
            }
            Filter::Species(id) => a.species_id == *id,
            Filter::SpeciesName(needle) => tables
                .species_name(a.species_id)
                .is_some_and(|name| contains_ignore_case(name, &needle.to_ascii_lowercase())),
            Filter::Nickname(needle) => contains_ignore_case(
                a.nickname.as_deref().unwrap_or(""),
                &needle.to_ascii_lowercase(),
            ),
            Filter::Shiny(v) => a.is_shiny == *v,
            Filter::Favorite(v) => entry.favorite == *v,
            Filter::Egg(v) => a.is_egg == *v,
            Filter::Form(v) => a.form == *v,
            Filter::Gender(g) => a.gender == *g,
            Filter::Ball(v) => a.ball_id == *v,
            Filter::HeldItem(v) => a.held_item_id == *v,
            Filter::OriginGame(v) => a.origin_game == *v,
            Filter::TeraType(v) => a.tera_type == Some(*v),
            Filter::LevelRange { min, max } => {
                min.is_none_or(|m| a.level >= m) && max.is_none_or(|m| a.level <= m)
            }
            Filter::OriginGeneration(b) => tables.origin_generation(a.origin_game) == *b,
            Filter::SpeciesGeneration(b) => tables.species_generation(a.species_id) == *b,
            Filter::Types(t) => t.matches_species(a.species_id, tables),
        }
    }
}

// ── Specifications ──────────────────────────────────────────────────────────

/// Something that narrows a collection of entries.
pub trait Specification {
    fn is_satisfied_by(&self, entry: &CatalogEntry, tables: &ReferenceTables) -> bool;

    /// Keep the entries that satisfy this specification, preserving order.
    fn apply(&self, mut entries: Vec<CatalogEntry>, tables: &ReferenceTables) -> Vec<CatalogEntry> {
        entries.retain(|e| self.is_satisfied_by(e, tables));
        entries
    }
}

impl Specification for Filter {
    fn is_satisfied_by(&self, entry: &CatalogEntry, tables: &ReferenceTables) -> bool {
        self.matches(entry, tables)
    }
}

/// An ordered set of filters combined by intersection. Empty means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeSpecification {
    filters: Vec<Filter>,
}

impl CompositeSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: Filter) -> &mut Self {
        self.filters.push(filter);
        self
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl FromIterator<Filter> for CompositeSpecification {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl Specification for CompositeSpecification {
    fn is_satisfied_by(&self, entry: &CatalogEntry, tables: &ReferenceTables) -> bool {
        self.filters.iter().all(|f| f.matches(entry, tables))
    }
}

// ── Filter Options ──────────────────────────────────────────────────────────

/// Optional filter parameters as a caller collects them (one field per
/// criterion). Unset and empty fields add no filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub search: Option<String>,
    pub species: Option<i32>,
    pub species_name: Option<String>,
    pub nickname: Option<String>,
    pub shiny: Option<bool>,
    pub favorite: Option<bool>,
    pub egg: Option<bool>,
    pub form: Option<i32>,
    pub gender: Option<Gender>,
    pub ball: Option<i32>,
    pub held_item: Option<i32>,
    pub origin_game: Option<i32>,
    pub tera_type: Option<i32>,
    pub min_level: Option<i32>,
    pub max_level: Option<i32>,
    pub origin_generation: Option<u8>,
    pub species_generation: Option<u8>,
    pub types: Option<TypeFilter>,
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl FilterOptions {
    pub fn to_specification(&self) -> CompositeSpecification {
        let mut spec = CompositeSpecification::new();
        if let Some(s) = non_empty(&self.search) {
            spec.add(Filter::TextSearch(s));
        }
        if let Some(id) = self.species {
            spec.add(Filter::Species(id));
        }
        if let Some(s) = non_empty(&self.species_name) {
            spec.add(Filter::SpeciesName(s));
        }
        if let Some(s) = non_empty(&self.nickname) {
            spec.add(Filter::Nickname(s));
        }
        if let Some(v) = self.shiny {
            spec.add(Filter::Shiny(v));
        }
        if let Some(v) = self.favorite {
            spec.add(Filter::Favorite(v));
        }
        if let Some(v) = self.egg {
            spec.add(Filter::Egg(v));
        }
        if let Some(v) = self.form {
            spec.add(Filter::Form(v));
        }
        if let Some(g) = self.gender {
            spec.add(Filter::Gender(g));
        }
        if let Some(v) = self.ball {
            spec.add(Filter::Ball(v));
        }
        if let Some(v) = self.held_item {
            spec.add(Filter::HeldItem(v));
        }
        if let Some(v) = self.origin_game {
            spec.add(Filter::OriginGame(v));
        }
        if let Some(v) = self.tera_type {
            spec.add(Filter::TeraType(v));
        }
        if self.min_level.is_some() || self.max_level.is_some() {
            spec.add(Filter::LevelRange {
                min: self.min_level,
                max: self.max_level,
            });
        }
        if let Some(b) = self.origin_generation {
            spec.add(Filter::OriginGeneration(b));
        }
        if let Some(b) = self.species_generation {
            spec.add(Filter::SpeciesGeneration(b));
        }
        if let Some(t) = self.types.filter(|t| !t.accepts_everything()) {
            spec.add(Filter::Types(t));
        }
        spec
    }
}
