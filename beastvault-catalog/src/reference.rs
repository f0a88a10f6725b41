//! Immutable reference tables used by generation and type filters.
//!
//! A [`ReferenceTables`] value is built once at startup (built-in step tables
//! plus species data loaded from YAML) and handed to the query engine by
//! reference. Nothing in here is mutated after construction.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

// ── Element Types ───────────────────────────────────────────────────────────

/// Elemental type, numbered the way exported records number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
}

impl ElementType {
    pub const ALL: [ElementType; 18] = [
        Self::Normal,
        Self::Fighting,
        Self::Flying,
        Self::Poison,
        Self::Ground,
        Self::Rock,
        Self::Bug,
        Self::Ghost,
        Self::Steel,
        Self::Fire,
        Self::Water,
        Self::Grass,
        Self::Electric,
        Self::Psychic,
        Self::Ice,
        Self::Dragon,
        Self::Dark,
        Self::Fairy,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fighting => "fighting",
            Self::Flying => "flying",
            Self::Poison => "poison",
            Self::Ground => "ground",
            Self::Rock => "rock",
            Self::Bug => "bug",
            Self::Ghost => "ghost",
            Self::Steel => "steel",
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Grass => "grass",
            Self::Electric => "electric",
            Self::Psychic => "psychic",
            Self::Ice => "ice",
            Self::Dragon => "dragon",
            Self::Dark => "dark",
            Self::Fairy => "fairy",
        }
    }

    /// Accepts a type name in any case, or its numeric code.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i32>() {
            return Self::from_code(code);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

/// A species' (primary, secondary) type pair.
///
/// A secondary equal to the primary is normalized away, so a single-typed
/// species always has `secondary == None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub primary: ElementType,
    pub secondary: Option<ElementType>,
}

impl TypePair {
    pub fn new(primary: ElementType, secondary: Option<ElementType>) -> Self {
        Self {
            primary,
            secondary: secondary.filter(|s| *s != primary),
        }
    }

    pub fn is_dual(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn contains(&self, t: ElementType) -> bool {
        self.primary == t || self.secondary == Some(t)
    }

    /// The distinct types of this pair, primary first.
    pub fn types(&self) -> Vec<ElementType> {
        let mut v = vec![self.primary];
        v.extend(self.secondary);
        v
    }
}

// ── Step Tables ─────────────────────────────────────────────────────────────

/// A monotonic step table mapping a scalar to a coarse bucket.
///
/// Values `<= 0` map to bucket 0 (unknown). Otherwise the first step whose
/// inclusive upper bound is `>= value` wins; values past the last bound map
/// to `overflow`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTable {
    steps: Vec<(i32, u8)>,
    overflow: u8,
}

impl StepTable {
    pub fn new(steps: Vec<(i32, u8)>, overflow: u8) -> Self {
        Self { steps, overflow }
    }

    /// Origin game identifier to generation.
    pub fn origin_games() -> Self {
        Self::new(
            vec![
                (3, 1),
                (7, 2),
                (12, 3),
                (17, 4),
                (23, 5),
                (29, 6),
                (43, 7),
                (50, 8),
            ],
            9,
        )
    }

    /// National dex number to the generation that introduced the species.
    pub fn species_generations() -> Self {
        Self::new(
            vec![
                (151, 1),
                (251, 2),
                (386, 3),
                (493, 4),
                (649, 5),
                (721, 6),
                (809, 7),
                (905, 8),
            ],
            9,
        )
    }

    /// `(inclusive upper bound, bucket)` pairs in ascending order.
    pub fn steps(&self) -> &[(i32, u8)] {
        &self.steps
    }

    pub fn overflow(&self) -> u8 {
        self.overflow
    }

    pub fn bucket(&self, value: i32) -> u8 {
        if value <= 0 {
            return 0;
        }
        self.steps
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map(|(_, bucket)| *bucket)
            .unwrap_or(self.overflow)
    }

    /// The inclusive value range that maps to `bucket`, or `None` if no
    /// value does.
    pub fn range(&self, bucket: u8) -> Option<RangeInclusive<i32>> {
        if bucket == 0 {
            return Some(i32::MIN..=0);
        }
        let mut lower = 1;
        let mut found: Option<RangeInclusive<i32>> = None;
        for (upper, b) in &self.steps {
            if *b == bucket {
                found = Some(match found {
                    Some(r) => *r.start()..=*upper,
                    None => lower..=*upper,
                });
            }
            lower = upper.saturating_add(1);
        }
        if bucket == self.overflow {
            found = Some(match found {
                Some(r) => *r.start()..=i32::MAX,
                None => lower..=i32::MAX,
            });
        }
        found
    }
}

// ── Species Reference ───────────────────────────────────────────────────────

/// One species row as written in reference YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesInfo {
    pub id: i32,
    pub name: String,
    pub primary_type: ElementType,
    #[serde(default)]
    pub secondary_type: Option<ElementType>,
}

#[derive(Debug, Clone)]
struct SpeciesRef {
    name: String,
    types: TypePair,
}

/// Reference data consulted by bucket, type and species-name filters.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    origin_steps: StepTable,
    species_steps: StepTable,
    species: BTreeMap<i32, SpeciesRef>,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceTables {
    /// Built-in step tables and no species data.
    pub fn new() -> Self {
        Self {
            origin_steps: StepTable::origin_games(),
            species_steps: StepTable::species_generations(),
            species: BTreeMap::new(),
        }
    }

    /// Built-in step tables plus the given species rows. Later rows with the
    /// same id replace earlier ones.
    pub fn with_species(species: impl IntoIterator<Item = SpeciesInfo>) -> Self {
        let mut tables = Self::new();
        for info in species {
            tables.species.insert(
                info.id,
                SpeciesRef {
                    name: info.name,
                    types: TypePair::new(info.primary_type, info.secondary_type),
                },
            );
        }
        tables
    }

    pub fn origin_steps(&self) -> &StepTable {
        &self.origin_steps
    }

    pub fn species_steps(&self) -> &StepTable {
        &self.species_steps
    }

    pub fn origin_generation(&self, origin_game: i32) -> u8 {
        self.origin_steps.bucket(origin_game)
    }

    pub fn species_generation(&self, species_id: i32) -> u8 {
        self.species_steps.bucket(species_id)
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn species_name(&self, species_id: i32) -> Option<&str> {
        self.species.get(&species_id).map(|s| s.name.as_str())
    }

    pub fn type_pair(&self, species_id: i32) -> Option<TypePair> {
        self.species.get(&species_id).map(|s| s.types)
    }

    /// Species ids whose name contains `needle`, ignoring ASCII case.
    pub fn species_ids_by_name(&self, needle: &str) -> Vec<i32> {
        let needle = needle.to_ascii_lowercase();
        self.species
            .iter()
            .filter(|(_, s)| s.name.to_ascii_lowercase().contains(&needle))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Species ids whose type pair satisfies `pred`, in ascending order.
    pub fn species_ids_where(&self, pred: impl Fn(&TypePair) -> bool) -> Vec<i32> {
        self.species
            .iter()
            .filter(|(_, s)| pred(&s.types))
            .map(|(id, _)| *id)
            .collect()
    }
}
