//! Sort keys and the in-memory comparator.
//!
//! Sorting is always total: unless the caller already sorts by id, a
//! trailing ascending id key breaks ties so paging is deterministic.

use std::cmp::Ordering;

use beastvault_catalog::{CatalogEntry, ReferenceTables};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Species,
    /// Sorts by species id; names are presentation only.
    SpeciesName,
    Nickname,
    Level,
    OriginGeneration,
    SpeciesGeneration,
    Ball,
    Gender,
    Shiny,
    Form,
    /// Insertion order, which is id order.
    CreatedAt,
    Favorite,
}

impl SortField {
    pub const ALL: [SortField; 13] = [
        Self::Id,
        Self::Species,
        Self::SpeciesName,
        Self::Nickname,
        Self::Level,
        Self::OriginGeneration,
        Self::SpeciesGeneration,
        Self::Ball,
        Self::Gender,
        Self::Shiny,
        Self::Form,
        Self::CreatedAt,
        Self::Favorite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Species => "species",
            Self::SpeciesName => "species-name",
            Self::Nickname => "nickname",
            Self::Level => "level",
            Self::OriginGeneration => "origin-generation",
            Self::SpeciesGeneration => "species-generation",
            Self::Ball => "ball",
            Self::Gender => "gender",
            Self::Shiny => "shiny",
            Self::Form => "form",
            Self::CreatedAt => "created",
            Self::Favorite => "favorite",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "id" => Some(Self::Id),
            "species" | "dex" | "pokedex-number" => Some(Self::Species),
            "species-name" | "name" => Some(Self::SpeciesName),
            "nickname" => Some(Self::Nickname),
            "level" => Some(Self::Level),
            "origin-generation" | "generation" => Some(Self::OriginGeneration),
            "species-generation" | "captured-generation" => Some(Self::SpeciesGeneration),
            "ball" => Some(Self::Ball),
            "gender" => Some(Self::Gender),
            "shiny" => Some(Self::Shiny),
            "form" => Some(Self::Form),
            "created" | "created-at" | "imported" => Some(Self::CreatedAt),
            "favorite" => Some(Self::Favorite),
            _ => None,
        }
    }

    /// Keys that already order by id, so no tiebreak is needed after them.
    fn is_identity(self) -> bool {
        matches!(self, Self::Id | Self::CreatedAt)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    /// Used when no key is given or a field name is not recognized.
    pub const DEFAULT: SortKey = SortKey {
        field: SortField::Id,
        direction: SortDirection::Desc,
    };

    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`. An unknown field yields
    /// [`SortKey::DEFAULT`]; an unknown direction means ascending.
    pub fn parse(s: &str) -> Self {
        let (name, dir) = match s.split_once(':') {
            Some((n, d)) => (n, Some(d)),
            None => (s, None),
        };
        let Some(field) = SortField::from_str_loose(name) else {
            log::debug!("Unknown sort field {name:?}, using default order");
            return Self::DEFAULT;
        };
        let direction = match dir.map(|d| d.trim().to_lowercase()) {
            Some(d) if d == "desc" || d == "descending" => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Self { field, direction }
    }
}

/// The keys actually applied: the default when `keys` is empty, otherwise
/// `keys` plus an ascending id tiebreak.
pub fn effective_keys(keys: &[SortKey]) -> Vec<SortKey> {
    if keys.is_empty() {
        return vec![SortKey::DEFAULT];
    }
    let mut out = keys.to_vec();
    if !keys.iter().any(|k| k.field.is_identity()) {
        out.push(SortKey::asc(SortField::Id));
    }
    out
}

fn compare_field(
    field: SortField,
    a: &CatalogEntry,
    b: &CatalogEntry,
    tables: &ReferenceTables,
) -> Ordering {
    let (x, y) = (&a.attributes, &b.attributes);
    match field {
        SortField::Id | SortField::CreatedAt => a.id.cmp(&b.id),
        SortField::Species | SortField::SpeciesName => x.species_id.cmp(&y.species_id),
        SortField::Nickname => x.nickname.cmp(&y.nickname),
        SortField::Level => x.level.cmp(&y.level),
        SortField::OriginGeneration => tables
            .origin_generation(x.origin_game)
            .cmp(&tables.origin_generation(y.origin_game)),
        SortField::SpeciesGeneration => tables
            .species_generation(x.species_id)
            .cmp(&tables.species_generation(y.species_id)),
        SortField::Ball => x.ball_id.cmp(&y.ball_id),
        SortField::Gender => x.gender.code().cmp(&y.gender.code()),
        SortField::Shiny => x.is_shiny.cmp(&y.is_shiny),
        SortField::Form => x.form.cmp(&y.form),
        SortField::Favorite => a.favorite.cmp(&b.favorite),
    }
}

/// Compare two entries under the effective keys for `keys`.
pub fn compare(
    a: &CatalogEntry,
    b: &CatalogEntry,
    keys: &[SortKey],
    tables: &ReferenceTables,
) -> Ordering {
    for key in effective_keys(keys) {
        let ord = compare_field(key.field, a, b, tables);
        let ord = match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

pub fn sort_entries(entries: &mut [CatalogEntry], keys: &[SortKey], tables: &ReferenceTables) {
    let keys = effective_keys(keys);
    entries.sort_by(|a, b| compare(a, b, &keys, tables));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_and_direction() {
        assert_eq!(SortKey::parse("level:desc"), SortKey::desc(SortField::Level));
        assert_eq!(SortKey::parse("Level"), SortKey::asc(SortField::Level));
        assert_eq!(
            SortKey::parse("pokedex_number:sideways"),
            SortKey::asc(SortField::Species)
        );
    }

    #[test]
    fn unknown_field_falls_back_to_default() {
        assert_eq!(SortKey::parse("charisma:asc"), SortKey::DEFAULT);
    }

    #[test]
    fn tiebreak_is_appended_once() {
        assert_eq!(effective_keys(&[]), vec![SortKey::DEFAULT]);
        assert_eq!(
            effective_keys(&[SortKey::desc(SortField::Level)]),
            vec![SortKey::desc(SortField::Level), SortKey::asc(SortField::Id)]
        );
        assert_eq!(
            effective_keys(&[SortKey::desc(SortField::CreatedAt)]),
            vec![SortKey::desc(SortField::CreatedAt)]
        );
    }

    #[test]
    fn every_field_round_trips_by_name() {
        for field in SortField::ALL {
            assert_eq!(SortField::from_str_loose(field.as_str()), Some(field));
        }
    }
}
