//! Lowering of filters and sort keys to SQL over the `entries e` table.
//!
//! Bucket filters become value ranges taken from the step tables, and
//! reference-table filters (types, species names) become `species_id IN`
//! lists, so every query runs without joining reference data. Positional
//! `?` placeholders appear in the same order as [`SqlFragment::params`].

use beastvault_catalog::{ReferenceTables, StepTable};
use rusqlite::types::Value;

use crate::filter::{CompositeSpecification, Filter};
use crate::sort::{effective_keys, SortDirection, SortField, SortKey};

/// A boolean SQL expression and its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    fn new(clause: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }

    fn always() -> Self {
        Self::new("1", Vec::new())
    }

    fn never() -> Self {
        Self::new("0", Vec::new())
    }
}

fn int(v: impl Into<i64>) -> Value {
    Value::Integer(v.into())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_ascii_lowercase())
}

fn in_list(column: &str, ids: &[i32]) -> SqlFragment {
    if ids.is_empty() {
        return SqlFragment::never();
    }
    let list = ids
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    SqlFragment::new(format!("{column} IN ({list})"), Vec::new())
}

fn bucket_range(column: &str, table: &StepTable, bucket: u8) -> SqlFragment {
    match table.range(bucket) {
        Some(r) => SqlFragment::new(
            format!("{column} BETWEEN ? AND ?"),
            vec![int(*r.start()), int(*r.end())],
        ),
        None => SqlFragment::never(),
    }
}

/// `LOWER()` folds ASCII only, matching the in-memory comparison.
fn contains(column: &str) -> String {
    format!("instr(LOWER(COALESCE({column}, '')), ?) > 0")
}

pub fn lower_filter(filter: &Filter, tables: &ReferenceTables) -> SqlFragment {
    match filter {
        Filter::TextSearch(needle) => SqlFragment::new(
            format!(
                "({} OR {} OR {})",
                contains("e.nickname"),
                contains("e.ot_name"),
                contains("e.notes")
            ),
            vec![text(needle), text(needle), text(needle)],
        ),
        Filter::Species(id) => SqlFragment::new("e.species_id = ?", vec![int(*id)]),
        Filter::SpeciesName(needle) => in_list("e.species_id", &tables.species_ids_by_name(needle)),
        Filter::Nickname(needle) => SqlFragment::new(contains("e.nickname"), vec![text(needle)]),
        Filter::Shiny(v) => SqlFragment::new("e.is_shiny = ?", vec![int(*v)]),
        Filter::Favorite(v) => SqlFragment::new("e.favorite = ?", vec![int(*v)]),
        Filter::Egg(v) => SqlFragment::new("e.is_egg = ?", vec![int(*v)]),
        Filter::Form(v) => SqlFragment::new("e.form = ?", vec![int(*v)]),
        Filter::Gender(g) => SqlFragment::new("e.gender = ?", vec![int(g.code())]),
        Filter::Ball(v) => SqlFragment::new("e.ball_id = ?", vec![int(*v)]),
        Filter::HeldItem(v) => SqlFragment::new("e.held_item_id = ?", vec![int(*v)]),
        Filter::OriginGame(v) => SqlFragment::new("e.origin_game = ?", vec![int(*v)]),
        Filter::TeraType(v) => SqlFragment::new("e.tera_type = ?", vec![int(*v)]),
        Filter::LevelRange { min, max } => {
            let mut parts = Vec::new();
            let mut params = Vec::new();
            if let Some(m) = min {
                parts.push("e.level >= ?");
                params.push(int(*m));
            }
            if let Some(m) = max {
                parts.push("e.level <= ?");
                params.push(int(*m));
            }
            if parts.is_empty() {
                SqlFragment::always()
            } else {
                SqlFragment::new(format!("({})", parts.join(" AND ")), params)
            }
        }
        Filter::OriginGeneration(b) => bucket_range("e.origin_game", tables.origin_steps(), *b),
        Filter::SpeciesGeneration(b) => bucket_range("e.species_id", tables.species_steps(), *b),
        Filter::Types(t) => {
            if t.accepts_everything() {
                SqlFragment::always()
            } else {
                in_list("e.species_id", &tables.species_ids_where(|p| t.matches(p)))
            }
        }
    }
}

/// Lower a composite specification to a `WHERE` body (`1` when empty).
pub fn lower_where(spec: &CompositeSpecification, tables: &ReferenceTables) -> SqlFragment {
    if spec.is_empty() {
        return SqlFragment::always();
    }
    let mut clauses = Vec::with_capacity(spec.len());
    let mut params = Vec::new();
    for filter in spec.filters() {
        let frag = lower_filter(filter, tables);
        clauses.push(frag.clause);
        params.extend(frag.params);
    }
    SqlFragment::new(clauses.join(" AND "), params)
}

/// `CASE` expression mapping `column` to its bucket under `table`.
fn bucket_case(column: &str, table: &StepTable) -> String {
    let mut sql = format!("CASE WHEN {column} <= 0 THEN 0");
    for (upper, bucket) in table.steps() {
        sql.push_str(&format!(" WHEN {column} <= {upper} THEN {bucket}"));
    }
    sql.push_str(&format!(" ELSE {} END", table.overflow()));
    sql
}

fn sort_expr(field: SortField, tables: &ReferenceTables) -> String {
    match field {
        SortField::Id | SortField::CreatedAt => "e.id".into(),
        SortField::Species | SortField::SpeciesName => "e.species_id".into(),
        SortField::Nickname => "e.nickname".into(),
        SortField::Level => "e.level".into(),
        SortField::OriginGeneration => bucket_case("e.origin_game", tables.origin_steps()),
        SortField::SpeciesGeneration => bucket_case("e.species_id", tables.species_steps()),
        SortField::Ball => "e.ball_id".into(),
        SortField::Gender => "e.gender".into(),
        SortField::Shiny => "e.is_shiny".into(),
        SortField::Form => "e.form".into(),
        SortField::Favorite => "e.favorite".into(),
    }
}

/// `ORDER BY` body for the effective keys of `keys`.
pub fn lower_order_by(keys: &[SortKey], tables: &ReferenceTables) -> String {
    effective_keys(keys)
        .iter()
        .map(|k| {
            let dir = match k.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("{} {dir}", sort_expr(k.field, tables))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use beastvault_catalog::ElementType;

    use crate::filter::{TypeFilter, TypeMode};

    #[test]
    fn empty_spec_selects_everything() {
        let frag = lower_where(&CompositeSpecification::new(), &ReferenceTables::new());
        assert_eq!(frag.clause, "1");
        assert!(frag.params.is_empty());
    }

    #[test]
    fn generation_becomes_a_range() {
        let frag = lower_filter(&Filter::OriginGeneration(2), &ReferenceTables::new());
        assert_eq!(frag.clause, "e.origin_game BETWEEN ? AND ?");
        assert_eq!(frag.params, vec![Value::Integer(4), Value::Integer(7)]);
    }

    #[test]
    fn type_filter_without_reference_data_selects_nothing() {
        let t = TypeFilter::new(Some(ElementType::Fire), None, TypeMode::AnyOf);
        let frag = lower_filter(&Filter::Types(t), &ReferenceTables::new());
        assert_eq!(frag.clause, "0");
    }

    #[test]
    fn order_by_always_ends_with_id() {
        let sql = lower_order_by(&[SortKey::desc(SortField::Level)], &ReferenceTables::new());
        assert_eq!(sql, "e.level DESC, e.id ASC");
        assert_eq!(lower_order_by(&[], &ReferenceTables::new()), "e.id DESC");
    }

    #[test]
    fn bucket_case_lists_every_step() {
        let sql = bucket_case("x", &StepTable::new(vec![(3, 1), (7, 2)], 3));
        assert_eq!(
            sql,
            "CASE WHEN x <= 0 THEN 0 WHEN x <= 3 THEN 1 WHEN x <= 7 THEN 2 ELSE 3 END"
        );
    }
}
