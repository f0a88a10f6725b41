use beastvault_catalog::{
    ElementType, EntryAttributes, Gender, NewCatalogEntry, NewFileRecord, ReferenceTables,
    SpeciesInfo,
};
use beastvault_db::{insert_catalog_item, list_entries, open_memory, set_favorite, set_notes};
use beastvault_query::*;
use rusqlite::Connection;

fn species(id: i32, name: &str, p: ElementType, s: Option<ElementType>) -> SpeciesInfo {
    SpeciesInfo {
        id,
        name: name.into(),
        primary_type: p,
        secondary_type: s,
    }
}

fn tables() -> ReferenceTables {
    use ElementType::*;
    ReferenceTables::with_species(vec![
        species(1, "Bulbasaur", Grass, Some(Poison)),
        species(4, "Charmander", Fire, None),
        species(6, "Charizard", Fire, Some(Flying)),
        species(25, "Pikachu", Electric, None),
        species(130, "Gyarados", Water, Some(Flying)),
        species(448, "Lucario", Fighting, Some(Steel)),
    ])
}

struct Row {
    species_id: i32,
    nickname: Option<&'static str>,
    ot: &'static str,
    level: i32,
    shiny: bool,
    origin: i32,
    gender: Gender,
    tera: Option<i32>,
}

fn row(species_id: i32, level: i32, origin: i32) -> Row {
    Row {
        species_id,
        nickname: None,
        ot: "Ash",
        level,
        shiny: false,
        origin,
        gender: Gender::Male,
        tera: None,
    }
}

/// Entry ids are 1..=n in fixture order.
fn fixture() -> Connection {
    let conn = open_memory().unwrap();
    let rows = vec![
        Row { nickname: Some("Sprout"), ..row(1, 12, 1) },
        Row { shiny: true, ..row(4, 36, 5) },
        Row { ot: "Misty", gender: Gender::Female, ..row(6, 36, 20) },
        Row { nickname: Some("Sparky"), tera: Some(12), ..row(25, 50, 50) },
        Row { shiny: true, ..row(130, 20, 51) },
        Row { ot: "Cynthia", ..row(448, 70, 12) },
        Row { gender: Gender::Unknown, ..row(9999, 1, 0) },
    ];
    for (i, r) in rows.into_iter().enumerate() {
        let hash = format!("{:064x}", i + 1);
        let file = NewFileRecord {
            content_hash: hash.clone(),
            display_name: format!("e_{}.pk9", &hash[56..]),
            original_name: None,
            format_tag: "pk9".into(),
            byte_size: 4,
            primary_path: format!("/vault/e_{}.pk9", &hash[56..]),
            imported_at: "2025-01-01T00:00:00+00:00".into(),
        };
        let entry = NewCatalogEntry {
            attributes: EntryAttributes {
                species_id: r.species_id,
                nickname: r.nickname.map(String::from),
                ot_name: r.ot.into(),
                level: r.level,
                is_shiny: r.shiny,
                origin_game: r.origin,
                gender: r.gender,
                tera_type: r.tera,
                ..Default::default()
            },
            ..Default::default()
        };
        insert_catalog_item(&conn, &file, &entry).unwrap();
    }
    set_favorite(&conn, 3, true).unwrap();
    set_notes(&conn, 5, Some("Caught at the LAKE")).unwrap();
    conn
}

fn ids(page: &QueryPage) -> Vec<i64> {
    page.items.iter().map(|e| e.id).collect()
}

fn both(conn: &Connection, query: &CatalogQuery) -> (QueryPage, QueryPage) {
    let tables = tables();
    let sql = execute(conn, query, &tables).unwrap();
    let mem = execute_in_memory(list_entries(conn).unwrap(), query, &tables);
    (sql, mem)
}

fn only(filter: Filter) -> CatalogQuery {
    CatalogQuery {
        spec: CompositeSpecification::new().with(filter),
        sort: vec![SortKey::asc(SortField::Id)],
        ..Default::default()
    }
}

#[test]
fn sql_and_memory_select_the_same_entries() {
    use ElementType::*;
    let conn = fixture();
    let cases = vec![
        Filter::TextSearch("spar".into()),
        Filter::TextSearch("lake".into()),
        Filter::TextSearch("MISTY".into()),
        Filter::Species(25),
        Filter::SpeciesName("char".into()),
        Filter::Nickname("SPR".into()),
        Filter::Shiny(true),
        Filter::Favorite(true),
        Filter::Gender(Gender::Female),
        Filter::TeraType(12),
        Filter::LevelRange { min: Some(20), max: Some(50) },
        Filter::LevelRange { min: None, max: Some(12) },
        Filter::OriginGeneration(0),
        Filter::OriginGeneration(3),
        Filter::OriginGeneration(8),
        Filter::OriginGeneration(9),
        Filter::SpeciesGeneration(1),
        Filter::SpeciesGeneration(4),
        Filter::SpeciesGeneration(9),
        Filter::Types(TypeFilter::new(Some(Flying), None, TypeMode::AnyOf)),
        Filter::Types(TypeFilter::new(Some(Fire), Some(Water), TypeMode::AnyOf)),
        Filter::Types(TypeFilter::new(Some(Flying), Some(Fire), TypeMode::AllOf)),
        Filter::Types(TypeFilter::new(
            Some(Fire),
            None,
            TypeMode::OnlyTypes {
                enforce_order: false,
            },
        )),
        Filter::Types(TypeFilter::new(Some(Flying), Some(Water), TypeMode::UnorderedPair)),
        Filter::Types(TypeFilter::new(Some(Flying), Some(Water), TypeMode::ExactOrder)),
        Filter::Types(TypeFilter::default()),
    ];
    for filter in cases {
        let (sql, mem) = both(&conn, &only(filter.clone()));
        assert_eq!(ids(&sql), ids(&mem), "{filter:?}");
        assert_eq!(sql.total, mem.total, "{filter:?}");
    }
}

#[test]
fn expected_matches_for_representative_filters() {
    use ElementType::*;
    let conn = fixture();
    let tables = tables();
    let run = |f: Filter| ids(&execute(&conn, &only(f), &tables).unwrap());

    assert_eq!(run(Filter::TextSearch("lake".into())), vec![5]);
    assert_eq!(run(Filter::SpeciesName("char".into())), vec![2, 3]);
    assert_eq!(run(Filter::OriginGeneration(8)), vec![4]);
    assert_eq!(run(Filter::OriginGeneration(9)), vec![5]);
    assert_eq!(run(Filter::OriginGeneration(0)), vec![7]);
    assert_eq!(run(Filter::SpeciesGeneration(9)), vec![7]);
    assert_eq!(
        run(Filter::Types(TypeFilter::new(Some(Flying), None, TypeMode::AnyOf))),
        vec![3, 5]
    );
    assert_eq!(
        run(Filter::Types(TypeFilter::new(Some(Fire), None, TypeMode::PrimaryOnly))),
        vec![2]
    );
    // Unknown species only pass an unconstrained type filter.
    assert_eq!(run(Filter::Types(TypeFilter::default())).len(), 7);
}

#[test]
fn composite_filters_intersect() {
    let conn = fixture();
    let query = CatalogQuery {
        spec: CompositeSpecification::new()
            .with(Filter::Shiny(true))
            .with(Filter::LevelRange { min: Some(30), max: None }),
        ..Default::default()
    };
    let (sql, mem) = both(&conn, &query);
    assert_eq!(ids(&sql), vec![2]);
    assert_eq!(ids(&mem), vec![2]);
}

#[test]
fn level_descending_breaks_ties_by_id() {
    let conn = fixture();
    let query = CatalogQuery {
        sort: vec![SortKey::desc(SortField::Level)],
        ..Default::default()
    };
    let (sql, mem) = both(&conn, &query);
    assert_eq!(ids(&sql), vec![6, 4, 2, 3, 5, 1, 7]);
    assert_eq!(ids(&sql), ids(&mem));
}

#[test]
fn secondary_keys_apply_for_every_field() {
    let conn = fixture();
    for field in SortField::ALL {
        let query = CatalogQuery {
            sort: vec![SortKey::desc(SortField::Shiny), SortKey::desc(field)],
            ..Default::default()
        };
        let (sql, mem) = both(&conn, &query);
        assert_eq!(ids(&sql), ids(&mem), "{field:?}");
    }
}

#[test]
fn unknown_sort_field_uses_default_order() {
    let conn = fixture();
    let query = CatalogQuery {
        sort: vec![SortKey::parse("charisma")],
        ..Default::default()
    };
    let (sql, _) = both(&conn, &query);
    assert_eq!(ids(&sql), vec![7, 6, 5, 4, 3, 2, 1]);
}

#[test]
fn paging_reports_unpaged_total() {
    let conn = fixture();
    let query = CatalogQuery {
        sort: vec![SortKey::asc(SortField::Id)],
        skip: 2,
        take: 3,
        ..Default::default()
    };
    let (sql, mem) = both(&conn, &query);
    assert_eq!(ids(&sql), vec![3, 4, 5]);
    assert_eq!(sql.total, 7);
    assert!(sql.has_more());
    assert_eq!(ids(&sql), ids(&mem));

    let past_end = CatalogQuery { skip: 100, ..query };
    let (sql, mem) = both(&conn, &past_end);
    assert!(sql.items.is_empty() && mem.items.is_empty());
    assert_eq!(sql.total, 7);
}

#[test]
fn take_is_clamped() {
    let conn = fixture();
    let query = CatalogQuery {
        take: 0,
        ..Default::default()
    };
    let (sql, _) = both(&conn, &query);
    assert_eq!(sql.items.len(), 1);
    assert_eq!(CatalogQuery { take: 10_000, ..Default::default() }.page_size(), MAX_TAKE);
}

#[test]
fn stats_describe_the_query() {
    let query = CatalogQuery {
        spec: FilterOptions {
            search: Some("ash".into()),
            min_level: Some(5),
            origin_generation: Some(1),
            ..Default::default()
        }
        .to_specification(),
        sort: vec![SortKey::asc(SortField::Level), SortKey::desc(SortField::Id)],
        ..Default::default()
    };
    let stats = query.stats();
    assert_eq!(stats.filter_count, 3);
    assert!(stats.has_text_search && stats.has_level_filter && stats.has_generation_filter);
    assert!(!stats.has_type_filter);
    assert!(stats.uses_complex_sorting);
}
