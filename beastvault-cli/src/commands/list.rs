use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use beastvault_catalog::{ElementType, Gender, ReferenceTables};
use beastvault_lib::settings::PathOverrides;
use beastvault_query::{CatalogQuery, FilterOptions, SortKey, TypeFilter, TypeMode};

use super::{truncate_str, Library};
use crate::cli_types::ListArgs;
use crate::CliError;

fn parse_type(value: &Option<String>) -> Result<Option<ElementType>, CliError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            ElementType::from_str_loose(s)
                .ok_or_else(|| CliError::invalid(format!("Unknown type '{}'", s)))
        })
        .transpose()
}

/// Build a query from `list` arguments.
pub(crate) fn build_query(args: &ListArgs) -> Result<CatalogQuery, CliError> {
    let primary = parse_type(&args.primary_type)?;
    let secondary = parse_type(&args.secondary_type)?;

    let mode = match args.type_mode.as_deref() {
        Some(s) => TypeMode::from_str_loose(s)
            .ok_or_else(|| CliError::invalid(format!("Unknown type mode '{}'", s)))?,
        None => TypeMode::default(),
    };
    let mode = match mode {
        TypeMode::OnlyTypes { enforce_order } => TypeMode::OnlyTypes {
            enforce_order: enforce_order || args.enforce_type_order,
        },
        other => other,
    };
    let types = (primary.is_some() || secondary.is_some() || args.type_mode.is_some())
        .then(|| TypeFilter::new(primary, secondary, mode));

    let options = FilterOptions {
        search: args.search.clone(),
        species: args.species,
        species_name: args.species_name.clone(),
        nickname: args.nickname.clone(),
        shiny: args.shiny,
        favorite: args.favorite,
        egg: args.egg,
        form: args.form,
        gender: args.gender.as_deref().map(Gender::from_str_loose),
        ball: args.ball,
        held_item: args.held_item,
        origin_game: args.origin_game,
        tera_type: args.tera_type,
        min_level: args.min_level,
        max_level: args.max_level,
        origin_generation: args.origin_generation,
        species_generation: args.species_generation,
        types,
    };

    Ok(CatalogQuery {
        spec: options.to_specification(),
        sort: args.sort.iter().map(|s| SortKey::parse(s)).collect(),
        skip: args.skip,
        take: args.take,
    })
}

fn species_label(tables: &ReferenceTables, species_id: i32) -> String {
    tables
        .species_name(species_id)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", species_id))
}

/// Query the catalog and print one page.
pub(crate) fn run_list(overrides: &PathOverrides, args: ListArgs) -> Result<(), CliError> {
    let lib = Library::open(overrides)?;
    let query = build_query(&args)?;
    let page = beastvault_query::execute(&lib.conn, &query, &lib.tables)
        .map_err(|e| CliError::database(format!("Query failed: {}", e)))?;

    log::debug!("Query shape: {:?}", page.stats);
    if page.items.is_empty() {
        log::info!("No matching entries ({} total)", page.total);
        return Ok(());
    }

    log::info!(
        "{}",
        format!(
            "{:>6}  {:<14} {:<14} {:>3}  {:<7} {:<12}",
            "ID", "Species", "Nickname", "Lv", "Gender", "Trainer"
        )
        .if_supports_color(Stdout, |t| t.bold()),
    );
    for entry in &page.items {
        let a = &entry.attributes;
        let mut marks = String::new();
        if a.is_shiny {
            marks.push('*');
        }
        if entry.favorite {
            marks.push('\u{2665}');
        }
        if a.is_egg {
            marks.push_str(" (egg)");
        }
        log::info!(
            "{:>6}  {:<14} {:<14} {:>3}  {:<7} {:<12} {}",
            entry.id,
            truncate_str(&species_label(&lib.tables, a.species_id), 14),
            truncate_str(a.nickname.as_deref().unwrap_or("-"), 14),
            a.level,
            a.gender.as_str(),
            truncate_str(&a.ot_name, 12),
            marks.if_supports_color(Stdout, |t| t.yellow()),
        );
    }

    crate::log_blank();
    log::info!(
        "Showing {}-{} of {}",
        page.skip + 1,
        page.skip + page.items.len(),
        page.total
    );
    if page.has_more() {
        log::info!(
            "  Next page: --skip {}",
            (page.skip + page.take).to_string().if_supports_color(Stdout, |t| t.cyan())
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beastvault_query::{Filter, SortDirection, SortField};

    #[test]
    fn empty_args_build_unfiltered_default_query() {
        let query = build_query(&ListArgs {
            take: 50,
            ..Default::default()
        })
        .unwrap();
        assert!(query.spec.is_empty());
        assert!(query.sort.is_empty());
        assert_eq!(query.take, 50);
    }

    #[test]
    fn type_arguments_accept_names_and_codes() {
        let query = build_query(&ListArgs {
            primary_type: Some("fire".into()),
            secondary_type: Some(ElementType::Flying.code().to_string()),
            type_mode: Some("only".into()),
            enforce_type_order: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            query.spec.filters(),
            &[Filter::Types(TypeFilter::new(
                Some(ElementType::Fire),
                Some(ElementType::Flying),
                TypeMode::OnlyTypes {
                    enforce_order: true
                },
            ))]
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = build_query(&ListArgs {
            primary_type: Some("plasma".into()),
            ..Default::default()
        });
        assert!(matches!(err, Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn sort_arguments_parse_in_order() {
        let query = build_query(&ListArgs {
            sort: vec!["level:desc".into(), "species".into()],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            query.sort,
            vec![
                SortKey {
                    field: SortField::Level,
                    direction: SortDirection::Desc
                },
                SortKey::asc(SortField::Species),
            ]
        );
    }
}
