//! Query execution: filter, count, sort and page.

use beastvault_catalog::{CatalogEntry, ReferenceTables};
use beastvault_db::{row_to_entry, ENTRY_COLUMNS};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::filter::{CompositeSpecification, Filter, Specification};
use crate::sort::{sort_entries, SortKey};
use crate::sql::{lower_order_by, lower_where};

pub const DEFAULT_TAKE: usize = 50;
pub const MAX_TAKE: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A complete query: filters, sort keys and a page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub spec: CompositeSpecification,
    pub sort: Vec<SortKey>,
    pub skip: usize,
    pub take: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            spec: CompositeSpecification::new(),
            sort: Vec::new(),
            skip: 0,
            take: DEFAULT_TAKE,
        }
    }
}

impl CatalogQuery {
    /// Page size clamped to `1..=MAX_TAKE`.
    pub fn page_size(&self) -> usize {
        self.take.clamp(1, MAX_TAKE)
    }

    pub fn stats(&self) -> QueryStats {
        let filters = self.spec.filters();
        QueryStats {
            filter_count: filters.len(),
            sort_count: self.sort.len(),
            has_text_search: filters.iter().any(|f| matches!(f, Filter::TextSearch(_))),
            has_type_filter: filters.iter().any(|f| matches!(f, Filter::Types(_))),
            has_level_filter: filters
                .iter()
                .any(|f| matches!(f, Filter::LevelRange { .. })),
            has_generation_filter: filters.iter().any(|f| {
                matches!(
                    f,
                    Filter::OriginGeneration(_) | Filter::SpeciesGeneration(_)
                )
            }),
            uses_complex_sorting: self.sort.len() > 1,
        }
    }
}

/// Shape of the query that produced a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub filter_count: usize,
    pub sort_count: usize,
    pub has_text_search: bool,
    pub has_type_filter: bool,
    pub has_level_filter: bool,
    pub has_generation_filter: bool,
    pub uses_complex_sorting: bool,
}

/// One page of results plus the unpaged match count.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub items: Vec<CatalogEntry>,
    pub total: usize,
    pub skip: usize,
    pub take: usize,
    pub stats: QueryStats,
}

impl QueryPage {
    pub fn has_more(&self) -> bool {
        self.skip + self.items.len() < self.total
    }
}

/// Run the query against the catalog database.
pub fn execute(
    conn: &Connection,
    query: &CatalogQuery,
    tables: &ReferenceTables,
) -> Result<QueryPage, QueryError> {
    let filter = lower_where(&query.spec, tables);
    let order = lower_order_by(&query.sort, tables);
    let take = query.page_size();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM entries e WHERE {}", filter.clause),
        params_from_iter(filter.params.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries e WHERE {} ORDER BY {order} LIMIT ? OFFSET ?",
        filter.clause
    );
    log::debug!("Catalog query: {sql}");

    let mut params = filter.params;
    params.push(rusqlite::types::Value::Integer(take as i64));
    params.push(rusqlite::types::Value::Integer(
        i64::try_from(query.skip).unwrap_or(i64::MAX),
    ));

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(params.iter()), row_to_entry)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QueryPage {
        items,
        total: usize::try_from(total).unwrap_or(0),
        skip: query.skip,
        take,
        stats: query.stats(),
    })
}

/// Run the query over an already-loaded collection.
pub fn execute_in_memory(
    entries: Vec<CatalogEntry>,
    query: &CatalogQuery,
    tables: &ReferenceTables,
) -> QueryPage {
    let mut matched = query.spec.apply(entries, tables);
    sort_entries(&mut matched, &query.sort, tables);
    let total = matched.len();
    let take = query.page_size();
    let items = matched.into_iter().skip(query.skip).take(take).collect();
    QueryPage {
        items,
        total,
        skip: query.skip,
        take,
        stats: query.stats(),
    }
}
