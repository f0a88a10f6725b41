//! Composable catalog queries.
//!
//! Filters form a small intermediate representation ([`Filter`]) that can be
//! evaluated in memory or lowered to SQL. Sorting and paging are applied
//! after filtering, with a trailing id tiebreak for stable pages.

pub mod execute;
pub mod filter;
pub mod sort;
pub mod sql;

pub use execute::{
    execute, execute_in_memory, CatalogQuery, QueryError, QueryPage, QueryStats, DEFAULT_TAKE,
    MAX_TAKE,
};
pub use filter::{
    CompositeSpecification, Filter, FilterOptions, Specification, TypeFilter, TypeMode,
};
pub use sort::{SortDirection, SortField, SortKey};
pub use sql::{lower_filter, lower_order_by, lower_where, SqlFragment};
