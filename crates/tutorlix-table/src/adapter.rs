//! Table adapter bridging table queries to the backend list convention.
//!
//! [`TableAdapter`] wraps any paginated list function and exposes the
//! contract the table needs: give it a [`TableQuery`], get back an
//! [`AdapterResult`]. Paging is translated to one-based `page`/`page_size`,
//! the first sort entry becomes an `ordering` parameter, and page-level
//! filters are passed through untouched.
//!
//! # Example
//!
//! ```
//! use tutorlix_table::{
//!     ListResponse, QueryParams, SortEntry, SortMap, TableAdapter, TableError, TableQuery,
//! };
//!
//! # async fn example() {
//! let adapter = TableAdapter::new(|params: QueryParams| async move {
//!     assert_eq!(params.get("ordering"), Some("-creator__first_name"));
//!     Ok::<_, TableError>(ListResponse::page(0, Vec::<serde_json::Value>::new()))
//! })
//! .with_sort_map(SortMap::new().with("creator", "creator__first_name"));
//!
//! let query = TableQuery::new(50).with_sort(SortEntry::desc("creator"));
//! let result = adapter.fetch_data(&query).await;
//! assert!(result.rows.is_empty());
//! # }
//! ```

use std::future::Future;
use std::marker::PhantomData;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::envelope::{ListResponse, Row};
use crate::error::Result;
use crate::query::{
    QueryParams, SortMap, TableQuery, PARAM_ORDERING, PARAM_PAGE, PARAM_PAGE_SIZE, PARAM_SEARCH,
};

// ============================================================================
// ListFetcher
// ============================================================================

/// A paginated list function, e.g. "get notes".
///
/// Implemented for async closures taking [`QueryParams`] and for HTTP list
/// endpoints in `tutorlix-client`.
pub trait ListFetcher<R>: Send + Sync {
    /// Fetches one page of rows for the given backend parameters.
    fn list(&self, params: QueryParams) -> BoxFuture<'_, Result<ListResponse<R>>>;
}

impl<R, F, Fut> ListFetcher<R> for F
where
    F: Fn(QueryParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ListResponse<R>>> + Send + 'static,
{
    fn list(&self, params: QueryParams) -> BoxFuture<'_, Result<ListResponse<R>>> {
        Box::pin(self(params))
    }
}

// ============================================================================
// AdapterResult
// ============================================================================

/// Rows and paging totals in the shape the table renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterResult<R = Row> {
    /// Rows for the requested page.
    pub rows: Vec<R>,
    /// Number of pages at the requested page size.
    pub page_count: u64,
    /// Total rows across all pages.
    pub total_count: u64,
}

impl<R> Default for AdapterResult<R> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<R> AdapterResult<R> {
    /// The result shown when nothing matched or the fetch failed.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rows: Vec::new(),
            page_count: 0,
            total_count: 0,
        }
    }

    /// Normalizes a backend response.
    ///
    /// A bare array is treated as the complete row set: one page whose total
    /// is the array length. The true total cannot be recovered in that case.
    #[must_use]
    pub fn from_response(response: ListResponse<R>, page_size: usize) -> Self {
        match response {
            ListResponse::Bare(rows) => {
                let total_count = rows.len() as u64;
                Self {
                    rows,
                    page_count: 1,
                    total_count,
                }
            }
            ListResponse::Page(envelope) => Self {
                rows: envelope.results,
                page_count: page_count(envelope.count, page_size),
                total_count: envelope.count,
            },
        }
    }

    /// Returns `true` when there are no rows to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `ceil(total / page_size)`, or zero for a zero page size.
#[must_use]
pub const fn page_count(total_count: u64, page_size: usize) -> u64 {
    if page_size == 0 {
        0
    } else {
        total_count.div_ceil(page_size as u64)
    }
}

// ============================================================================
// TableAdapter
// ============================================================================

/// Wraps a list function with the table's paging, sorting and search contract.
///
/// The adapter is stateless after construction; it only holds the list
/// function and the sort map, so one instance can serve every fetch a table
/// makes.
pub struct TableAdapter<F, R = Row> {
    list: F,
    sort_map: SortMap,
    _rows: PhantomData<fn() -> R>,
}

impl<F, R> std::fmt::Debug for TableAdapter<F, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableAdapter")
            .field("sort_map", &self.sort_map)
            .finish_non_exhaustive()
    }
}

impl<F, R> TableAdapter<F, R>
where
    F: ListFetcher<R>,
{
    /// Creates an adapter with an identity sort map.
    #[must_use]
    pub fn new(list: F) -> Self {
        Self {
            list,
            sort_map: SortMap::new(),
            _rows: PhantomData,
        }
    }

    /// Sets the column-to-field sort map.
    #[must_use]
    pub fn with_sort_map(mut self, sort_map: SortMap) -> Self {
        self.sort_map = sort_map;
        self
    }

    /// Returns the sort map.
    #[must_use]
    pub const fn sort_map(&self) -> &SortMap {
        &self.sort_map
    }

    /// Translates a table query into backend query parameters.
    ///
    /// Only the first sort entry is honored. Extra filters are applied last,
    /// so a filter named like a paging parameter replaces it.
    #[must_use]
    pub fn build_params(&self, query: &TableQuery) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert(PARAM_PAGE, query.page_index + 1);
        params.insert(PARAM_PAGE_SIZE, query.page_size);

        if !query.search.is_empty() {
            params.insert(PARAM_SEARCH, &query.search);
        }

        if let Some(sort) = query.sorting.first() {
            let field = self.sort_map.resolve(&sort.column_id);
            if !field.is_empty() {
                let ordering = if sort.descending {
                    format!("-{field}")
                } else {
                    field.to_string()
                };
                params.insert(PARAM_ORDERING, ordering);
            }
        }

        for (name, value) in &query.extra_filters {
            params.insert(name.clone(), value);
        }

        params
    }

    /// Fetches a page and normalizes it, surfacing any failure.
    pub async fn try_fetch(&self, query: &TableQuery) -> Result<AdapterResult<R>> {
        let params = self.build_params(query);
        debug!(?params, "Fetching table page");

        let response = self.list.list(params).await?;
        let result = AdapterResult::from_response(response, query.page_size);

        debug!(
            rows = result.rows.len(),
            total_count = result.total_count,
            page_count = result.page_count,
            "Table page fetched"
        );
        Ok(result)
    }

    /// Fetches a page, degrading any failure to an empty result.
    ///
    /// Never fails: the error is logged and the table shows its empty state.
    pub async fn fetch_data(&self, query: &TableQuery) -> AdapterResult<R> {
        match self.try_fetch(query).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Table adapter fetch failed, showing empty page");
                AdapterResult::empty()
            }
        }
    }
}
