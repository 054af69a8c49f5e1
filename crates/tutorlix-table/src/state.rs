//! Table state machine for server-driven data tables.
//!
//! [`TableState`] owns everything a list view tracks between fetches:
//! pagination, the active sort, the raw and committed search text, the
//! page-level dependencies, and the rows last applied. It is a plain value
//! driven by [`TableAction`]s; every action that changes what the backend
//! would be asked for yields exactly one [`FetchTicket`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::AdapterResult;
use crate::envelope::Row;
use crate::error::Result;
use crate::query::{ExtraFilters, SortEntry, TableQuery};

// ============================================================================
// TableStatus
// ============================================================================

/// Current status of a table.
///
/// The status transitions through these states:
/// - `Idle` -> `Loading` (mount, or any watched change)
/// - `Loading` -> `Loaded` (latest fetch returned rows)
/// - `Loading` -> `Empty` (latest fetch returned no rows, or failed)
/// - `Loaded` / `Empty` -> `Loading` (any watched change)
///
/// A failed fetch is not a separate state; it shows as `Empty`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    /// Not mounted yet; nothing requested.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The latest fetch returned rows.
    Loaded,
    /// The latest fetch returned no rows.
    Empty,
}

impl TableStatus {
    /// Returns `true` once the latest fetch has been applied.
    ///
    /// # Examples
    ///
    /// ```
    /// use tutorlix_table::TableStatus;
    ///
    /// assert!(TableStatus::Loaded.is_settled());
    /// assert!(TableStatus::Empty.is_settled());
    /// assert!(!TableStatus::Loading.is_settled());
    /// ```
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Loaded | Self::Empty)
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

// ============================================================================
// Actions and tickets
// ============================================================================

/// Inputs to the table state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    /// The table is shown; always fetches.
    Mount,
    /// Raw search text changed. Buffered until committed.
    SearchInput(String),
    /// The debounce window elapsed; commit the buffered search text.
    CommitSearch,
    /// A sortable column header was clicked.
    ToggleSort(String),
    /// Go to the next page, if there is one.
    NextPage,
    /// Go to the previous page, if there is one.
    PreviousPage,
    /// Jump to a zero-based page, clamped into range.
    GoToPage(usize),
    /// Page-level filters changed.
    SetDependencies(ExtraFilters),
    /// Re-fetch the current page unconditionally, e.g. after a mutation.
    Refresh,
}

/// A fetch the caller must run and later hand back to [`TableState::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Request id; only the latest one is applied.
    pub generation: u64,
    /// Query to pass to the adapter.
    pub query: TableQuery,
}

/// Zero-based pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page.
    pub page_index: usize,
    /// Rows per page; fixed for a table instance.
    pub page_size: usize,
}

// ============================================================================
// TableSnapshot
// ============================================================================

/// Read-only view of a table, for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot<R = Row> {
    /// Current status.
    pub status: TableStatus,
    /// Rows from the latest applied fetch.
    pub rows: Vec<R>,
    /// Current page (zero-based).
    pub page_index: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Pages available at this page size.
    pub page_count: u64,
    /// Total rows across all pages.
    pub total_count: u64,
    /// Active sort, at most one entry.
    pub sorting: Vec<SortEntry>,
    /// Committed search text.
    pub search: String,
    /// Search text as typed, possibly not committed yet.
    pub search_input: String,
    /// One-based index of the first row shown, or 0 when nothing is shown.
    pub showing_from: u64,
    /// One-based index of the last row shown.
    pub showing_to: u64,
    /// Whether "Previous" is enabled.
    pub can_previous_page: bool,
    /// Whether "Next" is enabled.
    pub can_next_page: bool,
    /// Reason the latest fetch failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Latest issued request id.
    pub generation: u64,
    /// When rows were last applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// TableState
// ============================================================================

/// Complete state of one table instance.
#[derive(Debug, Clone)]
pub struct TableState<R = Row> {
    pagination: Pagination,
    sorting: Vec<SortEntry>,
    search_input: String,
    debounced_search: String,
    dependencies: ExtraFilters,
    status: TableStatus,
    rows: Vec<R>,
    page_count: u64,
    total_count: u64,
    last_error: Option<String>,
    generation: u64,
    mounted: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl<R> TableState<R> {
    /// Creates an unmounted table with the given fixed page size.
    ///
    /// # Examples
    ///
    /// ```
    /// use tutorlix_table::{TableAction, TableState, TableStatus};
    ///
    /// let mut state: TableState = TableState::new(50);
    /// assert_eq!(state.status(), TableStatus::Idle);
    ///
    /// let ticket = state.dispatch(TableAction::Mount).unwrap();
    /// assert_eq!(ticket.generation, 1);
    /// assert_eq!(ticket.query.page_size, 50);
    /// assert_eq!(state.status(), TableStatus::Loading);
    /// ```
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            pagination: Pagination {
                page_index: 0,
                page_size,
            },
            sorting: Vec::new(),
            search_input: String::new(),
            debounced_search: String::new(),
            dependencies: ExtraFilters::new(),
            status: TableStatus::Idle,
            rows: Vec::new(),
            page_count: 0,
            total_count: 0,
            last_error: None,
            generation: 0,
            mounted: false,
            updated_at: None,
        }
    }

    /// Creates an unmounted table positioned at an existing query.
    ///
    /// The committed and typed search text both start as `query.search`, so
    /// mounting fetches exactly `query`.
    #[must_use]
    pub fn from_query(query: TableQuery) -> Self {
        let mut state = Self::new(query.page_size);
        state.pagination.page_index = query.page_index;
        state.sorting = query.sorting;
        state.search_input.clone_from(&query.search);
        state.debounced_search = query.search;
        state.dependencies = query.extra_filters;
        state
    }

    /// Sets the initial dependencies before mounting.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: ExtraFilters) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> TableStatus {
        self.status
    }

    /// Current pagination.
    #[must_use]
    pub const fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Active sort entries.
    #[must_use]
    pub fn sorting(&self) -> &[SortEntry] {
        &self.sorting
    }

    /// Rows from the latest applied fetch.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Latest issued request id.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Reason the latest fetch failed, if it did.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `true` if there is a page before the current one.
    #[must_use]
    pub const fn can_previous_page(&self) -> bool {
        self.pagination.page_index > 0
    }

    /// Returns `true` if there is a page after the current one.
    #[must_use]
    pub const fn can_next_page(&self) -> bool {
        (self.pagination.page_index as u64) + 1 < self.page_count
    }

    /// The query the backend would be asked for right now.
    #[must_use]
    pub fn query(&self) -> TableQuery {
        TableQuery {
            page_index: self.pagination.page_index,
            page_size: self.pagination.page_size,
            search: self.debounced_search.clone(),
            sorting: self.sorting.clone(),
            extra_filters: self.dependencies.clone(),
        }
    }

    /// Applies an action, returning a fetch to run if one is needed.
    ///
    /// At most one ticket is issued per action, and only when the action
    /// changed the query (or is `Mount`/`Refresh`). Before `Mount`, actions
    /// update state but never fetch.
    pub fn dispatch(&mut self, action: TableAction) -> Option<FetchTicket> {
        let before = self.query();

        match action {
            TableAction::Mount => {
                self.mounted = true;
                return Some(self.issue());
            }
            TableAction::Refresh => {
                return self.mounted.then(|| self.issue());
            }
            TableAction::SearchInput(text) => {
                self.search_input = text;
            }
            TableAction::CommitSearch => {
                self.debounced_search.clone_from(&self.search_input);
                self.pagination.page_index = 0;
            }
            TableAction::ToggleSort(column_id) => {
                self.toggle_sort(column_id);
            }
            TableAction::NextPage => {
                if self.can_next_page() {
                    self.pagination.page_index += 1;
                }
            }
            TableAction::PreviousPage => {
                if self.can_previous_page() {
                    self.pagination.page_index -= 1;
                }
            }
            TableAction::GoToPage(page_index) => {
                let last = usize::try_from(self.page_count.saturating_sub(1)).unwrap_or(usize::MAX);
                self.pagination.page_index = page_index.min(last);
            }
            TableAction::SetDependencies(dependencies) => {
                self.dependencies = dependencies;
            }
        }

        if self.mounted && self.query() != before {
            Some(self.issue())
        } else {
            None
        }
    }

    /// Applies the outcome of a fetch.
    ///
    /// Returns `false` and leaves state untouched when `generation` is not the
    /// latest issued one; an older, slower response never overwrites a newer
    /// one.
    pub fn resolve(&mut self, generation: u64, outcome: Result<AdapterResult<R>>) -> bool {
        if generation != self.generation {
            warn!(
                generation,
                latest = self.generation,
                "Discarding stale table response"
            );
            return false;
        }

        match outcome {
            Ok(result) => {
                self.status = if result.rows.is_empty() {
                    TableStatus::Empty
                } else {
                    TableStatus::Loaded
                };
                self.rows = result.rows;
                self.page_count = result.page_count;
                self.total_count = result.total_count;
                self.last_error = None;
            }
            Err(e) => {
                self.status = TableStatus::Empty;
                self.rows = Vec::new();
                self.page_count = 0;
                self.total_count = 0;
                self.last_error = Some(e.to_string());
            }
        }
        self.updated_at = Some(Utc::now());

        debug!(
            generation,
            status = %self.status,
            rows = self.rows.len(),
            "Applied table response"
        );
        true
    }

    /// Cycles a column through ascending, descending, then unsorted.
    ///
    /// Sorting a different column replaces the current sort.
    fn toggle_sort(&mut self, column_id: String) {
        let next = match self.sorting.first() {
            Some(current) if current.column_id == column_id && !current.descending => {
                Some(SortEntry::desc(column_id))
            }
            Some(current) if current.column_id == column_id => None,
            _ => Some(SortEntry::asc(column_id)),
        };
        self.sorting = next.into_iter().collect();
    }

    fn issue(&mut self) -> FetchTicket {
        self.generation += 1;
        self.status = TableStatus::Loading;
        FetchTicket {
            generation: self.generation,
            query: self.query(),
        }
    }
}

impl<R: Clone> TableState<R> {
    /// Builds a read-only snapshot for rendering.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot<R> {
        let offset = (self.pagination.page_index as u64) * (self.pagination.page_size as u64);
        let shown = self.rows.len() as u64;
        let (showing_from, showing_to) = if shown == 0 {
            (0, 0)
        } else {
            (offset + 1, offset + shown)
        };

        TableSnapshot {
            status: self.status,
            rows: self.rows.clone(),
            page_index: self.pagination.page_index,
            page_size: self.pagination.page_size,
            page_count: self.page_count,
            total_count: self.total_count,
            sorting: self.sorting.clone(),
            search: self.debounced_search.clone(),
            search_input: self.search_input.clone(),
            showing_from,
            showing_to,
            can_previous_page: self.can_previous_page(),
            can_next_page: self.can_next_page(),
            last_error: self.last_error.clone(),
            generation: self.generation,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
