//! Query types exchanged between the table and the adapter.
//!
//! A [`TableQuery`] is the table's view of what it wants to show: a zero-based
//! page, a page size, the committed search text, the active sort, and any
//! page-level filters. [`QueryParams`] is the backend's view of the same
//! request, in the Django REST list convention.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Backend query parameter carrying the one-based page number.
pub const PARAM_PAGE: &str = "page";
/// Backend query parameter carrying the page size.
pub const PARAM_PAGE_SIZE: &str = "page_size";
/// Backend query parameter carrying free-text search.
pub const PARAM_SEARCH: &str = "search";
/// Backend query parameter carrying the sort field, `-`-prefixed when descending.
pub const PARAM_ORDERING: &str = "ordering";

// ============================================================================
// SortEntry
// ============================================================================

/// A single sorted column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortEntry {
    /// UI-facing column identifier.
    pub column_id: String,
    /// Whether the column sorts in descending order.
    pub descending: bool,
}

impl SortEntry {
    /// Creates an ascending sort on the given column.
    #[must_use]
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: false,
        }
    }

    /// Creates a descending sort on the given column.
    #[must_use]
    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            descending: true,
        }
    }
}

// ============================================================================
// FilterValue / ExtraFilters
// ============================================================================

/// A scalar value for a page-level filter.
///
/// Filters are opaque to the adapter; only the backend validates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A boolean flag, sent as `true` or `false`.
    Boolean(bool),
    /// An integer, sent in decimal.
    Integer(i64),
    /// Any other JSON number, e.g. a price bound like `9.5`.
    Number(serde_json::Number),
    /// Free text, sent verbatim.
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<serde_json::Number> for FilterValue {
    fn from(value: serde_json::Number) -> Self {
        value
            .as_i64()
            .map_or(Self::Number(value), Self::Integer)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Caller-supplied filters passed through to the backend verbatim.
pub type ExtraFilters = BTreeMap<String, FilterValue>;

// ============================================================================
// TableQuery
// ============================================================================

/// Everything the table asks for in a single fetch.
///
/// Built fresh for every fetch cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableQuery {
    /// Zero-based page index.
    pub page_index: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Committed search text, possibly empty.
    #[serde(default)]
    pub search: String,
    /// Active sort entries. Only the first one reaches the backend.
    #[serde(default)]
    pub sorting: Vec<SortEntry>,
    /// Page-level filters, e.g. status or product id.
    #[serde(default)]
    pub extra_filters: ExtraFilters,
}

impl TableQuery {
    /// Creates a query for the first page with the given page size.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size,
            search: String::new(),
            sorting: Vec::new(),
            extra_filters: ExtraFilters::new(),
        }
    }

    /// Sets the zero-based page index.
    #[must_use]
    pub const fn with_page_index(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    /// Sets the search text.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Appends a sort entry.
    #[must_use]
    pub fn with_sort(mut self, entry: SortEntry) -> Self {
        self.sorting.push(entry);
        self
    }

    /// Adds a page-level filter.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.extra_filters.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// QueryParams
// ============================================================================

/// Query-string parameters for a backend list request.
///
/// Keys are kept sorted so requests and logs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if the parameter is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

// ============================================================================
// SortMap
// ============================================================================

/// Maps UI column ids to the backend's sortable field paths.
///
/// Column ids that are absent from the map pass through unchanged, e.g. a
/// `creator` column can sort by `creator__first_name` while `title` sorts by
/// `title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortMap(BTreeMap<String, String>);

impl SortMap {
    /// Creates an empty (identity) sort map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mapping and returns the map.
    #[must_use]
    pub fn with(mut self, column_id: impl Into<String>, field: impl Into<String>) -> Self {
        self.insert(column_id, field);
        self
    }

    /// Adds a mapping.
    pub fn insert(&mut self, column_id: impl Into<String>, field: impl Into<String>) {
        self.0.insert(column_id.into(), field.into());
    }

    /// Resolves a column id to the backend field name.
    ///
    /// An empty mapping is treated as absent.
    #[must_use]
    pub fn resolve<'a>(&'a self, column_id: &'a str) -> &'a str {
        match self.0.get(column_id) {
            Some(field) if !field.is_empty() => field,
            _ => column_id,
        }
    }

    /// Returns `true` if no column is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SortMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (column_id, field) in iter {
            map.insert(column_id, field);
        }
        map
    }
}
