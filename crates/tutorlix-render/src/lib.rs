//! Tutorlix table rendering
//!
//! Turns a [`TableSnapshot`] into something a person or a program can read.
//!
//! # Renderers
//!
//! - [`TextRenderer`] - Aligned plain-text table for terminals
//! - [`MarkdownRenderer`] - GitHub-flavored Markdown table
//! - [`json::JsonRenderer`] - The snapshot as compact or pretty JSON
//!
//! Every renderer shows the same states: a loading placeholder while a
//! fetch is in flight, an empty-state message when there are no rows, and
//! a footer with the visible range and the current page.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tutorlix_render::{render, Column, OutputFormat};
//! use tutorlix_table::{AdapterResult, TableAction, TableState};
//!
//! let mut state = TableState::new(50);
//! let ticket = state.dispatch(TableAction::Mount).unwrap();
//! state.resolve(
//!     ticket.generation,
//!     Ok(AdapterResult {
//!         rows: vec![json!({"id": 1, "title": "Organic Chemistry"})],
//!         page_count: 1,
//!         total_count: 1,
//!     }),
//! );
//!
//! let columns = Column::parse_list("id,title");
//! let text = render(&state.snapshot(), &columns, OutputFormat::Text).unwrap();
//! assert!(text.contains("Organic Chemistry"));
//! assert!(text.contains("Showing 1 to 1 of 1 records"));
//! ```

pub mod json;
mod markdown;
mod text;

pub use markdown::MarkdownRenderer;
pub use text::TextRenderer;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tutorlix_table::{Row, SortEntry, TableSnapshot, TableStatus};

/// Placeholder shown while a fetch is in flight.
pub const LOADING_MESSAGE: &str = "Fetching data...";

/// Message shown when the current query matched nothing.
pub const EMPTY_MESSAGE: &str = "No records found matching your filters.";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while rendering a table.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Failed to serialize the snapshot to JSON.
    #[error("failed to serialize table: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write rendered output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested output format does not exist.
    #[error("unknown output format '{0}': expected one of 'text', 'markdown', 'json'")]
    UnknownFormat(String),
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

// ============================================================================
// OutputFormat
// ============================================================================

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain text.
    #[default]
    Text,
    /// Markdown table.
    Markdown,
    /// Pretty-printed JSON.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(RenderError::UnknownFormat(s.to_string())),
        }
    }
}

// ============================================================================
// Column
// ============================================================================

/// A displayed column: where to find its value and how to label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column id; also the id used for sorting.
    pub id: String,
    /// Header label.
    pub header: String,
    /// Dotted path into each row, e.g. `creator.first_name`.
    pub path: String,
}

impl Column {
    /// Creates a column whose id, header and path are all `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: path.clone(),
            header: path.clone(),
            path,
        }
    }

    /// Sets the header label.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Sets the column id used for sorting.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Parses a comma-separated list of dotted paths.
    ///
    /// Blank entries are skipped.
    #[must_use]
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(Self::new)
            .collect()
    }

    /// Infers columns from the keys of the first object row.
    #[must_use]
    pub fn infer(rows: &[Row]) -> Vec<Self> {
        rows.first()
            .and_then(Row::as_object)
            .map(|object| object.keys().map(Self::new).collect())
            .unwrap_or_default()
    }

    /// The raw value of this column in a row, if present.
    #[must_use]
    pub fn value<'a>(&self, row: &'a Row) -> Option<&'a Row> {
        self.path
            .split('.')
            .try_fold(row, |value, segment| match value {
                Row::Object(object) => object.get(segment),
                Row::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }

    /// The display text of this column in a row.
    ///
    /// Missing values and nulls render as an empty cell. Strings are shown
    /// without quotes; arrays and objects as compact JSON.
    #[must_use]
    pub fn cell(&self, row: &Row) -> String {
        match self.value(row) {
            None | Some(Row::Null) => String::new(),
            Some(Row::String(text)) => text.replace(['\n', '\r'], " "),
            Some(other) => other.to_string(),
        }
    }

    /// Header label with a sort indicator when this column is sorted.
    #[must_use]
    pub fn label(&self, sorting: &[SortEntry]) -> String {
        match sorting.first() {
            Some(entry) if entry.column_id == self.id && entry.descending => {
                format!("{} ↓", self.header)
            }
            Some(entry) if entry.column_id == self.id => format!("{} ↑", self.header),
            _ => self.header.clone(),
        }
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// What the body of a table shows for a snapshot.
#[derive(Clone, Copy)]
pub(crate) enum Body<'a> {
    Message(&'static str),
    Rows(&'a [Row]),
}

impl<'a> Body<'a> {
    pub(crate) fn of(snapshot: &'a TableSnapshot) -> Self {
        match snapshot.status {
            TableStatus::Idle | TableStatus::Loading => Self::Message(LOADING_MESSAGE),
            _ if snapshot.rows.is_empty() => Self::Message(EMPTY_MESSAGE),
            _ => Self::Rows(&snapshot.rows),
        }
    }
}

/// "Showing X to Y of Z records"
pub(crate) fn showing_line(snapshot: &TableSnapshot) -> String {
    format!(
        "Showing {} to {} of {} records",
        snapshot.showing_from, snapshot.showing_to, snapshot.total_count
    )
}

/// "Page N / M", where M is at least 1.
pub(crate) fn page_line(snapshot: &TableSnapshot) -> String {
    format!(
        "Page {} / {}",
        snapshot.page_index + 1,
        snapshot.page_count.max(1)
    )
}

/// Renders a snapshot in the requested format.
///
/// When `columns` is empty, columns are inferred from the first row.
///
/// # Errors
///
/// Returns [`RenderError::Serialization`] if JSON output cannot be produced.
pub fn render(snapshot: &TableSnapshot, columns: &[Column], format: OutputFormat) -> Result<String> {
    let inferred;
    let columns = if columns.is_empty() {
        inferred = Column::infer(&snapshot.rows);
        inferred.as_slice()
    } else {
        columns
    };

    match format {
        OutputFormat::Text => Ok(TextRenderer::new(snapshot, columns).render()),
        OutputFormat::Markdown => Ok(MarkdownRenderer::new(snapshot, columns).render()),
        OutputFormat::Json => json::JsonRenderer::new(snapshot)
            .with_columns(columns)
            .generate_pretty(),
    }
}

// ============================================================================
// Tests
// ============================================================================
