//! Tutorlix server-driven data tables
//!
//! Adapter, state machine, and async driver for paginated list views backed
//! by Django REST style endpoints.

pub mod adapter;
pub mod config;
pub mod envelope;
pub mod error;
pub mod query;
pub mod state;
pub mod table;

pub use adapter::{page_count, AdapterResult, ListFetcher, TableAdapter};
pub use config::{Config, TablePreset};
pub use envelope::{ListResponse, PageEnvelope, Row};
pub use error::{FetchErrorKind, Result, TableError};
pub use query::{
    ExtraFilters, FilterValue, QueryParams, SortEntry, SortMap, TableQuery, PARAM_ORDERING,
    PARAM_PAGE, PARAM_PAGE_SIZE, PARAM_SEARCH,
};
pub use state::{FetchTicket, Pagination, TableAction, TableSnapshot, TableState, TableStatus};
pub use table::{ServerDataTable, TableOptions};
