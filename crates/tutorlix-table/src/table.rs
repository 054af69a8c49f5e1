//! Async driver that keeps a table in sync with its backend.
//!
//! [`ServerDataTable::spawn`] starts one tokio task per table. The task owns
//! a [`TableState`], turns commands from the handle into fetches, debounces
//! search input, and publishes a [`TableSnapshot`] after every change.
//!
//! Fetches run concurrently in a `JoinSet`; responses carry the generation
//! they were issued under and the state machine discards any that are no
//! longer the latest. Dropping the handle aborts the task together with all
//! in-flight fetches, so nothing resolves into a table that is gone.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tutorlix_table::{
//!     ListResponse, QueryParams, ServerDataTable, TableAdapter, TableError, TableOptions,
//! };
//!
//! # async fn example() -> tutorlix_table::Result<()> {
//! let adapter = Arc::new(TableAdapter::new(|_params: QueryParams| async move {
//!     Ok::<_, TableError>(ListResponse::page(1, vec![serde_json::json!({"id": 1})]))
//! }));
//!
//! let table = ServerDataTable::spawn(adapter, TableOptions::default());
//! table.set_search("organic")?;
//!
//! let snapshot = table.wait_until_settled().await?;
//! assert_eq!(snapshot.search, "organic");
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::adapter::{AdapterResult, ListFetcher, TableAdapter};
use crate::config::{default_debounce_ms, default_page_size};
use crate::envelope::Row;
use crate::error::{Result, TableError};
use crate::query::ExtraFilters;
use crate::state::{FetchTicket, TableAction, TableSnapshot, TableState};

/// Per-table settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Rows per page, fixed for the table's lifetime.
    pub page_size: usize,
    /// Quiet period after the last keystroke before a search is committed.
    pub debounce: Duration,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce: Duration::from_millis(default_debounce_ms()),
        }
    }
}

/// Commands sent from the handle to the driver task.
#[derive(Debug)]
enum TableCommand {
    Search(String),
    ToggleSort(String),
    NextPage,
    PreviousPage,
    GoToPage(usize),
    SetDependencies(ExtraFilters),
    Refresh,
    Barrier(oneshot::Sender<()>),
}

type FetchOutcome<R> = (u64, Result<AdapterResult<R>>);

/// Handle to a running server-driven table.
///
/// All methods are non-blocking sends; observe the effect through
/// [`snapshot`](Self::snapshot), [`subscribe`](Self::subscribe), or
/// [`wait_until_settled`](Self::wait_until_settled).
#[derive(Debug)]
pub struct ServerDataTable<R = Row> {
    commands: mpsc::UnboundedSender<TableCommand>,
    snapshots: watch::Receiver<TableSnapshot<R>>,
    task: JoinHandle<()>,
}

impl<R> ServerDataTable<R>
where
    R: Clone + Send + Sync + 'static,
{
    /// Mounts a table and starts its driver task.
    ///
    /// The first page is requested immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<F>(adapter: Arc<TableAdapter<F, R>>, options: TableOptions) -> Self
    where
        F: ListFetcher<R> + 'static,
    {
        Self::spawn_with_dependencies(adapter, options, ExtraFilters::new())
    }

    /// Mounts a table with initial page-level filters.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn_with_dependencies<F>(
        adapter: Arc<TableAdapter<F, R>>,
        options: TableOptions,
        dependencies: ExtraFilters,
    ) -> Self
    where
        F: ListFetcher<R> + 'static,
    {
        let state = TableState::new(options.page_size).with_dependencies(dependencies);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(state.snapshot());

        let task = tokio::spawn(run_table(
            adapter,
            state,
            options.debounce,
            command_rx,
            snapshot_tx,
        ));

        Self {
            commands,
            snapshots,
            task,
        }
    }

    /// Updates the search text; the fetch follows once typing pauses.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn set_search(&self, text: impl Into<String>) -> Result<()> {
        self.send(TableCommand::Search(text.into()))
    }

    /// Cycles the sort on a column.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn toggle_sort(&self, column_id: impl Into<String>) -> Result<()> {
        self.send(TableCommand::ToggleSort(column_id.into()))
    }

    /// Moves to the next page. Ignored on the last page.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn next_page(&self) -> Result<()> {
        self.send(TableCommand::NextPage)
    }

    /// Moves to the previous page. Ignored on the first page.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn previous_page(&self) -> Result<()> {
        self.send(TableCommand::PreviousPage)
    }

    /// Jumps to a zero-based page, clamped to the known page count.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn go_to_page(&self, page_index: usize) -> Result<()> {
        self.send(TableCommand::GoToPage(page_index))
    }

    /// Replaces the page-level filters.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn set_dependencies(&self, dependencies: ExtraFilters) -> Result<()> {
        self.send(TableCommand::SetDependencies(dependencies))
    }

    /// Re-fetches the current page.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver has stopped.
    pub fn refresh(&self) -> Result<()> {
        self.send(TableCommand::Refresh)
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> TableSnapshot<R> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot<R>> {
        self.snapshots.clone()
    }

    /// Waits until every command sent so far has been handled, any pending
    /// search has been committed, and the latest fetch has been applied.
    ///
    /// # Errors
    ///
    /// Returns `TableError::TableClosed` if the driver stops while waiting.
    pub async fn wait_until_settled(&self) -> Result<TableSnapshot<R>> {
        let (ack, acked) = oneshot::channel();
        self.send(TableCommand::Barrier(ack))?;
        acked.await.map_err(|_| TableError::TableClosed)?;

        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| s.status.is_settled() && s.search == s.search_input)
            .await
            .map_err(|_| TableError::TableClosed)?
            .clone();
        Ok(snapshot)
    }

    fn send(&self, command: TableCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TableError::TableClosed)
    }
}

impl<R> Drop for ServerDataTable<R> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Driver loop: one per mounted table.
async fn run_table<F, R>(
    adapter: Arc<TableAdapter<F, R>>,
    mut state: TableState<R>,
    debounce: Duration,
    mut commands: mpsc::UnboundedReceiver<TableCommand>,
    snapshots: watch::Sender<TableSnapshot<R>>,
) where
    F: ListFetcher<R> + 'static,
    R: Clone + Send + Sync + 'static,
{
    let mut in_flight: JoinSet<FetchOutcome<R>> = JoinSet::new();
    let mut search_deadline: Option<Instant> = None;

    if let Some(ticket) = state.dispatch(TableAction::Mount) {
        start_fetch(&mut in_flight, &adapter, ticket);
    }
    snapshots.send_replace(state.snapshot());

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("Table handle dropped, stopping driver");
                    break;
                };

                let action = match command {
                    TableCommand::Search(text) => {
                        search_deadline = Some(Instant::now() + debounce);
                        TableAction::SearchInput(text)
                    }
                    TableCommand::ToggleSort(column_id) => TableAction::ToggleSort(column_id),
                    TableCommand::NextPage => TableAction::NextPage,
                    TableCommand::PreviousPage => TableAction::PreviousPage,
                    TableCommand::GoToPage(page_index) => TableAction::GoToPage(page_index),
                    TableCommand::SetDependencies(filters) => TableAction::SetDependencies(filters),
                    TableCommand::Refresh => TableAction::Refresh,
                    TableCommand::Barrier(ack) => {
                        // Receiver may have given up waiting
                        let _ = ack.send(());
                        continue;
                    }
                };

                if let Some(ticket) = state.dispatch(action) {
                    start_fetch(&mut in_flight, &adapter, ticket);
                }
                snapshots.send_replace(state.snapshot());
            }

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                match joined {
                    Ok((generation, outcome)) => {
                        if state.resolve(generation, outcome) {
                            snapshots.send_replace(state.snapshot());
                        }
                    }
                    Err(e) => warn!(error = %e, "Table fetch task did not complete"),
                }
            }

            () = search_debounce(search_deadline) => {
                search_deadline = None;
                if let Some(ticket) = state.dispatch(TableAction::CommitSearch) {
                    start_fetch(&mut in_flight, &adapter, ticket);
                }
                snapshots.send_replace(state.snapshot());
            }
        }
    }
}

/// Resolves at the deadline, or never when no search is pending.
async fn search_debounce(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn start_fetch<F, R>(
    in_flight: &mut JoinSet<FetchOutcome<R>>,
    adapter: &Arc<TableAdapter<F, R>>,
    ticket: FetchTicket,
) where
    F: ListFetcher<R> + 'static,
    R: Send + 'static,
{
    let adapter = Arc::clone(adapter);
    let FetchTicket { generation, query } = ticket;
    debug!(generation, page_index = query.page_index, "Starting table fetch");

    in_flight.spawn(async move {
        let outcome = adapter.try_fetch(&query).await;
        if let Err(e) = &outcome {
            error!(generation, error = %e, "Table fetch failed, showing empty page");
        }
        (generation, outcome)
    });
}
