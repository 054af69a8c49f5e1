//! List endpoints as table list functions.

use std::marker::PhantomData;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tutorlix_table::{ListFetcher, ListResponse, QueryParams, Row, TableError};

use crate::client::RestClient;

/// A backend list path bound to a client, e.g. `/api/notes/`.
///
/// Implements [`ListFetcher`], so it can back a `TableAdapter` directly.
pub struct ListEndpoint<R = Row> {
    client: RestClient,
    path: String,
    _rows: PhantomData<fn() -> R>,
}

impl<R> ListEndpoint<R> {
    /// Binds a path to a client.
    #[must_use]
    pub fn new(client: RestClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _rows: PhantomData,
        }
    }

    /// Endpoint path as configured.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<R> Clone for ListEndpoint<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone(), self.path.clone())
    }
}

impl<R> std::fmt::Debug for ListEndpoint<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEndpoint")
            .field("base_url", &self.client.base_url())
            .field("path", &self.path)
            .finish()
    }
}

impl<R> ListFetcher<R> for ListEndpoint<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn list(&self, params: QueryParams) -> BoxFuture<'_, tutorlix_table::Result<ListResponse<R>>> {
        Box::pin(async move {
            self.client
                .get_list(&self.path, &params)
                .await
                .map_err(TableError::from)
        })
    }
}
