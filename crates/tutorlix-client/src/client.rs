//! Thin REST client for Django REST style list endpoints.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use tutorlix_table::{Config, ListResponse, QueryParams, Row, SortMap, TableAdapter};

use crate::endpoint::ListEndpoint;
use crate::error::ClientError;

/// Connection settings for a [`RestClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Sent as `Authorization: Bearer <token>` when set.
    pub access_token: Option<String>,
    /// Per-request timeout. No timeout when unset.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Reads connection settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_token: config.access_token.clone(),
            timeout: config.request_timeout(),
        }
    }
}

/// HTTP client bound to one backend origin.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl RestClient {
    /// Creates a client for the given backend origin.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` is not an absolute
    /// http(s) URL, or `ClientError::Build` if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: options.access_token,
        })
    }

    /// Creates a client from a loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`RestClient::new`].
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(&config.base_url, ClientOptions::from_config(config))
    }

    /// Backend origin without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves an endpoint path against the base URL.
    ///
    /// Any path prefix on the base URL is kept, so a base of
    /// `http://host/v1` and a path of `/notes/` give `http://host/v1/notes/`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the result does not parse.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| ClientError::InvalidUrl {
            url: joined.clone(),
            message: e.to_string(),
        })
    }

    /// Fetches one page from a list endpoint.
    ///
    /// # Errors
    ///
    /// Returns a `ClientError` classified by what went wrong: transport,
    /// timeout, non-success status, or an undecodable body.
    #[instrument(skip(self, params), fields(page = ?params.get("page")))]
    pub async fn get_list<R>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> Result<ListResponse<R>, ClientError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path)?;
        let url_text = url.to_string();

        let mut request = self.http.get(url).query(params);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::transport(&url_text, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status(&url_text, status.as_u16(), &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::transport(&url_text, e))?;
        debug!(
            status = status.as_u16(),
            bytes = bytes.len(),
            "List response received"
        );

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            url: url_text,
            message: e.to_string(),
        })
    }

    /// Returns a list endpoint usable as a table's list function.
    #[must_use]
    pub fn endpoint<R>(&self, path: impl Into<String>) -> ListEndpoint<R> {
        ListEndpoint::new(self.clone(), path)
    }

    /// Builds a table adapter over a list endpoint.
    #[must_use]
    pub fn adapter<R>(
        &self,
        path: impl Into<String>,
        sort_map: SortMap,
    ) -> TableAdapter<ListEndpoint<R>, R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        TableAdapter::new(self.endpoint(path)).with_sort_map(sort_map)
    }

    /// Builds a table adapter with JSON rows.
    #[must_use]
    pub fn json_adapter(
        &self,
        path: impl Into<String>,
        sort_map: SortMap,
    ) -> TableAdapter<ListEndpoint<Row>, Row> {
        self.adapter(path, sort_map)
    }
}
