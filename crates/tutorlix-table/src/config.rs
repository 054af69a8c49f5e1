//! Configuration types for Tutorlix tables.
//!
//! This module provides the `tutorlix.json` configuration: where the backend
//! lives, how to authenticate against it, table defaults such as page size
//! and search debounce, and named table presets for the CLI.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};
use crate::query::SortMap;
use crate::table::TableOptions;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "tutorlix.json";

/// Default backend base URL.
fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Default rows per page.
pub const fn default_page_size() -> usize {
    50
}

/// Default search debounce in milliseconds.
pub const fn default_debounce_ms() -> u64 {
    500
}

/// Main configuration for Tutorlix tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Rows per page for every table.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Quiet period after the last keystroke before a search is committed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Named table presets.
    #[serde(default)]
    pub tables: BTreeMap<String, TablePreset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            request_timeout_secs: None,
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            tables: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `tutorlix.json` in the current directory. If not found,
    /// returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            TableError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `tutorlix.json` in a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but contains invalid JSON.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `TableError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `TableError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(TableError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TableError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `TableError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(TableError::config_validation(
                "pageSize must be greater than 0",
                "Set pageSize to at least 1 in your tutorlix.json",
            ));
        }

        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(TableError::config_validation(
                "baseUrl must not be empty",
                "Set baseUrl to the backend origin, e.g. http://localhost:8000",
            ));
        }

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TableError::config_validation(
                format!("baseUrl '{base_url}' must start with http:// or https://"),
                "Include the scheme in baseUrl, e.g. https://api.example.com",
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(TableError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Remove requestTimeoutSecs to disable the timeout, or set it to at least 1",
            ));
        }

        for (name, preset) in &self.tables {
            if preset.endpoint.trim().is_empty() {
                return Err(TableError::config_validation(
                    format!("tables.{name}.endpoint must not be empty"),
                    "Set endpoint to the list path, e.g. /api/notes/",
                ));
            }
        }

        Ok(())
    }

    /// Returns the named table preset.
    #[must_use]
    pub fn preset(&self, name: &str) -> Option<&TablePreset> {
        self.tables.get(name)
    }

    /// Builds driver options from the table defaults.
    #[must_use]
    pub const fn table_options(&self) -> TableOptions {
        TableOptions {
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }

    /// Request timeout, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// A named list view: which endpoint to call and how to show it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePreset {
    /// List path relative to the base URL, e.g. `/api/notes/`.
    pub endpoint: String,

    /// Column id to backend sort field mapping.
    #[serde(default)]
    pub sort_map: SortMap,

    /// Columns to show, as dotted paths into each row.
    #[serde(default)]
    pub columns: Vec<String>,
}
