//! JSON rendering for table snapshots.
//!
//! [`JsonRenderer`] serializes a [`TableSnapshot`] as-is, or with each row
//! projected onto a set of columns so scripts only see the fields they
//! asked for.
//!
//! # Example
//!
//! ```rust
//! use tutorlix_render::json::JsonRenderer;
//! use tutorlix_table::TableState;
//!
//! let state: TableState = TableState::new(50);
//! let snapshot = state.snapshot();
//!
//! let json = JsonRenderer::new(&snapshot).generate().unwrap();
//! assert!(json.contains(r#""status":"idle""#));
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tutorlix_table::TableSnapshot;

use crate::{Column, Result};

/// JSON snapshot renderer.
pub struct JsonRenderer<'a> {
    snapshot: &'a TableSnapshot,
    columns: &'a [Column],
}

impl<'a> JsonRenderer<'a> {
    /// Creates a renderer that emits rows unchanged.
    #[must_use]
    pub const fn new(snapshot: &'a TableSnapshot) -> Self {
        Self {
            snapshot,
            columns: &[],
        }
    }

    /// Projects every row onto the given columns, keyed by column id.
    ///
    /// An empty slice keeps rows unchanged.
    #[must_use]
    pub const fn with_columns(mut self, columns: &'a [Column]) -> Self {
        self.columns = columns;
        self
    }

    /// Generates compact JSON output (single line).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`](crate::RenderError::Serialization)
    /// if serialization fails.
    pub fn generate(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }

    /// Generates pretty-printed JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`](crate::RenderError::Serialization)
    /// if serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value()?)?)
    }

    /// Writes the JSON output to a file, creating or overwriting it.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Serialization`](crate::RenderError::Serialization)
    /// if serialization fails, or [`RenderError::Io`](crate::RenderError::Io)
    /// if the file cannot be written.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    fn to_value(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self.snapshot)?;
        if !self.columns.is_empty() {
            let rows = self
                .snapshot
                .rows
                .iter()
                .map(|row| self.project(row))
                .collect();
            value["rows"] = Value::Array(rows);
        }
        Ok(value)
    }

    fn project(&self, row: &Value) -> Value {
        let object: Map<String, Value> = self
            .columns
            .iter()
            .map(|column| {
                let cell = column.value(row).cloned().unwrap_or(Value::Null);
                (column.id.clone(), cell)
            })
            .collect();
        Value::Object(object)
    }
}
