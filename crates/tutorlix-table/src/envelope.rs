//! Backend list response shapes.
//!
//! Paginated endpoints answer with a page envelope
//! (`{"count", "next", "previous", "results"}`); a few older endpoints answer
//! with a bare JSON array. [`ListResponse`] accepts either.

use serde::{Deserialize, Deserializer, Serialize};

/// Default row type: an arbitrary JSON object.
pub type Row = serde_json::Value;

/// A page envelope as returned by paginated list endpoints.
///
/// Missing or malformed fields are defaulted rather than rejected: a missing
/// or null `results` means no rows, and a missing or non-numeric `count`
/// means zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct PageEnvelope<R = Row> {
    /// Total number of rows across all pages.
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: u64,
    /// URL of the next page, if any.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page, if any.
    #[serde(default)]
    pub previous: Option<String>,
    /// Rows on this page.
    #[serde(default = "Vec::new", deserialize_with = "lenient_results")]
    pub results: Vec<R>,
}

impl<R> Default for PageEnvelope<R> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// Response from a list endpoint: either a page envelope or a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<R = Row> {
    /// Non-paginated endpoint: every row, no count.
    Bare(Vec<R>),
    /// Paginated endpoint.
    Page(PageEnvelope<R>),
}

impl<R> ListResponse<R> {
    /// Wraps a page of rows with the given total count.
    #[must_use]
    pub fn page(count: u64, results: Vec<R>) -> Self {
        Self::Page(PageEnvelope {
            count,
            results,
            ..PageEnvelope::default()
        })
    }

    /// Returns `true` for the bare-array shape.
    #[must_use]
    pub const fn is_bare(&self) -> bool {
        matches!(self, Self::Bare(_))
    }
}

/// Accepts any JSON value for `count`, keeping only non-negative whole
/// numbers. `42.0` counts as 42.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let count = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= u64::MAX as f64)
            .map(|n| n as u64)
    });
    Ok(count.unwrap_or(0))
}

/// Reads `results`, treating `null` like a missing field.
fn lenient_results<'de, D, R>(deserializer: D) -> std::result::Result<Vec<R>, D::Error>
where
    D: Deserializer<'de>,
    R: Deserialize<'de>,
{
    Ok(Option::<Vec<R>>::deserialize(deserializer)?.unwrap_or_default())
}
