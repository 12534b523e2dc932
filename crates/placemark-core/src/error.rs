//! Error types for the placemark core library.
//!
//! Mirrors the error taxonomy the query engine is built against: malformed
//! configuration, persistence failures from collaborator stores, bad
//! geometry, missing records, and cancellation. `FilterRejected` never
//! escapes the executor; it exists here only so the filter engine has a
//! typed way to report *why* it rejected a candidate during tracing.

use thiserror::Error;

/// The error type for all placemark-core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed connection string or missing required parameter.
    #[error("config error: {0}")]
    Config(String),

    /// An underlying collaborator store (bbox index, record store, raw
    /// store) failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Polygon decode failed, or the decoded ring has fewer than 4 points.
    #[error("bad geometry: {0}")]
    BadGeometry(String),

    /// SPR lookup returned nothing for a candidate.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A filter dimension rejected a candidate. Non-terminal: callers
    /// should drop the candidate, not propagate this as a query error.
    #[error("filter rejected: {0}")]
    FilterRejected(String),

    /// The query's cancellation token fired.
    #[error("cancelled")]
    Cancelled,

    /// Atomic multi-table ingest write failed; the transaction was rolled
    /// back.
    #[error("ingest error: {0}")]
    Ingest(String),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` for placemark-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True for the two drop-silently outcomes (§7 propagation policy):
    /// `RecordNotFound` and `FilterRejected` never terminate a query.
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, CoreError::RecordNotFound(_) | CoreError::FilterRejected(_))
    }
}
