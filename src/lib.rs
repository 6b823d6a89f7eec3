//! Bounded-memory, batched iteration over delimited tabular data.
//!
//! Parsing a source yields its full row sequence at once; the rows are then
//! delivered to a consumer callback in consecutive windows of at most
//! `batch_size` rows, so the consumer can correlate each window against an
//! external lookup without materializing its own copy of the data.

mod config;
pub mod csv;
pub mod record;

pub use config::{BatchConfig, Config, ParseConfig, DEFAULT_BATCH_SIZE};
pub use csv::{for_each_batch, for_each_batch_from, read_rows, Reader, Row};
pub use record::Batch;

/// Errors that any operation in this crate may return.
///
/// Every failure surfaces to the direct caller; no operation recovers or
/// retries locally. A failed lookup in [`Batch::find_by_value`] is not an
/// error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured batch size is not a positive integer.
    #[error("invalid batch size: must be at least 1")]
    InvalidBatchSize,
    /// The source could not be opened or read.
    #[error("cannot read source: {0}")]
    Io(#[from] std::io::Error),
    /// Field data is not valid UTF-8.
    #[error("parse error: {0}")]
    Parse(#[from] std::str::Utf8Error),
    /// A row access beyond the end of a batch.
    #[error("row index out of range: {index} >= {len}")]
    RowOutOfRange { index: usize, len: usize },
    /// A column access beyond the end of a row.
    #[error("column index out of range: {column} >= {len} in row {row}")]
    ColumnOutOfRange {
        row: usize,
        column: usize,
        len: usize,
    },
    /// A failure raised inside the per-batch callback.
    #[error("callback failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a consumer-side failure so it can propagate out of
    /// [`for_each_batch`] and halt batch delivery.
    pub fn callback<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Callback(error.into())
    }
}
