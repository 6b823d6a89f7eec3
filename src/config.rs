use serde::{Deserialize, Serialize};

/// The batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Options consumed by the batch iterator itself.
///
/// These are never forwarded to the parsing layer. The batch size must be at
/// least 1; the iterator rejects 0 with [`crate::Error::InvalidBatchSize`]
/// before reading anything.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    batch_size: usize,
}

impl BatchConfig {
    #[must_use]
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    /// The maximum number of rows per batch.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Options passed through, opaquely, to the parsing layer.
///
/// Quoting, escaping, and delimiter semantics are `csv-core`'s contract;
/// this type only carries the knobs. `has_header` drops the first parsed
/// record before any windowing.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct ParseConfig {
    #[serde(default = "default_delimiter")]
    delimiter: u8,
    #[serde(default = "default_quote")]
    quote: u8,
    #[serde(default)]
    comment: Option<u8>,
    #[serde(default)]
    has_header: bool,
}

impl ParseConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter. Defaults to `,`.
    #[must_use]
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the quote character. Defaults to `"`.
    #[must_use]
    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Sets the comment character; lines starting with it are skipped.
    #[must_use]
    pub fn comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    /// Treats the first record of the source as a header row to drop.
    #[must_use]
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    #[must_use]
    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub(crate) fn csv_reader(&self) -> csv_core::Reader {
        csv_core::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .comment(self.comment)
            .build()
    }
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            quote: default_quote(),
            comment: None,
            has_header: false,
        }
    }
}

fn default_delimiter() -> u8 {
    b','
}

fn default_quote() -> u8 {
    b'"'
}

/// Full configuration for one iteration: the iterator's own options plus the
/// options forwarded to the parsing layer. The two are disjoint; nothing in
/// `batch` reaches the parser.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub parse: ParseConfig,
}

impl Config {
    #[must_use]
    pub fn new(batch: BatchConfig, parse: ParseConfig) -> Self {
        Self { batch, parse }
    }

    /// A configuration with the given batch size and default parse options.
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch: BatchConfig::new(batch_size),
            parse: ParseConfig::default(),
        }
    }
}
