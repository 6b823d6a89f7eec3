//! Definitions to help handling parsed rows as fixed-size batches.

use crate::csv::Row;
use crate::Error;
use std::slice;

/// An ordered, immutable window of rows, delivered to the consumer as a
/// unit.
///
/// A batch owns its rows for its lifetime. The iterator hands each batch to
/// exactly one callback invocation by shared reference, so a batch cannot be
/// retained once its callback returns. Every batch except possibly the last
/// of a source holds the full configured batch size; none is ever empty.
#[derive(Clone, Debug)]
pub struct Batch {
    rows: Vec<Row>,
}

impl Batch {
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Returns the row at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns `Error::RowOutOfRange` if `index` is not below [`len`].
    ///
    /// [`len`]: Self::len
    pub fn get(&self, index: usize) -> Result<&Row, Error> {
        self.rows.get(index).ok_or(Error::RowOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    /// Traverses the rows in their original order. The traversal is
    /// restartable; iterating does not consume the batch.
    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Projects one column: the value at `column` from every row, in row
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `Error::ColumnOutOfRange` if any row has no field at
    /// `column`, propagated from the row access. Row widths are never
    /// validated up front, so ragged data fails here on the first short row.
    pub fn values(&self, column: usize) -> Result<Vec<&str>, Error> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, r)| {
                r.get(column).ok_or(Error::ColumnOutOfRange {
                    row,
                    column,
                    len: r.len(),
                })
            })
            .collect()
    }

    /// Returns the first row, in batch order, whose field at `column`
    /// equals `target`.
    ///
    /// Ties resolve to the earliest row. A miss returns `None` rather than
    /// an error: no match is an expected outcome of a correlation lookup.
    /// Rows too short to have `column` never match.
    #[must_use]
    pub fn find_by_value(&self, column: usize, target: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.get(column) == Some(target))
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        self.rows.as_slice()
    }

    /// The number of rows in this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
