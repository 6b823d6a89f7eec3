use crate::config::{Config, ParseConfig};
use crate::record::Batch;
use crate::Error;
use csv_core::ReadRecordResult;
use std::cmp;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str;
use std::vec;

/// One parsed record: an ordered sequence of UTF-8 fields, indexable by
/// zero-based column position.
///
/// Fields are stored in a single buffer with an offset vector marking where
/// each field ends, so access is allocation-free slicing. A row is immutable
/// once parsed; its field count is whatever the parser produced, and uniform
/// width across rows is never enforced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Row {
    fields: String,
    ends: Vec<usize>,
}

impl Row {
    /// Builds a row directly from field values, bypassing the parser.
    #[must_use]
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut buf = String::new();
        let mut ends = Vec::new();
        for field in fields {
            buf.push_str(field);
            ends.push(buf.len());
        }
        Self { fields: buf, ends }
    }

    fn new(mut buf: Vec<u8>, ends: Vec<usize>) -> Result<Self, str::Utf8Error> {
        // Validating per field also guarantees every offset in `ends` falls
        // on a character boundary.
        let mut start = 0;
        for &end in &ends {
            str::from_utf8(&buf[start..end])?;
            start = end;
        }
        buf.truncate(start);
        let fields = match String::from_utf8(buf) {
            Ok(fields) => fields,
            Err(e) => return Err(e.utf8_error()),
        };
        Ok(Self { fields, ends })
    }

    /// Reads the next record from `input`, or `None` at end of data.
    ///
    /// # Errors
    ///
    /// Returns an error if `input` cannot be read or a field is not valid
    /// UTF-8.
    pub(crate) fn from_buf(
        reader: &mut csv_core::Reader,
        input: &mut dyn BufRead,
    ) -> Result<Option<Self>, Error> {
        let mut fields = vec![0; 1024];
        let mut ends = vec![0; 64];
        let (mut outlen, mut endlen) = (0, 0);
        loop {
            let (res, nin, nout, nend) = {
                let buf = input.fill_buf()?;
                reader.read_record(buf, &mut fields[outlen..], &mut ends[endlen..])
            };
            input.consume(nin);
            outlen += nout;
            endlen += nend;
            match res {
                ReadRecordResult::InputEmpty => continue,
                ReadRecordResult::OutputFull => {
                    fields.resize(cmp::max(4, fields.len().saturating_mul(2)), 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    ends.resize(cmp::max(4, ends.len().saturating_mul(2)), 0);
                }
                ReadRecordResult::Record => {
                    fields.truncate(outlen);
                    ends.truncate(endlen);
                    return Ok(Some(Self::new(fields, ends)?));
                }
                ReadRecordResult::End => return Ok(None),
            }
        }
    }

    /// Returns the field at `index`, or `None` when `index >= len()`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        let end = *self.ends.get(index)?;
        let start = match index.checked_sub(1).and_then(|i| self.ends.get(i)) {
            None => 0,
            Some(&start) => start,
        };
        Some(&self.fields[start..end])
    }

    /// The number of fields in this row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

/// Reads the complete ordered row sequence from `input`.
///
/// The entire source is materialized before any windowing happens; bounding
/// memory per batch is the iterator's job, not this function's. When
/// `config.has_header()` is set, the first parsed record is dropped.
///
/// # Errors
///
/// Returns an error if `input` cannot be read or a field is not valid UTF-8.
pub fn read_rows<R: Read>(input: R, config: &ParseConfig) -> Result<Vec<Row>, Error> {
    let mut input = BufReader::new(input);
    let mut csv_reader = config.csv_reader();
    let mut rows = Vec::new();
    while let Some(row) = Row::from_buf(&mut csv_reader, &mut input)? {
        rows.push(row);
    }
    if config.has_header() && !rows.is_empty() {
        rows.remove(0);
    }
    Ok(rows)
}

/// Delivers an already-parsed row sequence as consecutive windows of at most
/// `batch_size` rows.
pub struct Reader {
    rows: vec::IntoIter<Row>,
    batch_size: usize,
}

impl Reader {
    /// # Errors
    ///
    /// Returns `Error::InvalidBatchSize` if `batch_size` is 0.
    pub fn new(rows: Vec<Row>, batch_size: usize) -> Result<Self, Error> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        Ok(Self {
            rows: rows.into_iter(),
            batch_size,
        })
    }

    /// Returns the next window, or `None` when the rows are exhausted.
    ///
    /// Every window except possibly the last holds exactly `batch_size`
    /// rows; the last holds the remainder. No window is ever empty.
    pub fn next_batch(&mut self) -> Option<Batch> {
        let rows: Vec<Row> = self.rows.by_ref().take(self.batch_size).collect();
        if rows.is_empty() {
            None
        } else {
            Some(Batch::new(rows))
        }
    }
}

/// Iterates over the rows of the file at `path` in batches, invoking
/// `callback` once per batch, in source order.
///
/// See [`for_each_batch_from`] for the full contract.
///
/// # Errors
///
/// Returns an error if the batch size is 0, the file cannot be opened or
/// parsed, or the callback fails.
pub fn for_each_batch<P, F>(path: P, config: &Config, callback: F) -> Result<(), Error>
where
    P: AsRef<Path>,
    F: FnMut(&Batch) -> Result<(), Error>,
{
    // Reject bad configuration before touching the source.
    if config.batch.batch_size() == 0 {
        return Err(Error::InvalidBatchSize);
    }
    for_each_batch_from(File::open(path)?, config, callback)
}

/// Iterates over the rows of `input` in batches, invoking `callback` once
/// per batch, in source order.
///
/// The full row sequence is parsed first, using only the options in
/// `config.parse`; `config.batch` never reaches the parser. The rows are
/// then partitioned into consecutive, non-overlapping windows of at most
/// `config.batch.batch_size()` rows, each constructed only after the
/// previous callback has returned. A source with zero rows invokes the
/// callback zero times.
///
/// # Errors
///
/// Returns `Error::InvalidBatchSize` (before any read) if the batch size is
/// 0, an I/O or parse error from reading `input`, or the first error the
/// callback returns. Once an error propagates, no further batches are
/// delivered.
pub fn for_each_batch_from<R, F>(input: R, config: &Config, mut callback: F) -> Result<(), Error>
where
    R: Read,
    F: FnMut(&Batch) -> Result<(), Error>,
{
    if config.batch.batch_size() == 0 {
        return Err(Error::InvalidBatchSize);
    }
    let rows = read_rows(input, &config.parse)?;
    let mut reader = Reader::new(rows, config.batch.batch_size())?;
    while let Some(batch) = reader.next_batch() {
        callback(&batch)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct FailingRead;

    impl Read for FailingRead {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "source was read"))
        }
    }

    fn collect_batches(input: &str, config: &Config) -> Vec<Vec<String>> {
        let mut batches = Vec::new();
        for_each_batch_from(Cursor::new(input), config, |batch| {
            batches.push(
                batch
                    .iter()
                    .map(|row| row.get(0).unwrap().to_string())
                    .collect(),
            );
            Ok(())
        })
        .unwrap();
        batches
    }

    #[test]
    fn row_field_access() {
        let row = Row::from_fields(vec!["1", "a"]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some("1"));
        assert_eq!(row.get(1), Some("a"));
        assert_eq!(row.get(2), None);
        assert!(!row.is_empty());
    }

    #[test]
    fn parsed_rows_match_source_order() {
        let input = Cursor::new("1,a\n2,b\n3,c\n");
        let rows = read_rows(input, &ParseConfig::default()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], Row::from_fields(vec!["1", "a"]));
        assert_eq!(rows[2].get(1), Some("c"));
    }

    #[test]
    fn quoted_delimiter_stays_in_field() {
        let input = Cursor::new("\"a,1\",b\n");
        let rows = read_rows(input, &ParseConfig::default()).unwrap();
        assert_eq!(rows[0].get(0), Some("a,1"));
        assert_eq!(rows[0].get(1), Some("b"));
    }

    #[test]
    fn custom_delimiter() {
        let input = Cursor::new("1;a\n2;b\n");
        let rows = read_rows(input, &ParseConfig::new().delimiter(b';')).unwrap();
        assert_eq!(rows[0].get(1), Some("a"));
        assert_eq!(rows[1].get(0), Some("2"));
    }

    #[test]
    fn header_row_is_dropped() {
        let input = Cursor::new("id,name\n1,a\n2,b\n");
        let rows = read_rows(input, &ParseConfig::new().with_header(true)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some("1"));
    }

    #[test]
    fn comment_lines_are_skipped() {
        let input = Cursor::new("# heading\n1,a\n");
        let rows = read_rows(input, &ParseConfig::new().comment(Some(b'#'))).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some("1"));
    }

    #[test]
    fn seven_rows_in_threes() {
        let input = "1,a\n2,b\n3,c\n4,d\n5,e\n6,f\n7,g\n";
        let batches = collect_batches(input, &Config::with_batch_size(3));
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![3, 3, 1]
        );
        let concatenated: Vec<String> = batches.into_iter().flatten().collect();
        assert_eq!(concatenated, vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[test]
    fn exact_multiple_has_no_short_batch() {
        let input = "1\n2\n3\n4\n5\n6\n";
        let batches = collect_batches(input, &Config::with_batch_size(3));
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![3, 3]
        );
    }

    #[test]
    fn default_batch_size_is_twenty() {
        let input: String = (0..25).map(|i| format!("{}\n", i)).collect();
        let batches = collect_batches(&input, &Config::default());
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![20, 5]
        );
    }

    #[test]
    fn empty_source_invokes_nothing() {
        let mut calls = 0;
        for_each_batch_from(Cursor::new(""), &Config::default(), |_| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn zero_batch_size_fails_before_reading() {
        let result = for_each_batch_from(FailingRead, &Config::with_batch_size(0), |_| Ok(()));
        assert!(matches!(result, Err(Error::InvalidBatchSize)));
    }

    #[test]
    fn zero_batch_size_rejected_by_reader() {
        assert!(matches!(
            Reader::new(Vec::new(), 0),
            Err(Error::InvalidBatchSize)
        ));
    }

    #[test]
    fn callback_error_halts_delivery() {
        let input = "1\n2\n3\n4\n5\n6\n7\n";
        let mut calls = 0;
        let result = for_each_batch_from(
            Cursor::new(input),
            &Config::with_batch_size(3),
            |_| {
                calls += 1;
                if calls == 2 {
                    Err(Error::callback("lookup failed"))
                } else {
                    Ok(())
                }
            },
        );
        assert_eq!(calls, 2);
        assert!(matches!(result, Err(Error::Callback(_))));
    }

    #[test]
    fn read_error_propagates() {
        let result = for_each_batch_from(FailingRead, &Config::default(), |_| Ok(()));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn missing_file_propagates_io_error() {
        let result = for_each_batch(
            "nonexistent-rowbatch-fixture.csv",
            &Config::default(),
            |_| Ok(()),
        );
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn next_batch_windows_prebuilt_rows() {
        let rows: Vec<Row> = (0..5)
            .map(|i| Row::from_fields(vec![i.to_string().as_str()]))
            .collect();
        let mut reader = Reader::new(rows, 2).unwrap();
        assert_eq!(reader.next_batch().unwrap().len(), 2);
        assert_eq!(reader.next_batch().unwrap().len(), 2);
        let last = reader.next_batch().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last.get(0).unwrap().get(0), Some("4"));
        assert!(reader.next_batch().is_none());
    }
}
