//! An interface to delimited text (CSV and friends).

pub(crate) mod reader;

pub use reader::for_each_batch;
pub use reader::for_each_batch_from;
pub use reader::read_rows;
pub use reader::Reader;
pub use reader::Row;
