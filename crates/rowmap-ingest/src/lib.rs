//! Row cursors feeding the rowmap materializer.
//!
//! - [`CsvCursor`]: header row plus text cells from any CSV reader
//! - [`MemoryCursor`]: rows already held in memory, one or more result sets

pub mod csv_cursor;
pub mod memory;

pub use csv_cursor::{CsvCursor, CsvOptions};
pub use memory::MemoryCursor;
