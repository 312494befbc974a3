#![forbid(unsafe_code)]

mod error;
mod layout;
mod memory;
mod sqlite;

pub use error::SheetError;
pub use layout::{CURSOR_CELL, Cell, ROSTER_RANGE, RowRange, STATUS_CELL};
pub use memory::MemorySheet;
pub use sqlite::SqliteSheet;

/// Row-oriented contract of the backing tabular store: a grid of optional
/// single-column string cells addressed by column letter and 1-based row.
///
/// Calls are independent of each other; there is no multi-range transaction.
/// Writers must assume another actor may have changed the grid since their
/// last read.
pub trait Sheet {
    /// Contiguous row range as an ordered sequence of optional values.
    /// Unoccupied rows inside the range read as `None`.
    fn read_range(&self, range: RowRange) -> Result<Vec<Option<String>>, SheetError>;

    /// Append one row after the last occupied row of the range.
    fn append_row(&mut self, range: RowRange, value: &str) -> Result<(), SheetError>;

    /// Overwrite the entire range with a new ordered sequence of rows,
    /// clearing whatever was there before.
    fn write_range(&mut self, range: RowRange, values: &[String]) -> Result<(), SheetError>;

    /// Clear the range to empty.
    fn clear_range(&mut self, range: RowRange) -> Result<(), SheetError>;

    fn read_cell(&self, cell: Cell) -> Result<Option<String>, SheetError>;

    fn write_cell(&mut self, cell: Cell, value: &str) -> Result<(), SheetError>;
}
