#![forbid(unsafe_code)]

/// Single grid cell, addressed spreadsheet-style: column letter plus
/// 1-based row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub col: char,
    pub row: i64,
}

/// Inclusive single-column row range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub col: char,
    pub start: i64,
    pub end: i64,
}

impl RowRange {
    pub fn row_count(self) -> usize {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start + 1) as usize
    }
}

/// `OPEN` / `CLOSED` marker for the signup window.
pub const STATUS_CELL: Cell = Cell { col: 'B', row: 1 };

/// Change cursor stamped on every mutation.
pub const CURSOR_CELL: Cell = Cell { col: 'C', row: 1 };

/// One entrant per row, append-ordered. Rows above the range hold the
/// sheet's own header area and stay untouched.
pub const ROSTER_RANGE: RowRange = RowRange {
    col: 'A',
    start: 5,
    end: 100,
};
