#![forbid(unsafe_code)]

use crate::{Cell, RowRange, Sheet, SheetError};
use std::collections::BTreeMap;

/// In-memory grid with the same semantics as [`SqliteSheet`], for tests
/// that need a hermetic store.
///
/// [`SqliteSheet`]: crate::SqliteSheet
#[derive(Clone, Debug, Default)]
pub struct MemorySheet {
    cells: BTreeMap<(char, i64), String>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sheet for MemorySheet {
    fn read_range(&self, range: RowRange) -> Result<Vec<Option<String>>, SheetError> {
        if range.end < range.start {
            return Err(SheetError::InvalidRange("end row before start row"));
        }
        let rows = (range.start..=range.end)
            .map(|row| self.cells.get(&(range.col, row)).cloned())
            .collect();
        Ok(rows)
    }

    fn append_row(&mut self, range: RowRange, value: &str) -> Result<(), SheetError> {
        let last = self
            .cells
            .range((range.col, range.start)..=(range.col, range.end))
            .next_back()
            .map(|((_, row), _)| *row);
        let next = match last {
            Some(last) => last + 1,
            None => range.start,
        };
        if next > range.end {
            return Err(SheetError::RangeFull {
                col: range.col,
                end: range.end,
            });
        }
        self.cells.insert((range.col, next), value.to_string());
        Ok(())
    }

    fn write_range(&mut self, range: RowRange, values: &[String]) -> Result<(), SheetError> {
        if values.len() > range.row_count() {
            return Err(SheetError::RangeFull {
                col: range.col,
                end: range.end,
            });
        }
        self.clear_range(range)?;
        for (offset, value) in values.iter().enumerate() {
            self.cells
                .insert((range.col, range.start + offset as i64), value.clone());
        }
        Ok(())
    }

    fn clear_range(&mut self, range: RowRange) -> Result<(), SheetError> {
        let occupied: Vec<i64> = self
            .cells
            .range((range.col, range.start)..=(range.col, range.end))
            .map(|((_, row), _)| *row)
            .collect();
        for row in occupied {
            self.cells.remove(&(range.col, row));
        }
        Ok(())
    }

    fn read_cell(&self, cell: Cell) -> Result<Option<String>, SheetError> {
        Ok(self.cells.get(&(cell.col, cell.row)).cloned())
    }

    fn write_cell(&mut self, cell: Cell, value: &str) -> Result<(), SheetError> {
        self.cells.insert((cell.col, cell.row), value.to_string());
        Ok(())
    }
}
