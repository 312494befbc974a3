#![forbid(unsafe_code)]

use crate::{Cell, RowRange, Sheet, SheetError};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// SQLite-backed grid. One process-local file stands in for the remote
/// spreadsheet; SQLite's per-call serialization is the only write
/// serialization the system gets, matching the remote store's per-cell
/// guarantee.
#[derive(Debug)]
pub struct SqliteSheet {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteSheet {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, SheetError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("lineup.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS cells (
              col TEXT NOT NULL,
              row INTEGER NOT NULL,
              value TEXT NOT NULL,
              PRIMARY KEY (col, row)
            );
            "#,
        )?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn last_occupied_row(&self, range: RowRange) -> Result<Option<i64>, SheetError> {
        let row = self
            .conn
            .query_row(
                "SELECT MAX(row) FROM cells WHERE col = ?1 AND row BETWEEN ?2 AND ?3",
                params![range.col.to_string(), range.start, range.end],
                |r| r.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
        Ok(row)
    }
}

impl Sheet for SqliteSheet {
    fn read_range(&self, range: RowRange) -> Result<Vec<Option<String>>, SheetError> {
        if range.end < range.start {
            return Err(SheetError::InvalidRange("end row before start row"));
        }
        let mut rows = vec![None; range.row_count()];
        let mut stmt = self.conn.prepare(
            "SELECT row, value FROM cells WHERE col = ?1 AND row BETWEEN ?2 AND ?3 ORDER BY row",
        )?;
        let hits = stmt.query_map(
            params![range.col.to_string(), range.start, range.end],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)),
        )?;
        for hit in hits {
            let (row, value) = hit?;
            rows[(row - range.start) as usize] = Some(value);
        }
        Ok(rows)
    }

    fn append_row(&mut self, range: RowRange, value: &str) -> Result<(), SheetError> {
        let next = match self.last_occupied_row(range)? {
            Some(last) => last + 1,
            None => range.start,
        };
        if next > range.end {
            return Err(SheetError::RangeFull {
                col: range.col,
                end: range.end,
            });
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO cells (col, row, value) VALUES (?1, ?2, ?3)",
            params![range.col.to_string(), next, value],
        )?;
        Ok(())
    }

    fn write_range(&mut self, range: RowRange, values: &[String]) -> Result<(), SheetError> {
        if values.len() > range.row_count() {
            return Err(SheetError::RangeFull {
                col: range.col,
                end: range.end,
            });
        }
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM cells WHERE col = ?1 AND row BETWEEN ?2 AND ?3",
            params![range.col.to_string(), range.start, range.end],
        )?;
        for (offset, value) in values.iter().enumerate() {
            tx.execute(
                "INSERT INTO cells (col, row, value) VALUES (?1, ?2, ?3)",
                params![range.col.to_string(), range.start + offset as i64, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear_range(&mut self, range: RowRange) -> Result<(), SheetError> {
        self.conn.execute(
            "DELETE FROM cells WHERE col = ?1 AND row BETWEEN ?2 AND ?3",
            params![range.col.to_string(), range.start, range.end],
        )?;
        Ok(())
    }

    fn read_cell(&self, cell: Cell) -> Result<Option<String>, SheetError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cells WHERE col = ?1 AND row = ?2",
                params![cell.col.to_string(), cell.row],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_cell(&mut self, cell: Cell, value: &str) -> Result<(), SheetError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO cells (col, row, value) VALUES (?1, ?2, ?3)",
            params![cell.col.to_string(), cell.row, value],
        )?;
        Ok(())
    }
}
