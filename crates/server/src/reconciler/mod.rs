#![forbid(unsafe_code)]

use lu_core::cursor::ChangeCursor;
use lu_core::model::{ListStatus, Placement};
use lu_core::names::{PlayerName, PlayerNameError};
use lu_core::roster::{CAPACITY, Roster};
use lu_sheet::{CURSOR_CELL, ROSTER_RANGE, STATUS_CELL, Sheet, SheetError};

#[derive(Debug)]
pub(crate) enum ListError {
    Closed,
    Duplicate { name: String },
    NotFound { name: String },
    InvalidName(PlayerNameError),
    CursorMoved { expected: String, stored: Option<String> },
    Sheet(SheetError),
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "the list is closed"),
            Self::Duplicate { name } => write!(f, "{name} is already on the list"),
            Self::NotFound { name } => write!(f, "{name} is not on the list"),
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::CursorMoved { expected, stored } => match stored {
                Some(stored) => write!(
                    f,
                    "list changed since the last read (cursor {expected} -> {stored})"
                ),
                None => write!(
                    f,
                    "list changed since the last read (cursor {expected} no longer stored)"
                ),
            },
            Self::Sheet(err) => write!(f, "store: {err}"),
        }
    }
}

impl std::error::Error for ListError {}

impl From<SheetError> for ListError {
    fn from(value: SheetError) -> Self {
        Self::Sheet(value)
    }
}

impl From<PlayerNameError> for ListError {
    fn from(value: PlayerNameError) -> Self {
        Self::InvalidName(value)
    }
}

/// Combined read for the hot polling path: one boundary call instead of
/// separate status/cursor/roster round trips.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub(crate) is_open: bool,
    pub(crate) cursor: Option<String>,
    pub(crate) changed: bool,
    pub(crate) names: Vec<String>,
}

/// The list-state reconciler. Holds no authoritative copy between calls:
/// every operation re-derives truth from the store, and every mutating
/// decision is validated against that fresh read, never against anything a
/// client claims to have seen.
pub(crate) struct Reconciler<S: Sheet> {
    sheet: S,
    capacity: usize,
}

impl<S: Sheet> Reconciler<S> {
    pub(crate) fn new(sheet: S) -> Self {
        Self::with_capacity(sheet, CAPACITY)
    }

    pub(crate) fn with_capacity(sheet: S, capacity: usize) -> Self {
        Self { sheet, capacity }
    }

    pub(crate) fn status(&self) -> Result<ListStatus, ListError> {
        let cell = self.sheet.read_cell(STATUS_CELL)?;
        Ok(ListStatus::parse_cell(cell.as_deref()))
    }

    pub(crate) fn roster(&self) -> Result<Roster, ListError> {
        Ok(Roster::from_rows(self.sheet.read_range(ROSTER_RANGE)?))
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn snapshot(&self, last_cursor: Option<&str>) -> Result<Snapshot, ListError> {
        let status = self.status()?;
        let cursor = self.read_cursor()?;
        let changed = match &cursor {
            Some(cursor) => cursor.differs_from(last_cursor),
            // Never stamped: there is nothing for the client to match on.
            None => true,
        };
        let names = if changed {
            self.roster()?.names().to_vec()
        } else {
            Vec::new()
        };
        Ok(Snapshot {
            is_open: status.is_open(),
            cursor: cursor.map(|c| c.as_str().to_string()),
            changed,
            names,
        })
    }

    pub(crate) fn try_add(
        &mut self,
        raw_name: &str,
        if_cursor: Option<&str>,
    ) -> Result<Placement, ListError> {
        let status = self.status()?;
        let roster = self.roster()?;
        let cursor = self.read_cursor()?;

        if !status.is_open() {
            return Err(ListError::Closed);
        }
        let name = PlayerName::try_new(raw_name)?;
        if roster.contains(name.as_str()) {
            return Err(ListError::Duplicate {
                name: name.as_str().to_string(),
            });
        }
        self.guard_cursor(if_cursor, cursor.as_ref())?;

        let placement = roster.next_placement(self.capacity);
        self.sheet.append_row(ROSTER_RANGE, name.as_str())?;
        self.bump_cursor()?;
        Ok(placement)
    }

    pub(crate) fn remove(
        &mut self,
        raw_name: &str,
        if_cursor: Option<&str>,
    ) -> Result<(), ListError> {
        let roster = self.roster()?;
        let cursor = self.read_cursor()?;

        // Absence is the only refusal here: a name that never validated
        // cannot be on the roster, so it is simply not found.
        let Some(remaining) = roster.without(raw_name) else {
            return Err(ListError::NotFound {
                name: raw_name.trim().to_string(),
            });
        };
        self.guard_cursor(if_cursor, cursor.as_ref())?;

        // The store has no delete-one-row primitive: rewrite the remaining
        // names in order, which also closes the gap without reordering.
        self.sheet.write_range(ROSTER_RANGE, &remaining)?;
        self.bump_cursor()?;
        Ok(())
    }

    pub(crate) fn open(&mut self) -> Result<(), ListError> {
        self.sheet.write_cell(STATUS_CELL, ListStatus::Open.as_str())?;
        self.bump_cursor()
    }

    pub(crate) fn close(&mut self) -> Result<(), ListError> {
        self.sheet
            .write_cell(STATUS_CELL, ListStatus::Closed.as_str())?;
        self.sheet.clear_range(ROSTER_RANGE)?;
        self.bump_cursor()
    }

    fn read_cursor(&self) -> Result<Option<ChangeCursor>, ListError> {
        Ok(self.sheet.read_cell(CURSOR_CELL)?.map(ChangeCursor::new))
    }

    /// Cursor writes happen strictly after the guarded write succeeded, so
    /// a reader can never observe a fresh cursor next to stale contents.
    fn bump_cursor(&mut self) -> Result<(), ListError> {
        self.sheet.write_cell(CURSOR_CELL, &crate::now_rfc3339())?;
        Ok(())
    }

    /// Optimistic-concurrency token: a mutation that carries the cursor it
    /// was read against fails before writing anything when the stored
    /// cursor has since advanced. Mutations without a token keep the
    /// best-effort semantics of the backing store.
    fn guard_cursor(
        &self,
        if_cursor: Option<&str>,
        stored: Option<&ChangeCursor>,
    ) -> Result<(), ListError> {
        let Some(expected) = if_cursor else {
            return Ok(());
        };
        let stored = stored.map(ChangeCursor::as_str);
        if stored == Some(expected) {
            return Ok(());
        }
        Err(ListError::CursorMoved {
            expected: expected.to_string(),
            stored: stored.map(str::to_string),
        })
    }
}
