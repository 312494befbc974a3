#![forbid(unsafe_code)]

pub mod names {
    pub const MAX_NAME_CHARS: usize = 30;

    /// Entrant name as shown on the roster. The display form keeps the
    /// casing it was entered with; all comparisons go through the
    /// canonical (trimmed, lowercased) form.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PlayerName {
        display: String,
        canonical: String,
    }

    impl PlayerName {
        pub fn try_new(value: impl Into<String>) -> Result<Self, PlayerNameError> {
            let value = value.into();
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(PlayerNameError::Empty);
            }
            if trimmed.chars().count() > MAX_NAME_CHARS {
                return Err(PlayerNameError::TooLong);
            }
            Ok(Self {
                display: trimmed.to_string(),
                canonical: canonical_form(trimmed),
            })
        }

        pub fn as_str(&self) -> &str {
            &self.display
        }

        pub fn canonical(&self) -> &str {
            &self.canonical
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum PlayerNameError {
        Empty,
        TooLong,
    }

    impl std::fmt::Display for PlayerNameError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Empty => write!(f, "name must not be empty"),
                Self::TooLong => {
                    write!(f, "name must be at most {MAX_NAME_CHARS} characters")
                }
            }
        }
    }

    impl std::error::Error for PlayerNameError {}

    pub fn canonical_form(value: &str) -> String {
        value.trim().to_lowercase()
    }
}

pub mod model {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ListStatus {
        Open,
        Closed,
    }

    impl ListStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Open => "OPEN",
                Self::Closed => "CLOSED",
            }
        }

        /// Anything other than a literal `OPEN` cell (including an empty or
        /// missing cell) reads as closed.
        pub fn parse_cell(value: Option<&str>) -> Self {
            match value {
                Some(v) if v.trim() == "OPEN" => Self::Open,
                _ => Self::Closed,
            }
        }

        pub fn is_open(self) -> bool {
            matches!(self, Self::Open)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Placement {
        Attending,
        Waitlisted,
    }

    impl Placement {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Attending => "ATTENDING",
                Self::Waitlisted => "WAITLISTED",
            }
        }

        pub fn for_position(position: usize, capacity: usize) -> Self {
            if position < capacity {
                Self::Attending
            } else {
                Self::Waitlisted
            }
        }
    }
}

pub mod roster {
    use crate::model::Placement;
    use crate::names::canonical_form;

    pub const CAPACITY: usize = 12;

    /// Ordered roster view derived from raw store rows. Insertion order is
    /// significant: position alone decides attending vs waitlisted.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct Roster {
        names: Vec<String>,
    }

    impl Roster {
        /// Store rows may be sparse; blank rows are dropped and surrounding
        /// order is kept.
        pub fn from_rows(rows: impl IntoIterator<Item = Option<String>>) -> Self {
            let names = rows
                .into_iter()
                .flatten()
                .map(|row| row.trim().to_string())
                .filter(|row| !row.is_empty())
                .collect();
            Self { names }
        }

        pub fn names(&self) -> &[String] {
            &self.names
        }

        pub fn len(&self) -> usize {
            self.names.len()
        }

        pub fn is_empty(&self) -> bool {
            self.names.is_empty()
        }

        pub fn position_of(&self, name: &str) -> Option<usize> {
            let needle = canonical_form(name);
            self.names
                .iter()
                .position(|entry| canonical_form(entry) == needle)
        }

        pub fn contains(&self, name: &str) -> bool {
            self.position_of(name).is_some()
        }

        /// Placement the next accepted entrant would receive.
        pub fn next_placement(&self, capacity: usize) -> Placement {
            Placement::for_position(self.names.len(), capacity)
        }

        pub fn split(&self, capacity: usize) -> (&[String], &[String]) {
            let cut = self.names.len().min(capacity);
            (&self.names[..cut], &self.names[cut..])
        }

        /// Remaining names, in order, with the first canonical match removed.
        /// `None` when the name is absent.
        pub fn without(&self, name: &str) -> Option<Vec<String>> {
            let position = self.position_of(name)?;
            let mut remaining = self.names.clone();
            remaining.remove(position);
            Some(remaining)
        }
    }
}

pub mod cursor {
    /// Opaque change marker stored next to the roster. Readers only ever
    /// compare cursors for equality; the value itself carries no meaning
    /// beyond "something was written".
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ChangeCursor(String);

    impl ChangeCursor {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        /// `true` when a reader holding `last` must refetch: no cursor seen
        /// yet, or the stored value moved.
        pub fn differs_from(&self, last: Option<&str>) -> bool {
            match last {
                None => true,
                Some(seen) => seen != self.0,
            }
        }
    }
}
