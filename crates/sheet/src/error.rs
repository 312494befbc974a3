#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum SheetError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    RangeFull { col: char, end: i64 },
    InvalidRange(&'static str),
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::RangeFull { col, end } => {
                write!(f, "range full (column {col} has no free row before {end})")
            }
            Self::InvalidRange(message) => write!(f, "invalid range: {message}"),
        }
    }
}

impl std::error::Error for SheetError {}

impl From<std::io::Error> for SheetError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for SheetError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
