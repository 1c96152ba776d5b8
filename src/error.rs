use chrono::NaiveDate;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Fatal ingestion failures
// ---------------------------------------------------------------------------

/// The raw feed cannot be turned into a usable dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestionError {
    #[error("data unavailable: the feed contained no rows")]
    EmptyFeed,

    #[error("data unavailable: none of the {total} rows could be parsed")]
    NoParseableRows { total: usize },

    #[error("dataset is missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// ---------------------------------------------------------------------------
// Recoverable row / value problems (collected, never propagated)
// ---------------------------------------------------------------------------

/// A row that was skipped during ingestion. `row` is the 0-based input position.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedRowError {
    #[error("row {row}: missing location")]
    MissingLocation { row: usize },

    #[error("row {row}: missing date")]
    MissingDate { row: usize },

    #[error("row {row}: '{value}' is not a date")]
    InvalidDate { row: usize, value: String },
}

impl MalformedRowError {
    pub fn row(&self) -> usize {
        match self {
            MalformedRowError::MissingLocation { row }
            | MalformedRowError::MissingDate { row }
            | MalformedRowError::InvalidDate { row, .. } => *row,
        }
    }
}

/// A numeric cell that could not be used; the field was set to `None`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row {row}, {field}: '{value}' is not a valid value")]
pub struct MalformedValueError {
    pub row: usize,
    pub field: &'static str,
    pub value: String,
}

/// A later row repeating an already ingested `(location, date)` key.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("row {row}: duplicate ({location}, {date}), keeping row {first_row}")]
pub struct DuplicateKeyError {
    pub row: usize,
    pub first_row: usize,
    pub location: String,
    pub date: NaiveDate,
}

// ---------------------------------------------------------------------------
// User input / export errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid date range: start {start} is after end {end}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("export format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("writing tabular export")]
    Csv(#[from] csv::Error),
}
