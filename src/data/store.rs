use std::collections::HashMap;

use chrono::NaiveDate;
use log::{debug, info, warn};

use super::model::{RawRow, Record, NEW_DEATHS_SMOOTHED, PEOPLE_VACCINATED_PER_HUNDRED};
use crate::error::{DuplicateKeyError, IngestionError, MalformedRowError, MalformedValueError};

// ---------------------------------------------------------------------------
// IngestReport – everything that went wrong without being fatal
// ---------------------------------------------------------------------------

/// Non-fatal problems found while building a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Number of raw rows offered to the store.
    pub total_rows: usize,
    /// Rows skipped because location or date was unusable.
    pub malformed_rows: Vec<MalformedRowError>,
    /// Numeric cells replaced by `None`; their rows were kept.
    pub malformed_values: Vec<MalformedValueError>,
    /// Rows dropped because an earlier row had the same key.
    pub duplicates: Vec<DuplicateKeyError>,
}

impl IngestReport {
    pub fn skipped_rows(&self) -> usize {
        self.malformed_rows.len()
    }

    pub fn is_clean(&self) -> bool {
        self.malformed_rows.is_empty()
            && self.malformed_values.is_empty()
            && self.duplicates.is_empty()
    }

    /// One summary line per problem category, empty for a clean ingest.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.malformed_rows.is_empty() {
            out.push(format!(
                "{} malformed rows skipped (missing or invalid location/date)",
                self.malformed_rows.len()
            ));
        }
        if !self.malformed_values.is_empty() {
            out.push(format!(
                "{} malformed numeric values treated as not reported",
                self.malformed_values.len()
            ));
        }
        if !self.duplicates.is_empty() {
            out.push(format!(
                "{} duplicate (location, date) rows ignored, first occurrence kept",
                self.duplicates.len()
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Dataset – the immutable record store
// ---------------------------------------------------------------------------

/// All validated records, in first-seen input order, unique per `(location, date)`.
///
/// There is no mutating API: once built, a dataset can be shared freely
/// between threads and sessions.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Validate raw rows and build the store.
    ///
    /// Row- and value-level problems are collected in the returned report.
    /// Fails only when no row at all survives validation.
    pub fn build<I>(rows: I) -> Result<(Dataset, IngestReport), IngestionError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut report = IngestReport::default();
        let mut records: Vec<Record> = Vec::new();
        let mut seen: HashMap<(String, NaiveDate), usize> = HashMap::new();

        for (row_no, raw) in rows.into_iter().enumerate() {
            report.total_rows += 1;

            let record = match validate_row(row_no, raw, &mut report.malformed_values) {
                Ok(r) => r,
                Err(e) => {
                    debug!("skipping {e}");
                    report.malformed_rows.push(e);
                    continue;
                }
            };

            let key = (record.location.clone(), record.date);
            if let Some(&first_row) = seen.get(&key) {
                let dup = DuplicateKeyError {
                    row: row_no,
                    first_row,
                    location: record.location,
                    date: record.date,
                };
                warn!("{dup}");
                report.duplicates.push(dup);
                continue;
            }
            seen.insert(key, row_no);
            records.push(record);
        }

        if report.total_rows == 0 {
            return Err(IngestionError::EmptyFeed);
        }
        if records.is_empty() {
            return Err(IngestionError::NoParseableRows {
                total: report.total_rows,
            });
        }

        for line in report.warnings() {
            warn!("{line}");
        }
        info!(
            "ingested {} records from {} rows",
            records.len(),
            report.total_rows
        );

        Ok((Dataset { records }, report))
    }

    /// All records in first-seen input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Row validation
// ---------------------------------------------------------------------------

fn validate_row(
    row: usize,
    raw: RawRow,
    bad_values: &mut Vec<MalformedValueError>,
) -> Result<Record, MalformedRowError> {
    let location = present(raw.location).ok_or(MalformedRowError::MissingLocation { row })?;
    let date_text = present(raw.date).ok_or(MalformedRowError::MissingDate { row })?;
    let date = parse_date(&date_text).ok_or(MalformedRowError::InvalidDate {
        row,
        value: date_text,
    })?;

    let mut number = |cell: Option<String>, field: &'static str| -> Option<f64> {
        let text = cell?;
        match parse_number(&text) {
            Ok(v) => v,
            Err(()) => {
                let err = MalformedValueError {
                    row,
                    field,
                    value: text,
                };
                debug!("{err}");
                bad_values.push(err);
                None
            }
        }
    };

    let new_deaths_smoothed = number(raw.new_deaths_smoothed, NEW_DEATHS_SMOOTHED);
    let people_vaccinated_per_hundred =
        number(raw.people_vaccinated_per_hundred, PEOPLE_VACCINATED_PER_HUNDRED);

    Ok(Record {
        location,
        date,
        new_deaths_smoothed,
        people_vaccinated_per_hundred,
    })
}

/// Trimmed, non-blank cell content.
fn present(cell: Option<String>) -> Option<String> {
    let cell = cell?;
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == cell.len() {
        Some(cell)
    } else {
        Some(trimmed.to_string())
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a `T` or space separated time.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = match s.as_bytes().get(10) {
        Some(b'T') | Some(b' ') => &s[..10],
        Some(_) => return None,
        None => s,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// `Ok(None)` for blank / NaN cells, `Err` for anything that is not a finite,
/// non-negative number.
pub(crate) fn parse_number(s: &str) -> Result<Option<f64>, ()> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v: f64 = s.parse().map_err(|_| ())?;
    if !v.is_finite() || v < 0.0 {
        return Err(());
    }
    // -0.0 would export as "-0"
    Ok(Some(if v == 0.0 { 0.0 } else { v }))
}
