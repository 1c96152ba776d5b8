use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RawRow, DATE, LOCATION, NEW_DEATHS_SMOOTHED, PEOPLE_VACCINATED_PER_HUNDRED, REQUIRED_COLUMNS};
use crate::error::IngestionError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read raw rows from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – OWID-style CSV with a header row (extra columns ignored)
/// * `.json`    – `[{ "location": ..., "date": ..., ... }, ...]`
/// * `.parquet` – one column per field; text, date or numeric types
///
/// Only file-level problems fail here. Cell contents are validated later by
/// [`crate::data::store::Dataset::build`].
pub fn load_file(path: &Path) -> Result<Vec<RawRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            read_csv(file)?
        }
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    info!("read {} raw rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Fail with [`IngestionError::MissingColumns`] unless every required column is present.
fn check_columns<'a, I>(present: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: BTreeSet<&str> = present.into_iter().collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestionError::MissingColumns(missing).into())
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per line.
/// Ragged lines are tolerated; absent trailing cells count as missing.
/// Invalid UTF-8 inside a cell is replaced rather than failing the file.
pub fn read_csv<R: io::Read>(source: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_columns(headers.iter().map(String::as_str))?;

    let position = |name: &str| headers.iter().position(|h| h == name);
    // checked above
    let (Some(loc_idx), Some(date_idx), Some(deaths_idx), Some(vax_idx)) = (
        position(LOCATION),
        position(DATE),
        position(NEW_DEATHS_SMOOTHED),
        position(PEOPLE_VACCINATED_PER_HUNDRED),
    ) else {
        bail!("CSV header lookup failed");
    };

    let mut rows = Vec::new();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| {
            record
                .get(idx)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        };
        rows.push(RawRow {
            location: cell(loc_idx),
            date: cell(date_idx),
            new_deaths_smoothed: cell(deaths_idx),
            people_vaccinated_per_hundred: cell(vax_idx),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "location": "India",
///     "date": "2021-05-01",
///     "new_deaths_smoothed": 3262.286,
///     "people_vaccinated_per_hundred": null
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Vec<RawRow>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    let mut seen: BTreeSet<&str> = BTreeSet::new();

    for rec in records {
        // left for the store to reject as a malformed row
        let Some(obj) = rec.as_object() else {
            rows.push(RawRow::default());
            continue;
        };
        seen.extend(obj.keys().map(String::as_str));

        let cell = |key: &str| obj.get(key).and_then(json_to_cell);
        rows.push(RawRow {
            location: cell(LOCATION),
            date: cell(DATE),
            new_deaths_smoothed: cell(NEW_DEATHS_SMOOTHED),
            people_vaccinated_per_hundred: cell(PEOPLE_VACCINATED_PER_HUNDRED),
        });
    }

    if !records.is_empty() {
        check_columns(seen)?;
    }
    Ok(rows)
}

fn json_to_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Accepted column types:
/// - `location`: Utf8 / LargeUtf8, or a dictionary (categorical) of those
/// - `date`: Utf8 / LargeUtf8 / Date32 / Timestamp (any unit; the day is kept)
/// - numeric fields: Float64 / Float32 / Int64 / Int32
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    check_columns(builder.schema().fields().iter().map(|f| f.name().as_str()))?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let loc_col = normalize(column(&batch, LOCATION)?)?;
        let date_col = normalize(column(&batch, DATE)?)?;
        let deaths_col = normalize(column(&batch, NEW_DEATHS_SMOOTHED)?)?;
        let vax_col = normalize(column(&batch, PEOPLE_VACCINATED_PER_HUNDRED)?)?;

        for row in 0..batch.num_rows() {
            rows.push(RawRow {
                location: extract_cell(&loc_col, row).context("reading 'location'")?,
                date: extract_cell(&date_col, row).context("reading 'date'")?,
                new_deaths_smoothed: extract_cell(&deaths_col, row)
                    .context("reading 'new_deaths_smoothed'")?,
                people_vaccinated_per_hundred: extract_cell(&vax_col, row)
                    .context("reading 'people_vaccinated_per_hundred'")?,
            });
        }
    }

    Ok(rows)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .with_context(|| format!("Parquet batch missing '{name}' column"))
}

/// Unpack dictionary columns and truncate timestamps to days, so that
/// `extract_cell` only sees plain types.
fn normalize(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Dictionary(_, values) => {
            let unpacked = cast(col, values).context("decoding dictionary column")?;
            normalize(&unpacked)
        }
        DataType::Timestamp(_, _) => {
            cast(col, &DataType::Date32).context("converting timestamp column to dates")
        }
        _ => Ok(col.clone()),
    }
}

/// Render one Arrow cell as text; nulls become missing cells.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Date32 => match col.as_primitive::<Date32Type>().value_as_date(row) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => return Ok(None),
        },
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(Some(text))
}
