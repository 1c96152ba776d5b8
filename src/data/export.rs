use std::fmt;
use std::io;
use std::str::FromStr;

use log::info;

use super::aggregate::EnrichedView;
use super::model::{Record, EXPORT_COLUMNS};
use crate::error::SerializationError;

// ---------------------------------------------------------------------------
// Export formats
// ---------------------------------------------------------------------------

/// Supported tabular encodings. Both share the same header and column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
}

impl ExportFormat {
    fn delimiter(self) -> u8 {
        match self {
            ExportFormat::Csv => b',',
            ExportFormat::Tsv => b'\t',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "tabular" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            _ => Err(SerializationError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Encode `view` in the named format.
///
/// The header is always written, so an empty view yields a header-only file.
/// Missing values become empty fields.
pub fn serialize(view: &EnrichedView, format: &str) -> Result<Vec<u8>, SerializationError> {
    let format: ExportFormat = format.parse()?;
    let mut buf = Vec::new();
    write_to(view, format, &mut buf)?;
    Ok(buf)
}

/// Stream `view` into `out`.
pub fn write_to<W: io::Write>(
    view: &EnrichedView,
    format: ExportFormat,
    out: W,
) -> Result<(), SerializationError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(format.delimiter())
        .from_writer(out);

    writer.write_record(EXPORT_COLUMNS)?;
    for record in view.rows() {
        writer.serialize(record)?;
    }
    writer.flush().map_err(csv::Error::from)?;

    info!("exported {} rows as {format}", view.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading back
// ---------------------------------------------------------------------------

/// Decode an export produced by [`serialize`]. Empty fields read back as `None`.
pub fn parse(bytes: &[u8], format: ExportFormat) -> Result<Vec<Record>, SerializationError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .from_reader(bytes);
    reader
        .deserialize::<Record>()
        .map(|r| r.map_err(SerializationError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::aggregate::enrich;
    use crate::data::filter::Filter;
    use crate::data::index::Index;
    use crate::data::model::RawRow;
    use crate::data::query::query;
    use crate::data::store::Dataset;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn view(filter: Filter) -> EnrichedView {
        let rows = vec![
            RawRow::new("USA", "2021-01-01", "120", "5.0"),
            RawRow::new("USA", "2021-01-02", "", "5.5"),
            RawRow::new("Bonaire, Sint Eustatius and Saba", "2021-01-01", "0.5", ""),
        ];
        let (ds, _) = Dataset::build(rows).unwrap();
        let idx = Index::build(Arc::new(ds));
        enrich(query(&idx, &filter).unwrap())
    }

    #[test]
    fn writes_header_first_with_empty_fields_for_none() {
        let v = view(Filter::all(d("2021-01-01"), d("2021-01-02")));
        let text = String::from_utf8(serialize(&v, "csv").unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "location,date,new_deaths_smoothed,people_vaccinated_per_hundred",
                "\"Bonaire, Sint Eustatius and Saba\",2021-01-01,0.5,",
                "USA,2021-01-01,120.0,5.0",
                "USA,2021-01-02,,5.5",
            ]
        );
        assert!(!text.contains("None"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn empty_view_exports_header_only() {
        let v = view(Filter::single_day(d("1999-01-01")));
        let text = String::from_utf8(serialize(&v, "csv").unwrap()).unwrap();
        assert_eq!(text, "location,date,new_deaths_smoothed,people_vaccinated_per_hundred\n");
    }

    #[test]
    fn tsv_uses_tabs() {
        let v = view(Filter::single_day(d("2021-01-02")));
        let text = String::from_utf8(serialize(&v, "TSV").unwrap()).unwrap();
        assert_eq!(text.lines().nth(1), Some("USA\t2021-01-02\t\t5.5"));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let v = view(Filter::single_day(d("2021-01-02")));
        match serialize(&v, "xlsx") {
            Err(SerializationError::UnsupportedFormat(f)) => assert_eq!(f, "xlsx"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn parse_reads_back_rows() {
        let v = view(Filter::all(d("2021-01-01"), d("2021-01-02")));
        for format in [ExportFormat::Csv, ExportFormat::Tsv] {
            let bytes = serialize(&v, format.extension()).unwrap();
            let back = parse(&bytes, format).unwrap();
            assert_eq!(back.as_slice(), v.rows());
        }
    }
}
