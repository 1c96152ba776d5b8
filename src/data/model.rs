use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const LOCATION: &str = "location";
pub const DATE: &str = "date";
pub const NEW_DEATHS_SMOOTHED: &str = "new_deaths_smoothed";
pub const PEOPLE_VACCINATED_PER_HUNDRED: &str = "people_vaccinated_per_hundred";

/// Columns every inbound feed must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    DATE,
    LOCATION,
    NEW_DEATHS_SMOOTHED,
    PEOPLE_VACCINATED_PER_HUNDRED,
];

/// Column order of every tabular export.
pub const EXPORT_COLUMNS: [&str; 4] = [
    LOCATION,
    DATE,
    NEW_DEATHS_SMOOTHED,
    PEOPLE_VACCINATED_PER_HUNDRED,
];

// ---------------------------------------------------------------------------
// RawRow – one inbound row before validation
// ---------------------------------------------------------------------------

/// An unvalidated row as delivered by a file or network reader.
/// `None` and blank text are both treated as a missing cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub location: Option<String>,
    pub date: Option<String>,
    pub new_deaths_smoothed: Option<String>,
    pub people_vaccinated_per_hundred: Option<String>,
}

impl RawRow {
    /// Convenience constructor for fully textual rows (tests, fixtures).
    pub fn new(location: &str, date: &str, deaths: &str, vaccinated: &str) -> Self {
        let cell = |s: &str| Some(s.to_string());
        RawRow {
            location: cell(location),
            date: cell(date),
            new_deaths_smoothed: cell(deaths),
            people_vaccinated_per_hundred: cell(vaccinated),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one validated observation
// ---------------------------------------------------------------------------

/// One observation for a `(location, date)` key.
///
/// Field order matches [`EXPORT_COLUMNS`]; the tabular exporter relies on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub location: String,
    pub date: NaiveDate,
    /// 7-day average of daily deaths as published upstream. `None` = not reported.
    pub new_deaths_smoothed: Option<f64>,
    /// Share of the population with at least one dose. May exceed 100.
    pub people_vaccinated_per_hundred: Option<f64>,
}

impl Record {
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::NewDeathsSmoothed => self.new_deaths_smoothed,
            Field::PeopleVaccinatedPerHundred => self.people_vaccinated_per_hundred,
        }
    }
}

// ---------------------------------------------------------------------------
// Field – the numeric series carried per record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    NewDeathsSmoothed,
    PeopleVaccinatedPerHundred,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::NewDeathsSmoothed, Field::PeopleVaccinatedPerHundred];

    pub fn column(self) -> &'static str {
        match self {
            Field::NewDeathsSmoothed => NEW_DEATHS_SMOOTHED,
            Field::PeopleVaccinatedPerHundred => PEOPLE_VACCINATED_PER_HUNDRED,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
