use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InvalidRangeError;

// ---------------------------------------------------------------------------
// Filter – which locations and which dates a view covers
// ---------------------------------------------------------------------------

/// A user's restriction of the dataset.
///
/// * `locations` empty → every known location.
/// * The date range is inclusive on both ends and must satisfy
///   `start_date <= end_date`; see [`Filter::validate`].
///
/// Deserializes from JSON such as
/// `{"locations": ["India"], "start_date": "2021-01-01", "end_date": "2021-06-30"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(alias = "start")]
    pub start_date: NaiveDate,
    #[serde(alias = "end")]
    pub end_date: NaiveDate,
}

impl Filter {
    /// Build a filter, rejecting inverted ranges.
    pub fn new<I, S>(locations: I, start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, InvalidRangeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = Filter {
            locations: locations.into_iter().map(Into::into).collect(),
            start_date,
            end_date,
        };
        filter.validate()?;
        Ok(filter)
    }

    /// All locations between `start_date` and `end_date`.
    /// Not validated; [`crate::data::query::query`] checks the range.
    pub fn all(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Filter {
            locations: BTreeSet::new(),
            start_date,
            end_date,
        }
    }

    /// All locations on a single day.
    pub fn single_day(date: NaiveDate) -> Self {
        Filter::all(date, date)
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), InvalidRangeError> {
        if self.start_date > self.end_date {
            return Err(InvalidRangeError {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether every location is selected.
    pub fn is_unrestricted(&self) -> bool {
        self.locations.is_empty()
    }
}
