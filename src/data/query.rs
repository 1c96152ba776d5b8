use std::collections::BTreeSet;

use log::{debug, warn};

use super::filter::Filter;
use super::index::Index;
use super::model::Record;
use crate::error::InvalidRangeError;

// ---------------------------------------------------------------------------
// FilteredView – the result of one query
// ---------------------------------------------------------------------------

/// Records matching a [`Filter`], ordered by `(location, date)`.
///
/// The view owns copies of its rows and is never modified after the query
/// returns; a new filter means a new view.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    filter: Filter,
    locations: Vec<String>,
    rows: Vec<Record>,
    warnings: Vec<String>,
}

impl FilteredView {
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Known locations the filter resolved to, sorted. Includes locations
    /// with no rows inside the date range.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Non-fatal problems with the request, e.g. `"unknown location: Atlantis"`.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The date-ordered rows of one location.
    pub fn rows_for(&self, location: &str) -> &[Record] {
        let lo = self.rows.partition_point(|r| r.location.as_str() < location);
        let hi = self.rows.partition_point(|r| r.location.as_str() <= location);
        &self.rows[lo..hi]
    }
}

// ---------------------------------------------------------------------------
// Query engine
// ---------------------------------------------------------------------------

/// Apply `filter` to the indexed dataset.
///
/// Inverted date ranges are rejected before any lookup. Requested locations
/// the index does not know are dropped and reported through
/// [`FilteredView::warnings`].
pub fn query(index: &Index, filter: &Filter) -> Result<FilteredView, InvalidRangeError> {
    filter.validate()?;

    let mut warnings = Vec::new();
    let slots: BTreeSet<usize> = if filter.is_unrestricted() {
        (0..index.location_count()).collect()
    } else {
        filter
            .locations
            .iter()
            .filter_map(|loc| match index.slot(loc) {
                Some(slot) => Some(slot),
                None => {
                    warn!("unknown location requested: {loc}");
                    warnings.push(format!("unknown location: {loc}"));
                    None
                }
            })
            .collect()
    };

    let mut locations = Vec::with_capacity(slots.len());
    let mut rows = Vec::new();
    for slot in slots {
        let series = index.series_at(slot);
        locations.push(series.location.clone());
        rows.extend(
            series
                .range(filter.start_date, filter.end_date)
                .iter()
                .map(|&(_, pos)| index.record(pos).clone()),
        );
    }

    debug!(
        "query {}..={} matched {} rows across {} locations",
        filter.start_date,
        filter.end_date,
        rows.len(),
        locations.len()
    );

    Ok(FilteredView {
        filter: filter.clone(),
        locations,
        rows,
        warnings,
    })
}
