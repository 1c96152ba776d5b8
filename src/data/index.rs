use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;

use super::filter::Filter;
use super::model::Record;
use super::store::Dataset;

// ---------------------------------------------------------------------------
// LocationSeries – one location's records, sorted by date
// ---------------------------------------------------------------------------

/// Date-sorted `(date, position in dataset)` pairs for one location.
#[derive(Debug, Clone)]
pub struct LocationSeries {
    pub location: String,
    entries: Vec<(NaiveDate, usize)>,
}

impl LocationSeries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|(d, _)| *d)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|(d, _)| *d)
    }

    /// Dataset positions with `start <= date <= end`, in date order.
    /// Two binary searches; the result is a contiguous slice.
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> &[(NaiveDate, usize)] {
        if start > end {
            return &[];
        }
        let lo = self.entries.partition_point(|(d, _)| *d < start);
        let hi = self.entries.partition_point(|(d, _)| *d <= end);
        &self.entries[lo..hi]
    }
}

// ---------------------------------------------------------------------------
// Index – derived lookup structures over a Dataset
// ---------------------------------------------------------------------------

/// Lookup structures over an immutable [`Dataset`].
///
/// `series` is ordered by location name, so walking slots in ascending order
/// yields rows in `(location, date)` order.
#[derive(Debug, Clone)]
pub struct Index {
    dataset: Arc<Dataset>,
    series: Vec<LocationSeries>,
    slots: HashMap<String, usize>,
    span: Option<(NaiveDate, NaiveDate)>,
}

impl Index {
    pub fn build(dataset: Arc<Dataset>) -> Index {
        let mut grouped: BTreeMap<&str, Vec<(NaiveDate, usize)>> = BTreeMap::new();
        for (pos, rec) in dataset.records().iter().enumerate() {
            grouped
                .entry(rec.location.as_str())
                .or_default()
                .push((rec.date, pos));
        }

        let mut series = Vec::with_capacity(grouped.len());
        let mut slots = HashMap::with_capacity(grouped.len());
        let mut span: Option<(NaiveDate, NaiveDate)> = None;

        for (slot, (location, mut entries)) in grouped.into_iter().enumerate() {
            // dates are unique per location, so an unstable sort is deterministic
            entries.sort_unstable_by_key(|(d, _)| *d);
            if let (Some((first, _)), Some((last, _))) = (entries.first(), entries.last()) {
                span = Some(match span {
                    Some((lo, hi)) => (lo.min(*first), hi.max(*last)),
                    None => (*first, *last),
                });
            }
            slots.insert(location.to_string(), slot);
            series.push(LocationSeries {
                location: location.to_string(),
                entries,
            });
        }

        Index {
            dataset,
            series,
            slots,
            span,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn record(&self, pos: usize) -> &Record {
        &self.dataset.records()[pos]
    }

    pub fn contains(&self, location: &str) -> bool {
        self.slots.contains_key(location)
    }

    pub(crate) fn slot(&self, location: &str) -> Option<usize> {
        self.slots.get(location).copied()
    }

    /// Every known location, sorted.
    pub fn locations(&self) -> impl Iterator<Item = &str> + '_ {
        self.series.iter().map(|s| s.location.as_str())
    }

    pub fn location_count(&self) -> usize {
        self.series.len()
    }

    pub fn series(&self, location: &str) -> Option<&LocationSeries> {
        self.slot(location).map(|i| &self.series[i])
    }

    pub(crate) fn series_at(&self, slot: usize) -> &LocationSeries {
        &self.series[slot]
    }

    /// Earliest and latest date across all locations.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.span
    }

    /// Every location over the full date span.
    pub fn default_filter(&self) -> Option<Filter> {
        self.span.map(|(start, end)| Filter::all(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawRow;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn index() -> Index {
        let rows = vec![
            RawRow::new("USA", "2021-01-05", "1", ""),
            RawRow::new("IND", "2021-01-01", "2", ""),
            RawRow::new("USA", "2021-01-01", "3", ""),
            RawRow::new("USA", "2021-01-03", "4", ""),
            RawRow::new("BRA", "2020-12-30", "5", ""),
        ];
        let (ds, _) = Dataset::build(rows).unwrap();
        Index::build(Arc::new(ds))
    }

    #[test]
    fn groups_and_sorts_by_location_then_date() {
        let idx = index();
        assert_eq!(idx.locations().collect::<Vec<_>>(), vec!["BRA", "IND", "USA"]);

        let usa = idx.series("USA").unwrap();
        let dates: Vec<_> = usa.range(d("2000-01-01"), d("2100-01-01")).iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![d("2021-01-01"), d("2021-01-03"), d("2021-01-05")]);
        assert_eq!(usa.first_date(), Some(d("2021-01-01")));
        assert_eq!(usa.last_date(), Some(d("2021-01-05")));
    }

    #[test]
    fn range_is_inclusive_and_tolerates_gaps() {
        let idx = index();
        let usa = idx.series("USA").unwrap();

        let hits = usa.range(d("2021-01-03"), d("2021-01-05"));
        assert_eq!(hits.len(), 2);
        assert_eq!(idx.record(hits[0].1).new_deaths_smoothed, Some(4.0));

        // falls entirely inside a gap
        assert!(usa.range(d("2021-01-04"), d("2021-01-04")).is_empty());
        assert_eq!(usa.range(d("2021-01-05"), d("2021-01-05")).len(), 1);
        assert!(usa.range(d("2021-01-05"), d("2021-01-01")).is_empty());
    }

    #[test]
    fn membership_and_span() {
        let idx = index();
        assert!(idx.contains("IND"));
        assert!(!idx.contains("Atlantis"));
        assert_eq!(idx.location_count(), 3);
        assert_eq!(idx.date_span(), Some((d("2020-12-30"), d("2021-01-05"))));

        let f = idx.default_filter().unwrap();
        assert!(f.locations.is_empty());
        assert_eq!((f.start_date, f.end_date), (d("2020-12-30"), d("2021-01-05")));
    }
}
