use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{Field, Record};
use super::query::FilteredView;

// ---------------------------------------------------------------------------
// SeriesStats – summary of one numeric field for one location
// ---------------------------------------------------------------------------

/// Statistics over the non-null observations of one field.
/// With no observations every statistic is `None` (never zero).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeriesStats {
    /// Number of non-null observations.
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Latest non-null value in date order.
    pub last_non_null: Option<f64>,
    pub sum: Option<f64>,
    pub mean: Option<f64>,
}

impl SeriesStats {
    /// Summarise values given in date order.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut stats = SeriesStats::default();
        let mut total = 0.0;
        for v in values.into_iter().flatten() {
            stats.count += 1;
            total += v;
            stats.min = Some(stats.min.map_or(v, |m| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m| m.max(v)));
            stats.last_non_null = Some(v);
        }
        if stats.count > 0 {
            stats.sum = Some(total);
            stats.mean = Some(total / stats.count as f64);
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// LocationSummary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    /// Rows in range, including rows where both fields are null.
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub new_deaths_smoothed: SeriesStats,
    pub people_vaccinated_per_hundred: SeriesStats,
}

impl LocationSummary {
    fn from_rows(location: &str, rows: &[Record]) -> Self {
        LocationSummary {
            location: location.to_string(),
            rows: rows.len(),
            first_date: rows.first().map(|r| r.date),
            last_date: rows.last().map(|r| r.date),
            new_deaths_smoothed: SeriesStats::from_values(rows.iter().map(|r| r.new_deaths_smoothed)),
            people_vaccinated_per_hundred: SeriesStats::from_values(
                rows.iter().map(|r| r.people_vaccinated_per_hundred),
            ),
        }
    }

    pub fn stats(&self, field: Field) -> &SeriesStats {
        match field {
            Field::NewDeathsSmoothed => &self.new_deaths_smoothed,
            Field::PeopleVaccinatedPerHundred => &self.people_vaccinated_per_hundred,
        }
    }
}

// ---------------------------------------------------------------------------
// Pivot – location × date matrix of one field
// ---------------------------------------------------------------------------

/// Dense location × date grid, `None` where no value was reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub field: Field,
    pub locations: Vec<String>,
    pub dates: Vec<NaiveDate>,
    /// `cells[i][j]` is the value for `locations[i]` on `dates[j]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Pivot {
    pub fn get(&self, location: &str, date: NaiveDate) -> Option<f64> {
        let i = self.locations.iter().position(|l| l == location)?;
        let j = self.dates.binary_search(&date).ok()?;
        self.cells[i][j]
    }
}

// ---------------------------------------------------------------------------
// EnrichedView
// ---------------------------------------------------------------------------

/// A [`FilteredView`] plus one [`LocationSummary`] per resolved location.
///
/// Record values are exactly those of the dataset; nothing is re-smoothed.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedView {
    view: FilteredView,
    summaries: Vec<LocationSummary>,
}

/// Attach per-location summaries to a view.
pub fn enrich(view: FilteredView) -> EnrichedView {
    let summaries = view
        .locations()
        .iter()
        .map(|loc| LocationSummary::from_rows(loc, view.rows_for(loc)))
        .collect();
    EnrichedView { view, summaries }
}

impl EnrichedView {
    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    pub fn rows(&self) -> &[Record] {
        self.view.rows()
    }

    pub fn warnings(&self) -> &[String] {
        self.view.warnings()
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Summaries in location order.
    pub fn summaries(&self) -> &[LocationSummary] {
        &self.summaries
    }

    pub fn summary(&self, location: &str) -> Option<&LocationSummary> {
        self.summaries
            .binary_search_by(|s| s.location.as_str().cmp(location))
            .ok()
            .map(|i| &self.summaries[i])
    }

    /// Rows of one location. Each row carries both fields for its date, so the
    /// deaths and vaccination series are aligned by construction.
    pub fn series(&self, location: &str) -> &[Record] {
        self.view.rows_for(location)
    }

    /// The first `n` rows, for table previews.
    pub fn head(&self, n: usize) -> &[Record] {
        let rows = self.view.rows();
        &rows[..n.min(rows.len())]
    }

    /// Location × date matrix of `field` over every location with rows.
    pub fn pivot(&self, field: Field) -> Pivot {
        let dates: Vec<NaiveDate> = self
            .rows()
            .iter()
            .map(|r| r.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut locations = Vec::new();
        let mut cells = Vec::new();
        for loc in self.view.locations() {
            let rows = self.view.rows_for(loc);
            if rows.is_empty() {
                continue;
            }
            let mut line = vec![None; dates.len()];
            for r in rows {
                if let Ok(j) = dates.binary_search(&r.date) {
                    line[j] = r.value(field);
                }
            }
            locations.push(loc.clone());
            cells.push(line);
        }

        Pivot {
            field,
            locations,
            dates,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::filter::Filter;
    use crate::data::index::Index;
    use crate::data::model::RawRow;
    use crate::data::query::query;
    use crate::data::store::Dataset;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn enriched(rows: Vec<RawRow>, filter: Filter) -> EnrichedView {
        let (ds, _) = Dataset::build(rows).unwrap();
        let idx = Index::build(Arc::new(ds));
        enrich(query(&idx, &filter).unwrap())
    }

    #[test]
    fn stats_skip_nulls() {
        let s = SeriesStats::from_values([Some(3.0), None, Some(1.0), Some(2.0), None]);
        assert_eq!(s.count, 3);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(3.0));
        assert_eq!(s.last_non_null, Some(2.0));
        assert_eq!(s.sum, Some(6.0));
        assert_eq!(s.mean, Some(2.0));
    }

    #[test]
    fn all_null_field_has_no_statistics() {
        let s = SeriesStats::from_values([None, None]);
        assert_eq!(s, SeriesStats::default());
        assert_eq!(s.sum, None);
    }

    #[test]
    fn summarises_each_location() {
        let view = enriched(
            vec![
                RawRow::new("USA", "2021-01-01", "120", "5.0"),
                RawRow::new("USA", "2021-01-02", "100", "5.5"),
                RawRow::new("IND", "2021-01-01", "50", ""),
            ],
            Filter::all(d("2021-01-01"), d("2021-01-02")),
        );

        let usa = view.summary("USA").unwrap();
        assert_eq!(usa.rows, 2);
        assert_eq!(usa.people_vaccinated_per_hundred.last_non_null, Some(5.5));
        assert_eq!(usa.new_deaths_smoothed.max, Some(120.0));
        assert_eq!(usa.stats(Field::NewDeathsSmoothed).sum, Some(220.0));

        let ind = view.summary("IND").unwrap();
        assert_eq!(ind.people_vaccinated_per_hundred.min, None);
        assert_eq!(ind.people_vaccinated_per_hundred.max, None);
        assert_eq!(ind.people_vaccinated_per_hundred.last_non_null, None);
        assert_eq!(ind.new_deaths_smoothed.last_non_null, Some(50.0));

        assert!(view.summary("BRA").is_none());
    }

    #[test]
    fn location_without_rows_in_range_still_summarised() {
        let view = enriched(
            vec![
                RawRow::new("USA", "2021-01-01", "120", "5.0"),
                RawRow::new("IND", "2021-03-01", "50", "1.0"),
            ],
            Filter::single_day(d("2021-01-01")),
        );
        let ind = view.summary("IND").unwrap();
        assert_eq!(ind.rows, 0);
        assert_eq!(ind.first_date, None);
        assert_eq!(ind.new_deaths_smoothed, SeriesStats::default());
    }

    #[test]
    fn values_pass_through_unchanged() {
        let view = enriched(
            vec![
                RawRow::new("ISR", "2021-06-01", "0.143", "104.7"),
                RawRow::new("ISR", "2021-06-02", "", "104.8"),
            ],
            Filter::all(d("2021-06-01"), d("2021-06-02")),
        );
        let rows = view.series("ISR");
        assert_eq!(rows[0].new_deaths_smoothed, Some(0.143));
        assert_eq!(rows[0].people_vaccinated_per_hundred, Some(104.7));
        assert_eq!(rows[1].new_deaths_smoothed, None);
    }

    #[test]
    fn pivot_fills_missing_cells_with_none() {
        let view = enriched(
            vec![
                RawRow::new("USA", "2021-01-01", "120", ""),
                RawRow::new("USA", "2021-01-03", "", ""),
                RawRow::new("IND", "2021-01-02", "50", ""),
            ],
            Filter::all(d("2021-01-01"), d("2021-01-03")),
        );
        let p = view.pivot(Field::NewDeathsSmoothed);
        assert_eq!(p.locations, vec!["IND".to_string(), "USA".to_string()]);
        assert_eq!(p.dates.len(), 3);
        assert_eq!(p.cells[0], vec![None, Some(50.0), None]);
        assert_eq!(p.cells[1], vec![Some(120.0), None, None]);
        assert_eq!(p.get("USA", d("2021-01-01")), Some(120.0));
        assert_eq!(p.get("USA", d("2021-01-02")), None);
    }

    #[test]
    fn head_is_bounded() {
        let view = enriched(
            vec![
                RawRow::new("USA", "2021-01-01", "1", ""),
                RawRow::new("USA", "2021-01-02", "2", ""),
            ],
            Filter::all(d("2021-01-01"), d("2021-01-02")),
        );
        assert_eq!(view.head(1).len(), 1);
        assert_eq!(view.head(200).len(), 2);
    }
}
