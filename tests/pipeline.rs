use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use covid_explorer::data::export::parse;
use covid_explorer::{
    enrich, query, serialize, Dataset, ExportFormat, Field, Filter, Index, InvalidRangeError, RawRow,
    SerializationError, Session,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

fn scenario_index() -> Index {
    let rows = vec![
        RawRow::new("USA", "2021-01-01", "120", "5.0"),
        RawRow::new("USA", "2021-01-02", "100", "5.5"),
        RawRow::new("IND", "2021-01-01", "50", "1.0"),
    ];
    let (dataset, report) = Dataset::build(rows).expect("ingests");
    assert!(report.is_clean());
    Index::build(Arc::new(dataset))
}

#[test]
fn usa_scenario() {
    let index = scenario_index();
    let filter = Filter::new(["USA"], d("2021-01-01"), d("2021-01-02")).expect("valid range");
    let view = enrich(query(&index, &filter).expect("query"));

    assert_eq!(view.len(), 2);
    assert!(view.rows().iter().all(|r| r.location == "USA"));
    assert!(view.rows()[0].date < view.rows()[1].date);

    let usa = view.summary("USA").expect("USA summary");
    assert_eq!(usa.people_vaccinated_per_hundred.last_non_null, Some(5.5));
    assert_eq!(view.summaries().len(), 1);
}

#[test]
fn atlantis_scenario() {
    let index = scenario_index();
    let filter = Filter::all(d("2021-01-01"), d("2021-01-02")).with_locations(["Atlantis"]);
    let view = query(&index, &filter).expect("unknown locations are not fatal");

    assert!(view.is_empty());
    assert_eq!(view.warnings(), ["unknown location: Atlantis".to_string()]);
}

#[test]
fn inverted_range_never_returns_rows() {
    let index = scenario_index();
    let filter = Filter::all(d("2021-01-02"), d("2021-01-01"));
    assert_eq!(
        query(&index, &filter),
        Err(InvalidRangeError {
            start: d("2021-01-02"),
            end: d("2021-01-01"),
        })
    );
}

#[test]
fn single_date_and_empty_ranges() {
    let index = scenario_index();

    let view = query(&index, &Filter::single_day(d("2021-01-02"))).expect("query");
    assert_eq!(view.len(), 1);
    assert!(view.rows().iter().all(|r| r.date == d("2021-01-02")));

    let view = query(&index, &Filter::all(d("2019-01-01"), d("2019-12-31"))).expect("query");
    assert!(view.is_empty());
    assert!(view.warnings().is_empty());
}

#[test]
fn full_pipeline_round_trip() {
    let index = scenario_index();
    let filter = index.default_filter().expect("span");
    let view = enrich(query(&index, &filter).expect("query"));

    let bytes = serialize(&view, "csv").expect("csv export");
    let back = parse(&bytes, ExportFormat::Csv).expect("parse export");
    assert_eq!(back.as_slice(), view.rows());
}

#[test]
fn unsupported_export_format() {
    let index = scenario_index();
    let view = enrich(query(&index, &Filter::single_day(d("2021-01-01"))).expect("query"));
    assert!(matches!(
        serialize(&view, "parquet"),
        Err(SerializationError::UnsupportedFormat(_))
    ));
}

#[test]
fn deaths_and_vaccination_are_aligned_by_date() {
    let index = scenario_index();
    let view = enrich(query(&index, &index.default_filter().expect("span")).expect("query"));

    let deaths = view.pivot(Field::NewDeathsSmoothed);
    let vax = view.pivot(Field::PeopleVaccinatedPerHundred);
    assert_eq!(deaths.locations, vax.locations);
    assert_eq!(deaths.dates, vax.dates);
    assert_eq!(vax.get("USA", d("2021-01-02")), Some(5.5));
    assert_eq!(deaths.get("IND", d("2021-01-02")), None);
}

#[test]
fn concurrent_sessions_share_one_index() {
    let index = Arc::new(scenario_index());

    let handles: Vec<_> = ["USA", "IND", "Atlantis"]
        .into_iter()
        .map(|loc| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                let mut session = Session::new(index).expect("session");
                session.toggle_location(loc);
                session.export("csv").expect("export")
            })
        })
        .collect();

    let exports: Vec<String> = handles
        .into_iter()
        .map(|h| String::from_utf8(h.join().expect("thread")).expect("utf8"))
        .collect();

    // no default countries exist in this dataset, so each session holds one location
    assert_eq!(exports[0].lines().count(), 1 + 2);
    assert_eq!(exports[1].lines().count(), 1 + 1);
    assert_eq!(exports[2].lines().count(), 1);
}
