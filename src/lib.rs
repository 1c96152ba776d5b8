//! Filtering, aggregation and export engine for a COVID-19 deaths and
//! vaccination dashboard.
//!
//! ```no_run
//! use std::sync::Arc;
//! use covid_explorer::{enrich, query, serialize, Dataset, Index};
//!
//! let rows = covid_explorer::data::loader::load_file("owid-covid-data.csv".as_ref())?;
//! let (dataset, _report) = Dataset::build(rows)?;
//! let index = Index::build(Arc::new(dataset));
//! let filter = index.default_filter().expect("non-empty dataset");
//! let view = enrich(query(&index, &filter)?);
//! let csv = serialize(&view, "csv")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod data;
pub mod error;
pub mod session;

pub use data::aggregate::{enrich, EnrichedView, LocationSummary, Pivot, SeriesStats};
pub use data::export::{serialize, ExportFormat};
pub use data::filter::Filter;
pub use data::index::Index;
pub use data::model::{Field, RawRow, Record};
pub use data::query::{query, FilteredView};
pub use data::store::{Dataset, IngestReport};
pub use error::{
    DuplicateKeyError, IngestionError, InvalidRangeError, MalformedRowError, MalformedValueError,
    SerializationError,
};
pub use session::Session;
