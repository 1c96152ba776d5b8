/// Data layer: ingestion, indexing, querying, aggregation and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRow>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  validate, first-wins dedup → Dataset + IngestReport
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  index    │  location → date-sorted series
///   └──────────┘
///        │  + Filter
///        ▼
///   ┌──────────┐
///   │  query    │  binary-search ranges → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  per-location stats → EnrichedView
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  header-first CSV / TSV bytes
///   └──────────┘
/// ```

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod index;
pub mod loader;
pub mod model;
pub mod query;
pub mod store;
