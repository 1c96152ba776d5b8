use std::sync::Arc;

use chrono::NaiveDate;
use log::debug;

use crate::data::aggregate::{enrich, EnrichedView};
use crate::data::export::serialize;
use crate::data::filter::Filter;
use crate::data::index::Index;
use crate::data::query::query;
use crate::error::{InvalidRangeError, SerializationError};

/// Countries pre-selected in a fresh session, when present in the data.
pub const DEFAULT_LOCATIONS: [&str; 4] = ["United States", "India", "Brazil", "United Kingdom"];

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One user's filter selection and its current result, independent of rendering.
///
/// Sessions share the immutable [`Index`] and nothing else; each one can live
/// on its own thread. Every selection change re-runs the query, so `view`
/// always matches `filter`.
#[derive(Debug, Clone)]
pub struct Session {
    index: Arc<Index>,

    /// Current selection. Only valid filters are ever stored.
    filter: Filter,

    /// Result of the current selection.
    view: EnrichedView,

    /// Status / warning message for the UI.
    pub status_message: Option<String>,
}

impl Session {
    /// Start with the default countries over the full date span.
    ///
    /// Returns `None` for an index without any dates, which cannot be built
    /// from a successfully ingested dataset.
    pub fn new(index: Arc<Index>) -> Option<Self> {
        let (start, end) = index.date_span()?;
        let defaults: Vec<&str> = DEFAULT_LOCATIONS
            .iter()
            .copied()
            .filter(|loc| index.contains(loc))
            .collect();
        let filter = Filter::all(start, end).with_locations(defaults);
        let view = enrich(query(&index, &filter).ok()?);
        let mut session = Session {
            index,
            filter,
            view,
            status_message: None,
        };
        session.update_status();
        Some(session)
    }

    pub fn index(&self) -> &Arc<Index> {
        &self.index
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn view(&self) -> &EnrichedView {
        &self.view
    }

    /// Add or remove one location from the selection.
    pub fn toggle_location(&mut self, location: &str) {
        if !self.filter.locations.remove(location) {
            self.filter.locations.insert(location.to_string());
        }
        self.refilter();
    }

    /// Select every location (an empty selection means "all").
    pub fn select_all(&mut self) {
        self.filter.locations.clear();
        self.refilter();
    }

    /// Change the date range. An inverted range is rejected before querying
    /// and the session stays as it was.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), InvalidRangeError> {
        let candidate = Filter {
            start_date: start,
            end_date: end,
            ..self.filter.clone()
        };
        if let Err(e) = candidate.validate() {
            self.status_message = Some(e.to_string());
            return Err(e);
        }
        self.filter = candidate;
        self.refilter();
        Ok(())
    }

    /// A date picker with only one date selected.
    pub fn set_single_date(&mut self, date: NaiveDate) {
        self.filter.start_date = date;
        self.filter.end_date = date;
        self.refilter();
    }

    /// Export the current view.
    pub fn export(&self, format: &str) -> Result<Vec<u8>, SerializationError> {
        serialize(&self.view, format)
    }

    /// Recompute `view` after a selection change.
    fn refilter(&mut self) {
        match query(&self.index, &self.filter) {
            Ok(view) => {
                self.view = enrich(view);
                debug!("session refiltered: {} rows", self.view.len());
                self.update_status();
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    fn update_status(&mut self) {
        self.status_message = if !self.view.warnings().is_empty() {
            Some(self.view.warnings().join("; "))
        } else if self.view.is_empty() {
            Some("No rows match your filters.".to_string())
        } else {
            None
        };
    }
}
