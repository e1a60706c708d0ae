use market_core::{Catalog, Instrument, RunQuery};
use std::sync::Arc;

/// The instrument the user is looking at plus the topics sent with a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub instrument: Instrument,
    pub topics: String,
}

impl Selection {
    pub fn new(instrument: Instrument) -> Self {
        let topics = instrument.default_topics.clone();
        Self { instrument, topics }
    }

    /// Request parameters for the news and analysis calls.
    pub fn query(&self) -> RunQuery {
        RunQuery {
            ticker: self.instrument.id.clone(),
            asset: self.instrument.display_name.clone(),
            topics: self.topics.clone(),
        }
    }
}

/// Selection bound to the catalog it selects from.
///
/// Re-selecting an instrument always resets the topics to its defaults,
/// discarding any edit.
#[derive(Debug, Clone)]
pub struct SelectionState {
    catalog: Arc<Catalog>,
    current: Selection,
}

impl SelectionState {
    /// Starts on the first catalog entry.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let current = Selection::new(catalog.first().clone());
        Self { catalog, current }
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns false, leaving the selection untouched, for an unknown id.
    pub fn select_instrument(&mut self, id: &str) -> bool {
        match self.catalog.get(id) {
            Some(instrument) => {
                self.current = Selection::new(instrument.clone());
                true
            }
            None => {
                tracing::debug!("Ignoring selection of unknown instrument {}", id);
                false
            }
        }
    }

    /// Replaces the topics verbatim; empty text is allowed.
    pub fn set_topics(&mut self, text: impl Into<String>) {
        self.current.topics = text.into();
    }

    /// Moves the picker by `delta` entries, wrapping at both ends.
    pub fn select_relative(&mut self, delta: isize) -> bool {
        let len = self.catalog.len() as isize;
        let index = self.catalog.position(&self.current.instrument.id).unwrap_or(0) as isize;
        let next = (index + delta).rem_euclid(len) as usize;
        match self.catalog.get_index(next).map(|i| i.id.clone()) {
            Some(id) => self.select_instrument(&id),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SelectionState {
        SelectionState::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn test_starts_on_first_entry_with_default_topics() {
        let state = state();
        assert_eq!(state.current().instrument.id, "CL=F");
        assert_eq!(
            state.current().topics,
            "OPEC, Middle East Conflict, Global Demand, Inventory Data"
        );
    }

    #[test]
    fn test_select_every_catalog_entry() {
        let mut state = state();
        let catalog = state.catalog().clone();
        for instrument in catalog.iter() {
            assert!(state.select_instrument(&instrument.id));
            assert_eq!(state.current().instrument.id, instrument.id);
            assert_eq!(state.current().topics, instrument.default_topics);
        }
    }

    #[test]
    fn test_unknown_id_leaves_selection_unchanged() {
        let mut state = state();
        state.select_instrument("GC=F");
        state.set_topics("my edit");
        let before = state.current().clone();

        assert!(!state.select_instrument("DOGE=F"));
        assert_eq!(state.current(), &before);
    }

    #[test]
    fn test_set_topics_never_touches_instrument() {
        let mut state = state();
        state.select_instrument("SI=F");

        state.set_topics("first");
        state.set_topics("");
        assert_eq!(state.current().topics, "");
        state.set_topics("second");
        assert_eq!(state.current().topics, "second");
        assert_eq!(state.current().instrument.id, "SI=F");
    }

    #[test]
    fn test_reselect_discards_topic_edit() {
        let mut state = state();
        state.select_instrument("GC=F");
        state.set_topics("Central bank buying");

        state.select_instrument("NG=F");
        assert_eq!(state.current().topics, "Weather Forecasts, LNG Exports, Storage Reports");

        // same instrument again still resets
        state.set_topics("edited");
        state.select_instrument("NG=F");
        assert_eq!(state.current().topics, "Weather Forecasts, LNG Exports, Storage Reports");
    }

    #[test]
    fn test_select_relative_wraps() {
        let mut state = state();
        assert!(state.select_relative(-1));
        assert_eq!(state.current().instrument.id, "CC=F");
        assert!(state.select_relative(1));
        assert_eq!(state.current().instrument.id, "CL=F");
        assert!(state.select_relative(4));
        assert_eq!(state.current().instrument.id, "GC=F");
    }

    #[test]
    fn test_query_uses_selection() {
        let mut state = state();
        state.select_instrument("GC=F");
        state.set_topics("Inflation");
        let query = state.current().query();
        assert_eq!(query.ticker, "GC=F");
        assert_eq!(query.asset, "Gold");
        assert_eq!(query.topics, "Inflation");
    }
}
