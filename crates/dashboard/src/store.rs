use market_core::{AnalysisReport, Catalog, NewsItem, PriceSeries, RunQuery};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::orchestrator::RunPolicy;
use crate::selection::SelectionState;

/// Monotonic identifier of a run, unique per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    /// Set when a run starts, cleared when an analysis call settles.
    pub busy: bool,
    /// Most recently started run.
    pub latest: Option<RunId>,
    pub runs_started: u64,
}

/// Everything the dashboard surfaces read.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub selection: SelectionState,
    pub prices: PriceSeries,
    pub news: Vec<NewsItem>,
    pub report: AnalysisReport,
    pub run: RunState,
}

impl DashboardState {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            selection: SelectionState::new(catalog),
            prices: PriceSeries::empty(),
            news: Vec::new(),
            report: AnalysisReport::default(),
            run: RunState::default(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        self.selection.catalog()
    }

    /// Whether a write from `run` should land under `policy`.
    fn accepts(&self, run: RunId, policy: RunPolicy) -> bool {
        match policy {
            RunPolicy::LastWriteWins => true,
            RunPolicy::LatestRunOnly => self.run.latest == Some(run),
        }
    }
}

/// Shared handle to the dashboard state.
///
/// Mutations are synchronous and notify every subscriber. Clones share
/// the same state.
#[derive(Clone)]
pub struct DashboardStore {
    tx: Arc<watch::Sender<DashboardState>>,
}

impl DashboardStore {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let (tx, _rx) = watch::channel(DashboardState::new(catalog));
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    /// Read without cloning. Do not call back into the store from `f`.
    pub fn read<R>(&self, f: impl FnOnce(&DashboardState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn is_busy(&self) -> bool {
        self.read(|s| s.run.busy)
    }

    pub fn select_instrument(&self, id: &str) -> bool {
        self.tx
            .send_if_modified(|state| state.selection.select_instrument(id))
    }

    pub fn select_relative(&self, delta: isize) -> bool {
        self.tx
            .send_if_modified(|state| state.selection.select_relative(delta))
    }

    pub fn set_topics(&self, text: impl Into<String>) {
        let text = text.into();
        self.tx.send_modify(|state| state.selection.set_topics(text));
    }

    /// Marks a new run as started: busy on, report and news cleared.
    /// The price series is left alone until its own call resolves.
    pub(crate) fn begin_run(&self) -> (RunId, RunQuery) {
        let mut run = RunId(0);
        let mut query = RunQuery::default();
        self.tx.send_modify(|state| {
            state.run.runs_started += 1;
            run = RunId(state.run.runs_started);
            state.run.latest = Some(run);
            state.run.busy = true;
            state.report.clear();
            state.news.clear();
            query = state.selection.current().query();
        });
        (run, query)
    }

    /// Applies a write from `run` unless `policy` says the run is stale.
    /// Returns whether the write landed.
    pub(crate) fn commit(
        &self,
        run: RunId,
        policy: RunPolicy,
        slot: &'static str,
        write: impl FnOnce(&mut DashboardState),
    ) -> bool {
        self.tx.send_if_modified(|state| {
            if !state.accepts(run, policy) {
                tracing::debug!(
                    "Discarding {} from superseded {} (latest: {:?})",
                    slot,
                    run,
                    state.run.latest
                );
                return false;
            }
            write(state);
            true
        })
    }
}

impl fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardStore")
            .field("state", &*self.tx.borrow())
            .finish()
    }
}
