use market_core::{normalize_bars, AnalysisReport, MarketBackend, PriceSeries, RunQuery};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::store::{DashboardStore, RunId};

/// How writes from overlapping runs are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Every settled call writes its slot; the last completion wins and any
    /// analysis settlement clears busy, whichever run it belongs to.
    #[default]
    LastWriteWins,
    /// Writes from a run that is no longer the latest are dropped, and only
    /// the latest run's analysis clears busy.
    LatestRunOnly,
}

#[derive(Error, Debug)]
#[error("unknown run policy '{0}' (expected 'last-write-wins' or 'latest-only')")]
pub struct RunPolicyParseError(String);

impl FromStr for RunPolicy {
    type Err = RunPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" => Ok(RunPolicy::LastWriteWins),
            "latest-only" | "latest_only" | "latest-run-only" => Ok(RunPolicy::LatestRunOnly),
            other => Err(RunPolicyParseError(other.to_string())),
        }
    }
}

/// Tasks spawned for one run. Dropping the handle detaches them.
#[derive(Debug)]
pub struct RunHandle {
    pub id: RunId,
    pub prices: JoinHandle<()>,
    pub news: JoinHandle<()>,
    pub analysis: JoinHandle<()>,
}

impl RunHandle {
    /// Waits for all three calls, in no particular order.
    pub async fn settled(self) {
        let (prices, news, analysis) = tokio::join!(self.prices, self.news, self.analysis);
        for (name, result) in [("prices", prices), ("news", news), ("analysis", analysis)] {
            if let Err(e) = result {
                tracing::error!("{} task for {} ended abnormally: {}", name, self.id, e);
            }
        }
    }
}

/// Issues the three calls of a run against the current selection and
/// writes each result into the store as it arrives.
pub struct FetchOrchestrator {
    backend: Arc<dyn MarketBackend>,
    store: DashboardStore,
    policy: RunPolicy,
}

impl FetchOrchestrator {
    pub fn new(backend: Arc<dyn MarketBackend>, store: DashboardStore) -> Self {
        Self {
            backend,
            store,
            policy: RunPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RunPolicy {
        self.policy
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Starts a run. Must be called from within a Tokio runtime.
    ///
    /// Busy is raised and the report and news are cleared before this
    /// returns. The three calls are independent: prices and news never touch
    /// busy, and only the analysis call clears it. A run already in flight
    /// is neither cancelled nor awaited.
    pub fn run(&self) -> RunHandle {
        let (id, query) = self.store.begin_run();
        tracing::info!(
            "Starting {} for {} ({}) via {} backend, topics: {}",
            id,
            query.asset,
            query.ticker,
            self.backend.backend_name(),
            query.topics
        );

        let prices = tokio::spawn(fetch_prices(
            self.backend.clone(),
            self.store.clone(),
            self.policy,
            id,
            query.ticker.clone(),
        ));
        let news = tokio::spawn(fetch_news(
            self.backend.clone(),
            self.store.clone(),
            self.policy,
            id,
            query.clone(),
        ));
        let analysis = tokio::spawn(fetch_analysis(
            self.backend.clone(),
            self.store.clone(),
            self.policy,
            id,
            query,
        ));

        RunHandle {
            id,
            prices,
            news,
            analysis,
        }
    }
}

async fn fetch_prices(
    backend: Arc<dyn MarketBackend>,
    store: DashboardStore,
    policy: RunPolicy,
    run: RunId,
    ticker: String,
) {
    match backend.price_history(&ticker).await {
        Ok(bars) => {
            let series = PriceSeries::new(normalize_bars(bars));
            let count = series.len();
            if store.commit(run, policy, "prices", |state| state.prices = series) {
                tracing::info!("{}: {} bars for {}", run, count, ticker);
            }
        }
        // prior series stays on screen
        Err(e) => tracing::error!("{}: price history for {} failed: {}", run, ticker, e),
    }
}

async fn fetch_news(
    backend: Arc<dyn MarketBackend>,
    store: DashboardStore,
    policy: RunPolicy,
    run: RunId,
    query: RunQuery,
) {
    match backend.news(&query).await {
        Ok(items) => {
            let count = items.len();
            if store.commit(run, policy, "news", |state| state.news = items) {
                tracing::info!("{}: {} news items for {}", run, count, query.ticker);
            }
        }
        Err(e) => tracing::error!("{}: news for {} failed: {}", run, query.ticker, e),
    }
}

async fn fetch_analysis(
    backend: Arc<dyn MarketBackend>,
    store: DashboardStore,
    policy: RunPolicy,
    run: RunId,
    query: RunQuery,
) {
    let report = match backend.analyze(&query).await {
        Ok(text) => {
            tracing::info!("{}: analysis for {} received ({} chars)", run, query.ticker, text.len());
            AnalysisReport::new(text)
        }
        Err(e) => {
            tracing::error!("{}: analysis for {} failed: {}", run, query.ticker, e);
            AnalysisReport::failure()
        }
    };

    store.commit(run, policy, "analysis", |state| {
        state.report = report;
        state.run.busy = false;
    });
}
