#[cfg(test)]
mod orchestration_tests {
    use crate::chart::testing::{Op, RecordingEngine};
    use crate::chart::{ChartLifecycle, Transition, Viewport};
    use crate::orchestrator::{FetchOrchestrator, RunPolicy};
    use crate::store::DashboardStore;
    use async_trait::async_trait;
    use market_core::{
        BarTime, Catalog, MarketBackend, MarketError, MarketResult, NewsItem, PriceBar, RunQuery,
        Sentiment, ANALYSIS_FAILURE_MESSAGE,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use tokio_test::assert_ok;

    type Reply<T> = oneshot::Receiver<MarketResult<T>>;

    #[derive(Default)]
    struct Pending {
        prices: Option<Reply<Vec<PriceBar>>>,
        news: Option<Reply<Vec<NewsItem>>>,
        analysis: Option<Reply<String>>,
    }

    /// Senders for one ticker's three calls. Each call stays pending until
    /// the test answers it, so completion order is fully scripted.
    struct Script {
        prices: oneshot::Sender<MarketResult<Vec<PriceBar>>>,
        news: oneshot::Sender<MarketResult<Vec<NewsItem>>>,
        analysis: oneshot::Sender<MarketResult<String>>,
    }

    #[derive(Default)]
    struct ScriptedBackend {
        pending: Mutex<HashMap<String, Pending>>,
        queries: Mutex<Vec<RunQuery>>,
    }

    impl ScriptedBackend {
        fn expect(&self, ticker: &str) -> Script {
            let (prices_tx, prices_rx) = oneshot::channel();
            let (news_tx, news_rx) = oneshot::channel();
            let (analysis_tx, analysis_rx) = oneshot::channel();
            self.pending.lock().unwrap().insert(
                ticker.to_string(),
                Pending {
                    prices: Some(prices_rx),
                    news: Some(news_rx),
                    analysis: Some(analysis_rx),
                },
            );
            Script {
                prices: prices_tx,
                news: news_tx,
                analysis: analysis_tx,
            }
        }

        fn take<T>(
            &self,
            ticker: &str,
            pick: impl FnOnce(&mut Pending) -> Option<Reply<T>>,
        ) -> Option<Reply<T>> {
            self.pending.lock().unwrap().get_mut(ticker).and_then(pick)
        }

        async fn answer<T>(reply: Option<Reply<T>>) -> MarketResult<T> {
            match reply {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(MarketError::Transport("script dropped".to_string()))),
                None => Err(MarketError::Transport("unscripted call".to_string())),
            }
        }
    }

    #[async_trait]
    impl MarketBackend for ScriptedBackend {
        async fn price_history(&self, ticker: &str) -> MarketResult<Vec<PriceBar>> {
            Self::answer(self.take(ticker, |p| p.prices.take())).await
        }

        async fn news(&self, query: &RunQuery) -> MarketResult<Vec<NewsItem>> {
            self.queries.lock().unwrap().push(query.clone());
            Self::answer(self.take(&query.ticker, |p| p.news.take())).await
        }

        async fn analyze(&self, query: &RunQuery) -> MarketResult<String> {
            Self::answer(self.take(&query.ticker, |p| p.analysis.take())).await
        }

        fn backend_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn setup(policy: RunPolicy) -> (Arc<ScriptedBackend>, DashboardStore, FetchOrchestrator) {
        let backend = Arc::new(ScriptedBackend::default());
        let store = DashboardStore::new(Arc::new(Catalog::builtin().unwrap()));
        let orchestrator =
            FetchOrchestrator::new(backend.clone(), store.clone()).with_policy(policy);
        (backend, store, orchestrator)
    }

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            time: BarTime::Unix(1_714_521_600 + day as i64 * 86_400),
            open: close - 5.0,
            high: close + 10.0,
            low: close - 10.0,
            close,
        }
    }

    fn headline(summary: &str, sentiment: Sentiment) -> NewsItem {
        NewsItem {
            link: format!("https://news.example.com/{}", summary.len()),
            sentiment,
            date: None,
            summary: summary.to_string(),
            source: "Bloomberg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_gold_run_end_to_end() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        assert!(store.select_instrument("GC=F"));
        let script = backend.expect("GC=F");

        let handle = orchestrator.run();
        assert!(store.is_busy());

        script
            .prices
            .send(Ok(vec![bar(3, 2330.0), bar(1, 2305.0), bar(2, 2318.0)]))
            .unwrap();
        script
            .news
            .send(Ok(vec![
                headline("Dollar slips after CPI", Sentiment::Bullish),
                headline("Fed signals patience", Sentiment::Neutral),
            ]))
            .unwrap();
        script.analysis.send(Ok("**Bullish** on gold.".to_string())).unwrap();
        handle.settled().await;

        let state = store.snapshot();
        assert!(!state.run.busy);
        assert_eq!(state.report.markdown(), "**Bullish** on gold.");

        let closes: Vec<f64> = state.prices.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2305.0, 2318.0, 2330.0]);

        let summaries: Vec<&str> = state.news.iter().map(|n| n.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Dollar slips after CPI", "Fed signals patience"]);

        let queries = backend.queries.lock().unwrap();
        assert_eq!(queries[0].asset, "Gold");
        assert_eq!(
            queries[0].topics,
            "US Dollar, Fed Interest Rates, Inflation, Safe Haven Flows"
        );
    }

    #[tokio::test]
    async fn test_run_start_clears_report_and_news_but_not_prices() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let first = backend.expect("CL=F");
        let handle = orchestrator.run();
        first.prices.send(Ok(vec![bar(1, 78.0), bar(2, 79.5)])).unwrap();
        first.news.send(Ok(vec![headline("OPEC holds", Sentiment::Bearish)])).unwrap();
        first.analysis.send(Ok("Sell the rip.".to_string())).unwrap();
        handle.settled().await;
        let prior = store.snapshot().prices;

        let _second = backend.expect("CL=F");
        let handle = orchestrator.run();

        // observable before any call is answered
        let state = store.snapshot();
        assert!(state.run.busy);
        assert!(state.report.is_empty());
        assert!(state.news.is_empty());
        assert_eq!(state.prices, prior);
        assert_eq!(state.prices.len(), 2);
        drop(handle);
    }

    #[tokio::test]
    async fn test_busy_cleared_by_analysis_while_data_still_arriving() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let script = backend.expect("CL=F");
        let handle = orchestrator.run();

        script.analysis.send(Ok("Wait.".to_string())).unwrap();
        assert_ok!(handle.analysis.await);

        let state = store.snapshot();
        assert!(!state.run.busy);
        assert!(state.prices.is_empty());
        assert!(state.news.is_empty());

        script.prices.send(Ok(vec![bar(1, 80.0)])).unwrap();
        script.news.send(Ok(vec![headline("Inventories fall", Sentiment::Bullish)])).unwrap();
        assert_ok!(handle.prices.await);
        assert_ok!(handle.news.await);

        let state = store.snapshot();
        assert!(!state.run.busy);
        assert_eq!(state.prices.len(), 1);
        assert_eq!(state.news.len(), 1);
    }

    #[tokio::test]
    async fn test_prices_and_news_never_touch_busy() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let script = backend.expect("CL=F");
        let handle = orchestrator.run();

        script.prices.send(Ok(vec![bar(1, 80.0)])).unwrap();
        script.news.send(Err(MarketError::Transport("reset".to_string()))).unwrap();
        assert_ok!(handle.prices.await);
        assert_ok!(handle.news.await);
        assert!(store.is_busy());

        script.analysis.send(Ok("Hold.".to_string())).unwrap();
        assert_ok!(handle.analysis.await);
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_analysis_failure_sets_fallback_report() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let script = backend.expect("CL=F");
        let handle = orchestrator.run();

        script.prices.send(Ok(vec![bar(1, 80.0), bar(2, 81.0)])).unwrap();
        script.news.send(Ok(vec![headline("Refinery outage", Sentiment::Bullish)])).unwrap();
        script
            .analysis
            .send(Err(MarketError::Transport("connection refused".to_string())))
            .unwrap();
        handle.settled().await;

        let state = store.snapshot();
        assert!(!state.run.busy);
        assert_eq!(state.report.markdown(), ANALYSIS_FAILURE_MESSAGE);
        assert_eq!(state.prices.len(), 2);
        assert_eq!(state.news.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_price_and_news_calls_keep_prior_data() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let first = backend.expect("CL=F");
        let handle = orchestrator.run();
        first.prices.send(Ok(vec![bar(1, 80.0)])).unwrap();
        first.news.send(Ok(Vec::new())).unwrap();
        first.analysis.send(Ok("ok".to_string())).unwrap();
        handle.settled().await;
        let prior = store.snapshot().prices;

        let second = backend.expect("CL=F");
        let handle = orchestrator.run();
        second
            .prices
            .send(Err(MarketError::Backend("No data found".to_string())))
            .unwrap();
        drop(second.news);
        second.analysis.send(Ok("again".to_string())).unwrap();
        handle.settled().await;

        let state = store.snapshot();
        assert_eq!(state.prices, prior);
        assert!(state.news.is_empty());
        assert_eq!(state.report.markdown(), "again");
    }

    #[tokio::test]
    async fn test_topics_edit_is_sent_then_discarded_on_reselect() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        store.select_instrument("GC=F");
        store.set_topics("Central bank buying");

        let script = backend.expect("GC=F");
        let handle = orchestrator.run();
        drop(script);
        handle.settled().await;
        assert_eq!(backend.queries.lock().unwrap()[0].topics, "Central bank buying");

        store.select_instrument("SI=F");
        let selection = store.read(|s| s.selection.current().clone());
        assert_eq!(selection.instrument.id, "SI=F");
        assert_eq!(selection.topics, selection.instrument.default_topics);
    }

    #[tokio::test]
    async fn test_overlapping_runs_last_write_wins() {
        let (backend, store, orchestrator) = setup(RunPolicy::LastWriteWins);

        store.select_instrument("GC=F");
        let gold = backend.expect("GC=F");
        let first = orchestrator.run();

        store.select_instrument("SI=F");
        let silver = backend.expect("SI=F");
        let second = orchestrator.run();

        silver.analysis.send(Ok("silver verdict".to_string())).unwrap();
        assert_ok!(second.analysis.await);
        // the first run is still in flight, yet busy is already down
        assert!(!store.is_busy());

        gold.analysis.send(Ok("gold verdict".to_string())).unwrap();
        gold.prices.send(Ok(vec![bar(1, 2300.0)])).unwrap();
        assert_ok!(first.analysis.await);
        assert_ok!(first.prices.await);

        let state = store.snapshot();
        assert_eq!(state.report.markdown(), "gold verdict");
        assert_eq!(state.prices.last_close(), Some(2300.0));
        assert_eq!(state.selection.current().instrument.id, "SI=F");
        assert_eq!(state.run.runs_started, 2);
    }

    #[tokio::test]
    async fn test_overlapping_runs_latest_only_discards_stale_writes() {
        let (backend, store, orchestrator) = setup(RunPolicy::LatestRunOnly);

        store.select_instrument("GC=F");
        let gold = backend.expect("GC=F");
        let first = orchestrator.run();

        store.select_instrument("SI=F");
        let silver = backend.expect("SI=F");
        let second = orchestrator.run();
        assert_eq!(store.read(|s| s.run.latest), Some(second.id));

        // stale analysis must not clear busy for the run in flight
        gold.analysis.send(Ok("gold verdict".to_string())).unwrap();
        gold.prices.send(Ok(vec![bar(1, 2300.0)])).unwrap();
        assert_ok!(first.analysis.await);
        assert_ok!(first.prices.await);
        let state = store.snapshot();
        assert!(state.run.busy);
        assert!(state.report.is_empty());
        assert!(state.prices.is_empty());

        silver.prices.send(Ok(vec![bar(1, 27.0), bar(2, 27.4)])).unwrap();
        silver.analysis.send(Ok("silver verdict".to_string())).unwrap();
        assert_ok!(second.prices.await);
        assert_ok!(second.analysis.await);

        let state = store.snapshot();
        assert!(!state.run.busy);
        assert_eq!(state.report.markdown(), "silver verdict");
        assert_eq!(state.prices.last_close(), Some(27.4));
    }

    #[tokio::test]
    async fn test_chart_follows_store_across_runs() {
        let (backend, store, orchestrator) = setup(RunPolicy::default());
        let mut rx = store.subscribe();
        let mut chart = ChartLifecycle::new(RecordingEngine::default(), 18);
        chart.attach(Viewport::new(120));

        for (round, close) in [(1u32, 80.0), (2, 82.0)] {
            let script = backend.expect("CL=F");
            let handle = orchestrator.run();
            // run start leaves the series alone
            let prices = rx.borrow_and_update().prices.clone();
            assert_eq!(chart.sync(&prices), Transition::Unchanged);

            script.prices.send(Ok(vec![bar(round, close)])).unwrap();
            assert_ok!(handle.prices.await);
            let prices = rx.borrow_and_update().prices.clone();
            let transition = chart.sync(&prices);
            if round == 1 {
                assert_eq!(transition, Transition::Created { revision: prices.revision() });
            } else {
                assert_eq!(transition, Transition::Replaced { revision: prices.revision() });
            }
            assert_eq!(chart.viewport().map(Viewport::listener_count), Some(1));
            drop((script.news, script.analysis));
        }

        let engine = chart.engine();
        assert_eq!(engine.count(|op| matches!(op, Op::Create { .. })), 2);
        assert_eq!(engine.count(|op| matches!(op, Op::Dispose { .. })), 1);
        assert_eq!(engine.count(|op| matches!(op, Op::SetData { bars: 1, .. })), 2);
    }
}
