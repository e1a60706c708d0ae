use async_trait::async_trait;

use crate::{MarketResult, NewsItem, PriceBar, RunQuery};

/// Remote collaborator serving price history, the news wire and the
/// narrative analysis.
///
/// Implemented by the HTTP client and by scripted backends in tests.
#[async_trait]
pub trait MarketBackend: Send + Sync {
    /// Daily bars for one instrument, keyed by ticker only.
    async fn price_history(&self, ticker: &str) -> MarketResult<Vec<PriceBar>>;

    async fn news(&self, query: &RunQuery) -> MarketResult<Vec<NewsItem>>;

    /// Markdown verdict text.
    async fn analyze(&self, query: &RunQuery) -> MarketResult<String>;

    fn backend_name(&self) -> &'static str;
}
