use async_trait::async_trait;
use market_core::{MarketBackend, MarketResult, NewsItem, PriceBar, RunQuery};

use crate::ArgusClient;

/// HTTP-backed implementation of [`MarketBackend`].
pub struct HttpBackend {
    client: ArgusClient,
}

impl HttpBackend {
    pub fn new(client: ArgusClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ArgusClient {
        &self.client
    }
}

impl From<ArgusClient> for HttpBackend {
    fn from(client: ArgusClient) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl MarketBackend for HttpBackend {
    async fn price_history(&self, ticker: &str) -> MarketResult<Vec<PriceBar>> {
        Ok(self.client.market_data(ticker).await?)
    }

    async fn news(&self, query: &RunQuery) -> MarketResult<Vec<NewsItem>> {
        Ok(self.client.news(query).await?)
    }

    async fn analyze(&self, query: &RunQuery) -> MarketResult<String> {
        Ok(self.client.analyze(query).await?)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
