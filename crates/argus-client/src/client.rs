use market_core::{NewsItem, PriceBar, RunQuery};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use crate::error::{ArgusError, ArgusResult};
use crate::wire::{AnalyzeResponse, MarketDataResponse, NewsResponse};
use crate::ArgusConfig;

#[derive(Clone)]
pub struct ArgusClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ArgusClient {
    pub fn new(config: ArgusConfig) -> ArgusResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ArgusError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ArgusError::InvalidUrl(config.base_url));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> ArgusResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ArgusError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check_status(response: Response) -> ArgusResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(ArgusError::Status {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }

    /// Reads the whole body and decodes it. A body that is not the expected
    /// JSON shape is an `InvalidResponse` carrying the start of the body.
    async fn decode<T: DeserializeOwned>(response: Response) -> ArgusResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let head: String = body.chars().take(120).collect();
            ArgusError::InvalidResponse(format!("{} (body: {})", e, head))
        })
    }

    /// Daily OHLC history for a ticker, as the backend ordered it.
    pub async fn market_data(&self, ticker: &str) -> ArgusResult<Vec<PriceBar>> {
        let url = self.endpoint(&["market-data", ticker])?;
        tracing::debug!("GET {}", url);

        let response = Self::check_status(self.client.get(url).send().await?).await?;
        match Self::decode::<MarketDataResponse>(response).await? {
            MarketDataResponse::Bars(bars) => Ok(bars),
            MarketDataResponse::Error { error } => Err(ArgusError::Backend(error)),
        }
    }

    /// Sentiment-tagged headlines for the query topics, in backend order.
    pub async fn news(&self, query: &RunQuery) -> ArgusResult<Vec<NewsItem>> {
        let url = self.endpoint(&["news"])?;
        tracing::debug!("POST {} ({})", url, query.ticker);

        let response =
            Self::check_status(self.client.post(url).json(query).send().await?).await?;
        let body: NewsResponse = Self::decode(response).await?;
        Ok(body.articles)
    }

    /// Markdown verdict produced by the analysis crew.
    pub async fn analyze(&self, query: &RunQuery) -> ArgusResult<String> {
        let url = self.endpoint(&["analyze"])?;
        tracing::debug!("POST {} ({})", url, query.ticker);

        let response =
            Self::check_status(self.client.post(url).json(query).send().await?).await?;
        let body: AnalyzeResponse = Self::decode(response).await?;
        Ok(body.report)
    }

    /// Whether the backend answers at all; any HTTP response counts.
    pub async fn ping(&self) -> bool {
        match self.endpoint(&["docs"]) {
            Ok(url) => self.client.get(url).send().await.is_ok(),
            Err(_) => false,
        }
    }
}
