//! Response bodies of the Argus backend.

use market_core::{NewsItem, PriceBar};
use serde::Deserialize;

/// `GET /market-data/{ticker}` answers with a bare bar list, or with an
/// `{"error": "..."}` object when the upstream quote source fails.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MarketDataResponse {
    Bars(Vec<PriceBar>),
    Error { error: String },
}

#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    pub report: String,
}
