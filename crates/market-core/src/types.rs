use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Report text shown when the analysis call fails.
pub const ANALYSIS_FAILURE_MESSAGE: &str = "**Error:** Failed to contact Argus Agent.";

/// Time key of a price bar: a calendar day or a unix timestamp (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BarTime {
    Day(NaiveDate),
    Unix(i64),
}

impl BarTime {
    /// Seconds since the epoch; days are taken at midnight UTC.
    pub fn as_unix(&self) -> i64 {
        match self {
            BarTime::Day(date) => date
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp())
                .unwrap_or_default(),
            BarTime::Unix(ts) => *ts,
        }
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.as_unix(), 0)
    }
}

impl Ord for BarTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_unix()
            .cmp(&other.as_unix())
            .then_with(|| matches!(self, BarTime::Unix(_)).cmp(&matches!(other, BarTime::Unix(_))))
    }
}

impl PartialOrd for BarTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarTime::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            BarTime::Unix(_) => match self.to_datetime() {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
                None => write!(f, "?"),
            },
        }
    }
}

/// OHLC bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub time: BarTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Sort bars ascending by time and collapse duplicate timestamps,
/// keeping the last occurrence.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    // stable sort keeps arrival order among equal timestamps
    bars.sort_by(|a, b| a.time.cmp(&b.time));
    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.time == bar.time => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

static NEXT_SERIES_REVISION: AtomicU64 = AtomicU64::new(1);

/// An immutable price history with an identity.
///
/// Every series built from a fetch gets a fresh `revision`, so two fetches
/// returning identical bars are still distinct series.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    revision: u64,
    bars: Arc<[PriceBar]>,
}

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self {
            revision: NEXT_SERIES_REVISION.fetch_add(1, Ordering::Relaxed),
            bars: bars.into(),
        }
    }

    pub fn empty() -> Self {
        Self {
            revision: 0,
            bars: Arc::from(Vec::new()),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

impl Default for PriceSeries {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for PriceSeries {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision
    }
}

/// Headline sentiment as tagged by the news collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Sentiment {
    Bullish,
    Bearish,
    /// Neutral, unknown, or missing
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn name(&self) -> &'static str {
        match self {
            Sentiment::Bullish => "Bullish",
            Sentiment::Bearish => "Bearish",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bullish" => Sentiment::Bullish,
            "bearish" => Sentiment::Bearish,
            _ => Sentiment::Neutral,
        }
    }
}

impl From<Option<String>> for Sentiment {
    fn from(raw: Option<String>) -> Self {
        raw.map(Sentiment::from).unwrap_or_default()
    }
}

impl From<Sentiment> for String {
    fn from(s: Sentiment) -> Self {
        s.name().to_string()
    }
}

/// One entry of the news wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub source: String,
}

/// Markdown verdict text; empty until an analysis call settles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisReport(String);

impl AnalysisReport {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self(markdown.into())
    }

    pub fn failure() -> Self {
        Self(ANALYSIS_FAILURE_MESSAGE.to_string())
    }

    pub fn markdown(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Request body shared by the news and analysis endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunQuery {
    pub ticker: String,
    pub asset: String,
    pub topics: String,
}
