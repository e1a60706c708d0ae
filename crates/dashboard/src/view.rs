//! Pure projection of [`DashboardState`] into what the screen shows.
//!
//! Nothing here owns state or performs I/O; front ends call
//! [`DashboardView::project`] on every store notification and draw the
//! result.

use market_core::{NewsItem, Sentiment};

use crate::store::DashboardState;

pub const APP_TITLE: &str = "ARGUS";
pub const APP_SUBTITLE: &str = "Institutional Futures Terminal";
pub const TOPICS_LABEL: &str = "Fundamental Focus Topics";
pub const STATUS_READY: &str = "● MARKET READY";
pub const STATUS_BUSY: &str = "● PROCESSING DATA STREAM...";
pub const TRIGGER_IDLE: &str = "Execute Analysis";
pub const TRIGGER_BUSY: &str = "Analyzing...";
pub const VERDICT_TITLE: &str = "Boy Plunger's Verdict";
pub const VERDICT_SUBTITLE: &str = "\"The line of least resistance...\"";
pub const VERDICT_SIGNATURE: &str = "Jesse L. Livermore | Boy Plunger | 1929";
pub const VERDICT_WAITING: &str = "\"Waiting for the tape...\"";
pub const VERDICT_HINT: &str = "Select a market above and click Execute Analysis to begin";
pub const CHART_AWAITING: &str = "Awaiting Market Data...";
pub const NEWS_TITLE: &str = "Live Fundamental Wire";
pub const NEWS_AWAITING: &str = "Awaiting Signal...";
pub const NEWS_UNDATED: &str = "Recent";

/// Colour intent; front ends map it onto their palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    Pending,
}

impl From<Sentiment> for Tone {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Bullish => Tone::Positive,
            Sentiment::Bearish => Tone::Negative,
            Sentiment::Neutral => Tone::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub enabled: bool,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Markdown to render as rich text.
    Report(String),
    Placeholder {
        headline: &'static str,
        hint: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub title: String,
    /// Shown instead of the chart while there is no data.
    pub awaiting: Option<&'static str>,
    pub bars: usize,
    pub last_close: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCard {
    pub badge: &'static str,
    pub tone: Tone,
    pub date: String,
    pub summary: String,
    /// `— {source}`, absent when the collaborator gave no source.
    pub byline: Option<String>,
    pub link: String,
}

impl From<&NewsItem> for NewsCard {
    fn from(item: &NewsItem) -> Self {
        let date = match item.date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => date.to_string(),
            _ => NEWS_UNDATED.to_string(),
        };
        let byline = (!item.source.is_empty()).then(|| format!("— {}", item.source));
        Self {
            badge: item.sentiment.name(),
            tone: item.sentiment.into(),
            date,
            summary: item.summary.clone(),
            byline,
            link: item.link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsPanel {
    Cards(Vec<NewsCard>),
    Awaiting(&'static str),
    /// Empty while a run is in flight: no placeholder either.
    Blank,
}

impl NewsPanel {
    pub fn cards(&self) -> &[NewsCard] {
        match self {
            NewsPanel::Cards(cards) => cards,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub picker_header: String,
    pub picker: Vec<PickerOption>,
    pub selected_index: usize,
    pub topics: String,
    pub trigger: Trigger,
    pub status: StatusBadge,
    pub verdict: Verdict,
    pub chart: ChartPanel,
    pub news: NewsPanel,
}

impl DashboardView {
    pub fn project(state: &DashboardState) -> Self {
        let busy = state.run.busy;
        let selection = state.selection.current();
        let catalog = state.catalog();

        let picker: Vec<PickerOption> = catalog
            .iter()
            .map(|instrument| PickerOption {
                id: instrument.id.clone(),
                label: instrument.label(),
                selected: instrument.id == selection.instrument.id,
            })
            .collect();
        let selected_index = picker.iter().position(|o| o.selected).unwrap_or(0);

        let trigger = Trigger {
            enabled: !busy,
            label: if busy { TRIGGER_BUSY } else { TRIGGER_IDLE },
        };
        let status = if busy {
            StatusBadge {
                label: STATUS_BUSY,
                tone: Tone::Pending,
            }
        } else {
            StatusBadge {
                label: STATUS_READY,
                tone: Tone::Positive,
            }
        };

        let verdict = if state.report.is_empty() {
            Verdict::Placeholder {
                headline: VERDICT_WAITING,
                hint: VERDICT_HINT,
            }
        } else {
            Verdict::Report(state.report.markdown().to_string())
        };

        let chart = ChartPanel {
            title: format!("PRICE ACTION: {}", selection.instrument.id),
            awaiting: state.prices.is_empty().then_some(CHART_AWAITING),
            bars: state.prices.len(),
            last_close: state.prices.last_close(),
        };

        let news = if !state.news.is_empty() {
            NewsPanel::Cards(state.news.iter().map(NewsCard::from).collect())
        } else if busy {
            NewsPanel::Blank
        } else {
            NewsPanel::Awaiting(NEWS_AWAITING)
        };

        Self {
            picker_header: format!("Select Market ({} Choices)", catalog.len()),
            picker,
            selected_index,
            topics: selection.topics.clone(),
            trigger,
            status,
            verdict,
            chart,
            news,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{AnalysisReport, BarTime, Catalog, PriceBar, PriceSeries};
    use std::sync::Arc;

    fn state() -> DashboardState {
        DashboardState::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn test_idle_startup_view() {
        let view = DashboardView::project(&state());

        assert_eq!(view.picker_header, "Select Market (20 Choices)");
        assert_eq!(view.picker.len(), 20);
        assert_eq!(view.selected_index, 0);
        assert_eq!(view.picker[0].label, "Crude Oil (WTI) (CL=F)");
        assert_eq!(view.picker.iter().filter(|o| o.selected).count(), 1);

        assert_eq!(view.trigger, Trigger { enabled: true, label: "Execute Analysis" });
        assert_eq!(view.status.label, "● MARKET READY");
        assert!(matches!(view.verdict, Verdict::Placeholder { headline, .. } if headline == VERDICT_WAITING));
        assert_eq!(view.chart.title, "PRICE ACTION: CL=F");
        assert_eq!(view.chart.awaiting, Some("Awaiting Market Data..."));
        assert_eq!(view.news, NewsPanel::Awaiting("Awaiting Signal..."));
    }

    #[test]
    fn test_busy_view_disables_trigger_and_blanks_news() {
        let mut state = state();
        state.run.busy = true;

        let view = DashboardView::project(&state);
        assert!(!view.trigger.enabled);
        assert_eq!(view.trigger.label, "Analyzing...");
        assert_eq!(view.status, StatusBadge { label: STATUS_BUSY, tone: Tone::Pending });
        assert_eq!(view.news, NewsPanel::Blank);
    }

    #[test]
    fn test_populated_view() {
        let mut state = state();
        state.selection.select_instrument("GC=F");
        state.report = AnalysisReport::new("**Bullish** on gold.");
        state.prices = PriceSeries::new(vec![PriceBar {
            time: BarTime::Unix(1_714_521_600),
            open: 2300.0,
            high: 2310.0,
            low: 2290.0,
            close: 2305.0,
        }]);
        state.news = vec![
            NewsItem {
                link: "https://example.com/a".to_string(),
                sentiment: Sentiment::Bearish,
                date: Some("2 hours ago".to_string()),
                summary: "Dollar firms".to_string(),
                source: "Reuters".to_string(),
            },
            NewsItem {
                summary: "Central banks buy".to_string(),
                ..NewsItem::default()
            },
        ];

        let view = DashboardView::project(&state);
        assert_eq!(view.selected_index, state.catalog().position("GC=F").unwrap());
        assert_eq!(view.topics, "US Dollar, Fed Interest Rates, Inflation, Safe Haven Flows");
        assert_eq!(view.verdict, Verdict::Report("**Bullish** on gold.".to_string()));
        assert_eq!(view.chart.awaiting, None);
        assert_eq!(view.chart.last_close, Some(2305.0));

        let cards = view.news.cards();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].badge, "Bearish");
        assert_eq!(cards[0].tone, Tone::Negative);
        assert_eq!(cards[0].byline.as_deref(), Some("— Reuters"));
        assert_eq!(cards[1].date, "Recent");
        assert_eq!(cards[1].badge, "Neutral");
        assert_eq!(cards[1].byline, None);
    }

    #[test]
    fn test_news_shown_even_while_busy() {
        let mut state = state();
        state.run.busy = true;
        state.news = vec![NewsItem::default()];
        assert_eq!(DashboardView::project(&state).news.cards().len(), 1);
    }
}
