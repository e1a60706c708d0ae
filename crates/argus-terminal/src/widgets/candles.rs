//! OHLC candlestick chart drawn straight into a ratatui buffer.
//!
//! [`CandleEngine`] is the terminal implementation of the dashboard's chart
//! engine seam; every widget it creates is a [`CandleChart`]. Layout:
//!
//! ```text
//! ┌──────────── plot ─────────────┐│ price axis
//! │   │ ┃                         ││  2330.00
//! │   ┃ ┃ │                       ││
//! └───────────────────────────────┘│
//!  2024-05-01            2024-06-28
//! ```

use dashboard::{ChartEngine, ChartOptions, ChartTheme, Rgb};
use market_core::{BarTime, PriceBar};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Columns reserved on the right for price labels.
const AXIS_WIDTH: u16 = 10;
/// Rows between horizontal grid lines.
const GRID_SPACING: u16 = 4;

const WICK: char = '│';
const BODY: char = '┃';
const GRID: char = '┈';

pub fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// A candle as drawn: one source bar, or several merged when the loaded
/// history is wider than the plot.
#[derive(Debug, Clone, PartialEq)]
struct Candle {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Candle {
    fn merge(bars: &[PriceBar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;
        Some(Self {
            open: first.open,
            close: last.close,
            high: bars.iter().map(|b| b.high).fold(f64::MIN, f64::max),
            low: bars.iter().map(|b| b.low).fold(f64::MAX, f64::min),
        })
    }

    fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

#[derive(Debug)]
pub struct CandleChart {
    width: u16,
    height: u16,
    theme: ChartTheme,
    bars: Vec<PriceBar>,
    candles: Vec<Candle>,
    /// Columns per candle, gap included.
    stride: u16,
    fitted: bool,
}

impl CandleChart {
    fn new(options: &ChartOptions) -> Self {
        Self {
            width: options.width,
            height: options.height,
            theme: options.theme.clone(),
            bars: Vec::new(),
            candles: Vec::new(),
            stride: 1,
            fitted: false,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn candle_count(&self) -> usize {
        self.candles.len()
    }

    fn plot_width(&self) -> u16 {
        self.width.saturating_sub(AXIS_WIDTH).max(1)
    }

    /// One candle per bar, most recent bars kept if they overflow.
    fn lay_out_unfitted(&mut self) {
        let columns = self.plot_width() as usize;
        let skip = self.bars.len().saturating_sub(columns);
        self.candles = self.bars[skip..]
            .iter()
            .filter_map(|b| Candle::merge(std::slice::from_ref(b)))
            .collect();
        self.stride = 1;
    }

    /// Buckets the full history into the available columns.
    fn fit(&mut self) {
        let columns = self.plot_width() as usize;
        let n = self.bars.len();
        if n == 0 {
            self.candles.clear();
            self.stride = 1;
            return;
        }

        if n * 2 <= columns {
            self.candles = self
                .bars
                .iter()
                .filter_map(|b| Candle::merge(std::slice::from_ref(b)))
                .collect();
            self.stride = 2;
        } else {
            let bucket = n.div_ceil(columns);
            self.candles = self.bars.chunks(bucket).filter_map(Candle::merge).collect();
            self.stride = 1;
        }
    }

    fn price_range(&self) -> Option<(f64, f64)> {
        let low = self.candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let high = self.candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        if self.candles.is_empty() || !low.is_finite() || !high.is_finite() {
            return None;
        }
        if (high - low).abs() < f64::EPSILON {
            return Some((low - 1.0, high + 1.0));
        }
        Some((low, high))
    }

    fn time_labels(&self) -> Option<(String, String)> {
        let first = self.bars.first()?;
        let last = self.bars.last()?;
        Some((label(&first.time), label(&last.time)))
    }
}

fn label(time: &BarTime) -> String {
    match time.to_datetime() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => time.to_string(),
    }
}

impl Widget for &CandleChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let background = color(self.theme.background);
        buf.set_style(area, Style::default().bg(background));

        let width = area.width.min(self.width);
        let height = area.height.min(self.height);
        if width <= AXIS_WIDTH || height < 3 {
            return;
        }
        let Some((low, high)) = self.price_range() else {
            return;
        };

        let plot_w = width - AXIS_WIDTH;
        // bottom row holds the time labels
        let plot_h = height - 1;
        let axis_x = area.x + plot_w;
        let to_row = |price: f64| -> u16 {
            let ratio = ((high - price) / (high - low)).clamp(0.0, 1.0);
            area.y + (ratio * f64::from(plot_h - 1)).round() as u16
        };

        let grid = Style::default().fg(color(self.theme.grid));
        let text = Style::default().fg(color(self.theme.text));
        let border = Style::default().fg(color(self.theme.border));

        // grid lines and price labels
        for offset in (0..plot_h).step_by(GRID_SPACING as usize) {
            let y = area.y + offset;
            for x in area.x..axis_x {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(GRID).set_style(grid);
                }
            }
            let price = high - (high - low) * f64::from(offset) / f64::from((plot_h - 1).max(1));
            buf.set_string(axis_x + 1, y, format!("{:>9.2}", price), text);
        }
        for y in area.y..area.y + plot_h {
            if let Some(cell) = buf.cell_mut((axis_x, y)) {
                cell.set_char('│').set_style(border);
            }
        }

        // candles, right-aligned so the latest bar sits next to the axis
        let used = (self.candles.len() as u16).saturating_mul(self.stride);
        let visible = self.candles.len().min((plot_w / self.stride.max(1)) as usize);
        let start_x = axis_x.saturating_sub(used.min(plot_w));
        let skip = self.candles.len() - visible;
        for (i, candle) in self.candles.iter().skip(skip).enumerate() {
            let x = start_x + i as u16 * self.stride;
            if x >= axis_x {
                break;
            }
            let style = Style::default().fg(color(if candle.is_up() {
                self.theme.up
            } else {
                self.theme.down
            }));

            let (wick_top, wick_bottom) = (to_row(candle.high), to_row(candle.low));
            let (body_top, body_bottom) = (
                to_row(candle.open.max(candle.close)),
                to_row(candle.open.min(candle.close)),
            );
            for y in wick_top..=wick_bottom {
                let glyph = if (body_top..=body_bottom).contains(&y) {
                    BODY
                } else {
                    WICK
                };
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_char(glyph).set_style(style);
                }
            }
        }

        // time axis
        if let Some((first, last)) = self.time_labels() {
            let y = area.y + plot_h;
            buf.set_string(area.x, y, &first, text);
            let last_x = axis_x.saturating_sub(last.chars().count() as u16);
            if last_x > area.x + first.chars().count() as u16 {
                buf.set_string(last_x, y, &last, text);
            }
        }
    }
}

/// Creates and drives [`CandleChart`] widgets. Keeps counts of what it has
/// created and disposed so leaks show up in the log.
#[derive(Debug, Default)]
pub struct CandleEngine {
    created: u64,
    disposed: u64,
}

impl CandleEngine {
    pub fn live(&self) -> u64 {
        self.created - self.disposed
    }
}

impl ChartEngine for CandleEngine {
    type Widget = CandleChart;

    fn create(&mut self, options: &ChartOptions) -> CandleChart {
        self.created += 1;
        CandleChart::new(options)
    }

    fn set_data(&mut self, widget: &mut CandleChart, bars: &[PriceBar]) {
        widget.bars = bars.to_vec();
        widget.fitted = false;
        widget.lay_out_unfitted();
    }

    fn fit_content(&mut self, widget: &mut CandleChart) {
        widget.fit();
        widget.fitted = true;
    }

    fn resize(&mut self, widget: &mut CandleChart, width: u16) {
        widget.width = width;
        if widget.fitted {
            widget.fit();
        } else {
            widget.lay_out_unfitted();
        }
    }

    fn dispose(&mut self, widget: CandleChart) {
        self.disposed += 1;
        tracing::debug!(
            "Disposed candle chart ({} bars), {} live",
            widget.bars.len(),
            self.live()
        );
    }
}
