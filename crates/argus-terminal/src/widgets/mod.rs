//! Terminal widgets for the dashboard panels.
//!
//! - `CandleChart`: price action, created and disposed by the chart lifecycle
//! - `NewsWire`: sentiment-tagged headlines
//! - `VerdictPanel`: the rendered analysis report

mod candles;
mod news;
mod verdict;

pub use candles::CandleEngine;
pub use news::NewsWire;
pub use verdict::VerdictPanel;

use dashboard::Tone;
use ratatui::style::Color;

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Rgb(0x4a, 0xde, 0x80),
        Tone::Negative => Color::Rgb(0xf8, 0x71, 0x71),
        Tone::Neutral => Color::Rgb(0x9c, 0xa3, 0xaf),
        Tone::Pending => Color::Rgb(0xea, 0xb3, 0x08),
    }
}
