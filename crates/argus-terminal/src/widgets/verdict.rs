use dashboard::view::{VERDICT_SIGNATURE, VERDICT_SUBTITLE, VERDICT_TITLE};
use dashboard::Verdict;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::markdown;

const AMBER: Color = Color::Rgb(0xf5, 0x9e, 0x0b);
const AMBER_DIM: Color = Color::Rgb(0xb4, 0x53, 0x09);
const IDLE: Color = Color::Rgb(0x6b, 0x72, 0x80);
const IDLE_BORDER: Color = Color::Rgb(0x1f, 0x29, 0x37);

pub struct VerdictPanel<'a> {
    verdict: &'a Verdict,
    scroll: u16,
}

impl<'a> VerdictPanel<'a> {
    pub fn new(verdict: &'a Verdict) -> Self {
        Self { verdict, scroll: 0 }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }
}

impl Widget for VerdictPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let live = matches!(self.verdict, Verdict::Report(_));
        let (accent, border) = if live {
            (AMBER, AMBER_DIM)
        } else {
            (IDLE, IDLE_BORDER)
        };

        let block = Block::default()
            .title(Line::from(vec![
                Span::styled(
                    format!(" {} ", VERDICT_TITLE.to_uppercase()),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} ", VERDICT_SUBTITLE),
                    Style::default().fg(border).add_modifier(Modifier::ITALIC),
                ),
            ]))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        match self.verdict {
            Verdict::Report(text) => {
                let mut lines = markdown::render(text, inner.width);
                lines.push(Line::default());
                lines.push(
                    Line::from(Span::styled(
                        VERDICT_SIGNATURE,
                        Style::default().fg(AMBER_DIM).add_modifier(Modifier::ITALIC),
                    ))
                    .alignment(Alignment::Right),
                );
                Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((self.scroll, 0))
                    .render(inner, buf);
            }
            Verdict::Placeholder { headline, hint } => {
                let top = inner.height.saturating_sub(2) / 2;
                let mut lines = vec![Line::default(); top as usize];
                lines.push(Line::from(Span::styled(
                    *headline,
                    Style::default().fg(IDLE).add_modifier(Modifier::ITALIC),
                )));
                lines.push(Line::from(Span::styled(
                    hint.to_uppercase(),
                    Style::default().fg(IDLE).add_modifier(Modifier::DIM),
                )));
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);
            }
        }
    }
}
