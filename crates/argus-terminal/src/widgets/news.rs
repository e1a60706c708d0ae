//! News wire widget - headline cards in collaborator order.

use dashboard::view::NEWS_TITLE;
use dashboard::NewsPanel;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget,
        Widget, Wrap,
    },
};

use super::tone_color;

const BORDER: Color = Color::Rgb(0x1f, 0x29, 0x37);
const SUMMARY: Color = Color::Rgb(0xd1, 0xd5, 0xdb);
const MUTED: Color = Color::Rgb(0x6b, 0x72, 0x80);
const LINK: Color = Color::Rgb(0x60, 0xa5, 0xfa);

pub struct NewsWire<'a> {
    panel: &'a NewsPanel,
    /// Index of the card shown first.
    offset: usize,
}

impl<'a> NewsWire<'a> {
    pub fn new(panel: &'a NewsPanel) -> Self {
        Self { panel, offset: 0 }
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn card_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for (i, card) in self.panel.cards().iter().enumerate().skip(self.offset) {
            let marker = if i == self.offset { "▶ " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(LINK)),
                Span::styled(
                    format!(" {} ", card.badge.to_uppercase()),
                    Style::default()
                        .fg(tone_color(card.tone))
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                ),
                Span::raw(" "),
                Span::styled(card.date.clone(), Style::default().fg(MUTED)),
            ]));
            lines.push(Line::from(Span::styled(
                card.summary.clone(),
                Style::default().fg(SUMMARY),
            )));
            if let Some(byline) = &card.byline {
                lines.push(
                    Line::from(Span::styled(
                        byline.clone(),
                        Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
                    ))
                    .alignment(Alignment::Right),
                );
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for NewsWire<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(
                format!(" ● {} ", NEWS_TITLE.to_uppercase()),
                Style::default()
                    .fg(Color::Rgb(0xd1, 0xd5, 0xdb))
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER));
        let inner = block.inner(area);
        block.render(area, buf);

        match self.panel {
            NewsPanel::Cards(cards) => {
                Paragraph::new(self.card_lines())
                    .wrap(Wrap { trim: true })
                    .render(inner, buf);

                let mut state = ScrollbarState::new(cards.len()).position(self.offset);
                Scrollbar::new(ScrollbarOrientation::VerticalRight).render(
                    area.inner(Margin {
                        vertical: 1,
                        horizontal: 0,
                    }),
                    buf,
                    &mut state,
                );
            }
            NewsPanel::Awaiting(text) => {
                let top = inner.height / 2;
                let mut lines = vec![Line::default(); top as usize];
                lines.push(Line::from(Span::styled(
                    text.to_uppercase(),
                    Style::default().fg(MUTED).add_modifier(Modifier::BOLD),
                )));
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(inner, buf);
            }
            NewsPanel::Blank => {}
        }
    }
}
