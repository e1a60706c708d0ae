//! Markdown to styled terminal lines for the verdict panel.
//!
//! `pulldown-cmark` parses the report and the event stream is folded into
//! ratatui lines: headings upper-cased, list markers kept, block quotes with
//! a gutter bar, code in grey. Blocks are separated by one blank line.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const HEADING: Color = Color::Rgb(0xf5, 0x9e, 0x0b);
const BODY: Color = Color::Rgb(0xfe, 0xf3, 0xc7);
const STRONG: Color = Color::Rgb(0xfb, 0xbf, 0x24);
const MARKER: Color = Color::Rgb(0xb4, 0x53, 0x09);
const RULE: Color = Color::Rgb(0x78, 0x35, 0x0f);
const CODE: Color = Color::Rgb(0x9c, 0xa3, 0xaf);

pub fn render(markdown: &str, width: u16) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(width);
    for event in Parser::new_ext(markdown, Options::empty()) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Heading,
    Quote,
    /// `next` is the number of the next ordered item, `None` for bullets.
    List { next: Option<u64> },
    Item,
    Code,
    Other,
}

struct Renderer {
    width: u16,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    blocks: Vec<Block>,
}

impl Renderer {
    fn new(width: u16) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![Style::default().fg(BODY)],
            blocks: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn inside(&self, block: Block) -> bool {
        self.blocks.contains(&block)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(TagEnd::Emphasis | TagEnd::Strong) => {
                self.styles.pop();
            }
            Event::End(TagEnd::Link | TagEnd::Image) => {}
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push(code.to_string(), Style::default().fg(CODE)),
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak => {
                let style = self.style();
                self.push(" ".to_string(), style);
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(self.width.max(1) as usize),
                    Style::default().fg(RULE),
                )));
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Emphasis => {
                let style = self.style().add_modifier(Modifier::ITALIC);
                self.styles.push(style);
            }
            Tag::Strong => {
                let style = self.style().fg(STRONG).add_modifier(Modifier::BOLD);
                self.styles.push(style);
            }
            Tag::Link { .. } | Tag::Image { .. } => {}
            Tag::Heading { level, .. } => {
                self.flush();
                let mut style = Style::default().fg(HEADING).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                self.styles.push(style);
                self.blocks.push(Block::Heading);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                let style = self.style().add_modifier(Modifier::ITALIC | Modifier::DIM);
                self.styles.push(style);
                self.blocks.push(Block::Quote);
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.styles.push(Style::default().fg(CODE));
                self.blocks.push(Block::Code);
            }
            Tag::List(first) => {
                self.flush();
                self.blocks.push(Block::List { next: first });
            }
            Tag::Item => {
                self.flush();
                let depth = self
                    .blocks
                    .iter()
                    .filter(|b| matches!(b, Block::List { .. }))
                    .count();
                let list = self.blocks.iter_mut().rev().find_map(|b| match b {
                    Block::List { next } => Some(next),
                    _ => None,
                });
                let marker = match list {
                    Some(Some(n)) => {
                        let marker = format!("{}.", n);
                        *n += 1;
                        marker
                    }
                    _ => "•".to_string(),
                };
                let pad = "  ".repeat(depth.saturating_sub(1));
                self.push(format!("{}{} ", pad, marker), Style::default().fg(MARKER));
                self.blocks.push(Block::Item);
            }
            _ => self.blocks.push(Block::Other),
        }
    }

    fn end(&mut self) {
        let Some(block) = self.blocks.pop() else {
            return;
        };
        if matches!(block, Block::Heading | Block::Quote | Block::Code) {
            self.styles.pop();
        }
        self.flush();
        let nested = self.inside(Block::Item);
        if block != Block::Item && !nested {
            self.blank();
        }
    }

    fn text(&mut self, text: &str) {
        let text = if self.inside(Block::Heading) {
            text.to_uppercase()
        } else {
            text.to_string()
        };
        let style = self.style();
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            self.push(part.to_string(), style);
            if parts.peek().is_some() {
                if self.current.is_empty() && self.inside(Block::Code) {
                    self.lines.push(Line::default());
                }
                self.flush();
            }
        }
    }

    /// Appends to the line being built, merging with the previous span when
    /// the style matches.
    fn push(&mut self, content: String, style: Style) {
        if content.is_empty() {
            return;
        }
        match self.current.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(&content),
            _ => self.current.push(Span::styled(content, style)),
        }
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if self.inside(Block::Quote) {
            spans.push(Span::styled("│ ", Style::default().fg(MARKER)));
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_run_is_styled() {
        let lines = render("**Bullish** on gold.", 40);
        assert_eq!(lines.len(), 1);
        let spans = &lines[0].spans;
        assert_eq!(spans[0].content, "Bullish");
        assert!(spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[1].content, " on gold.");
        assert!(!spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_failure_message_renders() {
        let lines = render(market_core::ANALYSIS_FAILURE_MESSAGE, 40);
        assert_eq!(text(&lines[0]), "Error: Failed to contact Argus Agent.");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_headings_lists_and_rules() {
        let md = "## Verdict\n\n- Trend is up\n  - *pullbacks* bought\n\n1. Wait for volume\n\n---\n\n> Cut losses";
        let lines = render(md, 10);
        let texts: Vec<String> = lines.iter().map(text).collect();

        assert_eq!(
            texts,
            vec![
                "VERDICT".to_string(),
                String::new(),
                "• Trend is up".to_string(),
                "  • pullbacks bought".to_string(),
                String::new(),
                "1. Wait for volume".to_string(),
                String::new(),
                "─".repeat(10),
                String::new(),
                "│ Cut losses".to_string(),
            ]
        );
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(lines[3].spans[1].style.add_modifier.contains(Modifier::ITALIC));
        assert!(lines[9].spans[1].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_ordered_list_keeps_start_number() {
        let lines = render("3. Trim\n4. Exit", 40);
        assert_eq!(text(&lines[0]), "3. Trim");
        assert_eq!(text(&lines[1]), "4. Exit");
    }

    #[test]
    fn test_unclosed_markers_stay_literal() {
        let lines = render("5 * 3 = 15 and **open", 40);
        assert_eq!(lines.len(), 1);
        assert_eq!(text(&lines[0]), "5 * 3 = 15 and **open");
    }

    #[test]
    fn test_code_and_snake_case() {
        let lines = render("Watch `GC=F` vs some_ticker_name", 40);
        assert_eq!(text(&lines[0]), "Watch GC=F vs some_ticker_name");
        assert_eq!(lines[0].spans[1].style.fg, Some(CODE));
    }

    #[test]
    fn test_code_block_lines() {
        let lines = render("```\nstop = 78.5\n\ntarget = 85\n```", 40);
        let texts: Vec<String> = lines.iter().map(text).collect();
        assert_eq!(texts, vec!["stop = 78.5", "", "target = 85"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(CODE));
    }

    #[test]
    fn test_hash_without_space_is_text() {
        let lines = render("#1 pick", 40);
        assert_eq!(text(&lines[0]), "#1 pick");
    }
}
