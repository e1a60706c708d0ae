//! Dashboard event loop - terminal input and store notifications in,
//! frames out.
//!
//! # Keys
//!
//! - `↑`/`↓` or `k`/`j`: previous / next market
//! - `e` or `/`: edit focus topics (`Enter`/`Esc` to finish)
//! - `Enter` or `r`: execute analysis (ignored while a run is in flight)
//! - `PgUp`/`PgDn`: scroll the news wire, `o` shows the top headline's link
//! - `K`/`J`: scroll the verdict
//! - `q`/`Esc`: quit

use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dashboard::view::{APP_SUBTITLE, APP_TITLE, TOPICS_LABEL};
use dashboard::{
    ChartLifecycle, DashboardStore, DashboardView, FetchOrchestrator, Transition, Viewport,
};
use futures_util::StreamExt;
use market_core::PriceSeries;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::widgets::{tone_color, CandleEngine, NewsWire, VerdictPanel};

const PANEL_BG: Color = Color::Rgb(0x11, 0x18, 0x27);
const BORDER: Color = Color::Rgb(0x37, 0x41, 0x51);
const FOCUS: Color = Color::Rgb(0x3b, 0x82, 0xf6);
const LABEL: Color = Color::Rgb(0x6b, 0x72, 0x80);
const ACCENT: Color = Color::Rgb(0x60, 0xa5, 0xfa);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    EditingTopics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Screen regions, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Areas {
    header: Rect,
    picker: Rect,
    topics: Rect,
    trigger: Rect,
    verdict: Rect,
    chart: Rect,
    news: Rect,
    footer: Rect,
}

impl Areas {
    fn compute(area: Rect, chart_height: u16) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),                // Header
                Constraint::Length(3),                // Controls
                Constraint::Min(6),                   // Verdict
                Constraint::Length(chart_height + 2), // Chart + news
                Constraint::Length(1),                // Footer
            ])
            .split(area);

        let controls = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Fill(3),
                Constraint::Fill(7),
                Constraint::Fill(2),
            ])
            .split(rows[1]);

        let data = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
            .split(rows[3]);

        Self {
            header: rows[0],
            picker: controls[0],
            topics: controls[1],
            trigger: controls[2],
            verdict: rows[2],
            chart: data[0],
            news: data[1],
            footer: rows[4],
        }
    }

    /// Columns available to the chart widget inside its border.
    fn chart_width(&self) -> u16 {
        self.chart.width.saturating_sub(2)
    }
}

pub struct App {
    store: DashboardStore,
    orchestrator: FetchOrchestrator,
    chart: ChartLifecycle<CandleEngine>,
    chart_height: u16,
    mode: Mode,
    news_offset: usize,
    verdict_scroll: u16,
    footer_note: Option<String>,
}

impl App {
    pub fn new(orchestrator: FetchOrchestrator, chart_height: u16) -> Self {
        Self {
            store: orchestrator.store().clone(),
            orchestrator,
            chart: ChartLifecycle::new(CandleEngine::default(), chart_height),
            chart_height,
            mode: Mode::Normal,
            news_offset: 0,
            verdict_scroll: 0,
            footer_note: None,
        }
    }

    /// Takes over the terminal until the user quits.
    pub async fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal).await;

        restore_terminal();
        terminal.show_cursor()?;
        result
    }

    async fn run_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut events = EventStream::new();
        let mut updates = self.store.subscribe();

        let size = terminal.size()?;
        let areas = Areas::compute(Rect::new(0, 0, size.width, size.height), self.chart_height);
        self.chart.attach(Viewport::new(areas.chart_width()));

        loop {
            let state = updates.borrow_and_update().clone();
            self.sync_chart(&state.prices);
            let view = DashboardView::project(&state);
            terminal.draw(|frame| self.draw(frame, &view))?;

            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                event = events.next() => match event {
                    Some(Ok(event)) => {
                        if self.handle_event(event) == Flow::Quit {
                            break;
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }
        }

        self.chart.detach();
        Ok(())
    }

    fn sync_chart(&mut self, prices: &PriceSeries) {
        let transition = self.chart.sync(prices);
        if transition == Transition::Unchanged {
            return;
        }
        match self.chart.live_widget() {
            Some(widget) => tracing::debug!(
                "Chart {:?}: {} bars in {} candles across {} columns",
                transition,
                widget.bar_count(),
                widget.candle_count(),
                widget.width()
            ),
            None => tracing::debug!("Chart {:?}", transition),
        }
    }

    fn handle_event(&mut self, event: Event) -> Flow {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Resize(width, height) => {
                let areas = Areas::compute(Rect::new(0, 0, width, height), self.chart_height);
                self.chart.handle_viewport_resize(areas.chart_width());
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match self.mode {
            Mode::EditingTopics => {
                self.edit_topics(key.code);
                Flow::Continue
            }
            Mode::Normal => self.normal_key(key.code),
        }
    }

    fn normal_key(&mut self, code: KeyCode) -> Flow {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.store.select_relative(-1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.store.select_relative(1);
            }
            KeyCode::Char('e') | KeyCode::Char('/') => self.mode = Mode::EditingTopics,
            KeyCode::Enter | KeyCode::Char('r') => self.trigger(),
            KeyCode::PageDown => {
                let len = self.store.read(|s| s.news.len());
                if self.news_offset + 1 < len {
                    self.news_offset += 1;
                }
            }
            KeyCode::PageUp => self.news_offset = self.news_offset.saturating_sub(1),
            KeyCode::Char('J') => self.verdict_scroll = self.verdict_scroll.saturating_add(1),
            KeyCode::Char('K') => self.verdict_scroll = self.verdict_scroll.saturating_sub(1),
            KeyCode::Char('o') => self.show_link(),
            _ => {}
        }
        Flow::Continue
    }

    fn edit_topics(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                let mut topics = self.topics();
                topics.pop();
                self.store.set_topics(topics);
            }
            KeyCode::Char(c) => {
                let mut topics = self.topics();
                topics.push(c);
                self.store.set_topics(topics);
            }
            _ => {}
        }
    }

    fn topics(&self) -> String {
        self.store.read(|s| s.selection.current().topics.clone())
    }

    fn trigger(&mut self) {
        if self.store.is_busy() {
            tracing::debug!("Run requested while busy, ignored");
            return;
        }
        let handle = self.orchestrator.run();
        tracing::debug!("{} dispatched", handle.id);
        self.news_offset = 0;
        self.verdict_scroll = 0;
        self.footer_note = None;
    }

    fn show_link(&mut self) {
        let link = self
            .store
            .read(|s| s.news.get(self.news_offset).map(|n| n.link.clone()));
        self.footer_note = match link {
            Some(link) if !link.is_empty() => Some(link),
            Some(_) => Some("No link for this headline".to_string()),
            None => None,
        };
    }

    fn draw(&self, frame: &mut Frame, view: &DashboardView) {
        let areas = Areas::compute(frame.area(), self.chart_height);

        self.draw_header(frame, areas.header, view);
        self.draw_picker(frame, areas.picker, view);
        self.draw_topics(frame, areas.topics, view);
        self.draw_trigger(frame, areas.trigger, view);

        frame.render_widget(
            VerdictPanel::new(&view.verdict).scroll(self.verdict_scroll),
            areas.verdict,
        );

        self.draw_chart(frame, areas.chart, view);

        let offset = self.news_offset.min(view.news.cards().len().saturating_sub(1));
        frame.render_widget(NewsWire::new(&view.news).offset(offset), areas.news);

        self.draw_footer(frame, areas.footer);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let title = Line::from(vec![
            Span::styled(
                format!(" {} ", APP_TITLE),
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                APP_SUBTITLE.to_uppercase(),
                Style::default().fg(LABEL),
            ),
        ]);
        frame.render_widget(Paragraph::new(title), area);

        let badge = Span::styled(
            format!(" {} ", view.status.label),
            Style::default()
                .fg(tone_color(view.status.tone))
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(
            Paragraph::new(Line::from(badge)).alignment(Alignment::Right),
            area,
        );
    }

    fn control_block(title: &str, focused: bool) -> Block<'_> {
        Block::default()
            .title(Span::styled(
                title.to_uppercase(),
                Style::default().fg(LABEL).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { FOCUS } else { BORDER }))
    }

    fn draw_picker(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let label = view
            .picker
            .get(view.selected_index)
            .map(|o| o.label.clone())
            .unwrap_or_default();
        let line = Line::from(vec![
            Span::styled("◀ ", Style::default().fg(LABEL)),
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(" ▶", Style::default().fg(LABEL)),
            Span::styled(
                format!("  {}/{}", view.selected_index + 1, view.picker.len()),
                Style::default().fg(LABEL),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(Self::control_block(&view.picker_header, self.mode == Mode::Normal)),
            area,
        );
    }

    fn draw_topics(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let editing = self.mode == Mode::EditingTopics;
        let mut spans = vec![Span::styled(
            view.topics.clone(),
            Style::default().fg(Color::Rgb(0xd1, 0xd5, 0xdb)),
        )];
        if editing {
            spans.push(Span::styled("▏", Style::default().fg(FOCUS)));
        }

        // keep the cursor end in view
        let inner = area.width.saturating_sub(2) as usize;
        let scroll = view.topics.chars().count().saturating_sub(inner.saturating_sub(1));
        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .scroll((0, scroll as u16))
                .block(Self::control_block(TOPICS_LABEL, editing)),
            area,
        );
    }

    fn draw_trigger(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let style = if view.trigger.enabled {
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(0x25, 0x63, 0xeb))
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Rgb(0x9c, 0xa3, 0xaf))
                .bg(Color::Rgb(0x37, 0x41, 0x51))
        };
        frame.render_widget(
            Paragraph::new(view.trigger.label.to_uppercase())
                .alignment(Alignment::Center)
                .style(style)
                .block(Block::default().borders(Borders::ALL).border_style(style)),
            area,
        );
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect, view: &DashboardView) {
        let mut title = vec![Span::styled(
            format!(" {} ", view.chart.title),
            Style::default().fg(Color::Rgb(0xd1, 0xd5, 0xdb)).add_modifier(Modifier::BOLD),
        )];
        if let Some(close) = view.chart.last_close {
            title.push(Span::styled(format!("{:.2} ", close), Style::default().fg(ACCENT)));
        }
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BORDER))
            .style(Style::default().bg(PANEL_BG));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match (self.chart.live_widget(), view.chart.awaiting) {
            (Some(widget), _) => frame.render_widget(widget, inner),
            (None, awaiting) => {
                let text = awaiting.unwrap_or_default();
                let top = inner.height / 2;
                let mut lines = vec![Line::default(); top as usize];
                lines.push(Line::from(Span::styled(text, Style::default().fg(LABEL))));
                frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
            }
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(Color::Yellow);
        let line = match (&self.footer_note, self.mode) {
            (Some(note), _) => Line::from(vec![
                Span::styled(" Link: ", key),
                Span::styled(note.clone(), Style::default().fg(ACCENT)),
            ]),
            (None, Mode::EditingTopics) => Line::from(vec![
                Span::styled(" Enter/Esc", key),
                Span::raw(" Done  │ "),
                Span::styled("Backspace", key),
                Span::raw(" Delete"),
            ]),
            (None, Mode::Normal) => Line::from(vec![
                Span::styled(" q", key),
                Span::raw(" Quit  │ "),
                Span::styled("↑↓", key),
                Span::raw(" Market  │ "),
                Span::styled("e", key),
                Span::raw(" Topics  │ "),
                Span::styled("Enter", key),
                Span::raw(" Execute  │ "),
                Span::styled("PgUp/PgDn", key),
                Span::raw(" News  │ "),
                Span::styled("o", key),
                Span::raw(" Link  │ "),
                Span::styled("J/K", key),
                Span::raw(" Verdict"),
            ]),
        };
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(Color::DarkGray)), area);
    }
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}
