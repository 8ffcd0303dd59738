//! Interactive terminal UI for viewing assessment history.
//!
//! Provides a scrollable list of past assessments with keyboard
//! navigation and a detail overlay for the selected entry.

use crate::assessment::score::{humanize, LABEL_ACCENT, LABEL_LEXICAL, LABEL_TOTAL};
use crate::history::AssessmentEntry;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const TIMESTAMP_FG: Color = Color::Rgb(100, 100, 100);
const SCORE_FG: Color = Color::Rgb(185, 207, 212);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);
const HELP_FG: Color = Color::Rgb(100, 100, 100);

/// Interactive history viewer for assessment entries.
pub struct HistoryViewer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    entries: Vec<AssessmentEntry>,
    list_state: ListState,
    detail_open: bool,
}

impl HistoryViewer {
    /// Creates a new history viewer with the given entries.
    pub fn new(entries: Vec<AssessmentEntry>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let mut list_state = ListState::default();
        if !entries.is_empty() {
            list_state.select(Some(0));
        }

        Ok(Self {
            terminal,
            entries,
            list_state,
            detail_open: false,
        })
    }

    /// Runs the interactive history viewer loop.
    pub fn run(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            self.cleanup()?;
            println!("Brak ocen w historii. Uruchom 'wymowa' i oceń pierwsze nagranie.");
            return Ok(());
        }

        tracing::debug!("History viewer started with {} entries", self.entries.len());

        loop {
            self.draw()?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => {
                        self.handle_mouse(mouse);
                    }
                    _ => {}
                }
            }
        }

        self.cleanup()?;
        Ok(())
    }

    /// Handles keyboard input. Returns true when the viewer should exit.
    fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> bool {
        if self.detail_open {
            // Any key closes the detail overlay; q/Esc also exits the viewer
            self.detail_open = false;
            return matches!(key.code, KeyCode::Char('q') | KeyCode::Esc);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                tracing::debug!("History viewer exited via Escape/q");
                true
            }
            KeyCode::Up => {
                self.list_state.select_previous();
                false
            }
            KeyCode::Down => {
                self.list_state.select_next();
                false
            }
            KeyCode::Enter => {
                if self.list_state.selected().is_some() {
                    self.detail_open = true;
                }
                false
            }
            _ => false,
        }
    }

    /// Handles mouse events.
    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.detail_open {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.list_state.select_previous();
            }
            MouseEventKind::ScrollDown => {
                self.list_state.select_next();
            }
            _ => {}
        }
    }

    /// Summary line of displayed scores for a history entry.
    fn score_line(entry: &AssessmentEntry) -> String {
        format!(
            "{} {}% · {} {}% · {} {}%",
            LABEL_LEXICAL,
            entry.lexical_pct.round() as i64,
            LABEL_ACCENT,
            humanize(entry.accent_pct),
            LABEL_TOTAL,
            humanize(entry.total_pct)
        )
    }

    /// Renders the current state of the history viewer.
    fn draw(&mut self) -> Result<()> {
        let detail = if self.detail_open {
            self.list_state.selected().map(|i| self.entries[i].clone())
        } else {
            None
        };

        self.terminal.draw(|frame| {
            let area = frame.area();

            let padding_block = Block::default()
                .padding(Padding::uniform(1))
                .style(Style::default().bg(BG));
            frame.render_widget(&padding_block, area);
            let padded_area = padding_block.inner(area);

            let [list_area, footer_area] =
                Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(padded_area);

            // Build list items: timestamp, target sentence, displayed scores
            let items: Vec<ListItem> = self
                .entries
                .iter()
                .map(|entry| {
                    let timestamp = Line::styled(
                        entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                        Style::default().fg(TIMESTAMP_FG),
                    );
                    let target = Line::styled(entry.target_text.clone(), Style::default().fg(FG));
                    let scores =
                        Line::styled(Self::score_line(entry), Style::default().fg(SCORE_FG));
                    ListItem::new(vec![timestamp, target, scores])
                })
                .collect();

            let list = List::new(items)
                .block(
                    Block::default()
                        .title(" Historia ocen ")
                        .borders(Borders::ALL)
                        .padding(Padding::bottom(1)),
                )
                .style(Style::default().fg(FG).bg(BG))
                .highlight_style(Style::default().bg(HIGHLIGHT_BG))
                .highlight_symbol("> ")
                .highlight_spacing(HighlightSpacing::Always);

            frame.render_stateful_widget(list, list_area, &mut self.list_state);

            let help_text = "↑↓ wybór, ↵ szczegóły, esc/q wyjście";
            let help_paragraph = Paragraph::new(help_text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(HELP_FG).bg(BG));
            frame.render_widget(help_paragraph, footer_area);

            if let Some(entry) = &detail {
                Self::render_detail(frame, area, entry);
            }
        })?;

        Ok(())
    }

    /// Renders a centered overlay with the full details of one entry.
    fn render_detail(frame: &mut Frame, screen_area: Rect, entry: &AssessmentEntry) {
        let modal_width = (screen_area.width * 3 / 4).max(30).min(screen_area.width);
        let modal_height = 12.min(screen_area.height);

        let modal_x = screen_area.x + (screen_area.width.saturating_sub(modal_width)) / 2;
        let modal_y = screen_area.y + (screen_area.height.saturating_sub(modal_height)) / 2;

        let modal_area = Rect {
            x: modal_x,
            y: modal_y,
            width: modal_width,
            height: modal_height,
        };

        let modal_block = Block::default()
            .title(" Wyniki analizy ")
            .borders(Borders::ALL)
            .padding(Padding::uniform(1))
            .style(Style::default().bg(BG).fg(FG));

        frame.render_widget(Clear, modal_area);

        let inner_area = modal_block.inner(modal_area);
        frame.render_widget(&modal_block, modal_area);

        let lines = vec![
            Line::from(vec![
                Span::styled("Zdanie docelowe: ", Style::default().fg(TIMESTAMP_FG)),
                Span::raw(entry.target_text.clone()),
            ]),
            Line::from(vec![
                Span::styled("Rozpoznany tekst: ", Style::default().fg(TIMESTAMP_FG)),
                Span::raw(entry.recognized_text.clone()),
            ]),
            Line::raw(""),
            Line::styled(Self::score_line(entry), Style::default().fg(SCORE_FG)),
            Line::raw(""),
            Line::from(vec![
                Span::styled("Feedback: ", Style::default().fg(TIMESTAMP_FG)),
                Span::raw(entry.feedback.clone()),
            ]),
        ];

        let detail_text = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(detail_text, inner_area);
    }

    /// Cleans up terminal and restores normal mode.
    fn cleanup(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        tracing::debug!("History viewer terminal cleanup complete");
        Ok(())
    }
}

impl Drop for HistoryViewer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
