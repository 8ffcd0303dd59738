//! Terminal user interface for the pronunciation practice form.
//!
//! Renders the target sentence and file inputs, the recording level meter,
//! validation/transport errors, and the score panel for the last result.
//! All disable logic comes from the session flags; the loop in
//! `commands::practice` owns the state and dispatches actions.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Sparkline, Wrap},
};
use std::error::Error;
use std::io::{stdout, Stdout};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::assessment::score::{
    bar_ratio, LABEL_ACCENT, LABEL_LEXICAL, LABEL_TOTAL,
};
use crate::assessment::{ScoreDisplay, SessionState};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(229, 231, 235);
const DIM_FG: Color = Color::Rgb(156, 163, 175);
const BAR_FG: Color = Color::Rgb(37, 99, 235);
const ERROR_FG: Color = Color::Rgb(252, 165, 165);
const RECORD_FG: Color = Color::Red;
const METER_FG: Color = Color::Rgb(206, 224, 220);

/// User input command during practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormCommand {
    /// Keep looping (typing, focus change, or no input)
    Continue,
    /// Start or stop recording (Ctrl+R)
    ToggleRecording,
    /// Submit for scoring (Enter)
    Submit,
    /// Reset the form (Ctrl+L)
    Reset,
    /// Exit the form (Escape / Ctrl+C)
    Quit,
}

/// Which text field currently receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Sentence,
    File,
}

/// Terminal UI for the practice form.
pub struct PracticeTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    sentence_input: Input,
    file_input: Input,
    focus: FormField,
    volume_history: Vec<u64>,
    last_sample_time: std::time::Instant,
    sample_interval: std::time::Duration,
    sample_rate: u32,
    meter_width: usize,
}

impl PracticeTui {
    /// Creates a new TUI instance and enters alternate screen mode.
    ///
    /// # Errors
    /// - If terminal cannot be initialized
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new(initial_sentence: &str, sample_rate: u32) -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let size = terminal.size()?;
        let meter_width = size.width.saturating_sub(2) as usize;

        Ok(PracticeTui {
            terminal,
            sentence_input: Input::from(initial_sentence.to_string()),
            file_input: Input::default(),
            focus: FormField::Sentence,
            volume_history: vec![0u64; meter_width],
            last_sample_time: std::time::Instant::now(),
            sample_interval: std::time::Duration::from_millis(50),
            sample_rate,
            meter_width,
        })
    }

    /// Current contents of the sentence field.
    pub fn sentence(&self) -> &str {
        self.sentence_input.value()
    }

    /// Current contents of the file path field.
    pub fn file_path(&self) -> &str {
        self.file_input.value()
    }

    /// Replaces the sentence field contents (reset, pre-selection).
    pub fn set_sentence(&mut self, sentence: &str) {
        self.sentence_input = Input::from(sentence.to_string());
    }

    /// Replaces the file field contents.
    pub fn set_file_path(&mut self, path: &str) {
        self.file_input = Input::from(path.to_string());
    }

    /// Clears the file field (reset).
    pub fn clear_file(&mut self) {
        self.file_input.reset();
    }

    /// Updates the actual sample rate once the device reports it.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
    }

    /// Processes user input and returns the appropriate form command.
    ///
    /// Control keys map to actions; everything else is routed to the
    /// focused text field. Tab switches focus between the two fields.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self) -> Result<FormCommand, Box<dyn Error>> {
        if event::poll(std::time::Duration::from_millis(50))? {
            let ev = event::read()?;
            if let Event::Key(key) = ev {
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                return Ok(match key.code {
                    KeyCode::Esc => {
                        tracing::debug!("Escape pressed: leaving practice form");
                        FormCommand::Quit
                    }
                    KeyCode::Char('c') if ctrl => {
                        tracing::debug!("Ctrl+C pressed: leaving practice form");
                        FormCommand::Quit
                    }
                    KeyCode::Char('r') if ctrl => FormCommand::ToggleRecording,
                    KeyCode::Char('l') if ctrl => FormCommand::Reset,
                    KeyCode::Enter => FormCommand::Submit,
                    KeyCode::Tab | KeyCode::BackTab => {
                        self.focus = match self.focus {
                            FormField::Sentence => FormField::File,
                            FormField::File => FormField::Sentence,
                        };
                        FormCommand::Continue
                    }
                    _ => {
                        match self.focus {
                            FormField::Sentence => {
                                self.sentence_input.handle_event(&ev);
                            }
                            FormField::File => {
                                self.file_input.handle_event(&ev);
                            }
                        }
                        FormCommand::Continue
                    }
                });
            }
        }
        Ok(FormCommand::Continue)
    }

    /// Feeds the live level meter from the recorder's sample buffer.
    ///
    /// Converts RMS of the most recent samples to dBFS and normalizes to a
    /// 0-100 scale, sampled at a fixed interval so meter speed does not
    /// depend on frame rate.
    pub fn push_level(&mut self, samples: &[i16]) {
        if self.last_sample_time.elapsed() < self.sample_interval {
            return;
        }
        self.last_sample_time = std::time::Instant::now();

        let level = self.calculate_volume(samples);
        self.volume_history.push(level as u64);
        while self.volume_history.len() > self.meter_width {
            self.volume_history.remove(0);
        }
    }

    /// Clears the level meter when no recording is live.
    pub fn clear_levels(&mut self) {
        self.volume_history.iter_mut().for_each(|v| *v = 0);
    }

    fn calculate_volume(&self, samples: &[i16]) -> u8 {
        if samples.is_empty() {
            return 0;
        }

        let last_samples_count =
            std::cmp::min(self.sample_rate / 20, samples.len() as u32) as usize;
        let recent_samples = &samples[samples.len() - last_samples_count..];

        let sum_of_squares: i64 = recent_samples.iter().map(|&x| (x as i64).pow(2)).sum();
        let mean_square = sum_of_squares / recent_samples.len() as i64;
        let rms = (mean_square as f32).sqrt();

        let db_fs = if rms > 0.0 {
            20.0 * (rms / 32767.0).log10()
        } else {
            -160.0
        };

        // Normalize with -20 dBFS as the 100% reference level
        let min_db = -60.0_f32;
        ((db_fs - min_db) / 40.0 * 100.0).clamp(4.0, 100.0) as u8
    }

    /// Renders one frame of the practice form.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, state: &SessionState) -> Result<(), Box<dyn Error>> {
        let focus = self.focus;
        let sentence_value = self.sentence_input.value().to_string();
        let sentence_cursor = self.sentence_input.visual_cursor();
        let file_value = self.file_input.value().to_string();
        let file_cursor = self.file_input.visual_cursor();
        let volume_history = self.volume_history.clone();

        self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(
                Block::default().style(Style::default().bg(BG).fg(FG)),
                area,
            );

            let [header_area, sentence_area, file_area, meter_area, status_area, error_area, result_area, footer_area] =
                Layout::vertical([
                    Constraint::Length(2),
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Min(0),
                    Constraint::Length(1),
                ])
                .areas(area);

            // Header
            let header = Paragraph::new(vec![
                Line::styled(
                    "Ocena wymowy po angielsku 🎙",
                    Style::default().fg(FG).add_modifier(Modifier::BOLD),
                ),
                Line::styled(
                    "Wpisz zdanie → nagraj głos lub wrzuć plik → zobacz ocenę słów i akcentu.",
                    Style::default().fg(DIM_FG),
                ),
            ]);
            frame.render_widget(header, header_area);

            // Text fields
            Self::render_field(
                frame,
                sentence_area,
                "Zdanie po angielsku",
                &sentence_value,
                sentence_cursor,
                focus == FormField::Sentence,
            );
            Self::render_field(
                frame,
                file_area,
                "Lub wybierz plik audio (ścieżka)",
                &file_value,
                file_cursor,
                focus == FormField::File,
            );

            // Level meter
            let meter = Sparkline::default()
                .data(&volume_history)
                .max(100)
                .style(Style::default().bg(BG).fg(METER_FG));
            let meter_block = Block::default()
                .title(" Mikrofon ")
                .borders(Borders::ALL)
                .style(Style::default().fg(if state.is_recording { RECORD_FG } else { DIM_FG }));
            let meter_inner = meter_block.inner(meter_area);
            frame.render_widget(meter_block, meter_area);
            frame.render_widget(meter, meter_inner);

            // Status line: indicator plus info text
            let mut status_spans: Vec<Span> = Vec::new();
            if state.is_recording {
                status_spans.push(Span::styled("● ", Style::default().fg(RECORD_FG)));
            } else if state.is_submitting {
                status_spans.push(Span::styled("⟳ ", Style::default().fg(BAR_FG)));
                status_spans.push(Span::styled("Analizuję... ", Style::default().fg(DIM_FG)));
            }
            if let Some(info) = &state.info {
                status_spans.push(Span::styled(info.clone(), Style::default().fg(DIM_FG)));
            }
            frame.render_widget(Paragraph::new(Line::from(status_spans)), status_area);

            // Error line
            if let Some(error) = &state.error {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        error.clone(),
                        Style::default().fg(ERROR_FG).add_modifier(Modifier::BOLD),
                    )),
                    error_area,
                );
            }

            // Result panel
            if let Some(result) = &state.result {
                let display = ScoreDisplay::from_response(result);

                let [meta_area, bars_area, feedback_area] = Layout::vertical([
                    Constraint::Length(4),
                    Constraint::Length(3),
                    Constraint::Min(0),
                ])
                .areas(result_area);

                let meta = Paragraph::new(vec![
                    Line::from(vec![
                        Span::styled("Zdanie docelowe: ", Style::default().fg(DIM_FG)),
                        Span::raw(result.target_text.clone()),
                    ]),
                    Line::from(vec![
                        Span::styled("Rozpoznany tekst: ", Style::default().fg(DIM_FG)),
                        Span::raw(result.recognized_text.clone()),
                    ]),
                    Line::from(vec![
                        Span::styled("Język rozpoznany: ", Style::default().fg(DIM_FG)),
                        Span::raw(result.detected_language_or_unknown().to_string()),
                    ]),
                    Line::from(Span::styled(
                        format!(
                            "{}: {}% | {}: {}% | {}: {}%",
                            LABEL_LEXICAL,
                            display.lexical,
                            LABEL_ACCENT,
                            display.accent,
                            LABEL_TOTAL,
                            display.total
                        ),
                        Style::default().fg(FG).add_modifier(Modifier::BOLD),
                    )),
                ])
                .wrap(Wrap { trim: true });
                frame.render_widget(meta, meta_area);

                let [lexical_area, accent_area, total_area] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(bars_area);

                Self::render_bar(frame, lexical_area, LABEL_LEXICAL, display.lexical);
                Self::render_bar(frame, accent_area, LABEL_ACCENT, display.accent);
                Self::render_bar(frame, total_area, LABEL_TOTAL, display.total);

                let feedback = Paragraph::new(vec![
                    Line::raw(""),
                    Line::from(vec![
                        Span::styled("Feedback: ", Style::default().fg(DIM_FG)),
                        Span::raw(result.feedback.clone()),
                    ]),
                ])
                .wrap(Wrap { trim: true });
                frame.render_widget(feedback, feedback_area);
            }

            // Footer
            let help_text =
                "^R nagrywanie · ↵ oceń wymowę · tab pole · ^L wyczyść wszystko · esc wyjście";
            frame.render_widget(
                Paragraph::new(help_text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(DIM_FG)),
                footer_area,
            );

            // Cursor in the focused field
            let (field_area, cursor) = match focus {
                FormField::Sentence => (sentence_area, sentence_cursor),
                FormField::File => (file_area, file_cursor),
            };
            let inner_width = field_area.width.saturating_sub(2) as usize;
            let cursor_x = field_area.x + 1 + cursor.min(inner_width.saturating_sub(1)) as u16;
            frame.set_cursor_position(Position::new(cursor_x, field_area.y + 1));
        })?;

        Ok(())
    }

    /// Renders one bordered single-line text field.
    fn render_field(
        frame: &mut Frame,
        area: Rect,
        title: &str,
        value: &str,
        cursor: usize,
        focused: bool,
    ) {
        let border_style = if focused {
            Style::default().fg(FG)
        } else {
            Style::default().fg(DIM_FG)
        };
        let block = Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // Keep the cursor in view when the value overflows the field
        let inner_width = inner.width as usize;
        let scroll = cursor.saturating_sub(inner_width.saturating_sub(1));
        let visible: String = value.chars().skip(scroll).collect();

        frame.render_widget(
            Paragraph::new(visible).style(Style::default().fg(FG)),
            inner,
        );
    }

    /// Renders one labeled score bar, width clamped to [0, 100].
    fn render_bar(frame: &mut Frame, area: Rect, label: &str, displayed: i64) {
        let gauge = Gauge::default()
            .ratio(bar_ratio(displayed))
            .label(format!("{label} {displayed}%"))
            .gauge_style(Style::default().fg(BAR_FG).bg(Color::Rgb(17, 24, 39)));
        frame.render_widget(gauge, area);
    }

    /// Cleans up terminal state and exits alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> Result<(), Box<dyn Error>> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            crossterm::terminal::LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
