//! Main TUI application state and logic

use crate::snapshot::{Snapshot, SnapshotManager, StepKind};
use crate::ui::panes::{self, SourceScrollState, StatusRenderData};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    text::Line,
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Output,
    Stack,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> output -> stack)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Stack,
            FocusedPane::Output => FocusedPane::Source,
            FocusedPane::Stack => FocusedPane::Output,
        }
    }
}

/// The main application state
pub struct App {
    /// Recorded execution trace
    pub history: SnapshotManager,

    /// Highlighted template lines, computed once
    pub highlighted_source: Vec<Line<'static>>,

    /// Error that stopped execution, shown at the last step
    pub error: Option<String>,

    /// Index of the snapshot being shown
    pub position: usize,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: SourceScrollState,
    pub output_scroll: usize,
    pub stack_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app replaying `history` over the template `source`
    pub fn new(history: SnapshotManager, source: &str, error: Option<String>) -> Self {
        let status_message = match &error {
            Some(message) => message.clone(),
            None => format!(
                "Ready! {} steps recorded ({} of {} KiB)",
                history.len(),
                history.memory_usage() / 1024,
                history.memory_limit() / 1024
            ),
        };
        App {
            history,
            highlighted_source: panes::highlight_template(source),
            error,
            position: 0,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None, // Centered on first render
            },
            output_scroll: usize::MAX,
            stack_scroll: 0,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or_else(Instant::now),
        }
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.history.get(self.position)
    }

    fn at_end(&self) -> bool {
        self.position + 1 >= self.history.len()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode
            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(500) {
                if self.step_forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 3 panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Template (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[0]);

        let snapshot = self.history.get(self.position);
        let current_line = snapshot.map_or(0, |s| s.location.line);
        let (output_start, output_end) = snapshot.map_or((0, 0), |s| (s.output_start, s.output_end));
        let is_error = self.error.is_some() && self.position + 1 >= self.history.len();

        panes::render_source_pane(
            frame,
            left_rows[0],
            &self.highlighted_source,
            current_line,
            is_error,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_output_pane(
            frame,
            left_rows[1],
            self.history.transcript(),
            output_start,
            output_end,
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        panes::render_stack_pane(
            frame,
            columns[1],
            snapshot,
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        let step_description = snapshot.map_or_else(|| StepKind::Start.describe(), |s| {
            format!("{} at {}", s.kind.describe(), s.location)
        });
        panes::render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.position,
                total_steps: self.history.len(),
                step_description: &step_description,
                has_error: self.error.is_some(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let stepped = (0..n).take_while(|_| self.step_forward()).count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = if self.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Cannot step backward: already at start".to_string()
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = if self.step_forward() {
                    "Stepped forward".to_string()
                } else if let Some(error) = &self.error {
                    error.clone()
                } else {
                    "Cannot step forward: execution finished".to_string()
                };
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_sub(1);
                }
                FocusedPane::Stack => {
                    self.stack_scroll = self.stack_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling down makes the current line move up visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Output => {
                    self.output_scroll = self.output_scroll.saturating_add(1);
                }
                FocusedPane::Stack => {
                    self.stack_scroll = self.stack_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or_else(Instant::now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.position = self.history.len().saturating_sub(1);
                self.output_scroll = usize::MAX;
                self.status_message = match &self.error {
                    Some(error) => error.clone(),
                    None => "Jumped to end".to_string(),
                };
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.position = 0;
                self.output_scroll = usize::MAX;
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    /// Step forward in the trace. Returns false at the last snapshot.
    pub fn step_forward(&mut self) -> bool {
        if self.at_end() {
            return false;
        }
        self.position += 1;
        // Auto-scroll output to bottom
        self.output_scroll = usize::MAX;
        true
    }

    /// Step backward in the trace. Returns false at the first snapshot.
    pub fn step_backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        self.output_scroll = usize::MAX;
        true
    }
}
