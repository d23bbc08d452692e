//! Main TUI application state and logic

use crate::interpreter::{Interpreter, RunState, Wait};
use crate::scheduler::Scheduler;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::panes::{
    render_console_pane, render_source_pane, render_status_bar, render_symbols_pane,
    ConsoleRenderData, SourceScrollState, StatusRenderData, SymbolsScrollState,
};

/// Longest the event loop blocks waiting for input
const MAX_POLL: Duration = Duration::from_millis(50);

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Console,
    Symbols,
}

impl FocusedPane {
    /// Move focus to the next pane (source -> console -> symbols)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Symbols,
            FocusedPane::Symbols => FocusedPane::Source,
        }
    }
}

/// Name a key press the way scripts compare it in `awaitkey`
pub fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Esc => "escape".to_string(),
        _ => return None,
    };
    Some(name)
}

/// The main application state
pub struct App {
    pub interpreter: Interpreter,
    pub scheduler: Scheduler,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub symbols_scroll: SymbolsScrollState,
    pub console_scroll: usize,

    /// Warnings raised since the last (re)start
    pub warnings: Rc<RefCell<Vec<String>>>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create a new app around a loaded interpreter
    pub fn new(mut interpreter: Interpreter, scheduler: Scheduler) -> Self {
        let warnings = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&warnings);
        interpreter.on_warning(move |warning| sink.borrow_mut().push(warning.to_string()));
        // Reports are read back through `last_report` and drawn in the console
        interpreter.on_error(|_| {});

        App {
            interpreter,
            scheduler,
            focused_pane: FocusedPane::Source,
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None,
            },
            symbols_scroll: SymbolsScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            console_scroll: 0,
            warnings,
            should_quit: false,
            status_message: String::from("Ready!"),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.restart();
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            let now = Instant::now();
            match self.scheduler.poll(&mut self.interpreter, now) {
                Ok(true) => self.console_scroll = usize::MAX,
                Ok(false) => {}
                Err(err) => self.status_message = format!("{}: {}", err.kind(), err.message()),
            }

            let timeout = self.scheduler.remaining(Instant::now()).min(MAX_POLL);
            if event::poll(timeout)? {
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

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Console (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(columns[0]);

        let state = self.interpreter.state().clone();
        let is_idle = matches!(state, RunState::Idle);
        let current_line = if is_idle { 0 } else { self.interpreter.cursor() + 1 };
        let is_error = matches!(state, RunState::Failed);
        // A failed run points at the line that raised the error
        let current_line = match (is_error, self.interpreter.last_report()) {
            (true, Some(report)) => report.line.unwrap_or(current_line),
            _ => current_line,
        };

        let lines: Vec<&str> = self.interpreter.lines().iter().map(String::as_str).collect();
        render_source_pane(
            frame,
            left_rows[0],
            &lines,
            current_line,
            is_error,
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let warnings = self.warnings.borrow();
        render_console_pane(
            frame,
            left_rows[1],
            ConsoleRenderData {
                console: self.interpreter.console(),
                warnings: &warnings,
                report: self.interpreter.last_report(),
            },
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        render_symbols_pane(
            frame,
            columns[1],
            self.interpreter.symbols(),
            self.interpreter.objects(),
            self.focused_pane == FocusedPane::Symbols,
            &mut self.symbols_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                name: self.interpreter.display_name(),
                state: &state,
                line: current_line,
                instructions_per_tick: self.interpreter.instructions_per_tick(),
                message: &self.status_message,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        let interrupt = key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if interrupt {
            self.should_quit = true;
            return;
        }

        if matches!(self.interpreter.state(), RunState::Waiting(Wait::Key(_))) {
            if let Some(name) = key_name(key.code) {
                self.interpreter.deliver_key(&name);
                self.status_message = format!("Sent '{}'", name);
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => self.toggle_pause(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.restart(),
            KeyCode::Char('n') | KeyCode::Char('N') => self.single_tick(),
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Source => {
                    // Scrolling up makes the current line move down visually
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Symbols => {
                    self.symbols_scroll.offset = self.symbols_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Source => {
                    if let Some(row) = self.source_scroll.target_line_row {
                        self.source_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Symbols => {
                    self.symbols_scroll.offset = self.symbols_scroll.offset.saturating_add(1);
                }
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_add(1);
                }
            },
            _ => {}
        }
    }

    fn toggle_pause(&mut self) {
        match self.interpreter.state() {
            RunState::Paused => {
                self.interpreter.resume();
                self.status_message = "Resumed".to_string();
            }
            RunState::Running | RunState::Waiting(_) => {
                self.interpreter.pause();
                self.status_message = "Paused".to_string();
            }
            RunState::Idle | RunState::Finished | RunState::Failed => self.restart(),
        }
    }

    /// Run exactly one tick, staying paused if we were
    fn single_tick(&mut self) {
        let was_paused = *self.interpreter.state() == RunState::Paused;
        self.interpreter.resume();
        let result = self.interpreter.tick();
        if was_paused {
            self.interpreter.pause();
        }
        self.status_message = match result {
            Ok(()) => format!("Ticked to line {}", self.interpreter.cursor() + 1),
            Err(err) => format!("{}: {}", err.kind(), err.message()),
        };
        self.console_scroll = usize::MAX;
    }

    fn restart(&mut self) {
        self.warnings.borrow_mut().clear();
        self.scheduler.reset();
        self.interpreter.stop();
        self.status_message = match self.interpreter.start() {
            Ok(()) => "Running".to_string(),
            Err(err) => format!("{}: {}", err.kind(), err.message()),
        };
        self.console_scroll = 0;
    }
}
