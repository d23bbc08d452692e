//! Status bar rendering with keybindings and state indicators

use crate::interpreter::{RunState, Wait};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Data needed to render the status bar
pub struct StatusRenderData<'a> {
    pub name: &'a str,
    pub state: &'a RunState,
    /// 1-based, 0 when nothing has run
    pub line: usize,
    pub instructions_per_tick: usize,
    pub message: &'a str,
}

fn state_color(state: &RunState) -> Color {
    match state {
        RunState::Failed => DEFAULT_THEME.error,
        RunState::Running => DEFAULT_THEME.success,
        RunState::Waiting(_) | RunState::Paused => DEFAULT_THEME.secondary,
        RunState::Finished => DEFAULT_THEME.primary,
        RunState::Idle => DEFAULT_THEME.comment,
    }
}

/// Render the status bar at the bottom.
pub fn render_status_bar(frame: &mut Frame, area: Rect, data: StatusRenderData) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let is_failed = matches!(data.state, RunState::Failed);
    let line_text = if data.line == 0 {
        "-".to_string()
    } else {
        data.line.to_string()
    };

    let left_spans = vec![
        Span::styled(
            format!(" {} ", data.state.to_string().to_uppercase()),
            Style::default()
                .bg(state_color(data.state))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} | line {} | {}/tick ", data.name, line_text, data.instructions_per_tick),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", data.message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if is_failed {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left);

    frame.render_widget(left_paragraph, layout[0]);

    // Right side: Keybinds with visual grouping
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let binds: &[(&str, &str)] = match data.state {
        RunState::Waiting(Wait::Key(_)) => &[("any key", "deliver"), ("esc", "quit")],
        _ => &[
            (" ⎵ ", "pause/resume"),
            (" n ", "tick"),
            (" r ", "restart"),
            ("tab", "focus"),
            (" q ", "quit"),
        ],
    };

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in binds.iter().enumerate() {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(*key, key_style));
        right_spans.push(Span::styled(format!(" {} ", desc), desc_style));
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right);

    frame.render_widget(right_paragraph, layout[1]);
}
