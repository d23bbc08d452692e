//! Source pane rendering with syntax highlighting
//!
//! This module renders the source pane, which displays the loaded script
//! with basic syntax highlighting and the execution cursor.
//!
//! # Features
//!
//! - Highlighting for keywords, strings, groups, references, numbers,
//!   comments and meta-tag lines
//! - Cursor line highlighting, red when the script failed on it
//! - Scroll state that keeps the cursor line at a fixed row

use crate::parser::source::is_meta_tag;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYWORDS: &[&str] = &[
    "var", "set", "add", "subtract", "multiply", "divide", "modulo", "join", "log", "function",
    "execute", "end", "if", "else", "|", "jump", "iterate", "with", "class", "object", "from",
    "#", "pause", "awaitkey", "stop", "restart", "export", "import",
];

const LABELS: &[&str] = &["global", "non-destructive"];

fn word_style(word: &str) -> Style {
    if KEYWORDS.contains(&word) {
        Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD)
    } else if LABELS.contains(&word) {
        Style::default().fg(DEFAULT_THEME.type_name)
    } else if crate::parser::literal::is_number_literal(word) || word.starts_with('~') {
        Style::default().fg(DEFAULT_THEME.number)
    } else if word.contains(':') {
        Style::default().fg(DEFAULT_THEME.function)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

fn flush<'a>(spans: &mut Vec<Span<'a>>, line: &'a str, start: Option<usize>, end: usize) {
    if let Some(start) = start {
        let word = &line[start..end];
        spans.push(Span::styled(word, word_style(word)));
    }
}

/// Split a line into styled spans. Delimited regions (`"..."`, `[...]`,
/// `\...\`) run to their closing character or to the end of the line.
fn highlight_source_line(line: &str) -> Line<'_> {
    if is_meta_tag(line.trim()) {
        return Line::from(Span::styled(line, Style::default().fg(DEFAULT_THEME.meta)));
    }

    let mut spans = Vec::new();
    let mut word_start: Option<usize> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let (close, color) = match c {
            '/' if matches!(chars.peek(), Some((_, '/'))) => {
                flush(&mut spans, line, word_start.take(), i);
                spans.push(Span::styled(&line[i..], Style::default().fg(DEFAULT_THEME.comment)));
                return Line::from(spans);
            }
            '"' => ('"', DEFAULT_THEME.string),
            '[' => (']', DEFAULT_THEME.primary),
            '\\' => ('\\', DEFAULT_THEME.reference),
            c if c.is_whitespace() => {
                flush(&mut spans, line, word_start.take(), i);
                spans.push(Span::raw(&line[i..i + c.len_utf8()]));
                continue;
            }
            _ => {
                word_start.get_or_insert(i);
                continue;
            }
        };

        // a `-` or `:` prefix belongs to the reference
        let start = match word_start.take() {
            Some(prefix) if c == '\\' && matches!(&line[prefix..i], "-" | ":") => prefix,
            other => {
                flush(&mut spans, line, other, i);
                i
            }
        };
        let end = chars
            .by_ref()
            .find(|(_, ch)| *ch == close)
            .map_or(line.len(), |(j, ch)| j + ch.len_utf8());
        spans.push(Span::styled(&line[start..end], Style::default().fg(color)));
    }
    flush(&mut spans, line, word_start, line.len());
    Line::from(spans)
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Render the source pane
///
/// `current_line` is 1-based; 0 hides the cursor.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[&str],
    current_line: usize,
    is_error: bool,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Script ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the cursor line at the target visual row
    if current_line > 0 && current_line <= total_lines {
        scroll_state.offset = (current_line - 1).saturating_sub(target_row);
        if total_lines > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_lines - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;

            let (num_style, content_style) = match (is_current, is_error) {
                (true, true) => (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Some(
                        Style::default()
                            .bg(DEFAULT_THEME.error)
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                ),
                (true, false) => (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Some(Style::default().bg(DEFAULT_THEME.current_line_bg)),
                ),
                _ => (Style::default().fg(DEFAULT_THEME.comment), None),
            };

            let mut content = highlight_source_line(line);
            if let Some(style) = content_style {
                for span in &mut content.spans {
                    span.style = if is_error { style } else { span.style.patch(style) };
                }
            }

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}
