//! Symbols pane rendering
//!
//! Lists everything the script has declared:
//! - the call stack, innermost frame first, with its parameters
//! - local and global variables with their type tags
//! - functions with their parameter lists
//!
//! Variables from an earlier pass that have not been redeclared yet (after a
//! non-destructive restart) are dimmed.

use crate::memory::objects::ObjectStore;
use crate::memory::symbols::{SymbolStore, Variable};
use crate::memory::value::Value;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Scroll state for the symbols pane
pub struct SymbolsScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

fn section(title: &str) -> ListItem<'static> {
    ListItem::new(Line::from(Span::styled(
        format!("▸ {}", title),
        Style::default()
            .fg(DEFAULT_THEME.secondary)
            .add_modifier(Modifier::BOLD),
    )))
}

fn empty() -> ListItem<'static> {
    ListItem::new("  (none)").style(Style::default().fg(DEFAULT_THEME.comment))
}

/// Object values are shown with their properties inline
fn describe(value: &Value, objects: &ObjectStore) -> String {
    let Some(object) = value.as_object().and_then(|id| objects.object(id)) else {
        return value.to_string();
    };
    let mut properties: Vec<String> = object
        .properties()
        .map(|(name, prop)| format!("{}={}", name, prop.value))
        .collect();
    if let Some(class) = object.class.as_deref().and_then(|c| objects.class(c)) {
        properties.extend(
            class
                .properties()
                .filter(|(name, _)| object.own_property(name).is_none())
                .map(|(name, prop)| format!("{}={}", name, prop.value)),
        );
    }
    let class = object.class.as_deref().unwrap_or("object");
    format!("{} {{{}}}", class, properties.join(", "))
}

fn variable_item<'a>(name: &str, var: &Variable, objects: &ObjectStore) -> ListItem<'a> {
    let dim = !var.declared && !var.host_owned;
    let value_style = if dim {
        Style::default().fg(DEFAULT_THEME.comment)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    };
    let (tag, value) = match &var.value {
        Some(value) => (value.kind.to_string(), describe(value, objects)),
        None => ("untyped".to_string(), "-".to_string()),
    };
    ListItem::new(Line::from(vec![
        Span::styled(format!("  {}", name), value_style.add_modifier(Modifier::BOLD)),
        Span::styled(format!(": {}", tag), Style::default().fg(DEFAULT_THEME.type_name)),
        Span::styled(format!(" = {}", value), value_style),
    ]))
}

/// Render the symbols pane
pub fn render_symbols_pane(
    frame: &mut Frame,
    area: Rect,
    symbols: &SymbolStore,
    objects: &ObjectStore,
    is_focused: bool,
    scroll_state: &mut SymbolsScrollState,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Symbols ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut all_items = vec![section("Call stack")];
    let frames = symbols.stack().frames();
    if frames.is_empty() {
        all_items.push(empty());
    }
    for frame_entry in frames.iter().rev() {
        let params: Vec<String> = frame_entry
            .params()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("  {}", frame_entry.function_name),
                Style::default()
                    .fg(DEFAULT_THEME.function)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("({})", params.join(", ")),
                Style::default().fg(DEFAULT_THEME.fg),
            ),
            Span::styled(
                format!("  ← line {}", frame_entry.return_line + 1),
                Style::default().fg(DEFAULT_THEME.comment),
            ),
        ])));
    }
    if let Some(iteration) = symbols.iterator() {
        all_items.push(
            ListItem::new(format!(
                "  iterating {} ({}/{})",
                iteration.function_name,
                iteration.index + 1,
                iteration.source.len()
            ))
            .style(Style::default().fg(DEFAULT_THEME.secondary)),
        );
    }

    all_items.push(section("Locals"));
    let before = all_items.len();
    all_items.extend(symbols.locals().map(|(name, var)| variable_item(name, var, objects)));
    if all_items.len() == before {
        all_items.push(empty());
    }

    all_items.push(section("Globals"));
    let before = all_items.len();
    all_items.extend(symbols.globals().map(|(name, var)| variable_item(name, var, objects)));
    if all_items.len() == before {
        all_items.push(empty());
    }

    all_items.push(section("Functions"));
    let before = all_items.len();
    all_items.extend(symbols.functions().map(|(name, function)| {
        let params: Vec<String> = function.params.iter().map(ToString::to_string).collect();
        let style = if function.declared {
            Style::default().fg(DEFAULT_THEME.function)
        } else {
            Style::default().fg(DEFAULT_THEME.comment)
        };
        let lines = match function.end_line {
            Some(end) => format!("  lines {}-{}", function.start_line + 1, end + 1),
            None => "  (declaring)".to_string(),
        };
        ListItem::new(Line::from(vec![
            Span::styled(format!("  {}({})", name, params.join(", ")), style),
            Span::styled(lines, Style::default().fg(DEFAULT_THEME.comment)),
        ]))
    }));
    if all_items.len() == before {
        all_items.push(empty());
    }

    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    // Follow growth while the view is scrolled to the bottom
    let max_scroll = total_items.saturating_sub(visible_height);
    if total_items > scroll_state.prev_item_count && scroll_state.offset + 1 >= max_scroll {
        scroll_state.offset = max_scroll;
    }
    scroll_state.offset = scroll_state.offset.min(max_scroll);
    scroll_state.prev_item_count = total_items;

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
