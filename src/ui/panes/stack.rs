//! Operand stack and loop variable pane rendering
//!
//! The upper section lists the operand stack an echo tag left behind before
//! it was flushed, top of stack first. The lower section lists the innermost
//! binding of every loop variable in scope.

use crate::memory::value::Value;
use crate::snapshot::Snapshot;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

fn section_header(title: &str) -> ListItem<'static> {
    ListItem::new(Line::from(vec![
        Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
        Span::styled(
            title.to_string(),
            Style::default()
                .fg(DEFAULT_THEME.primary)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
}

fn value_span(value: &Value) -> Span<'static> {
    match value {
        Value::Str(s) => Span::styled(format!("{:?}", s), Style::default().fg(DEFAULT_THEME.string)),
        other => Span::styled(other.to_string(), Style::default().fg(DEFAULT_THEME.number)),
    }
}

fn type_span(value: &Value) -> Span<'static> {
    Span::styled(
        format!("  {}", value.type_name()),
        Style::default().fg(DEFAULT_THEME.type_name),
    )
}

fn empty_item() -> ListItem<'static> {
    ListItem::new("  (empty)").style(Style::default().fg(DEFAULT_THEME.comment))
}

/// Render the stack and variables pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    snapshot: Option<&Snapshot>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Stack & Variables ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let mut all_items = vec![section_header("Operand stack")];
    let operand_stack = snapshot.map(|s| s.operand_stack.as_slice()).unwrap_or(&[]);
    if operand_stack.is_empty() {
        all_items.push(empty_item());
    }
    for (depth, value) in operand_stack.iter().rev().enumerate() {
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(format!("  [{}] ", depth), Style::default().fg(DEFAULT_THEME.comment)),
            value_span(value),
            type_span(value),
        ])));
    }

    all_items.push(ListItem::new(""));
    all_items.push(section_header("Loop variables"));
    let variables = snapshot.map(|s| s.variables.as_slice()).unwrap_or(&[]);
    if variables.is_empty() {
        all_items.push(empty_item());
    }
    for (name, value) in variables {
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(format!("  {}", name), Style::default().fg(DEFAULT_THEME.variable)),
            Span::styled(" = ", Style::default().fg(DEFAULT_THEME.comment)),
            value_span(value),
            type_span(value),
        ])));
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let max_scroll = all_items.len().saturating_sub(visible_height);
    *scroll_offset = (*scroll_offset).min(max_scroll);

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
