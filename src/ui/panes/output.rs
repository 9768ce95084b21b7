//! Template output pane rendering

use crate::snapshot::Transcript;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

/// Split `text` into display lines, styling everything from byte offset
/// `highlight_from` onward as freshly written.
fn output_lines(text: &str, highlight_from: usize) -> Vec<Line<'static>> {
    let old_style = Style::default().fg(DEFAULT_THEME.fg);
    let new_style = Style::default()
        .fg(DEFAULT_THEME.secondary)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let line_start = offset;
        offset += raw.len() + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);

        let mut split = highlight_from.clamp(line_start, line_start + raw.len()) - line_start;
        if !raw.is_char_boundary(split) {
            split = 0;
        }
        let (old, new) = raw.split_at(split);

        let mut spans = Vec::new();
        if !old.is_empty() {
            spans.push(Span::styled(old.to_string(), old_style));
        }
        if !new.is_empty() {
            spans.push(Span::styled(new.to_string(), new_style));
        }
        lines.push(Line::from(spans));
    }

    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Render the output written up to the current step
pub fn render_output_pane(
    frame: &mut Frame,
    area: Rect,
    transcript: &Transcript,
    output_start: usize,
    output_end: usize,
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
        .title(" Output ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let text = transcript.upto(output_end);

    if text.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let block = block.padding(Padding::new(1, 0, 0, 0));
    let all_items: Vec<ListItem> = output_lines(text, output_start)
        .into_iter()
        .map(ListItem::new)
        .collect();

    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // Clamp scroll offset only if content exceeds visible area
    if total_items > visible_height {
        let max_scroll = total_items - visible_height;
        *scroll_offset = (*scroll_offset).min(max_scroll);
    } else {
        *scroll_offset = 0;
    }

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    let list = List::new(visible_items).block(block);
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(lines: &[Line]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_highlights_latest_write() {
        let lines = output_lines("one\r\ntwo three", 8);
        assert_eq!(
            contents(&lines),
            vec![vec!["one".to_string()], vec!["two".to_string(), " three".to_string()]]
        );
    }

    #[test]
    fn test_trailing_newline_dropped() {
        let lines = output_lines("a\nb\n", 0);
        assert_eq!(lines.len(), 2);
    }
}
