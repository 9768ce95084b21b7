//! Template source pane rendering with tag highlighting
//!
//! This module renders the template currently being explored. Text outside
//! tags is shown plainly; inside `{$ ... $}` keywords, strings, numbers,
//! `@functions` and variable names each get their own color. A tag may span
//! several lines, so the highlighter carries its in-tag state from line to
//! line.
//!
//! The line holding the current step is highlighted and kept at a fixed row
//! while stepping, unless the user scrolls it.

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn flush_plain(spans: &mut Vec<Span<'static>>, text: &mut String, style: Style) {
    if !text.is_empty() {
        spans.push(Span::styled(std::mem::take(text), style));
    }
}

fn word_style(word: &str) -> Style {
    if word.starts_with('@') {
        Style::default().fg(DEFAULT_THEME.function)
    } else if word.eq_ignore_ascii_case("for") || word.eq_ignore_ascii_case("end") {
        Style::default()
            .fg(DEFAULT_THEME.keyword)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.variable)
    }
}

/// Highlight one line. `in_tag` is whether the line starts inside a tag and
/// is updated to whether it ends inside one.
fn highlight_line(line: &str, in_tag: &mut bool) -> Line<'static> {
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut plain = String::new();
    let text_style = Style::default().fg(DEFAULT_THEME.fg);
    let delimiter_style = Style::default()
        .fg(DEFAULT_THEME.primary)
        .add_modifier(Modifier::BOLD);

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if !*in_tag {
            if c == '\\' && next.is_some() {
                plain.push(c);
                plain.extend(next);
                i += 2;
            } else if c == '{' && next == Some('$') {
                flush_plain(&mut spans, &mut plain, text_style);
                spans.push(Span::styled("{$", delimiter_style));
                *in_tag = true;
                i += 2;
            } else {
                plain.push(c);
                i += 1;
            }
            continue;
        }

        if c == '$' && next == Some('}') {
            flush_plain(&mut spans, &mut plain, text_style);
            spans.push(Span::styled("$}", delimiter_style));
            *in_tag = false;
            i += 2;
            continue;
        }

        flush_plain(&mut spans, &mut plain, text_style);
        let start = i;
        let style = if c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                i += if chars[i] == '\\' { 2 } else { 1 };
            }
            i = (i + 1).min(chars.len());
            Style::default().fg(DEFAULT_THEME.string)
        } else if c.is_alphabetic() || c == '@' {
            i += 1;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            word_style(&chars[start..i].iter().collect::<String>())
        } else if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            Style::default().fg(DEFAULT_THEME.number)
        } else if c == '=' {
            i += 1;
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD)
        } else {
            i += 1;
            text_style
        };
        spans.push(Span::styled(
            chars[start..i].iter().collect::<String>(),
            style,
        ));
    }

    flush_plain(&mut spans, &mut plain, text_style);
    Line::from(spans)
}

/// Highlight a whole template, one [`Line`] per source line
pub fn highlight_template(source: &str) -> Vec<Line<'static>> {
    let mut in_tag = false;
    source
        .lines()
        .map(|line| highlight_line(line, &mut in_tag))
        .collect()
}

/// Scroll state for the source pane
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Render the template source pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    highlighted: &[Line<'static>],
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
        .title(" Template ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let total_lines = highlighted.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep current line at target visual row
    if current_line > 0 && current_line <= total_lines {
        let target_line_idx = current_line - 1;
        scroll_state.offset = target_line_idx.saturating_sub(target_row);

        if total_lines > visible_height {
            let max_scroll = total_lines - visible_height;
            scroll_state.offset = scroll_state.offset.min(max_scroll);
        } else {
            scroll_state.offset = 0;
        }
    }

    let visible_lines: Vec<Line> = highlighted
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_current = line_num == current_line;
            let line_num_str = format!("{:4} ", line_num);

            let (num_style, content_style) = if is_current && is_error {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.error)
                        .add_modifier(Modifier::BOLD),
                    Some(
                        Style::default()
                            .bg(DEFAULT_THEME.error)
                            .fg(ratatui::style::Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                )
            } else if is_current {
                (
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                    Some(Style::default().bg(DEFAULT_THEME.current_line_bg)),
                )
            } else {
                (Style::default().fg(DEFAULT_THEME.comment), None)
            };

            let mut spans = vec![Span::styled(line_num_str, num_style)];
            spans.extend(line.spans.iter().cloned().map(|mut span| {
                match content_style {
                    Some(style) if is_error => span.style = style,
                    Some(style) => span.style = span.style.patch(style),
                    None => {}
                }
                span
            }));
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_tag_tokens() {
        let lines = highlight_template("a {$= i \"s\" 2 @sin $}b");
        assert_eq!(
            contents(&lines[0]),
            vec!["a ", "{$", "=", " ", "i", " ", "\"s\"", " ", "2", " ", "@sin", " ", "$}", "b"]
        );
    }

    #[test]
    fn test_tag_spanning_lines() {
        let lines = highlight_template("{$ FOR i\n1 3 $}x");
        assert_eq!(contents(&lines[1]), vec!["1", " ", "3", " ", "$}", "x"]);
        assert_eq!(lines[1].spans[0].style.fg, Some(DEFAULT_THEME.number));
    }

    #[test]
    fn test_escaped_open_stays_text() {
        let lines = highlight_template("\\{$ not a tag");
        assert_eq!(contents(&lines[0]), vec!["\\{$ not a tag"]);
    }
}
