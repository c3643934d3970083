//! Source pane rendering with syntax highlighting
//!
//! Displays the analysed program with line numbers. The line holding the
//! token under the parser's input cursor is highlighted and kept at a fixed
//! visual row while stepping; lines with diagnostics get a red line number.
//!
//! Highlighting uses a small character scanner rather than the real lexer so
//! that malformed input still renders; block comments are tracked across
//! lines.

use super::pane_block;
use crate::parser::lexer::{SourceLocation, KEYWORDS};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::collections::BTreeSet;

/// Highlight one line; `in_comment` carries an open `/*` across lines.
fn highlight_source_line(line: &str, in_comment: &mut bool) -> Line<'static> {
    let comment_style = Style::default().fg(DEFAULT_THEME.comment);
    let chars: Vec<char> = line.chars().collect();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if *in_comment {
            let start = i;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            if i < chars.len() {
                i += 2;
                *in_comment = false;
            }
            spans.push(Span::styled(chars[start..i].iter().collect::<String>(), comment_style));
            continue;
        }

        let c = chars[i];

        if c == '/' && chars.get(i + 1) == Some(&'/') {
            spans.push(Span::styled(chars[i..].iter().collect::<String>(), comment_style));
            break;
        }
        if c == '/' && chars.get(i + 1) == Some(&'*') {
            *in_comment = true;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let style = if KEYWORDS.iter().any(|&k| k == word) {
                Style::default()
                    .fg(DEFAULT_THEME.keyword)
                    .add_modifier(Modifier::BOLD)
            } else if chars.get(i) == Some(&'(') {
                Style::default().fg(DEFAULT_THEME.nonterminal)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            spans.push(Span::styled(word, style));
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            spans.push(Span::styled(
                chars[start..i].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.number),
            ));
            continue;
        }

        let style = match c {
            '{' | '}' | '(' | ')' => Style::default().fg(DEFAULT_THEME.primary),
            ';' | ',' | '+' | '-' | '*' | '/' | '=' | '<' | '>' => {
                Style::default().fg(DEFAULT_THEME.fg)
            }
            c if c.is_whitespace() => Style::default(),
            // Anything else is an illegal character for the lexer
            _ => Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::UNDERLINED),
        };
        spans.push(Span::styled(c.to_string(), style));
        i += 1;
    }

    Line::from(spans)
}

/// Scroll offset plus the visual row the cursor line is pinned to.
pub struct SourceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source: &str,
    cursor: Option<SourceLocation>,
    error_lines: &BTreeSet<usize>,
    is_focused: bool,
    scroll_state: &mut SourceScrollState,
) {
    let title = match cursor {
        Some(location) => format!(" Source ({}) ", location),
        None => " Source ".to_string(),
    };
    let block = pane_block(&title, is_focused);

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();
    let current_line = cursor.map(|c| c.line).unwrap_or(0);

    let rows = area.height.saturating_sub(2).max(1) as usize;

    // Pinned row defaults to the middle of the pane
    let target_row = scroll_state
        .target_line_row
        .unwrap_or(rows / 2)
        .min(rows.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    if (1..=total_lines).contains(&current_line) {
        let max_offset = total_lines.saturating_sub(rows);
        scroll_state.offset = (current_line - 1).saturating_sub(target_row).min(max_offset);
    }

    // Highlight from the top so block comment state is correct
    let mut in_comment = false;
    let highlighted: Vec<Line> = lines
        .iter()
        .map(|line| highlight_source_line(line, &mut in_comment))
        .collect();

    let visible_lines: Vec<Line> = highlighted
        .into_iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(rows)
        .map(|(idx, mut content)| {
            let number = idx + 1;
            let is_current = number == current_line;

            let marker = if is_current { "▶" } else { " " };
            let num_style = if error_lines.contains(&number) {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            if is_current {
                let bg = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content.spans {
                    span.style = span.style.patch(bg);
                }
            }

            let mut spans = vec![Span::styled(format!("{}{:4} ", marker, number), num_style)];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
