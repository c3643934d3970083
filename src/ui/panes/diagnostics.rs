//! Diagnostics pane: errors, grammar conflicts and the token summary

use super::{pane_block, visible_rows};
use crate::analysis::{Diagnostic, Stage, TokenSummary};
use crate::parser::table::Conflict;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Padding},
    Frame,
};

fn diagnostic_item(diagnostic: &Diagnostic) -> ListItem<'static> {
    let tag_color = match diagnostic.stage {
        Stage::Lexical => DEFAULT_THEME.secondary,
        Stage::Syntax => DEFAULT_THEME.error,
    };
    ListItem::new(Line::from(vec![
        Span::styled(
            format!("[{}] ", diagnostic.stage.tag()),
            Style::default().fg(tag_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{}: ", diagnostic.location),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(diagnostic.message.clone(), Style::default().fg(DEFAULT_THEME.fg)),
    ]))
}

fn heading(text: &str) -> ListItem<'static> {
    ListItem::new(Span::styled(
        text.to_string(),
        Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Render the diagnostics pane
pub fn render_diagnostics_pane(
    frame: &mut Frame,
    area: Rect,
    diagnostics: &[Diagnostic],
    conflicts: &[Conflict],
    summary: &TokenSummary,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let title = format!(" Diagnostics ({}) ", diagnostics.len());
    let block = pane_block(&title, is_focused).padding(Padding::new(1, 0, 0, 0));

    let mut items = Vec::new();

    if diagnostics.is_empty() {
        items.push(ListItem::new(Span::styled(
            "No errors",
            Style::default().fg(DEFAULT_THEME.success),
        )));
    } else {
        items.extend(diagnostics.iter().map(diagnostic_item));
    }

    if !conflicts.is_empty() {
        items.push(ListItem::new(""));
        items.push(heading("LL(1) conflicts"));
        items.extend(conflicts.iter().map(|conflict| {
            ListItem::new(conflict.to_string()).style(Style::default().fg(DEFAULT_THEME.secondary))
        }));
    }

    items.push(ListItem::new(""));
    items.push(heading("Summary"));
    items.extend(
        summary
            .to_string()
            .lines()
            .map(|line| ListItem::new(line.to_string()).style(Style::default().fg(DEFAULT_THEME.fg))),
    );

    let visible = visible_rows(items, area, scroll_offset);
    frame.render_widget(List::new(visible).block(block), area);
}
