//! Parse stack pane
//!
//! Shows the transition taken at the current step, the symbol stack (top
//! first, as the parser sees it) and the input still to be consumed.

use super::{pane_block, visible_rows};
use crate::parser::lexer::Token;
use crate::parser::parser::StepAction;
use crate::snapshot::DerivationStep;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
    Frame,
};

fn action_style(action: &StepAction) -> Style {
    let color = match action {
        StepAction::Start | StepAction::Expand { .. } => DEFAULT_THEME.nonterminal,
        StepAction::Match { .. } => DEFAULT_THEME.terminal,
        StepAction::Accept => DEFAULT_THEME.success,
        StepAction::Insert { .. } | StepAction::Skip { .. } => DEFAULT_THEME.error,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Render the parse stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    step: Option<&DerivationStep>,
    input: &[Token],
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Parse Stack ", is_focused);

    let Some(step) = step else {
        let paragraph = Paragraph::new("(no steps)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    // Action line plus remaining input
    let remaining: Vec<Span> = input
        .iter()
        .skip(step.position)
        .enumerate()
        .flat_map(|(i, token)| {
            let style = if i == 0 {
                Style::default()
                    .fg(DEFAULT_THEME.cursor)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            [Span::styled(token.lexeme.clone(), style), Span::raw(" ")]
        })
        .collect();

    let mut input_line = vec![Span::styled("input: ", Style::default().fg(DEFAULT_THEME.comment))];
    if remaining.is_empty() {
        input_line.push(Span::styled("(exhausted)", Style::default().fg(DEFAULT_THEME.comment)));
    } else {
        input_line.extend(remaining);
    }

    let header = Paragraph::new(vec![
        Line::from(Span::styled(step.action.to_string(), action_style(&step.action))),
        Line::from(input_line),
    ])
    .wrap(Wrap { trim: false });
    frame.render_widget(header, rows[0]);

    // Stack, top first
    let items: Vec<ListItem> = if step.stack.is_empty() {
        vec![ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment))]
    } else {
        step.stack
            .iter()
            .rev()
            .enumerate()
            .map(|(depth, symbol)| {
                let marker = if depth == 0 { "▶ " } else { "  " };
                ListItem::new(format!("{}{}", marker, symbol)).style(if depth == 0 {
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(DEFAULT_THEME.fg)
                })
            })
            .collect()
    };

    // visible_rows accounts for borders; the list area has none
    let list_area = Rect {
        height: rows[1].height.saturating_add(2),
        ..rows[1]
    };
    let visible = visible_rows(items, list_area, scroll_offset);
    frame.render_widget(List::new(visible), rows[1]);
}
