//! Parse table pane
//!
//! The LL(1) table is far wider than a pane, so it is listed row by row:
//! each nonterminal followed by its filled cells. Cells the run used carry
//! the `▶` mark from [`TableMatrix::mark_used`]; the cell applied by the
//! current expand step is highlighted.

use super::{pane_block, visible_rows};
use crate::parser::table::TableMatrix;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

fn table_lines(matrix: &TableMatrix, active: Option<(&str, &str)>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for (index, row) in matrix.rows.iter().enumerate() {
        let nonterminal = row[0].as_str();
        lines.push(Line::from(Span::styled(
            nonterminal.to_string(),
            Style::default()
                .fg(DEFAULT_THEME.nonterminal)
                .add_modifier(Modifier::BOLD),
        )));

        for (terminal, cell) in matrix.filled(index) {
            let mut style = if cell.starts_with('▶') {
                Style::default().fg(DEFAULT_THEME.success)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            if active == Some((nonterminal, terminal)) {
                style = style
                    .bg(DEFAULT_THEME.current_line_bg)
                    .add_modifier(Modifier::BOLD);
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<8} ", terminal),
                    Style::default().fg(DEFAULT_THEME.terminal),
                ),
                Span::styled(cell.to_string(), style),
            ]));
        }
    }

    lines
}

/// Render the parse table pane; `active` is the `(nonterminal, terminal)`
/// cell applied at the displayed step.
pub fn render_table_pane(
    frame: &mut Frame,
    area: Rect,
    matrix: &TableMatrix,
    active: Option<(&str, &str)>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let used = matrix
        .rows
        .iter()
        .flatten()
        .filter(|cell| cell.starts_with('▶'))
        .count();
    let title = format!(" LL(1) Table ({} cells used) ", used);
    let block = pane_block(&title, is_focused);

    let items: Vec<ListItem> = table_lines(matrix, active)
        .into_iter()
        .map(ListItem::new)
        .collect();
    let visible = visible_rows(items, area, scroll_offset);
    frame.render_widget(List::new(visible).block(block), area);
}
