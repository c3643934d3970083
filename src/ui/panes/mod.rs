//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Source text with highlighting, cursor line and error lines
//! - [`diagnostics`]: Lexical and syntax errors, grammar conflicts, token summary
//! - [`stack`]: Parse stack and remaining input at the current step
//! - [`tree`]: Derivation tree snapshot or simplified AST
//! - [`table`]: LL(1) parse table with the used cells marked
//! - [`status`]: Status bar with keybindings and replay state
//!
//! Each pane module exports a primary `render_*_pane()` function. Scroll
//! offsets are owned by the app and clamped here on every render.

pub mod diagnostics;
pub mod source;
pub mod stack;
pub mod status;
pub mod table;
pub mod tree;

pub use diagnostics::render_diagnostics_pane;
pub use source::{render_source_pane, SourceScrollState};
pub use stack::render_stack_pane;
pub use status::render_status_bar;
pub use table::render_table_pane;
pub use tree::render_tree_pane;

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders},
};

/// Bordered block with the focus-dependent border style
fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Clamp `offset` and return the rows that fit inside `area`'s borders
fn visible_rows<T>(rows: Vec<T>, area: Rect, offset: &mut usize) -> Vec<T> {
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders, min 1

    // Clamp scroll offset only if content exceeds visible area
    if rows.len() > visible_height {
        *offset = (*offset).min(rows.len() - visible_height);
    } else {
        *offset = 0;
    }

    rows.into_iter().skip(*offset).take(visible_height).collect()
}
