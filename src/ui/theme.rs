//! Viewer palette.

use ratatui::style::Color;

/// Colors shared by every pane.
pub struct Theme {
    pub fg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub comment: Color,
    pub success: Color,
    pub error: Color,
    pub keyword: Color,
    pub number: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    /// Nonterminal that has already been expanded.
    pub nonterminal: Color,
    /// Nonterminal still waiting on the stack.
    pub pending: Color,
    pub terminal: Color,
    /// Token under the input cursor.
    pub cursor: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),
    secondary: Color::Rgb(250, 179, 135),
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    keyword: Color::Rgb(203, 166, 247),
    number: Color::Rgb(250, 179, 135),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(88, 91, 112),
    current_line_bg: Color::Rgb(49, 50, 68),
    nonterminal: Color::Rgb(249, 226, 175),
    pending: Color::Rgb(180, 165, 120),
    terminal: Color::Rgb(148, 226, 213),
    cursor: Color::Rgb(245, 194, 231),
};
