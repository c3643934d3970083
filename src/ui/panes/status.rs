//! One-line footer: step counter, last action, key hints and run outcome.

use crate::parser::parser::StepAction;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

fn badge(text: impl Into<Cow<'static, str>>, bg: Color) -> Span<'static> {
    Span::styled(
        text,
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

/// The outcome badge only shows at the first and last step.
#[allow(clippy::too_many_arguments)]
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    current_step: usize,
    total_steps: usize,
    action: Option<&StepAction>,
    accepted: bool,
    is_playing: bool,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let is_recovery = matches!(
        action,
        Some(StepAction::Insert { .. } | StepAction::Skip { .. })
    );
    let step_text = if total_steps == 0 {
        " Step 0/0 ".to_string()
    } else {
        format!(" Step {}/{} ", current_step + 1, total_steps)
    };

    let bar_style = Style::default().bg(DEFAULT_THEME.current_line_bg);
    let sep_style = bar_style.fg(DEFAULT_THEME.comment);

    let left_spans = vec![
        badge(
            step_text,
            if is_recovery {
                DEFAULT_THEME.error
            } else {
                DEFAULT_THEME.primary
            },
        ),
        Span::styled(" | ", sep_style),
        Span::styled(
            format!(" {} ", action.map(StepAction::name).unwrap_or("-")),
            bar_style.fg(DEFAULT_THEME.secondary),
        ),
        Span::styled(" | ", sep_style),
        Span::styled(format!(" {} ", message), bar_style.fg(DEFAULT_THEME.fg)),
    ];

    let left_paragraph = Paragraph::new(Line::from(left_spans))
        .style(bar_style)
        .alignment(Alignment::Left);
    frame.render_widget(left_paragraph, layout[0]);

    // Key hints, separated by thin bars
    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = bar_style.fg(DEFAULT_THEME.fg);

    let mut right_spans = Vec::new();
    for (i, (key, desc)) in [
        (" ←/→ ", " step "),
        (" ⎵ ", " play "),
        (" ↵ / ⌫ ", " end/start "),
        (" a ", " ast "),
        (" t ", " table "),
        ("q", " quit "),
    ]
    .into_iter()
    .enumerate()
    {
        if i > 0 {
            right_spans.push(Span::styled("│", sep_style));
            right_spans.push(Span::styled(" ", desc_style));
        }
        right_spans.push(Span::styled(key, key_style));
        right_spans.push(Span::styled(desc, desc_style));
    }

    let at_first = current_step == 0;
    let at_last = current_step + 1 >= total_steps;

    right_spans.push(Span::styled("│", sep_style));
    if is_playing {
        right_spans.push(badge(" ▶ PLAYING ", DEFAULT_THEME.secondary));
    } else if at_last && accepted {
        right_spans.push(badge(" ACCEPTED ", DEFAULT_THEME.success));
    } else if at_last {
        right_spans.push(badge(" REJECTED ", DEFAULT_THEME.error));
    } else if at_first {
        right_spans.push(badge(" START ", DEFAULT_THEME.success));
    } else {
        right_spans.pop();
    }

    let right_paragraph = Paragraph::new(Line::from(right_spans))
        .style(bar_style)
        .alignment(Alignment::Right);
    frame.render_widget(right_paragraph, layout[1]);
}
