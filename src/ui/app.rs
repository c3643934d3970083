//! Replay state, key handling and layout of the derivation viewer.

use crate::analysis::{Analysis, Analyzer, Diagnostic};
use crate::parser::ast::AstNode;
use crate::parser::grammar::{Symbol, EPSILON};
use crate::parser::parser::DerivationNode;
use crate::parser::table::{Conflict, TableMatrix};
use crate::snapshot::DerivationStep;
use crate::ui::panes::{self, SourceScrollState};
use crate::ui::theme::DEFAULT_THEME;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    Frame, Terminal,
};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::io;
use std::time::{Duration, Instant};

/// Time between automatic steps while replaying.
const PLAY_INTERVAL: Duration = Duration::from_millis(250);

/// Key repeat shorter than this does not toggle playback twice.
const SPACE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Input poll timeout; bounds how late an automatic step can fire.
const POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Pane that receives ↑/↓.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Diagnostics,
    Stack,
    Tree,
}

impl FocusedPane {
    const ORDER: [FocusedPane; 4] = [
        FocusedPane::Source,
        FocusedPane::Diagnostics,
        FocusedPane::Stack,
        FocusedPane::Tree,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|&p| p == self).unwrap_or(0)
    }

    /// Tab order: source, diagnostics, stack, tree, then wrap.
    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// What the lower right pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeView {
    /// Derivation tree of the displayed step
    Derivation,
    Ast,
    /// Parse table with the cells used by the run
    Table,
}

impl TreeView {
    /// Switch to `view`, or back to the derivation tree if already there.
    fn toggle(self, view: TreeView) -> TreeView {
        if self == view {
            TreeView::Derivation
        } else {
            view
        }
    }
}

/// Replay viewer over the steps of one finished analysis.
pub struct App {
    pub analysis: Analysis,
    /// Conflicts of the table the analysis was parsed with.
    pub conflicts: Vec<Conflict>,
    /// Parse table with the cells this analysis used marked.
    pub table: TableMatrix,
    nonterminals: FxHashSet<Symbol>,

    /// Displayed position in `analysis.parse.steps`.
    pub step: usize,
    pub focused_pane: FocusedPane,

    pub source_scroll: SourceScrollState,
    pub diagnostics_scroll: usize,
    pub stack_scroll: usize,
    pub tree_scroll: usize,

    pub tree_view: TreeView,
    pub should_quit: bool,
    pub status_message: String,

    pub is_playing: bool,
    pub last_play_time: Instant,
    pub last_space_press: Instant,
}

impl App {
    pub fn new(analyzer: &Analyzer<'_>, analysis: Analysis) -> Self {
        let status_message = match (analysis.parse.steps.len(), &analysis.parse.history_error) {
            (0, _) => String::from("Nothing to replay"),
            (n, Some(_)) => format!("History budget reached: replay covers the first {} steps", n),
            (n, None) => format!("{} steps recorded", n),
        };
        let table = analyzer.matrix(&analysis);
        let now = Instant::now();

        App {
            analysis,
            conflicts: analyzer.conflicts().to_vec(),
            table,
            nonterminals: analyzer.grammar().nonterminals().collect(),
            step: 0,
            focused_pane: FocusedPane::Source,
            // Target row is chosen on the first render.
            source_scroll: SourceScrollState {
                offset: 0,
                target_line_row: None,
            },
            diagnostics_scroll: 0,
            stack_scroll: 0,
            tree_scroll: 0,
            tree_view: TreeView::Derivation,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: now,
            last_space_press: now.checked_sub(SPACE_DEBOUNCE).unwrap_or(now),
        }
    }

    pub fn total_steps(&self) -> usize {
        self.analysis.parse.steps.len()
    }

    pub fn current_step(&self) -> Option<&DerivationStep> {
        self.analysis.parse.steps.get(self.step)
    }

    /// Draw, tick playback, and dispatch key presses until `q`.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;
            self.tick_playback();

            if !event::poll(POLL_TIMEOUT)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
                _ => {}
            }
        }
        Ok(())
    }

    fn tick_playback(&mut self) {
        if !self.is_playing || self.last_play_time.elapsed() < PLAY_INTERVAL {
            return;
        }
        self.last_play_time = Instant::now();
        if self.advance() {
            self.status_message = format!("Replaying step {}", self.step);
        } else {
            self.is_playing = false;
            self.status_message = String::from("Replay finished");
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let [body, status_area] = split(
            frame.area(),
            Direction::Vertical,
            [Constraint::Min(0), Constraint::Length(1)],
        );
        let [left, right] = split(
            body,
            Direction::Horizontal,
            [Constraint::Percentage(50), Constraint::Percentage(50)],
        );
        let [source_area, diagnostics_area] = split(
            left,
            Direction::Vertical,
            [Constraint::Percentage(65), Constraint::Percentage(35)],
        );
        let [stack_area, tree_area] = split(
            right,
            Direction::Vertical,
            [Constraint::Percentage(35), Constraint::Percentage(65)],
        );

        let diagnostics: Vec<Diagnostic> = self.analysis.diagnostics();
        let error_lines: BTreeSet<usize> = diagnostics.iter().map(|d| d.location.line).collect();
        let cursor = self.analysis.token_at(self.step).map(|t| t.location);
        let focus = self.focused_pane;

        panes::render_source_pane(
            frame,
            source_area,
            &self.analysis.source,
            cursor,
            &error_lines,
            focus == FocusedPane::Source,
            &mut self.source_scroll,
        );

        panes::render_diagnostics_pane(
            frame,
            diagnostics_area,
            &diagnostics,
            &self.conflicts,
            &self.analysis.summary,
            focus == FocusedPane::Diagnostics,
            &mut self.diagnostics_scroll,
        );

        let step = self.analysis.parse.steps.get(self.step);
        panes::render_stack_pane(
            frame,
            stack_area,
            step,
            &self.analysis.parse.input,
            focus == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        let nonterminals = &self.nonterminals;
        match self.tree_view {
            TreeView::Ast => panes::render_tree_pane(
                frame,
                tree_area,
                " AST ",
                self.analysis.ast.as_ref(),
                |node: &AstNode| {
                    let color = if nonterminals.contains(node.symbol) {
                        DEFAULT_THEME.nonterminal
                    } else {
                        DEFAULT_THEME.terminal
                    };
                    Style::default().fg(color)
                },
                focus == FocusedPane::Tree,
                &mut self.tree_scroll,
            ),
            TreeView::Derivation => panes::render_tree_pane(
                frame,
                tree_area,
                " Derivation Tree ",
                step.map(|s| &s.tree),
                |node: &DerivationNode| derivation_style(node, nonterminals),
                focus == FocusedPane::Tree,
                &mut self.tree_scroll,
            ),
            TreeView::Table => panes::render_table_pane(
                frame,
                tree_area,
                &self.table,
                self.analysis.active_cell(self.step),
                focus == FocusedPane::Tree,
                &mut self.tree_scroll,
            ),
        }

        panes::render_status_bar(
            frame,
            status_area,
            &self.status_message,
            self.step,
            self.total_steps(),
            step.map(|s| &s.action),
            self.analysis.parse.accepted(),
            self.is_playing,
        );
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q' | 'Q') => self.should_quit = true,
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let wanted = c.to_digit(10).unwrap_or(1) as usize;
                let moved = (0..wanted).take_while(|_| self.advance()).count();
                self.status_message = format!("Advanced {} of {} step(s)", moved, wanted);
            }
            KeyCode::Char('a' | 'A') => self.switch_view(TreeView::Ast),
            KeyCode::Char('t' | 'T') => self.switch_view(TreeView::Table),
            KeyCode::Char(' ') => self.toggle_playback(),
            KeyCode::Tab => self.focused_pane = self.focused_pane.next(),
            KeyCode::BackTab => self.focused_pane = self.focused_pane.prev(),
            KeyCode::Left => self.jump_back(),
            KeyCode::Right => self.jump_forward(),
            KeyCode::Up => self.scroll_focused(false),
            KeyCode::Down => self.scroll_focused(true),
            KeyCode::Enter => self.jump_to(self.total_steps().saturating_sub(1), "last"),
            KeyCode::Backspace => self.jump_to(0, "first"),
            _ => {}
        }
    }

    fn switch_view(&mut self, view: TreeView) {
        self.tree_view = self.tree_view.toggle(view);
        self.tree_scroll = 0;
        self.status_message = String::from(match self.tree_view {
            TreeView::Derivation => "Tree pane: derivation",
            TreeView::Ast => "Tree pane: AST",
            TreeView::Table => "Tree pane: parse table",
        });
    }

    fn toggle_playback(&mut self) {
        if self.last_space_press.elapsed() < SPACE_DEBOUNCE {
            return;
        }
        let now = Instant::now();
        self.last_space_press = now;
        self.is_playing = !self.is_playing;
        if self.is_playing {
            // First automatic step fires on the next tick.
            self.last_play_time = now.checked_sub(PLAY_INTERVAL).unwrap_or(now);
            self.status_message = String::from("Replaying");
        } else {
            self.status_message = String::from("Replay paused");
        }
    }

    /// `down` moves the view toward later content.
    fn scroll_focused(&mut self, down: bool) {
        let shift = |offset: usize| {
            if down {
                offset.saturating_add(1)
            } else {
                offset.saturating_sub(1)
            }
        };
        match self.focused_pane {
            // The cursor line stays pinned to a row, so scrolling moves that row.
            FocusedPane::Source => {
                if let Some(row) = self.source_scroll.target_line_row {
                    self.source_scroll.target_line_row = Some(if down {
                        row.saturating_sub(1)
                    } else {
                        row.saturating_add(1)
                    });
                }
            }
            FocusedPane::Diagnostics => self.diagnostics_scroll = shift(self.diagnostics_scroll),
            FocusedPane::Stack => self.stack_scroll = shift(self.stack_scroll),
            FocusedPane::Tree => self.tree_scroll = shift(self.tree_scroll),
        }
    }

    /// Move one step forward; false at the last step
    fn advance(&mut self) -> bool {
        if self.step + 1 < self.total_steps() {
            self.step += 1;
            true
        } else {
            false
        }
    }

    fn jump_forward(&mut self) {
        self.is_playing = false;
        self.status_message = if self.advance() {
            format!("Step {}", self.step)
        } else {
            String::from("Already at the last step")
        };
    }

    fn jump_back(&mut self) {
        self.is_playing = false;
        self.status_message = match self.step.checked_sub(1) {
            Some(prev) => {
                self.step = prev;
                format!("Step {}", prev)
            }
            None => String::from("Already at the first step"),
        };
    }

    fn jump_to(&mut self, step: usize, which: &str) {
        self.is_playing = false;
        self.step = step;
        self.status_message = format!("Jumped to the {} step", which);
    }
}

fn split<const N: usize>(
    area: Rect,
    direction: Direction,
    constraints: [Constraint; N],
) -> [Rect; N] {
    Layout::default()
        .direction(direction)
        .constraints(constraints)
        .areas(area)
}

fn derivation_style(node: &DerivationNode, nonterminals: &FxHashSet<Symbol>) -> Style {
    if node.symbol == EPSILON {
        Style::default().fg(DEFAULT_THEME.comment)
    } else if !nonterminals.contains(node.symbol) {
        Style::default().fg(DEFAULT_THEME.terminal)
    } else if node.expanded {
        Style::default().fg(DEFAULT_THEME.nonterminal)
    } else {
        Style::default()
            .fg(DEFAULT_THEME.pending)
            .add_modifier(Modifier::ITALIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalyzerConfig;
    use crossterm::event::KeyModifiers;

    fn app(source: &str) -> App {
        let analyzer = Analyzer::java_subset(AnalyzerConfig::default());
        let analysis = analyzer.analyze(source);
        App::new(&analyzer, analysis)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_step_navigation() {
        let mut app = app("class A { }");
        let last = app.total_steps() - 1;

        press(&mut app, KeyCode::Left);
        assert_eq!(app.step, 0);
        assert_eq!(app.status_message, "Already at the first step");

        press(&mut app, KeyCode::Right);
        assert_eq!(app.step, 1);

        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.step, 4);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.step, last);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.step, last);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.step, 0);
        assert_eq!(app.current_step().map(|s| s.action.name()), Some("start"));
    }

    #[test]
    fn test_number_key_stops_at_end() {
        let mut app = app("class A { }");
        press(&mut app, KeyCode::Char('9'));
        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.step, app.total_steps() - 1);
        assert_eq!(app.status_message, "Advanced 0 of 9 step(s)");
    }

    #[test]
    fn test_focus_and_toggles() {
        let mut app = app("class A { }");

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Diagnostics);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focused_pane, FocusedPane::Source);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.tree_view, TreeView::Ast);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.tree_view, TreeView::Table);
        assert_eq!(app.status_message, "Tree pane: parse table");
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.tree_view, TreeView::Derivation);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_table_view_tracks_expand_steps() {
        let app = app("class A { }");
        assert_eq!(app.table.cell("ClassDecl", "class"), Some("▶ class id { MemberList }"));
        assert_eq!(app.analysis.active_cell(1), Some(("Prog", "class")));
        assert_eq!(app.analysis.active_cell(3), None);
    }

    #[test]
    fn test_truncated_history_status() {
        let analyzer = Analyzer::java_subset(AnalyzerConfig { history_limit: 1024 });
        let analysis = analyzer.analyze("class A { int x; int y; }");
        let app = App::new(&analyzer, analysis);
        assert!(app.analysis.parse.accepted());
        assert!(app
            .status_message
            .starts_with("History budget reached: replay covers the first"));
    }

    #[test]
    fn test_derivation_style() {
        let nonterminals: FxHashSet<Symbol> = ["Prog"].into_iter().collect();
        let pending = DerivationNode {
            id: 0,
            symbol: "Prog",
            children: Vec::new(),
            expanded: false,
        };
        assert_eq!(
            derivation_style(&pending, &nonterminals).fg,
            Some(DEFAULT_THEME.pending)
        );
        let leaf = DerivationNode {
            symbol: "id",
            ..pending.clone()
        };
        assert_eq!(
            derivation_style(&leaf, &nonterminals).fg,
            Some(DEFAULT_THEME.terminal)
        );
    }
}
