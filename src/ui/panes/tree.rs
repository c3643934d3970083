//! Tree pane: derivation tree snapshot or simplified AST
//!
//! Any [`LabeledTree`] renders as an indented outline with box-drawing
//! connectors; the caller decides how each node is styled.

use super::{pane_block, visible_rows};
use crate::export::{LabeledGraph, LabeledTree};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

/// Outline lines for `node` and its descendants
fn tree_lines<T, F>(node: &T, prefix: &str, is_last: Option<bool>, node_style: &F, out: &mut Vec<Line<'static>>)
where
    T: LabeledTree,
    F: Fn(&T) -> Style,
{
    let connector = match is_last {
        None => "",
        Some(true) => "└─ ",
        Some(false) => "├─ ",
    };
    out.push(Line::from(vec![
        Span::styled(
            format!("{}{}", prefix, connector),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(node.label(), node_style(node)),
    ]));

    let child_prefix = match is_last {
        None => String::new(),
        Some(true) => format!("{}   ", prefix),
        Some(false) => format!("{}│  ", prefix),
    };
    let children = node.children();
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        tree_lines(child, &child_prefix, Some(i + 1 == count), node_style, out);
    }
}

/// Render the tree pane
pub fn render_tree_pane<T, F>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    tree: Option<&T>,
    node_style: F,
    is_focused: bool,
    scroll_offset: &mut usize,
) where
    T: LabeledTree,
    F: Fn(&T) -> Style,
{
    let Some(tree) = tree else {
        let paragraph = Paragraph::new("(empty tree)")
            .block(pane_block(title, is_focused))
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    };

    let graph = LabeledGraph::from_tree(tree);
    let title = format!("{}({} nodes) ", title, graph.len());
    let block = pane_block(&title, is_focused);

    let mut lines = Vec::with_capacity(graph.len());
    tree_lines(tree, "", None, &node_style, &mut lines);

    let items: Vec<ListItem> = lines.into_iter().map(ListItem::new).collect();
    let visible = visible_rows(items, area, scroll_offset);
    frame.render_widget(List::new(visible).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::AstNode;

    fn ast(id: usize, symbol: &'static str, children: Vec<AstNode>) -> AstNode {
        AstNode {
            id,
            symbol,
            children,
        }
    }

    #[test]
    fn test_outline() {
        let tree = ast(
            0,
            "Return",
            vec![
                ast(1, "return", Vec::new()),
                ast(2, "ReturnP", vec![ast(3, "id", Vec::new()), ast(4, ";", Vec::new())]),
            ],
        );
        let mut lines = Vec::new();
        tree_lines(&tree, "", None, &|_: &AstNode| Style::default(), &mut lines);

        let text: Vec<String> = lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect();
        assert_eq!(
            text,
            vec![
                "Return",
                "├─ return",
                "└─ ReturnP",
                "   ├─ id",
                "   └─ ;",
            ]
        );
    }
}
