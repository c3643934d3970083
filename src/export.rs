//! Labeled-graph form of derivation trees and ASTs
//!
//! External renderers (graph descriptions, CSV dumps, the TUI tree pane)
//! consume trees through [`LabeledTree`] and flatten them into a
//! [`LabeledGraph`]. Nothing here formats a concrete textual representation.

use crate::parser::ast::AstNode;
use crate::parser::parser::{DerivationNode, NodeId};

/// A tree whose nodes carry an id, a display label, and ordered children
pub trait LabeledTree {
    fn id(&self) -> NodeId;

    fn label(&self) -> String;

    fn children(&self) -> Vec<&Self>;
}

impl LabeledTree for DerivationNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> String {
        self.symbol.to_string()
    }

    fn children(&self) -> Vec<&Self> {
        self.children.iter().collect()
    }
}

impl LabeledTree for AstNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> String {
        self.symbol.to_string()
    }

    fn children(&self) -> Vec<&Self> {
        self.children.iter().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    /// Child ids in order
    pub children: Vec<NodeId>,
    /// Distance from the root
    pub depth: usize,
}

/// Flattened tree: nodes in pre-order, root first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledGraph {
    pub root: NodeId,
    pub nodes: Vec<GraphNode>,
}

impl LabeledGraph {
    pub fn from_tree<T: LabeledTree>(tree: &T) -> Self {
        fn visit<T: LabeledTree>(node: &T, depth: usize, nodes: &mut Vec<GraphNode>) {
            let children = node.children();
            nodes.push(GraphNode {
                id: node.id(),
                label: node.label(),
                children: children.iter().map(|child| child.id()).collect(),
                depth,
            });
            for child in children {
                visit(child, depth + 1, nodes);
            }
        }

        let mut nodes = Vec::new();
        visit(tree, 0, &mut nodes);
        LabeledGraph {
            root: tree.id(),
            nodes,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Parent-child pairs in pre-order
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|node| node.children.iter().map(move |&child| (node.id, child)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
