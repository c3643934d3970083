//! Derivation tree to AST simplification
//!
//! The derivation tree mirrors the grammar exactly, so a single identifier in
//! an expression sits at the bottom of a chain like
//! `Expr → Rel → Add → Term → Factor → id`. Simplification drops epsilon
//! leaves, prunes nodes left without children, and replaces every
//! single-child scaffolding node with that child. Nodes for the terminals in
//! [`TERMINALS_OF_INTEREST`] are always kept.

use super::grammar::{Symbol, EPSILON};
use super::parser::{DerivationNode, NodeId};

/// Terminals that survive simplification even without children
pub const TERMINALS_OF_INTEREST: [Symbol; 20] = [
    "id", "number", "+", "-", "*", "/", "==", "<", ">", "=", "return", "class", "int", "void",
    "(", ")", "{", "}", ",", ";",
];

/// Node of the simplified tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    /// Id of the derivation node this node came from
    pub id: NodeId,
    pub symbol: Symbol,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(AstNode::size).sum::<usize>()
    }

    /// Symbols in pre-order
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut out = vec![self.symbol];
        for child in &self.children {
            out.extend(child.symbols());
        }
        out
    }
}

/// Simplify a derivation tree. `None` when nothing meaningful survives.
pub fn simplify(node: &DerivationNode) -> Option<AstNode> {
    let children: Vec<AstNode> = node
        .children
        .iter()
        .filter(|child| child.symbol != EPSILON)
        .filter_map(simplify)
        .collect();

    if TERMINALS_OF_INTEREST.contains(&node.symbol) {
        return Some(AstNode {
            id: node.id,
            symbol: node.symbol,
            children,
        });
    }

    match children.len() {
        0 => None,
        1 => children.into_iter().next(),
        _ => Some(AstNode {
            id: node.id,
            symbol: node.symbol,
            children,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: NodeId, symbol: Symbol) -> DerivationNode {
        DerivationNode {
            id,
            symbol,
            children: Vec::new(),
            expanded: false,
        }
    }

    fn node(id: NodeId, symbol: Symbol, children: Vec<DerivationNode>) -> DerivationNode {
        DerivationNode {
            id,
            symbol,
            children,
            expanded: true,
        }
    }

    /// `Return → return ReturnP`, `ReturnP → Expr ;`, down to `Factor → id FactorP`
    fn return_statement() -> DerivationNode {
        let factor = node(
            7,
            "Factor",
            vec![leaf(8, "id"), node(9, "FactorP", vec![leaf(10, EPSILON)])],
        );
        let term = node(6, "Term", vec![factor, node(11, "TermP", vec![leaf(12, EPSILON)])]);
        let add = node(5, "Add", vec![term, node(13, "AddP", vec![leaf(14, EPSILON)])]);
        let rel = node(4, "Rel", vec![add, node(15, "RelP", vec![leaf(16, EPSILON)])]);
        let expr = node(3, "Expr", vec![rel]);
        node(
            0,
            "Return",
            vec![
                leaf(1, "return"),
                node(2, "ReturnP", vec![expr, leaf(17, ";")]),
            ],
        )
    }

    #[test]
    fn test_chain_is_elided() {
        let ast = simplify(&return_statement()).expect("ast");

        assert_eq!(ast.symbols(), vec!["Return", "return", "ReturnP", "id", ";"]);
        let identifier = &ast.children[1].children[0];
        assert_eq!(identifier.symbol, "id");
        assert_eq!(identifier.id, 8);
        for scaffolding in ["Expr", "Rel", "Add", "Term", "Factor"] {
            assert!(!ast.symbols().contains(&scaffolding));
        }
    }

    #[test]
    fn test_empty_subtree_is_pruned() {
        let tree = node(0, "MemberList", vec![leaf(1, EPSILON)]);
        assert_eq!(simplify(&tree), None);

        // Unexpanded nonterminals have nothing to keep either
        assert_eq!(simplify(&leaf(0, "Prog")), None);
    }

    #[test]
    fn test_terminal_of_interest_kept_alone() {
        let tree = node(0, "Type", vec![leaf(1, "int")]);
        assert_eq!(
            simplify(&tree),
            Some(AstNode {
                id: 1,
                symbol: "int",
                children: Vec::new(),
            })
        );
    }
}
