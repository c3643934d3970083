//! Table-driven predictive parser
//!
//! The parser keeps an explicit symbol stack seeded with `[$, start]` and a
//! cursor into the token stream (with `$` appended). Each loop iteration
//! applies exactly one transition against `(top of stack, current token)`:
//!
//! | Top of stack        | Current token        | Transition                          |
//! |---------------------|----------------------|-------------------------------------|
//! | `$`                 | `$`                  | accept                              |
//! | terminal `a`        | `a`                  | match: pop, advance                 |
//! | terminal `a`        | `b != a`             | insert: error, pop, keep token      |
//! | nonterminal `A`     | table has `[A, b]`   | expand: pop, push production        |
//! | nonterminal `A`     | no `[A, b]`          | skip: error, advance, keep stack    |
//!
//! Recovery never aborts the run: every error is collected and the loop stops
//! on accept, on an empty stack, or once the input (including `$`) has been
//! skipped entirely.
//!
//! After every transition the parser records a [`DerivationStep`] holding a
//! deep copy of the tree and the stack, so replay never observes later
//! mutation. This costs O(steps × tree size) memory and is bounded by the
//! history budget. Once the budget is spent recording stops, but the parse
//! itself runs to its normal end: errors, the final tree and the used cells
//! do not depend on the budget.

use super::grammar::{Grammar, Production, Symbol, END_MARKER, EPSILON};
use super::lexer::{SourceLocation, Token};
use super::table::ParseTable;
use crate::snapshot::{DerivationStep, HistoryError, StepHistory};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Node identifier, sequential in creation order (root is 0)
pub type NodeId = usize;

/// Node of the derivation (concrete parse) tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationNode {
    pub id: NodeId,
    pub symbol: Symbol,
    pub children: Vec<DerivationNode>,
    /// Whether a production has been applied to this node
    pub expanded: bool,
}

impl DerivationNode {
    /// Number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(DerivationNode::size).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Find a node by id in this subtree
    pub fn find(&self, id: NodeId) -> Option<&DerivationNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Leaf symbols left to right, epsilon leaves omitted
    pub fn frontier(&self) -> Vec<Symbol> {
        fn collect(node: &DerivationNode, out: &mut Vec<Symbol>) {
            if node.is_leaf() {
                if node.symbol != EPSILON {
                    out.push(node.symbol);
                }
                return;
            }
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

/// What a parser transition did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Start,
    Match { token: Token },
    Expand { nonterminal: Symbol, production: Production },
    Insert { expected: Symbol, found: Token },
    Skip { token: Token },
    Accept,
}

impl StepAction {
    /// Short lowercase name of the transition
    pub fn name(&self) -> &'static str {
        match self {
            StepAction::Start => "start",
            StepAction::Match { .. } => "match",
            StepAction::Expand { .. } => "expand",
            StepAction::Insert { .. } => "insert",
            StepAction::Skip { .. } => "skip",
            StepAction::Accept => "accept",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Start => write!(f, "start"),
            StepAction::Match { token } => write!(f, "match {}", token),
            StepAction::Expand {
                nonterminal,
                production,
            } => write!(f, "expand {} → {}", nonterminal, production),
            StepAction::Insert { expected, found } => {
                write!(f, "insert '{}' before {}", expected, found)
            }
            StepAction::Skip { token } => write!(f, "skip {}", token),
            StepAction::Accept => write!(f, "accept"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("token '{found}' does not match expected '{expected}'")]
    Mismatch { expected: Symbol, found: String },

    #[error("no production for [{nonterminal}] with '{found}'")]
    NoProduction { nonterminal: Symbol, found: String },
}

/// Parse error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub location: SourceLocation,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, location: SourceLocation) -> Self {
        SyntaxError { kind, location }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.kind
        )
    }
}

impl std::error::Error for SyntaxError {}

/// Everything a parse run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub errors: Vec<SyntaxError>,
    pub steps: Vec<DerivationStep>,
    /// Final derivation tree
    pub tree: DerivationNode,
    /// Table cells `(nonterminal, terminal)` used by expand transitions
    pub used_cells: BTreeSet<(Symbol, Symbol)>,
    /// Token stream the parser ran over, ending with `$`
    pub input: Vec<Token>,
    /// Set when the history budget ran out; `steps` is then a prefix of the run
    pub history_error: Option<HistoryError>,
    accepted: bool,
}

impl ParseResult {
    /// True iff the run ended on an accept transition
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Whether some transitions were not recorded
    pub fn is_truncated(&self) -> bool {
        self.history_error.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
struct StackEntry {
    symbol: Symbol,
    /// Tree node bound to this symbol; only the `$` sentinel has none
    node: Option<NodeId>,
}

#[derive(Debug)]
struct ArenaNode {
    symbol: Symbol,
    children: Vec<NodeId>,
    expanded: bool,
}

const ROOT: NodeId = 0;

/// Predictive parser over one token stream
pub struct Parser<'a> {
    grammar: &'a Grammar,
    table: &'a ParseTable,
    input: Vec<Token>,
    position: usize,
    stack: Vec<StackEntry>,
    arena: Vec<ArenaNode>,
    history: StepHistory,
    history_error: Option<HistoryError>,
    errors: Vec<SyntaxError>,
    used_cells: BTreeSet<(Symbol, Symbol)>,
    accepted: bool,
}

impl<'a> Parser<'a> {
    /// Default step history budget: 256 MiB
    pub const DEFAULT_HISTORY_LIMIT: usize = 256 * 1024 * 1024;

    /// Create a parser; `$` is appended to `tokens`.
    pub fn new(grammar: &'a Grammar, table: &'a ParseTable, tokens: &[Token]) -> Self {
        let end = tokens
            .last()
            .map(|last| {
                SourceLocation::new(
                    last.location.line,
                    last.location.column + last.lexeme.chars().count(),
                )
            })
            .unwrap_or(SourceLocation::new(1, 1));

        let mut input = tokens.to_vec();
        input.push(Token::end_of_input(end));

        let arena = vec![ArenaNode {
            symbol: grammar.start(),
            children: Vec::new(),
            expanded: false,
        }];
        let stack = vec![
            StackEntry {
                symbol: END_MARKER,
                node: None,
            },
            StackEntry {
                symbol: grammar.start(),
                node: Some(ROOT),
            },
        ];

        Parser {
            grammar,
            table,
            input,
            position: 0,
            stack,
            arena,
            history: StepHistory::new(Self::DEFAULT_HISTORY_LIMIT),
            history_error: None,
            errors: Vec::new(),
            used_cells: BTreeSet::new(),
            accepted: false,
        }
    }

    /// Set the step history budget in bytes
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = StepHistory::new(limit);
        self
    }

    /// Run to completion
    pub fn parse(mut self) -> ParseResult {
        self.record(StepAction::Start);
        self.run();

        log::debug!(
            "parse finished with {} errors; recorded {} steps in {} of {} bytes",
            self.errors.len(),
            self.history.len(),
            self.history.memory_usage(),
            self.history.memory_limit()
        );

        let tree = self.materialize(ROOT);
        ParseResult {
            errors: self.errors,
            steps: self.history.into_steps(),
            tree,
            used_cells: self.used_cells,
            input: self.input,
            history_error: self.history_error,
            accepted: self.accepted,
        }
    }

    fn run(&mut self) {
        let grammar = self.grammar;
        let table = self.table;

        while let Some(top) = self.stack.last().copied() {
            let Some(current) = self.input.get(self.position).cloned() else {
                log::trace!("input exhausted with {} symbols on the stack", self.stack.len());
                return;
            };

            let action = if !grammar.is_nonterminal(top.symbol) {
                if top.symbol == END_MARKER && current.is_end_of_input() {
                    self.accepted = true;
                    self.record(StepAction::Accept);
                    return;
                }

                self.stack.pop();
                if top.symbol == current.kind {
                    self.position += 1;
                    StepAction::Match { token: current }
                } else {
                    log::trace!("insert '{}' before {}", top.symbol, current);
                    self.errors.push(SyntaxError::new(
                        SyntaxErrorKind::Mismatch {
                            expected: top.symbol,
                            found: current.lexeme.clone(),
                        },
                        current.location,
                    ));
                    StepAction::Insert {
                        expected: top.symbol,
                        found: current,
                    }
                }
            } else if let Some(production) = table.get(top.symbol, current.kind) {
                self.used_cells.insert((top.symbol, current.kind));
                self.stack.pop();
                if let Some(node) = top.node {
                    self.expand(node, production);
                }
                StepAction::Expand {
                    nonterminal: top.symbol,
                    production: production.clone(),
                }
            } else {
                log::trace!("skip {} while expanding {}", current, top.symbol);
                self.errors.push(SyntaxError::new(
                    SyntaxErrorKind::NoProduction {
                        nonterminal: top.symbol,
                        found: current.lexeme.clone(),
                    },
                    current.location,
                ));
                self.position += 1;
                StepAction::Skip { token: current }
            };

            self.record(action);
        }
    }

    /// Attach one child per production symbol and push them right to left.
    fn expand(&mut self, node: NodeId, production: &Production) {
        let children: Vec<NodeId> = production
            .symbols()
            .iter()
            .map(|&symbol| self.alloc(symbol))
            .collect();

        self.arena[node].expanded = true;
        self.arena[node].children = children.clone();

        if production.is_epsilon() {
            return;
        }
        for (&symbol, &child) in production.symbols().iter().zip(&children).rev() {
            self.stack.push(StackEntry {
                symbol,
                node: Some(child),
            });
        }
    }

    fn alloc(&mut self, symbol: Symbol) -> NodeId {
        self.arena.push(ArenaNode {
            symbol,
            children: Vec::new(),
            expanded: false,
        });
        self.arena.len() - 1
    }

    /// Snapshot the current state unless the history budget is already spent.
    fn record(&mut self, action: StepAction) {
        if self.history_error.is_some() {
            return;
        }
        let step = DerivationStep {
            action,
            tree: self.materialize(ROOT),
            stack: self.stack.iter().map(|entry| entry.symbol).collect(),
            position: self.position,
        };

        if let Err(err) = self.history.push(step) {
            log::warn!("{}; recording stops after step {}", err, self.history.len());
            self.history_error = Some(err);
        }
    }

    fn materialize(&self, id: NodeId) -> DerivationNode {
        let node = &self.arena[id];
        DerivationNode {
            id,
            symbol: node.symbol,
            expanded: node.expanded,
            children: node
                .children
                .iter()
                .map(|&child| self.materialize(child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize;
    use crate::parser::sets::FirstFollow;
    use test_log::test;

    fn parse_with_limit(source: &str, limit: usize) -> ParseResult {
        let grammar = Grammar::java_subset();
        let sets = FirstFollow::compute(grammar);
        let (table, _) = ParseTable::build(grammar, &sets);
        let lexed = tokenize(source);
        Parser::new(grammar, &table, &lexed.tokens)
            .with_history_limit(limit)
            .parse()
    }

    fn parse(source: &str) -> ParseResult {
        parse_with_limit(source, Parser::DEFAULT_HISTORY_LIMIT)
    }

    fn actions(result: &ParseResult) -> Vec<&'static str> {
        result.steps.iter().map(|step| step.action.name()).collect()
    }

    #[test]
    fn test_accepts_valid_program() {
        let result = parse("class Demo { int sum(int a, int b) { return a + b; } }");

        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert!(result.accepted());
        assert_eq!(actions(&result).first(), Some(&"start"));
        assert!(result.used_cells.contains(&("ClassDecl", "class")));
        assert!(result.used_cells.contains(&("AddP", "+")));

        let kinds: Vec<Symbol> = result
            .input
            .iter()
            .filter(|t| !t.is_end_of_input())
            .map(|t| t.kind)
            .collect();
        assert_eq!(result.tree.frontier(), kinds);
    }

    #[test]
    fn test_initial_step() {
        let result = parse("class A { }");
        let first = &result.steps[0];

        assert_eq!(first.action, StepAction::Start);
        assert_eq!(first.stack, vec!["$", "Prog"]);
        assert_eq!(first.position, 0);
        assert_eq!(first.tree.size(), 1);
        assert_eq!(first.tree.id, 0);
        assert!(!first.tree.expanded);
    }

    #[test]
    fn test_step_sequence() {
        let result = parse("class A { }");
        assert_eq!(
            actions(&result),
            vec![
                "start", "expand", "expand", "match", "match", "match", "expand", "match",
                "accept"
            ]
        );

        // State is captured after the transition
        let expand = &result.steps[2];
        assert_eq!(expand.stack, vec!["$", "}", "MemberList", "{", "id", "class"]);
        let matched = &result.steps[3];
        assert_eq!(matched.position, 1);
        assert_eq!(result.steps.last().map(|s| s.position), Some(4));
    }

    #[test]
    fn test_snapshots_are_independent() {
        let result = parse("class A { int x; }");
        let sizes: Vec<usize> = result.steps.iter().map(|s| s.tree.size()).collect();

        assert_eq!(sizes[0], 1);
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(sizes.last(), Some(&result.tree.size()));
        assert!(!result.steps[1].tree.children[0].expanded);
    }

    #[test]
    fn test_node_ids_are_sequential() {
        let result = parse("class A { void f() { x = 1; } }");
        let mut ids = Vec::new();
        fn walk(node: &DerivationNode, ids: &mut Vec<NodeId>) {
            ids.push(node.id);
            node.children.iter().for_each(|c| walk(c, ids));
        }
        walk(&result.tree, &mut ids);
        ids.sort_unstable();
        assert_eq!(ids, (0..result.tree.size()).collect::<Vec<_>>());
        assert!(result.tree.find(3).is_some());
    }

    #[test]
    fn test_epsilon_leaf() {
        let result = parse("class A { }");
        let member_list = result.tree.find(5).expect("MemberList node");
        assert_eq!(member_list.symbol, "MemberList");
        assert!(member_list.expanded);
        assert_eq!(member_list.children.len(), 1);
        assert_eq!(member_list.children[0].symbol, EPSILON);
    }

    #[test]
    fn test_insert_recovery() {
        let result = parse("class { }");

        assert_eq!(
            result.errors,
            vec![SyntaxError::new(
                SyntaxErrorKind::Mismatch {
                    expected: "id",
                    found: "{".to_string(),
                },
                SourceLocation::new(1, 7),
            )]
        );
        assert!(actions(&result).contains(&"insert"));
        assert!(result.accepted());
    }

    #[test]
    fn test_skip_recovery_terminates() {
        let result = parse("int x");

        assert_eq!(result.errors.len(), 3);
        assert!(result
            .errors
            .iter()
            .all(|e| matches!(e.kind, SyntaxErrorKind::NoProduction { nonterminal: "Prog", .. })));
        assert_eq!(actions(&result), vec!["start", "skip", "skip", "skip"]);
        assert!(!result.accepted());
        assert_eq!(result.steps.last().map(|s| s.position), Some(3));
    }

    #[test]
    fn test_end_marker_location() {
        let result = parse("class A");
        let end = result.input.last().expect("end marker");
        assert!(end.is_end_of_input());
        assert_eq!(end.location, SourceLocation::new(1, 8));

        let empty = parse("");
        assert_eq!(empty.input.len(), 1);
        assert_eq!(empty.input[0].location, SourceLocation::new(1, 1));
        assert_eq!(empty.errors.len(), 1);
        assert_eq!(
            empty.errors[0].to_string(),
            "Parse error at line 1, column 1: no production for [Prog] with '$'"
        );
    }

    #[test]
    fn test_history_limit_keeps_parsing() {
        let source = "class A { int x; }";
        let full = parse(source);
        let capped = parse_with_limit(source, 1024);

        assert!(capped.accepted());
        assert!(capped.errors.is_empty());
        assert!(matches!(
            capped.history_error,
            Some(HistoryError::LimitExceeded { limit: 1024, .. })
        ));
        assert!(!capped.steps.is_empty());
        assert!(capped.steps.len() < full.steps.len());
        assert_eq!(capped.steps[..], full.steps[..capped.steps.len()]);
        assert_eq!(capped.tree, full.tree);
        assert_eq!(capped.used_cells, full.used_cells);
        assert!(!full.is_truncated());

        let nothing = parse_with_limit("class A { }", 0);
        assert!(nothing.steps.is_empty());
        assert!(nothing.errors.is_empty());
        assert!(nothing.accepted());
        assert!(nothing.is_truncated());
    }

    #[test]
    fn test_history_limit_keeps_errors() {
        let full = parse("class { int x }");
        let capped = parse_with_limit("class { int x }", 0);

        assert_eq!(capped.errors, full.errors);
        assert_eq!(capped.accepted(), full.accepted());
        assert!(capped.steps.is_empty());
    }

    #[test]
    fn test_action_display() {
        let result = parse("class A { }");
        assert_eq!(result.steps[1].action.to_string(), "expand Prog → ClassDecl");
        assert_eq!(result.steps[3].action.to_string(), "match 'class'");
        assert_eq!(result.steps[4].action.to_string(), "match id 'A'");
    }
}
