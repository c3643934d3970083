//! Grammar definitions for the LL(1) front end
//!
//! A [`Grammar`] is an ordered mapping from nonterminals to their productions.
//! It is validated once when constructed and never mutated afterwards, so the
//! set solver, the table builder and the parser can all share it by reference.
//!
//! A symbol is a nonterminal exactly when the grammar has rules for it. Every
//! other symbol appearing in a production is a terminal, except the epsilon
//! marker [`EPSILON`], which may only form a production on its own.

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Grammar symbols are interned as static string tags.
pub type Symbol = &'static str;

/// Marker for the empty production.
pub const EPSILON: Symbol = "ε";
/// End-of-input marker, reserved for the parser.
pub const END_MARKER: Symbol = "$";
/// Terminal produced for identifiers.
pub const ID: Symbol = "id";
/// Terminal produced for integer literals.
pub const NUMBER: Symbol = "number";

/// Classification of a symbol relative to a grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
    Epsilon,
}

/// An ordered replacement sequence for a nonterminal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Production {
    symbols: Vec<Symbol>,
}

impl Production {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Production { symbols }
    }

    /// The single-symbol epsilon production
    pub fn epsilon() -> Self {
        Production {
            symbols: vec![EPSILON],
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn is_epsilon(&self) -> bool {
        self.symbols == [EPSILON]
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbols.join(" "))
    }
}

/// Reasons a grammar is rejected at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar has no rules")]
    Empty,

    #[error("start symbol '{0}' has no productions")]
    UndefinedStart(Symbol),

    #[error("nonterminal '{0}' is defined more than once")]
    DuplicateNonterminal(Symbol),

    #[error("nonterminal '{0}' has no productions")]
    NoProductions(Symbol),

    #[error("'{0}' has an empty production; use 'ε' for the empty string")]
    EmptyProduction(Symbol),

    #[error("'ε' must be the only symbol of a production of '{0}'")]
    MisplacedEpsilon(Symbol),

    #[error("'$' is reserved and cannot appear in a production of '{0}'")]
    ReservedEndMarker(Symbol),

    /// Predictive parsing would expand the cycle forever without consuming input.
    #[error("left recursion through {}", .0.join(" -> "))]
    LeftRecursion(Vec<Symbol>),
}

/// Immutable context-free grammar with a fixed start symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    start: Symbol,
    rules: Vec<(Symbol, Vec<Production>)>,
    index: FxHashMap<Symbol, usize>,
}

static JAVA_SUBSET: Lazy<Grammar> = Lazy::new(|| {
    Grammar::new("Prog", java_subset_rules()).expect("built-in grammar is well-formed")
});

impl Grammar {
    /// Build and validate a grammar.
    ///
    /// Rules keep their declaration order; that order drives the table
    /// builder's first-production-wins tie-break and the row order of the
    /// exported table.
    pub fn new(
        start: Symbol,
        rules: Vec<(Symbol, Vec<Vec<Symbol>>)>,
    ) -> Result<Self, GrammarError> {
        if rules.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut index = FxHashMap::default();
        let mut validated = Vec::with_capacity(rules.len());

        for (position, (nonterminal, productions)) in rules.into_iter().enumerate() {
            if index.insert(nonterminal, position).is_some() {
                return Err(GrammarError::DuplicateNonterminal(nonterminal));
            }
            if productions.is_empty() {
                return Err(GrammarError::NoProductions(nonterminal));
            }

            let mut checked = Vec::with_capacity(productions.len());
            for symbols in productions {
                if symbols.is_empty() {
                    return Err(GrammarError::EmptyProduction(nonterminal));
                }
                if symbols.len() > 1 && symbols.contains(&EPSILON) {
                    return Err(GrammarError::MisplacedEpsilon(nonterminal));
                }
                if symbols.contains(&END_MARKER) {
                    return Err(GrammarError::ReservedEndMarker(nonterminal));
                }
                checked.push(Production::new(symbols));
            }
            validated.push((nonterminal, checked));
        }

        if !index.contains_key(start) {
            return Err(GrammarError::UndefinedStart(start));
        }

        let grammar = Grammar {
            start,
            rules: validated,
            index,
        };
        grammar.check_left_recursion()?;

        log::debug!(
            "grammar accepted: {} nonterminals, {} productions",
            grammar.rules.len(),
            grammar.rules.iter().map(|(_, p)| p.len()).sum::<usize>()
        );

        Ok(grammar)
    }

    /// The built-in grammar for the Java-like subset (start symbol `Prog`).
    pub fn java_subset() -> &'static Grammar {
        &JAVA_SUBSET
    }

    pub fn start(&self) -> Symbol {
        self.start
    }

    /// Nonterminals in declaration order
    pub fn nonterminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.rules.iter().map(|(nonterminal, _)| *nonterminal)
    }

    /// Rules in declaration order
    pub fn rules(&self) -> impl Iterator<Item = (Symbol, &[Production])> + '_ {
        self.rules
            .iter()
            .map(|(nonterminal, productions)| (*nonterminal, productions.as_slice()))
    }

    /// Productions of `nonterminal`, empty for terminals
    pub fn productions(&self, nonterminal: Symbol) -> &[Production] {
        self.index
            .get(nonterminal)
            .map(|&i| self.rules[i].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_nonterminal(&self, symbol: Symbol) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn classify(&self, symbol: Symbol) -> SymbolKind {
        if symbol == EPSILON {
            SymbolKind::Epsilon
        } else if self.is_nonterminal(symbol) {
            SymbolKind::Nonterminal
        } else {
            SymbolKind::Terminal
        }
    }

    /// Terminals used by the grammar plus `id`, `number` and `$`, sorted.
    ///
    /// This is the column order of the exported parse table.
    pub fn terminals(&self) -> BTreeSet<Symbol> {
        let mut terminals: BTreeSet<Symbol> = self
            .rules
            .iter()
            .flat_map(|(_, productions)| productions.iter())
            .flat_map(|production| production.symbols().iter().copied())
            .filter(|&symbol| self.classify(symbol) == SymbolKind::Terminal)
            .collect();
        terminals.insert(ID);
        terminals.insert(NUMBER);
        terminals.insert(END_MARKER);
        terminals
    }

    /// Nonterminals that can derive the empty string
    fn nullable(&self) -> FxHashSet<Symbol> {
        let mut nullable = FxHashSet::default();
        let mut changed = true;
        while changed {
            changed = false;
            for (nonterminal, productions) in &self.rules {
                if nullable.contains(nonterminal) {
                    continue;
                }
                let derives_empty = productions.iter().any(|production| {
                    production.is_epsilon()
                        || production.symbols().iter().all(|s| nullable.contains(s))
                });
                if derives_empty {
                    nullable.insert(*nonterminal);
                    changed = true;
                }
            }
        }
        nullable
    }

    /// Reject any cycle `A =>+ A ...` reachable through nullable prefixes.
    fn check_left_recursion(&self) -> Result<(), GrammarError> {
        let nullable = self.nullable();

        // Edges A -> B where B can appear leftmost in a sentential form of A
        let mut leftmost: FxHashMap<Symbol, Vec<Symbol>> = FxHashMap::default();
        for (nonterminal, productions) in &self.rules {
            let edges = leftmost.entry(*nonterminal).or_default();
            for production in productions {
                for &symbol in production.symbols() {
                    if !self.is_nonterminal(symbol) {
                        break;
                    }
                    if !edges.contains(&symbol) {
                        edges.push(symbol);
                    }
                    if !nullable.contains(symbol) {
                        break;
                    }
                }
            }
        }

        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(
            symbol: Symbol,
            leftmost: &FxHashMap<Symbol, Vec<Symbol>>,
            marks: &mut FxHashMap<Symbol, Mark>,
            path: &mut Vec<Symbol>,
        ) -> Result<(), GrammarError> {
            marks.insert(symbol, Mark::Active);
            path.push(symbol);
            for &next in leftmost.get(symbol).map(Vec::as_slice).unwrap_or(&[]) {
                match marks.get(next).copied().unwrap_or(Mark::Unvisited) {
                    Mark::Active => {
                        let from = path.iter().position(|&s| s == next).unwrap_or(0);
                        let mut cycle = path[from..].to_vec();
                        cycle.push(next);
                        return Err(GrammarError::LeftRecursion(cycle));
                    }
                    Mark::Unvisited => visit(next, leftmost, marks, path)?,
                    Mark::Done => {}
                }
            }
            path.pop();
            marks.insert(symbol, Mark::Done);
            Ok(())
        }

        let mut marks = FxHashMap::default();
        for nonterminal in self.nonterminals() {
            if marks.get(nonterminal).copied().unwrap_or(Mark::Unvisited) == Mark::Unvisited {
                visit(nonterminal, &leftmost, &mut marks, &mut Vec::new())?;
            }
        }
        Ok(())
    }
}

/// Rules of the Java-like subset: one class of fields and methods, with
/// declarations, assignments, calls and returns over integer expressions.
fn java_subset_rules() -> Vec<(Symbol, Vec<Vec<Symbol>>)> {
    vec![
        ("Prog", vec![vec!["ClassDecl"]]),
        ("ClassDecl", vec![vec!["class", ID, "{", "MemberList", "}"]]),
        ("MemberList", vec![vec!["Member", "MemberList"], vec![EPSILON]]),
        ("Member", vec![vec!["Type", ID, "MemberP"]]),
        ("MemberP", vec![vec![";"], vec!["(", "ParamList", ")", "Block"]]),
        ("ParamList", vec![vec!["Param", "ParamRest"], vec![EPSILON]]),
        ("ParamRest", vec![vec![",", "Param", "ParamRest"], vec![EPSILON]]),
        ("Param", vec![vec!["Type", ID]]),
        ("Block", vec![vec!["{", "StmtList", "}"]]),
        ("StmtList", vec![vec!["Stmt", "StmtList"], vec![EPSILON]]),
        (
            "Stmt",
            vec![vec!["Type", ID, ";"], vec!["Return"], vec![ID, "StmtP"]],
        ),
        (
            "StmtP",
            vec![vec!["=", "Expr", ";"], vec!["(", "ArgList", ")", ";"]],
        ),
        ("Return", vec![vec!["return", "ReturnP"]]),
        ("ReturnP", vec![vec!["Expr", ";"], vec![";"]]),
        ("ArgList", vec![vec!["Expr", "ArgRest"], vec![EPSILON]]),
        ("ArgRest", vec![vec![",", "Expr", "ArgRest"], vec![EPSILON]]),
        ("Expr", vec![vec!["Rel"]]),
        ("Rel", vec![vec!["Add", "RelP"]]),
        (
            "RelP",
            vec![
                vec!["==", "Add", "RelP"],
                vec!["<", "Add", "RelP"],
                vec![">", "Add", "RelP"],
                vec![EPSILON],
            ],
        ),
        ("Add", vec![vec!["Term", "AddP"]]),
        (
            "AddP",
            vec![
                vec!["+", "Term", "AddP"],
                vec!["-", "Term", "AddP"],
                vec![EPSILON],
            ],
        ),
        ("Term", vec![vec!["Factor", "TermP"]]),
        (
            "TermP",
            vec![
                vec!["*", "Factor", "TermP"],
                vec!["/", "Factor", "TermP"],
                vec![EPSILON],
            ],
        ),
        (
            "Factor",
            vec![vec![NUMBER], vec!["(", "Expr", ")"], vec![ID, "FactorP"]],
        ),
        ("FactorP", vec![vec!["(", "ArgList", ")"], vec![EPSILON]]),
        ("Type", vec![vec!["int"], vec!["void"]]),
    ]
}
