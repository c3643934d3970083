//! FIRST and FOLLOW set computation
//!
//! Both sets are computed by fixed-point iteration over the grammar: every
//! pass only adds symbols, the universe of terminals is finite, so the loop
//! stops once a full pass changes nothing. The single-pass `refine_*`
//! functions are public so callers can check that a result really is a
//! fixed point.

use super::grammar::{Grammar, Symbol, END_MARKER, EPSILON};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Ordered set of terminals (FIRST sets may also hold [`EPSILON`])
pub type SymbolSet = BTreeSet<Symbol>;

/// Mapping nonterminal -> set
pub type SetMap = FxHashMap<Symbol, SymbolSet>;

/// FIRST and FOLLOW sets for every nonterminal of a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollow {
    first: SetMap,
    follow: SetMap,
}

impl FirstFollow {
    pub fn compute(grammar: &Grammar) -> Self {
        let first = compute_first(grammar);
        let follow = compute_follow(grammar, &first);
        FirstFollow { first, follow }
    }

    pub fn first(&self, nonterminal: Symbol) -> Option<&SymbolSet> {
        self.first.get(nonterminal)
    }

    pub fn follow(&self, nonterminal: Symbol) -> Option<&SymbolSet> {
        self.follow.get(nonterminal)
    }

    pub fn first_sets(&self) -> &SetMap {
        &self.first
    }

    pub fn follow_sets(&self) -> &SetMap {
        &self.follow
    }

    /// FIRST of an arbitrary symbol sequence
    pub fn first_of_sequence(&self, grammar: &Grammar, sequence: &[Symbol]) -> SymbolSet {
        first_of_sequence(grammar, &self.first, sequence)
    }
}

/// Compute FIRST for every nonterminal
pub fn compute_first(grammar: &Grammar) -> SetMap {
    let mut first: SetMap = grammar
        .nonterminals()
        .map(|nonterminal| (nonterminal, SymbolSet::new()))
        .collect();

    let mut passes = 1;
    while refine_first(grammar, &mut first) {
        passes += 1;
    }
    log::trace!("FIRST sets converged after {} passes", passes);

    first
}

/// One pass of the FIRST computation. Returns whether any set grew.
pub fn refine_first(grammar: &Grammar, first: &mut SetMap) -> bool {
    let mut changed = false;

    for (nonterminal, productions) in grammar.rules() {
        for production in productions {
            let additions = first_of_sequence(grammar, first, production.symbols());
            let set = first.entry(nonterminal).or_default();
            for symbol in additions {
                changed |= set.insert(symbol);
            }
        }
    }

    changed
}

/// FIRST of a symbol sequence under the (possibly partial) sets in `first`.
///
/// Scans left to right: a terminal is added and ends the scan; a nonterminal
/// contributes its FIRST minus epsilon and only lets the scan continue when it
/// is nullable. If every symbol is nullable (including the empty sequence and
/// the epsilon production), epsilon is added.
pub fn first_of_sequence(grammar: &Grammar, first: &SetMap, sequence: &[Symbol]) -> SymbolSet {
    let mut result = SymbolSet::new();

    for &symbol in sequence {
        if symbol == EPSILON {
            continue;
        }
        if !grammar.is_nonterminal(symbol) {
            result.insert(symbol);
            return result;
        }

        let Some(set) = first.get(symbol) else {
            return result;
        };
        result.extend(set.iter().copied().filter(|&s| s != EPSILON));
        if !set.contains(EPSILON) {
            return result;
        }
    }

    result.insert(EPSILON);
    result
}

/// Compute FOLLOW for every nonterminal, seeding the start symbol with `$`
pub fn compute_follow(grammar: &Grammar, first: &SetMap) -> SetMap {
    let mut follow: SetMap = grammar
        .nonterminals()
        .map(|nonterminal| (nonterminal, SymbolSet::new()))
        .collect();
    follow.entry(grammar.start()).or_default().insert(END_MARKER);

    let mut passes = 1;
    while refine_follow(grammar, first, &mut follow) {
        passes += 1;
    }
    log::trace!("FOLLOW sets converged after {} passes", passes);

    follow
}

/// One pass of the FOLLOW computation. Returns whether any set grew.
pub fn refine_follow(grammar: &Grammar, first: &SetMap, follow: &mut SetMap) -> bool {
    let mut changed = false;

    for (nonterminal, productions) in grammar.rules() {
        for production in productions {
            let symbols = production.symbols();
            for (i, &symbol) in symbols.iter().enumerate() {
                if !grammar.is_nonterminal(symbol) {
                    continue;
                }

                let beta = &symbols[i + 1..];
                let first_beta = first_of_sequence(grammar, first, beta);

                let mut additions: Vec<Symbol> =
                    first_beta.iter().copied().filter(|&s| s != EPSILON).collect();
                if first_beta.contains(EPSILON) {
                    if let Some(inherited) = follow.get(nonterminal) {
                        additions.extend(inherited.iter().copied());
                    }
                }

                let set = follow.entry(symbol).or_default();
                for terminal in additions {
                    changed |= set.insert(terminal);
                }
            }
        }
    }

    changed
}
