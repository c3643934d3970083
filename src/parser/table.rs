//! LL(1) parse table construction
//!
//! The table maps `(nonterminal, lookahead terminal)` to the production the
//! predictive parser applies. Grammars that are not strictly LL(1) still get a
//! usable table: when two productions compete for a cell the one assigned
//! first (declaration order) keeps it and the other is recorded as a
//! [`Conflict`]. This first-production-wins rule is a fixed policy, not a
//! disambiguation strategy.

use super::grammar::{Grammar, Production, Symbol, EPSILON};
use super::sets::FirstFollow;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;

/// Two productions competing for the same table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub nonterminal: Symbol,
    pub terminal: Symbol,
    /// Production kept in the table
    pub existing: Production,
    /// Production that lost the cell
    pub rejected: Production,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]: keeping {} → {}, rejecting {} → {}",
            self.nonterminal,
            self.terminal,
            self.nonterminal,
            self.existing,
            self.nonterminal,
            self.rejected
        )
    }
}

/// Predictive parse table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseTable {
    cells: FxHashMap<(Symbol, Symbol), Production>,
}

impl ParseTable {
    /// Build the table from FIRST/FOLLOW, returning it with every conflict found.
    pub fn build(grammar: &Grammar, sets: &FirstFollow) -> (ParseTable, Vec<Conflict>) {
        let mut table = ParseTable::default();
        let mut conflicts = Vec::new();

        for (nonterminal, productions) in grammar.rules() {
            for production in productions {
                let first = sets.first_of_sequence(grammar, production.symbols());

                for &terminal in first.iter().filter(|&&s| s != EPSILON) {
                    table.assign(nonterminal, terminal, production, &mut conflicts);
                }

                if first.contains(EPSILON) {
                    let follow = sets.follow(nonterminal).into_iter().flatten();
                    for &terminal in follow {
                        table.assign(nonterminal, terminal, production, &mut conflicts);
                    }
                }
            }
        }

        if conflicts.is_empty() {
            log::debug!("built LL(1) table with {} cells", table.len());
        } else {
            log::warn!(
                "grammar is not LL(1): {} conflicts, first production wins",
                conflicts.len()
            );
            for conflict in &conflicts {
                log::debug!("conflict {}", conflict);
            }
        }

        (table, conflicts)
    }

    fn assign(
        &mut self,
        nonterminal: Symbol,
        terminal: Symbol,
        production: &Production,
        conflicts: &mut Vec<Conflict>,
    ) {
        if let Some(existing) = self.cells.get(&(nonterminal, terminal)) {
            if existing != production {
                conflicts.push(Conflict {
                    nonterminal,
                    terminal,
                    existing: existing.clone(),
                    rejected: production.clone(),
                });
            }
            return;
        }
        self.cells
            .insert((nonterminal, terminal), production.clone());
    }

    /// Production for `(nonterminal, terminal)`, if any
    pub fn get(&self, nonterminal: Symbol, terminal: Symbol) -> Option<&Production> {
        self.cells.get(&(nonterminal, terminal))
    }

    /// Number of filled cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Export as a header row plus one row per nonterminal (declaration order).
    ///
    /// Columns are [`Grammar::terminals`]; a cell holds the space-joined
    /// production or is empty.
    pub fn matrix(&self, grammar: &Grammar) -> TableMatrix {
        let terminals: Vec<Symbol> = grammar.terminals().into_iter().collect();

        let mut header = Vec::with_capacity(terminals.len() + 1);
        header.push("Nonterminal".to_string());
        header.extend(terminals.iter().map(|t| t.to_string()));

        let rows = grammar
            .nonterminals()
            .map(|nonterminal| {
                let mut row = Vec::with_capacity(terminals.len() + 1);
                row.push(nonterminal.to_string());
                row.extend(terminals.iter().map(|&terminal| {
                    self.get(nonterminal, terminal)
                        .map(Production::to_string)
                        .unwrap_or_default()
                }));
                row
            })
            .collect();

        TableMatrix { header, rows }
    }
}

/// Rectangular text form of a parse table for external renderers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMatrix {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableMatrix {
    /// Prefix with `▶ ` every non-empty cell the parser actually used
    pub fn mark_used(&self, used: &BTreeSet<(Symbol, Symbol)>) -> TableMatrix {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let nonterminal = row[0].as_str();
                row.iter()
                    .enumerate()
                    .map(|(column, cell)| {
                        let is_used = column > 0
                            && !cell.is_empty()
                            && used.iter().any(|&(n, t)| {
                                n == nonterminal && t == self.header[column]
                            });
                        if is_used {
                            format!("▶ {}", cell)
                        } else {
                            cell.clone()
                        }
                    })
                    .collect()
            })
            .collect();

        TableMatrix {
            header: self.header.clone(),
            rows,
        }
    }

    /// Cell text for `(nonterminal, terminal)`
    pub fn cell(&self, nonterminal: &str, terminal: &str) -> Option<&str> {
        let column = self.header.iter().position(|h| h == terminal)?;
        let row = self.rows.iter().find(|row| row[0] == nonterminal)?;
        row.get(column).map(String::as_str)
    }

    /// Non-empty cells of one row as `(terminal, cell)` pairs
    pub fn filled(&self, row: usize) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.rows
            .get(row)
            .into_iter()
            .flat_map(|cells| cells.iter().enumerate().skip(1))
            .filter(|(_, cell)| !cell.is_empty())
            .map(move |(column, cell)| (self.header[column].as_str(), cell.as_str()))
    }
}

/// Column-aligned grid, one line per row with ` | ` between cells
impl fmt::Display for TableMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = (0..self.header.len())
            .map(|column| {
                std::iter::once(&self.header)
                    .chain(&self.rows)
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let write_row = |f: &mut fmt::Formatter<'_>, row: &[String]| -> fmt::Result {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
                .collect();
            writeln!(f, "{}", cells.join(" | ").trim_end())
        };

        write_row(f, &self.header)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;
        for row in &self.rows {
            write_row(f, row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn builtin() -> (&'static Grammar, ParseTable, Vec<Conflict>) {
        let grammar = Grammar::java_subset();
        let sets = FirstFollow::compute(grammar);
        let (table, conflicts) = ParseTable::build(grammar, &sets);
        (grammar, table, conflicts)
    }

    #[test]
    fn test_builtin_grammar_is_ll1() {
        let (_, table, conflicts) = builtin();
        assert!(conflicts.is_empty(), "unexpected conflicts: {:?}", conflicts);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_cells() {
        let (_, table, _) = builtin();
        assert_eq!(
            table.get("ClassDecl", "class").map(ToString::to_string),
            Some("class id { MemberList }".to_string())
        );
        assert_eq!(
            table.get("MemberList", "}").map(ToString::to_string),
            Some("ε".to_string())
        );
        assert_eq!(
            table.get("Stmt", "return").map(ToString::to_string),
            Some("Return".to_string())
        );
        assert_eq!(
            table.get("TermP", ";").map(ToString::to_string),
            Some("ε".to_string())
        );
        assert!(table.get("ClassDecl", "id").is_none());
        assert!(table.get("Prog", "$").is_none());
    }

    #[test]
    fn test_conflicts_keep_first_production() {
        // Dangling-else style ambiguity: both productions start with `if`
        let grammar = Grammar::new(
            "S",
            vec![
                ("S", vec![vec!["if", "E", "S", "Else"], vec!["x"]]),
                ("Else", vec![vec!["else", "S"], vec!["ε"]]),
                ("E", vec![vec!["b"]]),
            ],
        )
        .unwrap();
        let sets = FirstFollow::compute(&grammar);
        let (table, conflicts) = ParseTable::build(&grammar, &sets);

        assert_eq!(
            conflicts,
            vec![Conflict {
                nonterminal: "Else",
                terminal: "else",
                existing: Production::new(vec!["else", "S"]),
                rejected: Production::epsilon(),
            }]
        );
        assert_eq!(
            table.get("Else", "else"),
            Some(&Production::new(vec!["else", "S"]))
        );
        assert_eq!(table.get("Else", "$"), Some(&Production::epsilon()));
    }

    #[test]
    fn test_common_prefix_conflict() {
        let grammar = Grammar::new(
            "S",
            vec![("S", vec![vec!["a", "b"], vec!["a", "c"], vec!["d"]])],
        )
        .unwrap();
        let sets = FirstFollow::compute(&grammar);
        let (table, conflicts) = ParseTable::build(&grammar, &sets);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].rejected, Production::new(vec!["a", "c"]));
        assert_eq!(table.get("S", "a"), Some(&Production::new(vec!["a", "b"])));
        assert!(conflicts[0].to_string().contains("keeping S → a b"));
    }

    #[test]
    fn test_matrix_shape() {
        let (grammar, table, _) = builtin();
        let matrix = table.matrix(grammar);

        assert_eq!(matrix.header[0], "Nonterminal");
        assert_eq!(matrix.header.len(), grammar.terminals().len() + 1);
        assert_eq!(matrix.rows.len(), grammar.nonterminals().count());
        assert_eq!(matrix.rows[0][0], "Prog");
        assert!(matrix.rows.iter().all(|row| row.len() == matrix.header.len()));
        assert_eq!(matrix.cell("Prog", "class"), Some("ClassDecl"));
        assert_eq!(matrix.cell("ParamList", ")"), Some("ε"));
        assert_eq!(matrix.cell("Prog", "id"), Some(""));
    }

    #[test]
    fn test_mark_used() {
        let (grammar, table, _) = builtin();
        let matrix = table.matrix(grammar);
        let used: BTreeSet<(Symbol, Symbol)> = [("Prog", "class"), ("Prog", "id")].into_iter().collect();
        let marked = matrix.mark_used(&used);
        assert_eq!(marked.cell("Prog", "class"), Some("▶ ClassDecl"));
        // Empty cells are never marked
        assert_eq!(marked.cell("Prog", "id"), Some(""));
        assert_eq!(marked.cell("ClassDecl", "class"), Some("class id { MemberList }"));
    }

    #[test]
    fn test_filled_cells() {
        let (grammar, table, _) = builtin();
        let matrix = table.matrix(grammar);
        let prog: Vec<(&str, &str)> = matrix.filled(0).collect();
        assert_eq!(prog, vec![("class", "ClassDecl")]);
        assert_eq!(matrix.filled(matrix.rows.len()).count(), 0);
    }

    #[test]
    fn test_matrix_display_is_aligned() {
        let matrix = TableMatrix {
            header: vec!["Nonterminal".to_string(), "a".to_string(), "b".to_string()],
            rows: vec![
                vec!["S".to_string(), "▶ a B".to_string(), String::new()],
                vec!["B".to_string(), String::new(), "b".to_string()],
            ],
        };
        let text = matrix.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Nonterminal | a     | b");
        assert_eq!(lines[1], "------------+-------+--");
        assert_eq!(lines[2], "S           | ▶ a B |");
        assert_eq!(lines[3], "B           |       | b");
    }
}
