//! End-to-end analysis of one source text
//!
//! [`Analyzer`] computes FIRST/FOLLOW and the parse table once per grammar and
//! then runs lexer, parser and simplifier for each input. `analyze` borrows
//! the analyzer immutably and builds every result from scratch, so it can be
//! called repeatedly (or reentrantly) and yields identical output for
//! identical text.

use crate::parser::ast::{self, AstNode};
use crate::parser::grammar::{Grammar, Symbol};
use crate::parser::lexer::{self, LexOutput, SourceLocation, Token};
use crate::parser::parser::{ParseResult, Parser, StepAction};
use crate::parser::sets::FirstFollow;
use crate::parser::table::{Conflict, ParseTable, TableMatrix};
use std::fmt;

/// Program analysed when no file is given
pub const DEMO_PROGRAM: &str = "class Demo {
    int total;

    int sum(int a, int b) {
        int c;
        c = a + b * 2;
        return c;
    }

    void reset() {
        total = 0;
        log(total, 1);
    }
}
";

const OPERATORS: [Symbol; 7] = ["+", "-", "*", "/", "<", ">", "=="];
const PUNCTUATION: [Symbol; 6] = ["{", "}", "(", ")", ",", ";"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Step history budget in bytes
    pub history_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            history_limit: Parser::DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Grammar-level artifacts shared by every analysis run
#[derive(Debug, Clone)]
pub struct Analyzer<'g> {
    grammar: &'g Grammar,
    sets: FirstFollow,
    table: ParseTable,
    conflicts: Vec<Conflict>,
    config: AnalyzerConfig,
}

impl<'g> Analyzer<'g> {
    pub fn new(grammar: &'g Grammar, config: AnalyzerConfig) -> Self {
        let sets = FirstFollow::compute(grammar);
        let (table, conflicts) = ParseTable::build(grammar, &sets);
        Analyzer {
            grammar,
            sets,
            table,
            conflicts,
            config,
        }
    }

    /// Analyzer for the built-in grammar
    pub fn java_subset(config: AnalyzerConfig) -> Analyzer<'static> {
        Analyzer::new(Grammar::java_subset(), config)
    }

    /// Run the full pipeline over `source`
    pub fn analyze(&self, source: &str) -> Analysis {
        let lex = lexer::tokenize(source);

        let parse = Parser::new(self.grammar, &self.table, &lex.tokens)
            .with_history_limit(self.config.history_limit)
            .parse();
        let ast = ast::simplify(&parse.tree);
        log::debug!(
            "simplified {} derivation nodes to {} AST nodes",
            parse.tree.size(),
            ast.as_ref().map_or(0, AstNode::size)
        );
        let summary = TokenSummary::from_tokens(&lex.tokens, lex.lines);

        Analysis {
            source: source.to_string(),
            lex,
            parse,
            ast,
            summary,
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn sets(&self) -> &FirstFollow {
        &self.sets
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn config(&self) -> AnalyzerConfig {
        self.config
    }

    /// Table matrix with the cells used by `analysis` marked
    pub fn matrix(&self, analysis: &Analysis) -> TableMatrix {
        self.table
            .matrix(self.grammar)
            .mark_used(&analysis.parse.used_cells)
    }
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub source: String,
    pub lex: LexOutput,
    pub parse: ParseResult,
    /// Simplified tree; `None` if nothing survives simplification
    pub ast: Option<AstNode>,
    pub summary: TokenSummary,
}

impl Analysis {
    /// Lexical diagnostics first, then syntax diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let lexical = self.lex.errors.iter().map(|err| Diagnostic {
            stage: Stage::Lexical,
            location: err.location,
            message: err.message(),
        });
        let syntax = self.parse.errors.iter().map(|err| Diagnostic {
            stage: Stage::Syntax,
            location: err.location,
            message: err.message(),
        });
        lexical.chain(syntax).collect()
    }

    /// Whether the run produced no diagnostics and reached accept
    pub fn is_clean(&self) -> bool {
        self.lex.errors.is_empty() && self.parse.errors.is_empty() && self.parse.accepted()
    }

    /// Table cell `(nonterminal, lookahead)` applied by `step`, if it expanded
    pub fn active_cell(&self, step: usize) -> Option<(Symbol, Symbol)> {
        let step = self.parse.steps.get(step)?;
        match &step.action {
            StepAction::Expand { nonterminal, .. } => {
                let lookahead = self.parse.input.get(step.position)?;
                Some((*nonterminal, lookahead.kind))
            }
            _ => None,
        }
    }

    /// Token under the input cursor at `step`
    pub fn token_at(&self, step: usize) -> Option<&Token> {
        let position = self.parse.steps.get(step)?.position;
        self.parse.input.get(position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexical,
    Syntax,
}

impl Stage {
    pub fn tag(&self) -> &'static str {
        match self {
            Stage::Lexical => "LEX",
            Stage::Syntax => "SYNTAX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub location: SourceLocation,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage.tag(), self.location, self.message)
    }
}

/// Declaration and token counts of a source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenSummary {
    /// `int|void id ;`
    pub variables: usize,
    /// `int|void id (`
    pub methods: usize,
    pub operators: usize,
    pub punctuation: usize,
    pub lines: usize,
}

impl TokenSummary {
    pub fn from_tokens(tokens: &[Token], lines: usize) -> Self {
        let mut summary = TokenSummary {
            lines,
            ..TokenSummary::default()
        };

        summary.operators = tokens
            .iter()
            .filter(|t| OPERATORS.contains(&t.kind))
            .count();
        summary.punctuation = tokens
            .iter()
            .filter(|t| PUNCTUATION.contains(&t.kind))
            .count();

        for window in tokens.windows(3) {
            let [ty, name, next] = window else {
                continue;
            };
            if !matches!(ty.kind, "int" | "void") || name.kind != "id" {
                continue;
            }
            match next.kind {
                ";" => summary.variables += 1,
                "(" => summary.methods += 1,
                _ => {}
            }
        }

        summary
    }
}

impl fmt::Display for TokenSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Declared variables: {}", self.variables)?;
        writeln!(f, "Declared methods: {}", self.methods)?;
        writeln!(f, "Operators: {}", self.operators)?;
        writeln!(f, "Punctuation: {}", self.punctuation)?;
        write!(f, "Lines processed: {}", self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_demo_program_is_clean() {
        let analyzer = Analyzer::java_subset(AnalyzerConfig::default());
        let analysis = analyzer.analyze(DEMO_PROGRAM);

        assert!(analysis.is_clean(), "{:?}", analysis.diagnostics());
        assert!(analysis.ast.is_some());
        assert!(analyzer.conflicts().is_empty());
    }

    #[test]
    fn test_summary() {
        let analysis = Analyzer::java_subset(AnalyzerConfig::default()).analyze(DEMO_PROGRAM);
        let summary = analysis.summary;

        // `int total;` and `int c;`; parameters are not followed by `;`
        assert_eq!(summary.variables, 2);
        assert_eq!(summary.methods, 2);
        // `+`, `*`; `=` is not counted
        assert_eq!(summary.operators, 2);
        assert_eq!(summary.lines, 15);
        assert!(summary.to_string().starts_with("Declared variables: 2"));
    }

    #[test]
    fn test_diagnostics_order() {
        let analysis = Analyzer::java_subset(AnalyzerConfig::default())
            .analyze("class A {\n  int x @\n}");
        let diagnostics = analysis.diagnostics();

        assert_eq!(diagnostics[0].stage, Stage::Lexical);
        assert_eq!(diagnostics[0].to_string(), "[LEX] L2 C9: illegal character '@'");
        assert!(diagnostics[1..].iter().all(|d| d.stage == Stage::Syntax));
        assert!(diagnostics.len() > 1);
        assert!(!analysis.is_clean());
    }

    #[test]
    fn test_token_at() {
        let analysis = Analyzer::java_subset(AnalyzerConfig::default()).analyze("class A { }");
        assert_eq!(analysis.token_at(0).map(|t| t.kind), Some("class"));
        let last = analysis.parse.steps.len() - 1;
        assert_eq!(analysis.token_at(last).map(|t| t.kind), Some("$"));
        assert!(analysis.token_at(last + 1).is_none());
    }

    #[test]
    fn test_marked_matrix() {
        let analyzer = Analyzer::java_subset(AnalyzerConfig::default());
        let analysis = analyzer.analyze("class A { }");
        let matrix = analyzer.matrix(&analysis);
        assert_eq!(matrix.cell("ClassDecl", "class"), Some("▶ class id { MemberList }"));
        assert_eq!(matrix.cell("MemberList", "}"), Some("▶ ε"));
        assert_eq!(matrix.cell("MemberList", "int"), Some("Member MemberList"));
    }
}
