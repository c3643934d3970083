// Error recovery and configuration edge cases

use derivtty::analysis::{Analyzer, AnalyzerConfig, Stage};
use derivtty::parser::grammar::{Grammar, GrammarError};
use derivtty::parser::lexer::{tokenize, LexErrorKind, SourceLocation, Token};
use derivtty::parser::parser::{Parser, SyntaxErrorKind};
use derivtty::parser::sets::FirstFollow;
use derivtty::parser::table::ParseTable;
use derivtty::snapshot::HistoryError;

#[test]
fn test_illegal_character_is_skipped() {
    let source = "class A {\n  int x;@\n  int y;\n}";
    let with_at = tokenize(source);
    let without_at = tokenize(&source.replace('@', ""));

    assert_eq!(with_at.errors.len(), 1);
    assert_eq!(with_at.errors[0].kind, LexErrorKind::IllegalCharacter('@'));
    assert_eq!(with_at.errors[0].location, SourceLocation::new(2, 9));

    let kinds = |tokens: &[Token]| -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind).collect()
    };
    assert_eq!(kinds(&with_at.tokens), kinds(&without_at.tokens));

    // The parser never sees the bad character
    let analysis = Analyzer::java_subset(AnalyzerConfig::default()).analyze(source);
    assert!(analysis.parse.errors.is_empty());
    assert_eq!(analysis.diagnostics().len(), 1);
    assert_eq!(analysis.diagnostics()[0].stage, Stage::Lexical);
}

#[test]
fn test_missing_terminator_terminates() {
    let analysis = Analyzer::java_subset(AnalyzerConfig::default()).analyze("int x");

    assert!(!analysis.parse.errors.is_empty());
    assert!(!analysis.parse.accepted());
    // Every token including `$` was skipped exactly once
    assert_eq!(analysis.parse.steps.len(), 1 + analysis.parse.input.len());
}

#[test]
fn test_missing_semicolon_in_class() {
    let analysis = Analyzer::java_subset(AnalyzerConfig::default()).analyze("class A { int x }");
    let errors = &analysis.parse.errors;

    assert!(matches!(
        errors[0].kind,
        SyntaxErrorKind::NoProduction { nonterminal: "MemberP", .. }
    ));
    assert_eq!(errors[0].location, SourceLocation::new(1, 17));
    assert!(!analysis.parse.accepted());
}

#[test]
fn test_unterminated_comment_stops_scanning() {
    let analysis = Analyzer::java_subset(AnalyzerConfig::default())
        .analyze("class A {\n /* never closed\n int x; }");

    assert_eq!(analysis.lex.errors.len(), 1);
    assert_eq!(analysis.lex.errors[0].kind, LexErrorKind::UnterminatedComment);
    assert_eq!(analysis.lex.errors[0].location, SourceLocation::new(2, 2));
    assert_eq!(analysis.lex.tokens.len(), 3);
    assert!(!analysis.parse.errors.is_empty());
    assert_eq!(analysis.diagnostics()[0].stage, Stage::Lexical);
}

#[test]
fn test_ambiguous_grammar_still_parses() {
    let grammar = Grammar::new(
        "S",
        vec![
            ("S", vec![vec!["if", "id", "S", "Else"], vec!["number"]]),
            ("Else", vec![vec!["else", "S"], vec!["ε"]]),
        ],
    )
    .expect("valid grammar");
    let sets = FirstFollow::compute(&grammar);
    let (table, conflicts) = ParseTable::build(&grammar, &sets);
    assert!(!conflicts.is_empty());

    // Keywords outside the built-in set lex as identifiers, so build tokens by hand
    let tokens = ["if", "id", "if", "id", "number", "else", "number"]
        .iter()
        .enumerate()
        .map(|(i, &kind)| Token::new(kind, kind, SourceLocation::new(1, i + 1)))
        .collect::<Vec<_>>();
    let result = Parser::new(&grammar, &table, &tokens).parse();

    assert!(result.errors.is_empty());
    assert!(result.accepted());
    assert!(result.used_cells.contains(&("Else", "else")));
}

#[test]
fn test_left_recursive_grammar_is_rejected() {
    let err = Grammar::new(
        "E",
        vec![
            ("E", vec![vec!["E", "+", "T"], vec!["T"]]),
            ("T", vec![vec!["id"]]),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, GrammarError::LeftRecursion(_)));
}

#[test]
fn test_history_limit_only_truncates_replay() {
    let config = AnalyzerConfig {
        history_limit: 4 * 1024,
    };
    let analysis = Analyzer::java_subset(config).analyze("class A { int x; int y; int z; }");

    assert!(analysis.parse.accepted());
    assert!(analysis.parse.errors.is_empty());
    assert!(analysis.is_clean());
    let err = analysis.parse.history_error.as_ref().expect("budget exhausted");
    assert!(matches!(err, HistoryError::LimitExceeded { limit: 4096, .. }));
    assert!(err.to_string().contains("history limit exceeded"));
}

#[test]
fn test_long_valid_program_past_history_budget() {
    let mut source = String::from("class A {\n");
    for i in 0..200 {
        source.push_str(&format!("  int x{};\n", i));
    }
    source.push_str("}\n");

    let config = AnalyzerConfig {
        history_limit: 1024 * 1024,
    };
    let analysis = Analyzer::java_subset(config).analyze(&source);

    assert!(analysis.lex.errors.is_empty());
    assert!(analysis.parse.errors.is_empty(), "{:?}", analysis.parse.errors);
    assert!(analysis.parse.accepted());
    assert!(analysis.parse.is_truncated());
    assert_eq!(analysis.summary.variables, 200);

    // The final tree is complete even though replay stops early
    let declared = analysis
        .parse
        .tree
        .frontier()
        .into_iter()
        .filter(|&symbol| symbol == "int")
        .count();
    assert_eq!(declared, 200);
    let last = analysis.parse.steps.last().expect("some steps recorded");
    assert!(last.position < analysis.parse.input.len() - 1);
}
