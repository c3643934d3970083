//! # Introduction
//!
//! derivtty runs an LL(1) analysis of a small Java-like language and records
//! every transition of the predictive parser, so the derivation can be
//! stepped through forward and backward in a terminal UI built with
//! [ratatui](https://docs.rs/ratatui).
//!
//! ## Analysis pipeline
//!
//! ```text
//! Source → Lexer → Tokens ─┐
//! Grammar → FIRST/FOLLOW → Table ─┴→ Parser → Steps + Tree → AST
//! ```
//!
//! 1. [`parser`]: grammar, lexer, set solver, table builder, predictive
//!    parser and AST simplifier.
//! 2. [`snapshot`]: per-step derivation snapshots with a memory budget.
//! 3. [`export`]: trees as generic labeled graphs for external renderers.
//! 4. [`analysis`]: the [`analysis::Analyzer`] facade running the whole
//!    pipeline, plus token summary and merged diagnostics.
//! 5. [`ui`]: ratatui-based step viewer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use derivtty::analysis::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::java_subset(AnalyzerConfig::default());
//! let analysis = analyzer.analyze("class A { int x; }");
//! assert!(analysis.parse.accepted());
//! assert!(analysis.diagnostics().is_empty());
//! ```
//!
//! Errors never stop a run: lexical and syntax errors are collected and
//! returned alongside whatever was parsed.

pub mod analysis;
pub mod export;
pub mod parser;
pub mod snapshot;
pub mod ui;
