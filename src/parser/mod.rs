//! Grammar-driven LL(1) front end
//!
//! - [`grammar`]: symbols, productions and the built-in Java-like grammar
//! - [`lexer`]: tokenization (source text → tokens)
//! - [`sets`]: FIRST/FOLLOW fixed-point computation
//! - [`table`]: LL(1) table construction with conflict recording
//! - [`parser`]: table-driven predictive parsing with recovery and step history
//! - [`ast`]: derivation tree → AST simplification
//!
//! # Supported Language
//!
//! A single class containing fields and methods:
//! - Types: `int`, `void`
//! - Statements: local declarations, assignments, calls, `return`
//! - Expressions: `+ - * /`, comparisons `== < >`, parentheses, calls
//! - Comments: `// line` and `/* block */`
//!
//! No `if`/`while`, no strings, no nested classes.

pub mod ast;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod sets;
pub mod table;
