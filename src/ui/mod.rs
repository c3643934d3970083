//! Terminal user interface built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: replay state, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane (source,
//!   diagnostics, parse stack, derivation tree or parse table, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it from an
//! [`Analyzer`] and a finished [`Analysis`] and call [`App::run`] to start
//! the event loop. The viewer only reads recorded steps; it never re-runs
//! the parser.
//!
//! [`Analyzer`]: crate::analysis::Analyzer
//! [`Analysis`]: crate::analysis::Analysis
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
