// derivtty: Step-through LL(1) analysis with derivation replay

use std::fs;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use derivtty::analysis::{Analysis, Analyzer, AnalyzerConfig, DEMO_PROGRAM};
use derivtty::parser::sets::SymbolSet;
use derivtty::ui::App;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "derivtty",
    version,
    about = "Step through the LL(1) derivation of a small Java-like program."
)]
struct Args {
    /// Source file to analyse (the built-in demo program if omitted)
    file: Option<PathBuf>,

    /// Print a text report instead of opening the viewer
    #[arg(long)]
    report: bool,

    /// Step history budget in MiB
    #[arg(long, value_name = "MB", default_value_t = 256)]
    history_limit_mb: usize,

    /// Write diagnostics to this file when there are any
    #[arg(long, value_name = "PATH")]
    errors_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let source = match &args.file {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            format!("cannot read '{}': {}", path.display(), e)
        })?,
        None => DEMO_PROGRAM.to_string(),
    };

    let config = AnalyzerConfig {
        history_limit: args.history_limit_mb.saturating_mul(1024 * 1024),
    };
    let analyzer = Analyzer::java_subset(config);
    let analysis = analyzer.analyze(&source);

    if let Some(path) = &args.errors_out {
        let lines: Vec<String> = analysis
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect();
        if !lines.is_empty() {
            fs::write(path, lines.join("\n"))?;
        }
    }

    if args.report {
        print_report(&analyzer, &analysis);
        return Ok(());
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(&analyzer, analysis);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn print_report(analyzer: &Analyzer<'_>, analysis: &Analysis) {
    println!("Tokens:");
    for token in &analysis.lex.tokens {
        println!("  {:<8} {:<8} {}", token.location, token.kind, token.lexeme);
    }

    let diagnostics = analysis.diagnostics();
    println!();
    if diagnostics.is_empty() {
        println!("No errors.");
    } else {
        println!("Errors:");
        for diagnostic in &diagnostics {
            println!("  {}", diagnostic);
        }
    }

    println!();
    println!("FIRST / FOLLOW:");
    let grammar = analyzer.grammar();
    let sets = analyzer.sets();
    for nonterminal in grammar.nonterminals() {
        println!(
            "  {:<12} FIRST = {{{}}}  FOLLOW = {{{}}}",
            nonterminal,
            join(sets.first(nonterminal)),
            join(sets.follow(nonterminal))
        );
    }

    if !analyzer.conflicts().is_empty() {
        println!();
        println!("LL(1) conflicts:");
        for conflict in analyzer.conflicts() {
            println!("  {}", conflict);
        }
    }

    println!();
    println!("LL(1) table (▶ marks cells used by this parse):");
    print!("{}", analyzer.matrix(analysis));

    println!();
    println!("{}", analysis.summary);

    println!();
    let outcome = if analysis.parse.accepted() {
        "accepted"
    } else {
        "rejected"
    };
    println!(
        "Derivation {} ({} table cells used).",
        outcome,
        analysis.parse.used_cells.len()
    );
    match &analysis.parse.history_error {
        None => println!("Recorded {} steps.", analysis.parse.steps.len()),
        Some(err) => println!(
            "Recorded the first {} steps; the {} MiB history budget ran out ({}).",
            analysis.parse.steps.len(),
            analyzer.config().history_limit / (1024 * 1024),
            err
        ),
    }
}

fn join(set: Option<&SymbolSet>) -> String {
    set.map(|symbols| symbols.iter().copied().collect::<Vec<_>>().join(", "))
        .unwrap_or_default()
}
