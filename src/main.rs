use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tagcalc::config::Config;
use tagcalc::formula::{MemoryStore, evaluate, format_result, tokenize};
use tagcalc::input::{FormulaInput, Key};
use tagcalc::suggest::CatalogSource;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tagcalc", version, about = "Build and evaluate formulas from numbers, operators and tags")]
struct Args {
    /// Config file (defaults to ~/.config/tagcalc/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON catalog of tag suggestions
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Evaluate an expression and exit
    #[arg(long)]
    eval: Option<String>,
}

type Session = FormulaInput<MemoryStore, CatalogSource>;

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(text) = args.eval {
        return eval_once(&text);
    }

    let source = match args.catalog.or(config.catalog) {
        Some(path) => CatalogSource::load(&path)?,
        None => CatalogSource::new(Vec::new()),
    }
    .with_max_results(config.max_suggestions);
    if source.is_empty() {
        tracing::info!("No suggestion catalog loaded; tag suggestions are disabled");
    }

    let mut session = FormulaInput::new(MemoryStore::new(), source);
    run_session(&mut session)
}

fn eval_once(text: &str) -> Result<()> {
    let items = tokenize(text).context("Invalid expression")?;
    let value = evaluate(&items).context("Failed to evaluate expression")?;
    println!("{}", format_result(value));
    Ok(())
}

fn run_session(session: &mut Session) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    print_state(session, &mut stdout)?;
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read input")?;
        if !apply_line(session, &line) {
            break;
        }
        print_state(session, &mut stdout)?;
    }

    Ok(())
}

/// Apply one input line. Returns `false` when the session should end.
fn apply_line(session: &mut Session, line: &str) -> bool {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        session.set_input(line);
        session.handle_key(Key::Enter);
        return true;
    };

    let (name, arg) = command
        .split_once(' ')
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "q" => return false,
        "left" => {
            session.handle_key(Key::Left);
        }
        "right" => {
            session.handle_key(Key::Right);
        }
        "up" => {
            session.handle_key(Key::Up);
        }
        "down" => {
            session.handle_key(Key::Down);
        }
        "back" => {
            session.handle_key(Key::Backspace);
        }
        "enter" => {
            session.handle_key(Key::Enter);
        }
        "clear" => session.clear(),
        "type" => session.set_input(arg),
        "edit" | "pick" => match arg.parse::<usize>() {
            Ok(index) if name == "edit" => {
                if !session.click_tag(index) {
                    eprintln!("No tag at index {}", index);
                }
            }
            Ok(index) => {
                if !session.choose_suggestion(index) {
                    eprintln!("No suggestion at index {}", index);
                }
            }
            Err(_) => eprintln!("Expected an index, got '{}'", arg),
        },
        _ => eprintln!("Unknown command ':{}'", name),
    }

    true
}

fn print_state(session: &Session, out: &mut impl Write) -> Result<()> {
    let sequence = session.sequence();
    writeln!(out, "formula: {}", session.render_formula())?;
    writeln!(out, "cursor:  {}/{}", sequence.cursor(), sequence.len())?;
    if let Some(index) = session.editing_tag() {
        writeln!(out, "editing: tag {}", index)?;
    }
    if session.showing_suggestions() {
        for (idx, suggestion) in session.suggestions().iter().enumerate() {
            let marker = if session.selected_suggestion() == Some(idx) {
                '>'
            } else {
                ' '
            };
            writeln!(
                out,
                "{} [{}] {} ({}) = {}",
                marker, idx, suggestion.name, suggestion.category, suggestion.value
            )?;
        }
    }
    writeln!(out, "result:  {}", session.result())?;
    out.flush()?;
    Ok(())
}
