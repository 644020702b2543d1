//! Monkey CLI

use clap::{Parser, Subcommand};
use monkey::error::{report_error, Error};
use monkey::interp::{Interpreter, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "monkey", version, about = "Monkey - a small scripting language")]
struct Cli {
    /// Log interpreter activity at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Monkey source file
    Run {
        /// Source file to run
        file: PathBuf,
    },
    /// Start an interactive session
    Repl,
    /// Evaluate an expression given on the command line
    Eval {
        /// Monkey source text
        source: String,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Run { file } => run_file(&file),
        Command::Repl => start_repl(),
        Command::Eval { source } => eval_source(&source),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(path: &Path) -> Result<(String, String), Error> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::io_error(format!("{}: {e}", path.display())))?;
    Ok((path.display().to_string(), source))
}

/// Run `source`, rendering any failure as a diagnostic
fn execute(filename: &str, source: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let mut interp = Interpreter::new();
    match interp.run_source(source) {
        Ok(value) => Ok(value),
        Err(err) => {
            report_error(filename, source, &err);
            Err(err.into())
        }
    }
}

fn run_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (filename, source) = read_source(path)?;
    tracing::debug!(file = %filename, bytes = source.len(), "running");
    execute(&filename, &source)?;
    Ok(())
}

fn eval_source(source: &str) -> Result<(), Box<dyn std::error::Error>> {
    let value = execute("<eval>", source)?;
    if !matches!(value, Value::Nil) {
        println!("{value}");
    }
    Ok(())
}

fn start_repl() -> Result<(), Box<dyn std::error::Error>> {
    let mut repl = monkey::repl::Repl::new()?;
    repl.run()?;
    Ok(())
}

fn parse_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (filename, source) = read_source(path)?;

    let tokens = monkey::lexer::tokenize(&source)?;
    let ast = monkey::parser::parse(&filename, &source, tokens)?;

    println!("{}", serde_json::to_string_pretty(&ast)?);
    Ok(())
}

fn tokenize_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (_, source) = read_source(path)?;

    let tokens = monkey::lexer::tokenize(&source)?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}
