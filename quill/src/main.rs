//! Quill CLI

use clap::{Parser, Subcommand};
use quill::ast::Program;
use quill::error::{CompileError, report_error, report_runtime_error};
use quill::interp::{MAX_RECURSION_DEPTH, Runtime};
use quill::parser::MAX_NESTING_DEPTH;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "quill", version, about = "Quill - a small dynamic scripting language")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a Quill source file, printing each statement's value
    Run {
        /// Source file to run
        file: PathBuf,
        /// Maximum nesting, checked while parsing and while evaluating
        #[arg(long, default_value_t = MAX_RECURSION_DEPTH)]
        max_depth: usize,
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
    /// Start the interactive REPL
    Repl,
}

const JSON_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Failure already reported on stderr
struct Reported;

fn main() -> ExitCode {
    quill::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { file, max_depth } => run_file(&file, max_depth),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
        Command::Repl => start_repl(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Reported) => ExitCode::FAILURE,
    }
}

fn read_source(path: &Path) -> Result<(String, String), Reported> {
    let filename = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(source) => Ok((filename, source)),
        Err(e) => {
            report_error(&filename, "", &CompileError::from(e));
            Err(Reported)
        }
    }
}

/// Tokenize and parse, reporting the first front-end error
fn load(filename: &str, source: &str, max_depth: usize) -> Result<Program, Reported> {
    quill::lexer::tokenize(source)
        .and_then(|tokens| quill::parser::parse_with_max_depth(filename, source, tokens, max_depth))
        .map_err(|e| {
            report_error(filename, source, &e);
            Reported
        })
}

fn run_file(path: &Path, max_depth: usize) -> Result<(), Reported> {
    let (filename, source) = read_source(path)?;
    let program = load(&filename, &source, max_depth)?;

    let mut runtime = Runtime::with_max_depth(max_depth);
    for stmt in &program.statements {
        match runtime.evaluate(stmt) {
            Ok(value) => println!("{value}"),
            Err(e) => {
                report_runtime_error(&filename, &source, &e);
                return Err(Reported);
            }
        }
    }
    Ok(())
}

fn parse_file(path: &Path) -> Result<(), Reported> {
    let (filename, source) = read_source(path)?;
    let program = load(&filename, &source, MAX_NESTING_DEPTH)?;

    // Serialization recurses once per AST level
    let json = stacker::grow(JSON_STACK_SIZE, || serde_json::to_string_pretty(&program));
    match json {
        Ok(json) => {
            println!("{json}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Err(Reported)
        }
    }
}

fn tokenize_file(path: &Path) -> Result<(), Reported> {
    let (filename, source) = read_source(path)?;

    let tokens = quill::lexer::tokenize(&source).map_err(|e| {
        report_error(&filename, &source, &e);
        Reported
    })?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}

fn start_repl() -> Result<(), Reported> {
    let result = quill::repl::Repl::new().and_then(|mut repl| repl.run());
    result.map_err(|e| {
        eprintln!("Error: {e}");
        Reported
    })
}
