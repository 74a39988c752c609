//! REPL (Read-Eval-Print Loop) for Quill

use crate::error::{report_error, report_runtime_error};
use crate::interp::{Runtime, Value};
use crate::lexer::tokenize;
use crate::parser::parse;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".quill_history";
const SOURCE_NAME: &str = "<repl>";

/// REPL state. The runtime persists across lines until `:reset`.
pub struct Repl {
    editor: DefaultEditor,
    runtime: Runtime,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;

        // Try to find history file in home directory
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            runtime: Runtime::new(),
            history_path,
        };

        // Load history if available
        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Quill REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :). Returns true to exit.
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            ":scope" => {
                let env = self.runtime.env();
                println!("depth {}: {}", env.depth(), Value::Object(env.current_scope().clone()));
                false
            }
            ":descend" => {
                let depth = self.runtime.env_mut().descend();
                println!("depth {depth}");
                false
            }
            ":ascend" => {
                match self.runtime.env_mut().ascend() {
                    Ok(()) => println!("depth {}", self.runtime.env().depth()),
                    Err(err) => eprintln!("{err}"),
                }
                false
            }
            ":reset" => {
                self.runtime.reset();
                println!("Scope reset.");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    fn print_help(&self) {
        println!("Quill REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :clear          Clear the screen");
        println!("  :scope          Show the current scope");
        println!("  :descend        Enter a nested scope");
        println!("  :ascend         Leave the current nested scope");
        println!("  :reset          Forget all variables");
        println!();
        println!("You can enter:");
        println!("  - Arithmetic: 1 + 2 * 3, 2 ** -1, 7 % 4");
        println!("  - Assignment: x = 5; x += 1; x++");
        println!("  - Containers: o = {{'a': [1, 2]}}; o.a[0] = 3");
    }

    /// Evaluate one line. Prints each statement's value, or reports the
    /// first error. Returns the values printed when every statement succeeds.
    fn eval_input(&mut self, input: &str) -> Option<Vec<Value>> {
        let program = match tokenize(input).and_then(|tokens| parse(SOURCE_NAME, input, tokens)) {
            Ok(program) => program,
            Err(err) => {
                report_error(SOURCE_NAME, input, &err);
                return None;
            }
        };

        let mut values = Vec::with_capacity(program.statements.len());
        for stmt in &program.statements {
            match self.runtime.evaluate(stmt) {
                Ok(value) => {
                    println!("{value}");
                    values.push(value);
                }
                Err(err) => {
                    report_runtime_error(SOURCE_NAME, input, &err);
                    return None;
                }
            }
        }
        Some(values)
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
