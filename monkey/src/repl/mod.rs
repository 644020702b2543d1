//! REPL (Read-Eval-Print Loop) for Monkey

use crate::error::{report_error, Error};
use crate::interp::{Interpreter, Value};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = ".. ";
const HISTORY_FILE: &str = ".monkey_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
    /// Lines of an input whose brackets are not yet balanced
    pending: String,
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let interpreter = Interpreter::new();

        // Try to find history file in home directory
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter,
            history_path,
            pending: String::new(),
        };

        // Load history if available
        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Monkey REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            let prompt = if self.pending.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() && self.pending.is_empty() {
                        continue;
                    }

                    // Add to history
                    let _ = self.editor.add_history_entry(trimmed);

                    // Handle commands
                    if self.pending.is_empty() && trimmed.starts_with(':') {
                        if self.handle_command(trimmed) {
                            break;
                        }
                        continue;
                    }

                    self.pending.push_str(&line);
                    self.pending.push('\n');
                    if needs_more_input(&self.pending) {
                        continue;
                    }

                    let input = std::mem::take(&mut self.pending);
                    match self.eval_input(&input) {
                        Ok(Some(output)) => println!("{output}"),
                        Ok(None) => {}
                        Err(err) => report_error("<repl>", &input, &err),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.pending.clear();
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

        // Save history
        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
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
            ":env" => {
                let env = self.interpreter.global_env().borrow();
                let mut names: Vec<_> = env.bindings().iter().collect();
                names.sort_by(|a, b| a.0.cmp(b.0));
                for (name, value) in names {
                    println!("  {name} = {value}");
                }
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    /// Print help message
    fn print_help(&self) {
        println!("Monkey REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :env            List global bindings");
        println!("  :clear          Clear the screen");
        println!();
        println!("You can enter:");
        println!("  - Bindings: let a = [1, 2, 3];");
        println!("  - Expressions: a.map(fn(x) {{ x * 2 }})");
        println!("  - Several lines, while brackets are open");
        println!();
        println!("Array methods:");
        println!("  len empty first/head last tail/rest count includes index");
        println!("  push unshift pop shift merge map filter/grep reduce");
        println!();
        println!("Built-in functions:");
        println!("  puts(x, ...)    Print each value on its own line");
        println!("  len(x)          Length of a string or array");
        println!("  type(x)         Type name of a value");
        println!("  to_json(a)      Encode an array as JSON text");
        println!("  from_json(s)    Decode JSON text into an array");
    }

    /// Evaluate one complete input; bindings persist between inputs
    ///
    /// Returns the rendered value, or `None` for nil.
    fn eval_input(&mut self, input: &str) -> Result<Option<String>, Error> {
        let value = self.interpreter.run_source(input)?;
        Ok(match value {
            Value::Nil => None,
            Value::Str(s) => Some(format!("{s:?}")),
            other => Some(other.to_string()),
        })
    }
}

/// Whether `source` has unclosed brackets outside string literals
fn needs_more_input(source: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' if in_string => {
                chars.next();
            }
            '"' => in_string = !in_string,
            '(' | '[' | '{' if !in_string => depth += 1,
            ')' | ']' | '}' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth > 0
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_new() {
        let repl = Repl::new();
        assert!(repl.is_ok());
    }

    #[test]
    fn test_handle_command_quit() {
        let mut repl = Repl::new().unwrap();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
    }

    #[test]
    fn test_handle_command_non_exiting() {
        let mut repl = Repl::new().unwrap();
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":env"));
        assert!(!repl.handle_command(":unknown"));
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, ">> ");
        assert_eq!(HISTORY_FILE, ".monkey_history");
    }

    #[test]
    fn test_eval_input_persists_bindings() {
        let mut repl = Repl::new().unwrap();
        assert_eq!(repl.eval_input("let a = [1, 2];").unwrap(), None);
        assert_eq!(repl.eval_input("a.push(3);").unwrap().as_deref(), Some("[1, 2, 3]"));
        assert_eq!(repl.eval_input("a.len()").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_eval_input_quotes_strings() {
        let mut repl = Repl::new().unwrap();
        assert_eq!(repl.eval_input(r#""hi""#).unwrap().as_deref(), Some(r#""hi""#));
    }

    #[test]
    fn test_eval_input_errors() {
        let mut repl = Repl::new().unwrap();
        assert!(matches!(repl.eval_input("let = 1;"), Err(Error::Parser { .. })));
        assert!(matches!(repl.eval_input("[].pop()"), Err(Error::Runtime(_))));
    }

    #[test]
    fn test_needs_more_input() {
        assert!(needs_more_input("let f = fn(x) {"));
        assert!(needs_more_input("[1,\n2"));
        assert!(!needs_more_input("let f = fn(x) { x };"));
        assert!(!needs_more_input(r#"puts("{")"#));
        assert!(!needs_more_input(r#"puts("\"{")"#));
    }

    #[test]
    fn test_dirs_home_returns_some() {
        // HOME (or USERPROFILE) is set in test environments
        let home = dirs_home();
        assert!(home.is_some());
    }
}
