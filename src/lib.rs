pub mod playground_frontend;
pub mod treewalk_interpreter;

use playground_frontend::errors::ParserError;
use treewalk_interpreter::{Interpreter, InterpreterError};

use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaygroundError {
    #[error("Syntax Error: {0}")]
    Parser(#[from] ParserError),
    #[error("Runtime Error: {0}")]
    Runtime(#[from] InterpreterError),
}

/// Runs a program, printing to stdout.
pub fn run_source(source: &str) -> Result<(), PlaygroundError> {
    run_source_with_output(source, std::io::stdout())
}

/// Runs a program, printing to `output`. Syntax errors are returned rather
/// than reported.
pub fn run_source_with_output<W: Write>(source: &str, output: W) -> Result<(), PlaygroundError> {
    let mut interpreter = Interpreter::new_with_output(output);
    interpreter.set_testing(true);
    interpreter.interp(source)
}
