use super::object::Value;
use crate::playground_frontend::errors::ParserError;
use crate::playground_frontend::grammar::{ArithOperator, CompareOperator};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InterpreterError {
    #[error("NameError: Symbol {0} could not be found!")]
    UndefinedName(String),
    #[error("AttributeError: {instance} has no member `{name}`")]
    MissingAttribute { instance: String, name: String },
    #[error("ArityError: {name}() called with {found} arguments, {}", describe_arities(.expected))]
    WrongArity {
        name: String,
        expected: Vec<usize>,
        found: usize,
    },
    #[error("`this` used outside of a class instance")]
    ThisOutsideInstance,
    #[error("`{0}` is not callable")]
    NotCallable(String),
    #[error("`{0}` is not a class or instance")]
    NotAnInstance(String),
    #[error("Unsupported operand types for {}: {1} and {2}", .0.symbol())]
    IllegalInfixOperation(ArithOperator, Value, Value),
    #[error("Cannot compare {1} {} {2}", .0.symbol())]
    IllegalComparison(CompareOperator, Value, Value),
    #[error("Division by zero")]
    DivideByZero,
    #[error("Integer overflow in {}", .0.symbol())]
    IntegerOverflow(ArithOperator),
    #[error("Repeated string of {0} bytes is too long")]
    StringTooLong(usize),
    #[error("Literal `{0}` is out of range")]
    InvalidLiteral(String),
    #[error("Class `{0}` contains itself and cannot be copied")]
    CyclicClass(String),
    #[error("Could not read import `{path}`: {reason}")]
    ImportRead { path: String, reason: String },
    #[error("Syntax error in import `{path}`: {error}")]
    ImportSyntax { path: String, error: ParserError },
    #[error("Could not write output: {0}")]
    Output(String),
    #[error("Node {0} not handled")]
    UnsupportedOperation(String),
}

pub type RuntimeResult<T> = Result<T, InterpreterError>;

fn describe_arities(expected: &[usize]) -> String {
    match expected {
        [] => "but nothing callable is defined".to_owned(),
        [arity] => format!("expected {}", arity),
        _ => {
            let arities: Vec<_> = expected.iter().map(|a| a.to_string()).collect();
            format!("expected one of {}", arities.join(", "))
        }
    }
}

impl From<std::io::Error> for InterpreterError {
    fn from(error: std::io::Error) -> Self {
        InterpreterError::Output(error.to_string())
    }
}
