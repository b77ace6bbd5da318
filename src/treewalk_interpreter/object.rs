use super::errors::{InterpreterError, RuntimeResult};
use super::function::OverloadSet;
use super::scope::Scope;
use crate::playground_frontend::grammar::{ArithOperator, CompareOperator};

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Overloads(OverloadSet),
    Class(Scope),
    None,
}

/// Numeric view of a value. Booleans count as 0 and 1.
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn to_float(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Bool(b) => Some(Number::Int(*b as i64)),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Overloads(_) | Value::Class(_) => true,
        }
    }

    /// Equality the way `==` sees it: numbers compare by value across
    /// int, float and bool, everything else by kind and contents.
    pub fn equals(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(a), Number::Int(b)) => a == b,
                (a, b) => a.to_float() == b.to_float(),
            };
        }

        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Overloads(a), Value::Overloads(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            _ => false,
        }
    }

    pub fn apply_arith(op: ArithOperator, lhs: Value, rhs: Value) -> RuntimeResult<Value> {
        match op {
            ArithOperator::Add => match (lhs, rhs) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (a, b) => numerical_binop(op, a, b, i64::checked_add, |a, b| a + b),
            },
            ArithOperator::Subtract => {
                numerical_binop(op, lhs, rhs, i64::checked_sub, |a, b| a - b)
            }
            ArithOperator::Multiply => match (lhs, rhs) {
                (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                    repeat_string(op, &s, n)
                }
                (Value::Str(s), Value::Bool(b)) | (Value::Bool(b), Value::Str(s)) => {
                    repeat_string(op, &s, b as i64)
                }
                (a, b) => numerical_binop(op, a, b, i64::checked_mul, |a, b| a * b),
            },
            ArithOperator::Divide => match (lhs.as_number(), rhs.as_number()) {
                (Some(a), Some(b)) => {
                    let divisor = b.to_float();
                    if divisor == 0.0 {
                        Err(InterpreterError::DivideByZero)
                    } else {
                        Ok(Value::Float(a.to_float() / divisor))
                    }
                }
                _ => Err(InterpreterError::IllegalInfixOperation(op, lhs, rhs)),
            },
            ArithOperator::Modulo => match (lhs.as_number(), rhs.as_number()) {
                (Some(Number::Int(_)), Some(Number::Int(0))) => Err(InterpreterError::DivideByZero),
                (Some(Number::Int(a)), Some(Number::Int(b))) => a
                    .checked_rem(b)
                    .map(|r| Value::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
                    .ok_or(InterpreterError::IntegerOverflow(op)),
                (Some(a), Some(b)) => {
                    let (a, b) = (a.to_float(), b.to_float());
                    if b == 0.0 {
                        return Err(InterpreterError::DivideByZero);
                    }
                    let r = a % b;
                    Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
                }
                _ => Err(InterpreterError::IllegalInfixOperation(op, lhs, rhs)),
            },
        }
    }

    pub fn apply_compare(op: CompareOperator, lhs: Value, rhs: Value) -> RuntimeResult<Value> {
        if op == CompareOperator::EqualTo {
            return Ok(Value::Bool(lhs.equals(&rhs)));
        }

        let ordering = match (lhs.as_number(), rhs.as_number()) {
            (Some(Number::Int(a)), Some(Number::Int(b))) => Some(a.cmp(&b)),
            (Some(a), Some(b)) => a.to_float().partial_cmp(&b.to_float()),
            _ => match (&lhs, &rhs) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => return Err(InterpreterError::IllegalComparison(op, lhs, rhs)),
            },
        };

        // NaN compares false against everything.
        let result = match ordering {
            None => false,
            Some(ordering) => match op {
                CompareOperator::LessThan => ordering == Ordering::Less,
                CompareOperator::LessEq => ordering != Ordering::Greater,
                CompareOperator::GreaterThan => ordering == Ordering::Greater,
                CompareOperator::GreaterEq => ordering != Ordering::Less,
                CompareOperator::EqualTo => ordering == Ordering::Equal,
            },
        };
        Ok(Value::Bool(result))
    }

    /// Representation used inside attribute listings, where strings are
    /// quoted.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s),
            other => other.to_string(),
        }
    }
}

/// Longest string `*` may build.
const MAX_REPEAT_LEN: usize = 1 << 30;

fn repeat_string(op: ArithOperator, s: &str, count: i64) -> RuntimeResult<Value> {
    // Non-positive counts give the empty string.
    let count = usize::try_from(count.max(0)).map_err(|_| InterpreterError::IntegerOverflow(op))?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(count))),
        Some(len) => Err(InterpreterError::StringTooLong(len)),
        None => Err(InterpreterError::IntegerOverflow(op)),
    }
}

fn numerical_binop<I, F>(
    op: ArithOperator,
    lhs: Value,
    rhs: Value,
    int_func: I,
    float_func: F,
) -> RuntimeResult<Value>
where
    I: Fn(i64, i64) -> Option<i64>,
    F: Fn(f64, f64) -> f64,
{
    match (lhs.as_number(), rhs.as_number()) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => int_func(a, b)
            .map(Value::Int)
            .ok_or(InterpreterError::IntegerOverflow(op)),
        (Some(a), Some(b)) => Ok(Value::Float(float_func(a.to_float(), b.to_float()))),
        _ => Err(InterpreterError::IllegalInfixOperation(op, lhs, rhs)),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_owned()
    } else if f.is_infinite() {
        let sign = if f < 0.0 { "-" } else { "" };
        format!("{}inf", sign)
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Overloads(set) => write!(f, "{}", set),
            Value::Class(scope) => write!(f, "{}", scope),
            Value::None => write!(f, "None"),
        }
    }
}
