use super::token::{Token, TokenKind};

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Invalid character `{character}` on line {line}")]
    InvalidCharacter { character: char, line: usize },
    #[error(
        "A floating point number must have at least 1 digit after the dot: \
         `{text}` on line {line}"
    )]
    MalformedFloat { text: String, line: usize },
    #[error("Unterminated string starting on line {line}")]
    UnterminatedString { line: usize },
}

pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserErrorType {
    #[error("Expecting {expected}; found {found} on line {}", .found.line())]
    ExpectedToken { expected: TokenKind, found: Token },
    #[error("Expecting a statement; found {0} on line {}", .0.line())]
    ExpectedStatement(Token),
    #[error("Expecting {what}; found {found} on line {}", .found.line())]
    ExpectedExpression { what: &'static str, found: Token },
    #[error("Expecting {what}; found {found} on line {}", .found.line())]
    ExpectedOperator { what: &'static str, found: Token },
    #[error(
        "Failed to reach EOF before parsing halted. Last token retrieved: {0} on line {}",
        .0.line()
    )]
    TrailingInput(Token),
    #[error(transparent)]
    Lexer(#[from] LexError),
}

/// A parse failure plus the chain of grammar rules it travelled through,
/// outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    pub rules: Vec<&'static str>,
    pub error: ParserErrorType,
}

pub type ParserResult<T> = Result<T, ParserError>;

impl ParserError {
    pub fn new(error: ParserErrorType) -> Self {
        ParserError {
            rules: vec![],
            error,
        }
    }

    /// Records that the error passed out of grammar rule `rule`.
    pub fn in_rule(mut self, rule: &'static str) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Source line of the offending token, when there is one.
    pub fn line(&self) -> usize {
        match &self.error {
            ParserErrorType::ExpectedToken { found, .. }
            | ParserErrorType::ExpectedExpression { found, .. }
            | ParserErrorType::ExpectedOperator { found, .. } => found.line(),
            ParserErrorType::ExpectedStatement(found) | ParserErrorType::TrailingInput(found) => {
                found.line()
            }
            ParserErrorType::Lexer(LexError::InvalidCharacter { line, .. })
            | ParserErrorType::Lexer(LexError::MalformedFloat { line, .. })
            | ParserErrorType::Lexer(LexError::UnterminatedString { line }) => *line,
        }
    }
}

impl From<LexError> for ParserError {
    fn from(error: LexError) -> Self {
        ParserError::new(ParserErrorType::Lexer(error))
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rule in self.rules.iter() {
            write!(f, "rule `{}`: ", rule)?;
        }
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground_frontend::span::CodePosition;

    #[test]
    fn test_rule_chain_rendering() {
        let found = Token::new(TokenKind::EndOfFile, "<EOF>", CodePosition::new(3, 1));
        let error = ParserError::new(ParserErrorType::ExpectedToken {
            expected: TokenKind::Semicolon,
            found,
        })
        .in_rule("statement")
        .in_rule("statements");

        assert_eq!(error.rules, vec!["statements", "statement"]);
        assert_eq!(error.line(), 3);
        assert_eq!(
            error.to_string(),
            "rule `statements`: rule `statement`: \
             Expecting `;`; found <EndOfFile '<EOF>'> on line 3"
        );
    }
}
