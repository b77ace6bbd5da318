use super::errors::{LexResult, ParserError, ParserResult};
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

/// Number of tokens of lookahead the grammar needs.
pub const LOOKAHEAD: usize = 4;

/// Fixed-size circular cache of upcoming tokens pulled from the lexer.
/// Lexical errors are buffered like tokens and only surface when the
/// parser actually looks at them.
pub struct LookaheadBuffer<'s> {
    lexer: Lexer<'s>,
    buffer: Vec<LexResult<Token>>,
    p: usize,
}

impl<'s> LookaheadBuffer<'s> {
    pub fn new(mut lexer: Lexer<'s>, k: usize) -> Self {
        assert!(k > 0, "lookahead buffer needs at least one slot");
        let buffer = (0..k).map(|_| lexer.next_token()).collect();
        LookaheadBuffer {
            lexer,
            buffer,
            p: 0,
        }
    }

    pub fn k(&self) -> usize {
        self.buffer.len()
    }

    /// Replaces the oldest token with a fresh one from the lexer.
    pub fn consume(&mut self) {
        let k = self.k();
        self.buffer[self.p] = self.lexer.next_token();
        self.p = (self.p + 1) % k;
    }

    /// The i'th lookahead token, 1-based.
    pub fn lt(&self, i: usize) -> ParserResult<&Token> {
        debug_assert!(i >= 1 && i <= self.k());
        let k = self.k();
        match &self.buffer[(self.p + i - 1) % k] {
            Ok(token) => Ok(token),
            Err(e) => Err(ParserError::from(e.clone())),
        }
    }

    /// Kind of the i'th lookahead token, 1-based.
    pub fn la(&self, i: usize) -> ParserResult<TokenKind> {
        self.lt(i).map(|t| t.kind)
    }
}
