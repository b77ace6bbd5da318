use super::span::CodePosition;
use std::str::Chars;

/// Sentinel returned once the source is exhausted.
pub const EOF_CHAR: char = '\0';

/// Single character lookahead over the source. `current()` is the next
/// character to be consumed.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    chars: Chars<'src>,
    current: char,
    position: CodePosition,
}

impl<'src> Cursor<'src> {
    /// Creates a character stream for the source string.
    pub fn new(source: &'src str) -> Self {
        let mut chars = source.chars();
        let current = chars.next().unwrap_or(EOF_CHAR);
        Cursor {
            chars,
            current,
            position: CodePosition::start(),
        }
    }

    /// Position of the current character.
    pub fn get_position(&self) -> CodePosition {
        self.position
    }

    pub fn current(&self) -> char {
        self.current
    }

    pub fn at_eof(&self) -> bool {
        self.current == EOF_CHAR
    }

    /// Advances past the current character and returns it.
    pub fn consume(&mut self) -> char {
        let ch = self.current;
        if ch == EOF_CHAR {
            return ch;
        }

        self.current = self.chars.next().unwrap_or(EOF_CHAR);
        if ch == '\n' {
            self.position.line_no += 1;
            self.position.column_no = 1;
        } else {
            self.position.column_no += 1;
        }

        ch
    }

    /// Consumes the current character if it equals target char.
    pub fn take_if(&mut self, target: char) -> bool {
        if !self.at_eof() && self.current == target {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Consumes characters as long as they meet condition, collecting them.
    /// At the end, the current character fails condition.
    pub fn take_while<F>(&mut self, buf: &mut String, condition: F)
    where
        F: Fn(char) -> bool,
    {
        while !self.at_eof() && condition(self.current) {
            buf.push(self.consume());
        }
    }

    /// Discards characters up to (not including) the next one meeting condition.
    pub fn skip_until<F>(&mut self, condition: F)
    where
        F: Fn(char) -> bool,
    {
        while !self.at_eof() && !condition(self.current) {
            self.consume();
        }
    }
}
