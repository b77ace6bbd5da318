use super::cursor::Cursor;
use super::errors::{LexError, LexResult};
use super::token::{Token, TokenKind};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer from source.
    pub fn new(source: &'src str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
        }
    }

    /// Returns the next token. Keeps returning `EndOfFile` once the source
    /// is exhausted.
    pub fn next_token(&mut self) -> LexResult<Token> {
        loop {
            match self.cursor.current() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.consume();
                }
                '#' => self.consume_line(),
                _ => break,
            }
        }

        let start_pos = self.cursor.get_position();
        if self.cursor.at_eof() {
            return Ok(Token::new(TokenKind::EndOfFile, "<EOF>", start_pos));
        }

        let ch = self.cursor.current();
        let kind = match ch {
            // Single-character tokens.
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,

            // Potentially two character tokens.
            '=' => return Ok(self.look_for_eq_sign(TokenKind::Assign, TokenKind::DoubleEq)),
            '<' => return Ok(self.look_for_eq_sign(TokenKind::LeftAngle, TokenKind::LeftAngleEq)),
            '>' => {
                return Ok(self.look_for_eq_sign(TokenKind::RightAngle, TokenKind::RightAngleEq))
            }

            '"' => return self.lex_string(),
            _ if is_digit_char(ch) => return self.lex_number(),
            _ if is_name_start_char(ch) => return Ok(self.lex_name_or_kw()),

            _ => {
                return Err(LexError::InvalidCharacter {
                    character: ch,
                    line: start_pos.line_no,
                })
            }
        };

        let text = self.cursor.consume().to_string();
        Ok(Token::new(kind, text, start_pos))
    }

    fn consume_line(&mut self) {
        self.cursor.skip_until(|ch| ch == '\n');
        // Consume newline char.
        self.cursor.consume();
    }

    /// Consumes the current char, then checks if next char is '='. If so,
    /// consume it too and return t2. Otherwise, return t1.
    fn look_for_eq_sign(&mut self, t1: TokenKind, t2: TokenKind) -> Token {
        let start_pos = self.cursor.get_position();
        let mut text = self.cursor.consume().to_string();

        let kind = if self.cursor.take_if('=') {
            text.push('=');
            t2
        } else {
            t1
        };
        Token::new(kind, text, start_pos)
    }

    /// Scans string up to next '"'. No escape sequences are processed.
    fn lex_string(&mut self) -> LexResult<Token> {
        let start_pos = self.cursor.get_position();
        // Discard the opening quote.
        self.cursor.consume();

        let mut text = String::new();
        self.cursor.take_while(&mut text, |ch| ch != '"');

        if !self.cursor.take_if('"') {
            return Err(LexError::UnterminatedString {
                line: start_pos.line_no,
            });
        }

        Ok(Token::new(TokenKind::String, text, start_pos))
    }

    /// Scans an integer, promoting it to a float on a '.' followed by digits.
    fn lex_number(&mut self) -> LexResult<Token> {
        let start_pos = self.cursor.get_position();
        let mut text = String::new();
        self.cursor.take_while(&mut text, is_digit_char);

        if self.cursor.current() != '.' {
            return Ok(Token::new(TokenKind::Int, text, start_pos));
        }

        text.push(self.cursor.consume());
        let int_len = text.len();
        self.cursor.take_while(&mut text, is_digit_char);

        if text.len() == int_len {
            return Err(LexError::MalformedFloat {
                text,
                line: start_pos.line_no,
            });
        }

        Ok(Token::new(TokenKind::Float, text, start_pos))
    }

    /// Scan up to end of lexeme and return it as a name. Checks for keywords.
    fn lex_name_or_kw(&mut self) -> Token {
        let start_pos = self.cursor.get_position();
        let mut text = String::new();
        self.cursor.take_while(&mut text, is_name_char);

        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Name);
        Token::new(kind, text, start_pos)
    }

    /// Returns an iterator version of lexer.
    pub fn iter(self) -> LexerIterator<'src> {
        LexerIterator {
            lexer: self,
            done: false,
        }
    }
}

/// Yields every token up to, but not including, `EndOfFile`. Stops after
/// the first lexical error.
pub struct LexerIterator<'src> {
    lexer: Lexer<'src>,
    done: bool,
}

impl<'src> Iterator for LexerIterator<'src> {
    type Item = LexResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.lexer.next_token() {
            Ok(token) if token.kind == TokenKind::EndOfFile => {
                self.done = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn is_digit_char(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_name_start_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_lexed_kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .iter()
            .map(|r| r.unwrap().kind)
            .collect()
    }

    fn get_lexed_text(source: &str) -> Vec<String> {
        Lexer::new(source)
            .iter()
            .map(|r| r.unwrap().text)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            get_lexed_kinds("+-*/ = % == < <= > >="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Assign,
                TokenKind::Percent,
                TokenKind::DoubleEq,
                TokenKind::LeftAngle,
                TokenKind::LeftAngleEq,
                TokenKind::RightAngle,
                TokenKind::RightAngleEq,
            ]
        );
    }

    #[test]
    fn test_keywords_and_names() {
        assert_eq!(
            get_lexed_kinds("def print True False and or if elif else while Class return import"),
            vec![
                TokenKind::Def,
                TokenKind::Print,
                TokenKind::True,
                TokenKind::False,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::If,
                TokenKind::Elif,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Class,
                TokenKind::Return,
                TokenKind::Import,
            ]
        );

        assert_eq!(
            get_lexed_text("underscored_name _x1 x_1_ this"),
            vec!["underscored_name", "_x1", "x_1_", "this"]
        );
        assert_eq!(get_lexed_kinds("this"), vec![TokenKind::Name]);
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<_> = Lexer::new("1 11 5.0 3.25")
            .iter()
            .map(|r| r.unwrap())
            .collect();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        let text: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float
            ]
        );
        assert_eq!(text, vec!["1", "11", "5.0", "3.25"]);
    }

    #[test]
    fn test_strings_are_raw() {
        assert_eq!(
            get_lexed_text(r#""A test string: 10 9, ; .ouauht." "a\n""#),
            vec!["A test string: 10 9, ; .ouauht.", r"a\n"]
        );
    }

    #[test]
    fn test_comments_and_lines() {
        let mut lexer = Lexer::new("# a comment\n\n  foo # trailing\nbar");
        let foo = lexer.next_token().unwrap();
        assert_eq!(foo.text, "foo");
        assert_eq!(foo.line(), 3);
        assert_eq!(foo.position.column_no, 3);

        let bar = lexer.next_token().unwrap();
        assert_eq!(bar.line(), 4);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfFile);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(
            Lexer::new("a = 5.;").iter().last(),
            Some(Err(LexError::MalformedFloat {
                text: "5.".to_owned(),
                line: 1
            }))
        );
        assert_eq!(
            Lexer::new("\n a ! b").iter().last(),
            Some(Err(LexError::InvalidCharacter {
                character: '!',
                line: 2
            }))
        );
        assert_eq!(
            Lexer::new("\"never closed").next_token(),
            Err(LexError::UnterminatedString { line: 1 })
        );
    }
}
