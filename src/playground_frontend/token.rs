use super::span::CodePosition;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    // Punctuation.
    Semicolon,
    Comma,
    Dot,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    // Operators.
    Assign,
    DoubleEq,
    LeftAngle,
    LeftAngleEq,
    RightAngle,
    RightAngleEq,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,

    // Literals.
    Int,
    Float,
    String,
    True,
    False,
    Name,

    // Keywords.
    Def,
    Print,
    And,
    Or,
    If,
    Elif,
    Else,
    While,
    Class,
    Return,
    Import,

    EndOfFile,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: CodePosition,
}

impl TokenKind {
    /// Maps reserved words onto their keyword kinds.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "def" => TokenKind::Def,
            "print" => TokenKind::Print,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "Class" => TokenKind::Class,
            "return" => TokenKind::Return,
            "import" => TokenKind::Import,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether a token of this kind can start an expression.
    pub fn starts_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen
                | TokenKind::Name
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Whether a token of this kind can start a statement.
    pub fn starts_statement(&self) -> bool {
        self.starts_expression()
            || matches!(
                self,
                TokenKind::Print
                    | TokenKind::LeftBrace
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Def
                    | TokenKind::Class
                    | TokenKind::Return
                    | TokenKind::Import
            )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::Assign => "`=`",
            TokenKind::DoubleEq => "`==`",
            TokenKind::LeftAngle => "`<`",
            TokenKind::LeftAngleEq => "`<=`",
            TokenKind::RightAngle => "`>`",
            TokenKind::RightAngleEq => "`>=`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Asterisk => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::String => "string",
            TokenKind::True => "`True`",
            TokenKind::False => "`False`",
            TokenKind::Name => "name",
            TokenKind::Def => "`def`",
            TokenKind::Print => "`print`",
            TokenKind::And => "`and`",
            TokenKind::Or => "`or`",
            TokenKind::If => "`if`",
            TokenKind::Elif => "`elif`",
            TokenKind::Else => "`else`",
            TokenKind::While => "`while`",
            TokenKind::Class => "`Class`",
            TokenKind::Return => "`return`",
            TokenKind::Import => "`import`",
            TokenKind::EndOfFile => "end of file",
        };
        f.write_str(name)
    }
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: CodePosition) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn line(&self) -> usize {
        self.position.line_no
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{:?} '{}'>", self.kind, self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(TokenKind::keyword("Class"), Some(TokenKind::Class));
        assert_eq!(TokenKind::keyword("True"), Some(TokenKind::True));
        assert_eq!(TokenKind::keyword("class"), None);
        assert_eq!(TokenKind::keyword("this"), None);
    }

    #[test]
    fn test_statement_starts() {
        assert!(TokenKind::Import.starts_statement());
        assert!(TokenKind::String.starts_expression());
        assert!(!TokenKind::Else.starts_statement());
        assert!(!TokenKind::Print.starts_expression());
    }
}
