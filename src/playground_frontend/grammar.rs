use super::token::{Token, TokenKind};

use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArithOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CompareOperator {
    EqualTo,
    LessThan,
    LessEq,
    GreaterThan,
    GreaterEq,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NodeKind {
    // Synthetic grouping nodes.
    Statements,
    ArgList,
    IdList,

    // Statements.
    Print,
    Import,
    Assign,
    If,
    Elif,
    While,
    Def,
    Class,
    Return,

    // Expressions.
    Call,
    Dot,
    Or,
    And,
    Compare(CompareOperator),
    Arith(ArithOperator),
    Name,
    Int,
    Float,
    Str,
    Bool,
}

/// A parse tree node. Real nodes carry the token they were built from;
/// synthetic nodes group children and carry a symbolic name instead.
/// Children are shared so function bodies can point into the tree.
#[derive(Debug, PartialEq, Clone)]
pub struct AstNode {
    pub kind: NodeKind,
    pub token: Option<Token>,
    pub children: Vec<Rc<AstNode>>,
}

impl ArithOperator {
    pub fn from_token(kind: TokenKind) -> Option<ArithOperator> {
        let op = match kind {
            TokenKind::Plus => ArithOperator::Add,
            TokenKind::Minus => ArithOperator::Subtract,
            TokenKind::Asterisk => ArithOperator::Multiply,
            TokenKind::Slash => ArithOperator::Divide,
            TokenKind::Percent => ArithOperator::Modulo,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &str {
        match self {
            ArithOperator::Add => "+",
            ArithOperator::Subtract => "-",
            ArithOperator::Multiply => "*",
            ArithOperator::Divide => "/",
            ArithOperator::Modulo => "%",
        }
    }
}

impl CompareOperator {
    pub fn from_token(kind: TokenKind) -> Option<CompareOperator> {
        let op = match kind {
            TokenKind::DoubleEq => CompareOperator::EqualTo,
            TokenKind::LeftAngle => CompareOperator::LessThan,
            TokenKind::LeftAngleEq => CompareOperator::LessEq,
            TokenKind::RightAngle => CompareOperator::GreaterThan,
            TokenKind::RightAngleEq => CompareOperator::GreaterEq,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &str {
        match self {
            CompareOperator::EqualTo => "==",
            CompareOperator::LessThan => "<",
            CompareOperator::LessEq => "<=",
            CompareOperator::GreaterThan => ">",
            CompareOperator::GreaterEq => ">=",
        }
    }
}

impl NodeKind {
    pub fn is_synthetic(&self) -> bool {
        self.synthetic_name().is_some()
    }

    pub fn synthetic_name(&self) -> Option<&'static str> {
        match self {
            NodeKind::Statements => Some("$STATEMENTS"),
            NodeKind::ArgList => Some("$ARG_LIST"),
            NodeKind::IdList => Some("$ID_LIST"),
            _ => None,
        }
    }
}

impl AstNode {
    /// Builds a node from a real token.
    pub fn new(kind: NodeKind, token: Token) -> Self {
        AstNode {
            kind,
            token: Some(token),
            children: vec![],
        }
    }

    /// Builds a tokenless grouping node.
    pub fn synthetic(kind: NodeKind) -> Self {
        debug_assert!(kind.is_synthetic());
        AstNode {
            kind,
            token: None,
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: Vec<AstNode>) -> Self {
        self.children.extend(children.into_iter().map(Rc::new));
        self
    }

    pub fn add_child(&mut self, child: AstNode) {
        self.children.push(Rc::new(child));
    }

    pub fn is_synthetic(&self) -> bool {
        self.token.is_none()
    }

    pub fn synthetic_name(&self) -> Option<&'static str> {
        self.kind.synthetic_name()
    }

    /// Literal text of the node's token; synthetic nodes have none.
    pub fn text(&self) -> &str {
        self.token.as_ref().map_or("", |t| t.text.as_str())
    }

    pub fn child(&self, index: usize) -> Option<&AstNode> {
        self.children.get(index).map(|c| c.as_ref())
    }

    /// A handle on a child that outlives borrows of this node.
    pub fn shared_child(&self, index: usize) -> Option<Rc<AstNode>> {
        self.children.get(index).cloned()
    }

    /// Renders the tree as an s-expression over the original token text,
    /// so independently built trees can be compared structurally.
    pub fn ast_string(&self) -> String {
        let head = match (&self.token, self.synthetic_name()) {
            (Some(token), _) if self.kind == NodeKind::Str => format!("\"{}\"", token.text),
            (Some(token), _) => token.text.clone(),
            (None, Some(name)) => name.to_owned(),
            (None, None) => String::new(),
        };

        if self.children.is_empty() {
            return head;
        }

        let children: Vec<_> = self.children.iter().map(|c| c.ast_string()).collect();
        format!("({} {})", head, children.join(" "))
    }

    /// Token text of the subtree in source order. Synthetic nodes add
    /// nothing of their own.
    pub fn tokens(&self) -> Vec<&str> {
        let mut out = vec![];
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self.children.split_first() {
            // Binary operators sit between their operands.
            Some((lhs, rest)) if self.is_infix() => {
                lhs.collect_tokens(out);
                out.push(self.text());
                for child in rest {
                    child.collect_tokens(out);
                }
            }
            _ => {
                if let Some(token) = &self.token {
                    out.push(&token.text);
                }
                for child in self.children.iter() {
                    child.collect_tokens(out);
                }
            }
        }
    }

    fn is_infix(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Assign
                | NodeKind::Dot
                | NodeKind::Or
                | NodeKind::And
                | NodeKind::Compare(_)
                | NodeKind::Arith(_)
        )
    }

    /// Indented, one node per line dump used by diagnostics.
    pub fn to_string_tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, tab: usize) {
        out.push_str(&"| ".repeat(tab));
        match (&self.token, self.synthetic_name()) {
            (None, Some(name)) => out.push_str(&format!("<AST: ARTIFICIAL - {}>", name)),
            (Some(token), _) => out.push_str(&format!("<AST: {}>", token)),
            (None, None) => out.push_str("<AST: ?>"),
        }
        out.push('\n');

        for child in self.children.iter() {
            child.write_tree(out, tab + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground_frontend::span::CodePosition;
    use crate::playground_frontend::{Lexer, Parser};

    fn leaf(kind: NodeKind, token_kind: TokenKind, text: &str) -> AstNode {
        AstNode::new(kind, Token::new(token_kind, text, CodePosition::default()))
    }

    #[test]
    fn test_synthetic_nodes() {
        let node = AstNode::synthetic(NodeKind::ArgList);
        assert!(node.is_synthetic());
        assert_eq!(node.synthetic_name(), Some("$ARG_LIST"));
        assert_eq!(node.text(), "");

        let name = leaf(NodeKind::Name, TokenKind::Name, "foo");
        assert!(!name.is_synthetic());
        assert_eq!(name.synthetic_name(), None);
    }

    #[test]
    fn test_ast_string() {
        let product = leaf(
            NodeKind::Arith(ArithOperator::Multiply),
            TokenKind::Asterisk,
            "*",
        )
        .with_children(vec![
            leaf(NodeKind::Int, TokenKind::Int, "5"),
            leaf(NodeKind::Float, TokenKind::Float, "2.5"),
        ]);
        let sum = leaf(NodeKind::Arith(ArithOperator::Add), TokenKind::Plus, "+")
            .with_children(vec![leaf(NodeKind::Name, TokenKind::Name, "a"), product]);

        assert_eq!(sum.ast_string(), "(+ a (* 5 2.5))");

        let print = leaf(NodeKind::Print, TokenKind::Print, "print").with_children(vec![
            AstNode::synthetic(NodeKind::ArgList)
                .with_children(vec![leaf(NodeKind::Str, TokenKind::String, "hi")]),
        ]);
        assert_eq!(print.ast_string(), "(print ($ARG_LIST \"hi\"))");
    }

    #[test]
    fn test_tokens_follow_source_order() {
        let sum = leaf(NodeKind::Arith(ArithOperator::Add), TokenKind::Plus, "+")
            .with_children(vec![
                leaf(NodeKind::Name, TokenKind::Name, "a"),
                leaf(NodeKind::Int, TokenKind::Int, "1"),
            ]);
        let assign = leaf(NodeKind::Assign, TokenKind::Assign, "=")
            .with_children(vec![leaf(NodeKind::Name, TokenKind::Name, "b"), sum]);
        assert_eq!(assign.tokens(), vec!["b", "=", "a", "+", "1"]);
    }

    #[test]
    fn test_parsed_tokens_match_source() {
        let source = "
            import \"lib.plgd\";
            def add(a, b) { return a + b; }
            Class P { n = 2; }
            x = add(1, 2.5) * (3 - y);
            while x > 0 { x = x - 1; }
            if x < 10 and k.Add(f) { print(\"lo\", x); } elif x == 4 or True { p.q = 1; }
        ";
        let root = Parser::new(source).parse().unwrap();

        let punctuation = [
            TokenKind::Semicolon,
            TokenKind::Comma,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::LeftBrace,
            TokenKind::RightBrace,
            TokenKind::EndOfFile,
        ];
        let lexed: Vec<String> = Lexer::new(source)
            .iter()
            .map(|t| t.unwrap())
            .filter(|t| !punctuation.contains(&t.kind))
            .map(|t| t.text)
            .collect();

        assert_eq!(root.tokens(), lexed);
    }

    #[test]
    fn test_string_tree() {
        let node = AstNode::synthetic(NodeKind::Statements)
            .with_children(vec![leaf(NodeKind::Name, TokenKind::Name, "x")]);
        assert_eq!(
            node.to_string_tree(),
            "<AST: ARTIFICIAL - $STATEMENTS>\n| <AST: <Name 'x'>>\n"
        );
    }
}
