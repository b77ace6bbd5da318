use super::errors::{ParserError, ParserErrorType, ParserResult};
use super::grammar::{ArithOperator, AstNode, CompareOperator, NodeKind};
use super::lexer::Lexer;
use super::parser_utils::{LookaheadBuffer, LOOKAHEAD};
use super::token::{Token, TokenKind};

use log::{debug, error, trace};

/// LL(4) recursive descent parser. Every grammar rule annotates errors
/// passing through it with its own name.
pub struct Parser<'s> {
    input: LookaheadBuffer<'s>,
    testing: bool,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Self {
        Parser {
            input: LookaheadBuffer::new(Lexer::new(source), LOOKAHEAD),
            testing: false,
        }
    }

    /// In testing mode `program` hands syntax errors back to the caller
    /// instead of reporting them.
    pub fn set_testing(&mut self, testing: bool) {
        self.testing = testing;
    }

    /// Parses a whole document. A syntax error is reported on stderr and
    /// yields no tree, unless the parser is in testing mode.
    pub fn program(&mut self) -> ParserResult<Option<AstNode>> {
        match self.parse_program() {
            Ok(root) => Ok(Some(root)),
            Err(e) if self.testing => Err(e),
            Err(e) => {
                error!("syntax error: {}", e);
                eprintln!("Syntax Error: {}", e);
                Ok(None)
            }
        }
    }

    /// Parses a whole document, always propagating errors.
    pub fn parse(mut self) -> ParserResult<AstNode> {
        self.parse_program()
    }

    fn parse_program(&mut self) -> ParserResult<AstNode> {
        debug!("Beginning parse phase");
        let root = self.statements()?;

        if self.la(1)? != TokenKind::EndOfFile {
            return Err(ParserError::new(ParserErrorType::TrailingInput(
                self.lt(1)?.clone(),
            )));
        }

        debug!("Parsed {} top level statements", root.children.len());
        Ok(root)
    }

    /// Runs a grammar rule, tagging any error that escapes it.
    fn rule<T, F>(&mut self, name: &'static str, parse: F) -> ParserResult<T>
    where
        F: FnOnce(&mut Parser<'s>) -> ParserResult<T>,
    {
        trace!("Entering rule {}", name);
        parse(self).map_err(|e| e.in_rule(name))
    }

    fn lt(&self, i: usize) -> ParserResult<&Token> {
        self.input.lt(i)
    }

    fn la(&self, i: usize) -> ParserResult<TokenKind> {
        self.input.la(i)
    }

    /// Consumes the current token, asserting it has the expected kind.
    fn match_kind(&mut self, expected: TokenKind) -> ParserResult<Token> {
        let token = self.lt(1)?.clone();
        if token.kind != expected {
            return Err(ParserError::new(ParserErrorType::ExpectedToken {
                expected,
                found: token,
            }));
        }

        self.input.consume();
        Ok(token)
    }

    /// Consumes the current token and builds a leaf node from it.
    fn match_node(&mut self, expected: TokenKind, kind: NodeKind) -> ParserResult<AstNode> {
        let token = self.match_kind(expected)?;
        Ok(AstNode::new(kind, token))
    }

    fn expect_expression_start(&self, what: &'static str) -> ParserResult<()> {
        let token = self.lt(1)?;
        if token.kind.starts_expression() {
            Ok(())
        } else {
            Err(ParserError::new(ParserErrorType::ExpectedExpression {
                what,
                found: token.clone(),
            }))
        }
    }

    fn statements(&mut self) -> ParserResult<AstNode> {
        self.rule("statements", |this| {
            let mut root = AstNode::synthetic(NodeKind::Statements);
            while this.la(1)?.starts_statement() {
                root.add_child(this.statement()?);
            }
            Ok(root)
        })
    }

    fn statement(&mut self) -> ParserResult<AstNode> {
        self.rule("statement", |this| {
            let node = match this.la(1)? {
                TokenKind::Print => this.print_stat()?,
                TokenKind::Class => this.class_def()?,
                TokenKind::Def => this.func_def()?,
                TokenKind::Return => this.return_stat()?,
                TokenKind::Import => this.import_stat()?,
                TokenKind::LeftBrace => this.block()?,
                TokenKind::Name if this.is_assignment()? => this.assign()?,
                kind if kind.starts_expression() => {
                    let expr = this.bool_expr()?;
                    this.match_kind(TokenKind::Semicolon)?;
                    expr
                }
                TokenKind::If => this.if_stat()?,
                TokenKind::While => this.while_stat()?,
                _ => {
                    return Err(ParserError::new(ParserErrorType::ExpectedStatement(
                        this.lt(1)?.clone(),
                    )))
                }
            };
            Ok(node)
        })
    }

    /// Scans past an optional dotted prefix looking for `=`.
    fn is_assignment(&self) -> ParserResult<bool> {
        Ok(match self.la(2)? {
            TokenKind::Assign => true,
            TokenKind::Dot => {
                self.la(3)? == TokenKind::Name && self.la(4)? == TokenKind::Assign
            }
            _ => false,
        })
    }

    fn print_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("print", |this| {
            let mut root = this.match_node(TokenKind::Print, NodeKind::Print)?;
            this.match_kind(TokenKind::LeftParen)?;
            root.add_child(this.arg_list()?);
            this.match_kind(TokenKind::RightParen)?;
            this.match_kind(TokenKind::Semicolon)?;
            Ok(root)
        })
    }

    fn import_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("import", |this| {
            let mut root = this.match_node(TokenKind::Import, NodeKind::Import)?;
            root.add_child(this.match_node(TokenKind::String, NodeKind::Str)?);
            this.match_kind(TokenKind::Semicolon)?;
            Ok(root)
        })
    }

    fn arg_list(&mut self) -> ParserResult<AstNode> {
        self.rule("arg_list", |this| {
            let mut root = AstNode::synthetic(NodeKind::ArgList);

            // An argument list can be empty.
            if this.la(1)?.starts_expression() {
                root.add_child(this.bool_expr()?);
                while this.la(1)? == TokenKind::Comma {
                    this.match_kind(TokenKind::Comma)?;
                    root.add_child(this.bool_expr()?);
                }
            }

            Ok(root)
        })
    }

    fn id_list(&mut self) -> ParserResult<AstNode> {
        self.rule("id_list", |this| {
            let mut root = AstNode::synthetic(NodeKind::IdList);

            if this.la(1)? == TokenKind::Name {
                root.add_child(this.match_node(TokenKind::Name, NodeKind::Name)?);
                while this.la(1)? == TokenKind::Comma {
                    this.match_kind(TokenKind::Comma)?;
                    root.add_child(this.match_node(TokenKind::Name, NodeKind::Name)?);
                }
            }

            Ok(root)
        })
    }

    fn assign(&mut self) -> ParserResult<AstNode> {
        self.rule("assign", |this| {
            let mut target = this.match_node(TokenKind::Name, NodeKind::Name)?;
            if this.la(1)? == TokenKind::Dot {
                let dot = this.match_node(TokenKind::Dot, NodeKind::Dot)?;
                let attr = this.match_node(TokenKind::Name, NodeKind::Name)?;
                target = dot.with_children(vec![target, attr]);
            }

            let root = this.match_node(TokenKind::Assign, NodeKind::Assign)?;
            let expr = this.bool_expr()?;
            this.match_kind(TokenKind::Semicolon)?;

            Ok(root.with_children(vec![target, expr]))
        })
    }

    fn block(&mut self) -> ParserResult<AstNode> {
        self.rule("block", |this| {
            this.match_kind(TokenKind::LeftBrace)?;
            let root = this.statements()?;
            this.match_kind(TokenKind::RightBrace)?;
            Ok(root)
        })
    }

    fn if_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("if_stat", |this| {
            let root = this.match_node(TokenKind::If, NodeKind::If)?;
            this.conditional_tail(root)
        })
    }

    fn elif_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("elif_stat", |this| {
            let root = this.match_node(TokenKind::Elif, NodeKind::Elif)?;
            this.conditional_tail(root)
        })
    }

    fn else_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("else_stat", |this| {
            this.match_kind(TokenKind::Else)?;
            this.block()
        })
    }

    /// Test, block, then an optional `elif` chain or `else` block.
    fn conditional_tail(&mut self, root: AstNode) -> ParserResult<AstNode> {
        let test = self.bool_expr()?;
        let block = self.block()?;
        let mut root = root.with_children(vec![test, block]);

        match self.la(1)? {
            TokenKind::Elif => root.add_child(self.elif_stat()?),
            TokenKind::Else => root.add_child(self.else_stat()?),
            _ => {}
        }

        Ok(root)
    }

    fn while_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("while_stat", |this| {
            let root = this.match_node(TokenKind::While, NodeKind::While)?;
            let test = this.bool_expr()?;
            let block = this.block()?;
            Ok(root.with_children(vec![test, block]))
        })
    }

    fn func_def(&mut self) -> ParserResult<AstNode> {
        self.rule("func_def", |this| {
            let root = this.match_node(TokenKind::Def, NodeKind::Def)?;
            let name = this.match_node(TokenKind::Name, NodeKind::Name)?;
            this.match_kind(TokenKind::LeftParen)?;
            let params = this.id_list()?;
            this.match_kind(TokenKind::RightParen)?;
            let body = this.block()?;
            Ok(root.with_children(vec![name, params, body]))
        })
    }

    fn func_call(&mut self) -> ParserResult<AstNode> {
        self.rule("func_call", |this| {
            let mut root = this.match_node(TokenKind::Name, NodeKind::Call)?;
            this.match_kind(TokenKind::LeftParen)?;
            root.add_child(this.arg_list()?);
            this.match_kind(TokenKind::RightParen)?;
            Ok(root)
        })
    }

    fn return_stat(&mut self) -> ParserResult<AstNode> {
        self.rule("return_stat", |this| {
            let mut root = this.match_node(TokenKind::Return, NodeKind::Return)?;
            root.add_child(this.bool_expr()?);
            this.match_kind(TokenKind::Semicolon)?;
            Ok(root)
        })
    }

    fn class_def(&mut self) -> ParserResult<AstNode> {
        self.rule("class_def", |this| {
            let root = this.match_node(TokenKind::Class, NodeKind::Class)?;
            let name = this.match_node(TokenKind::Name, NodeKind::Name)?;
            let body = this.block()?;
            Ok(root.with_children(vec![name, body]))
        })
    }

    /// `NAME ('.' (NAME | funcCall))+`, nested to the left.
    fn dotted_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("dotted_expr", |this| {
            let mut lhs = this.match_node(TokenKind::Name, NodeKind::Name)?;

            while this.la(1)? == TokenKind::Dot {
                let dot = this.match_node(TokenKind::Dot, NodeKind::Dot)?;
                let rhs = if this.la(2)? == TokenKind::LeftParen {
                    this.func_call()?
                } else {
                    this.match_node(TokenKind::Name, NodeKind::Name)?
                };
                lhs = dot.with_children(vec![lhs, rhs]);
            }

            Ok(lhs)
        })
    }

    pub fn bool_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("bool_expr", |this| {
            this.expect_expression_start("a bool expression")?;
            let mut left = this.and_expr()?;

            while this.la(1)? == TokenKind::Or {
                let root = this.match_node(TokenKind::Or, NodeKind::Or)?;
                let right = this.and_expr()?;
                left = root.with_children(vec![left, right]);
            }

            Ok(left)
        })
    }

    fn and_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("and_expr", |this| {
            this.expect_expression_start("an and expression")?;
            let mut left = this.comp_expr()?;

            while this.la(1)? == TokenKind::And {
                let root = this.match_node(TokenKind::And, NodeKind::And)?;
                let right = this.comp_expr()?;
                left = root.with_children(vec![left, right]);
            }

            Ok(left)
        })
    }

    fn comp_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("comp_expr", |this| {
            this.expect_expression_start("a comp expression")?;
            let mut left = this.add_expr()?;

            while CompareOperator::from_token(this.la(1)?).is_some() {
                let root = this.cmp_op()?;
                let right = this.add_expr()?;
                left = root.with_children(vec![left, right]);
            }

            Ok(left)
        })
    }

    fn add_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("add_expr", |this| {
            this.expect_expression_start("an add expression")?;
            let mut left = this.mult_expr()?;

            while matches!(this.la(1)?, TokenKind::Plus | TokenKind::Minus) {
                let root = this.arith_op("add op ('+' or '-')")?;
                let right = this.mult_expr()?;
                left = root.with_children(vec![left, right]);
            }

            Ok(left)
        })
    }

    fn mult_expr(&mut self) -> ParserResult<AstNode> {
        self.rule("mult_expr", |this| {
            this.expect_expression_start("a mult expression")?;
            let mut left = this.atom()?;

            // 2 * 2 * 2 nests as ((2 * 2) * 2).
            while matches!(
                this.la(1)?,
                TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent
            ) {
                let root = this.arith_op("mult op ('*', '/' or '%')")?;
                let right = this.atom()?;
                left = root.with_children(vec![left, right]);
            }

            Ok(left)
        })
    }

    fn cmp_op(&mut self) -> ParserResult<AstNode> {
        self.rule("cmp_op", |this| {
            let kind = this.la(1)?;
            match CompareOperator::from_token(kind) {
                Some(op) => this.match_node(kind, NodeKind::Compare(op)),
                None => Err(ParserError::new(ParserErrorType::ExpectedOperator {
                    what: "a comparison operator",
                    found: this.lt(1)?.clone(),
                })),
            }
        })
    }

    fn arith_op(&mut self, what: &'static str) -> ParserResult<AstNode> {
        self.rule("arith_op", |this| {
            let kind = this.la(1)?;
            match ArithOperator::from_token(kind) {
                Some(op) => this.match_node(kind, NodeKind::Arith(op)),
                None => Err(ParserError::new(ParserErrorType::ExpectedOperator {
                    what,
                    found: this.lt(1)?.clone(),
                })),
            }
        })
    }

    fn atom(&mut self) -> ParserResult<AstNode> {
        self.rule("atom", |this| {
            let node = match (this.la(1)?, this.la(2)?) {
                (TokenKind::Name, TokenKind::Dot) => this.dotted_expr()?,
                (TokenKind::Name, TokenKind::LeftParen) => this.func_call()?,
                (TokenKind::Name, _) => this.match_node(TokenKind::Name, NodeKind::Name)?,
                (TokenKind::Int, _) => this.match_node(TokenKind::Int, NodeKind::Int)?,
                (TokenKind::Float, _) => this.match_node(TokenKind::Float, NodeKind::Float)?,
                (TokenKind::String, _) => this.match_node(TokenKind::String, NodeKind::Str)?,
                (TokenKind::True, _) => this.match_node(TokenKind::True, NodeKind::Bool)?,
                (TokenKind::False, _) => this.match_node(TokenKind::False, NodeKind::Bool)?,
                (TokenKind::LeftParen, _) => {
                    this.match_kind(TokenKind::LeftParen)?;
                    let expr = this.bool_expr()?;
                    this.match_kind(TokenKind::RightParen)?;
                    expr
                }
                _ => {
                    return Err(ParserError::new(ParserErrorType::ExpectedExpression {
                        what: "an atom",
                        found: this.lt(1)?.clone(),
                    }))
                }
            };
            Ok(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playground_frontend::errors::LexError;

    fn parse(source: &str) -> ParserResult<AstNode> {
        Parser::new(source).parse()
    }

    fn parse_statement_string(source: &str) -> String {
        let root = parse(source).unwrap();
        assert_eq!(root.children.len(), 1);
        root.children[0].ast_string()
    }

    fn run_testing_parser(source: &str) -> ParserResult<Option<AstNode>> {
        let mut parser = Parser::new(source);
        parser.set_testing(true);
        parser.program()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(parse_statement_string("5 + 5 * 5;"), "(+ 5 (* 5 5))");
        assert_eq!(parse_statement_string("5 * 5 + 5;"), "(+ (* 5 5) 5)");
        assert_eq!(parse_statement_string("(5 + 5) * foo;"), "(* (+ 5 5) foo)");
        assert_eq!(
            parse_statement_string("a < b + 1 and c or d;"),
            "(or (and (< a (+ b 1)) c) d)"
        );
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(parse_statement_string("a + b + c;"), "(+ (+ a b) c)");
        assert_eq!(parse_statement_string("8 / 4 % 3;"), "(% (/ 8 4) 3)");
        assert_eq!(parse_statement_string("a or b or c;"), "(or (or a b) c)");
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            parse_statement_string("print(a, 10, \"hi\");"),
            "(print ($ARG_LIST a 10 \"hi\"))"
        );
        assert_eq!(parse_statement_string("print();"), "(print $ARG_LIST)");
        assert_eq!(parse_statement_string("goo = (5 + 5);"), "(= goo (+ 5 5))");
        assert_eq!(parse_statement_string("foo.bar = a;"), "(= (. foo bar) a)");
        assert_eq!(
            parse_statement_string("def add(a, b){ return a + b; }"),
            "(def add ($ID_LIST a b) ($STATEMENTS (return (+ a b))))"
        );
        assert_eq!(
            parse_statement_string("Class Fooby{ poopy; goopy = 5; }"),
            "(Class Fooby ($STATEMENTS poopy (= goopy 5)))"
        );
        assert_eq!(
            parse_statement_string("import \"lib.plgd\";"),
            "(import \"lib.plgd\")"
        );
        assert_eq!(
            parse_statement_string("while a > 0 { a = a - 1; }"),
            "(while (> a 0) ($STATEMENTS (= a (- a 1))))"
        );
    }

    #[test]
    fn test_conditional_chain() {
        assert_eq!(
            parse_statement_string("if a { x; } elif b { y; } elif c { z; } else { w; }"),
            "(if a ($STATEMENTS x) \
             (elif b ($STATEMENTS y) \
             (elif c ($STATEMENTS z) ($STATEMENTS w))))"
        );
    }

    #[test]
    fn test_calls_and_dotted_access() {
        let root = parse("foo(); bar(a); k.Add(f); Outer.Inner.ai; this.x;").unwrap();
        let strings: Vec<_> = root.children.iter().map(|c| c.ast_string()).collect();
        assert_eq!(
            strings,
            vec![
                "(foo $ARG_LIST)",
                "(bar ($ARG_LIST a))",
                "(. k (Add ($ARG_LIST f)))",
                "(. (. Outer Inner) ai)",
                "(. this x)",
            ]
        );
        assert_eq!(root.children[0].kind, NodeKind::Call);
        assert_eq!(root.children[2].children[1].kind, NodeKind::Call);
        assert_eq!(root.children[3].children[1].kind, NodeKind::Name);
    }

    #[test]
    fn test_independently_built_trees_match() {
        let first = parse("x = 1 + 2 * y;").unwrap();
        let second = parse("x =\n  1 + (2 * y);").unwrap();
        assert_eq!(first.ast_string(), second.ast_string());
        assert_ne!(first, second);
    }

    #[test]
    fn test_bad_input_fails() {
        for source in ["5 + ", " + 5", "+", "5 + 5", "5 + + ", "(5 + )) * 3;", "(5 + 3)) * 3;"] {
            assert!(run_testing_parser(source).is_err(), "{}", source);
        }
    }

    #[test]
    fn test_can_parse() {
        let source = "
            5 + 5;
            5 / 5;
            a * a - a;
            (5 + (5 + (5 + 5) + 5)) + 5;
            goo = bar;
            print(5 * (3 + 2));
            { a + b; }
            ((5 + 3) > 2 and True) or (10 <= (2 * 20) and 3 < 2);
            if (5 > 6) { print(a+b); } elif (5 <= 6 ) { print(b); } else { print(a); }
            def barfoo(){}
            Class Goober {
                this.a;
                def Goober(a){ this.a = a; }
                def printA(){ print(this.a); }
            }
            a = foo.bar();
            a = 5 % 3;
            \"strings start statements too\";
        ";
        let root = run_testing_parser(source).unwrap().unwrap();
        assert_eq!(root.children.len(), 14);
    }

    #[test]
    fn test_error_carries_rule_chain() {
        let error = parse("a = 5 +;").unwrap_err();
        assert_eq!(
            error.rules,
            vec![
                "statements",
                "statement",
                "assign",
                "bool_expr",
                "and_expr",
                "comp_expr",
                "add_expr",
                "mult_expr",
            ]
        );
        assert!(matches!(
            error.error,
            ParserErrorType::ExpectedExpression { what: "a mult expression", .. }
        ));
        assert_eq!(error.line(), 1);
    }

    #[test]
    fn test_missing_semicolon_line() {
        let error = parse("a = 1;\nb = 2\nc = 3;").unwrap_err();
        match error.error {
            ParserErrorType::ExpectedToken { expected, found } => {
                assert_eq!(expected, TokenKind::Semicolon);
                assert_eq!(found.text, "c");
                assert_eq!(found.line(), 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_trailing_input() {
        let error = parse("a; }").unwrap_err();
        assert!(error.rules.is_empty());
        assert!(matches!(error.error, ParserErrorType::TrailingInput(_)));
    }

    #[test]
    fn test_lex_error_propagates() {
        let error = parse("a = 1.;").unwrap_err();
        assert_eq!(
            error.error,
            ParserErrorType::Lexer(LexError::MalformedFloat {
                text: "1.".to_owned(),
                line: 1
            })
        );
    }

    #[test]
    fn test_non_testing_mode_swallows_errors() {
        let mut parser = Parser::new("5 + ;");
        assert_eq!(parser.program(), Ok(None));
    }
}
