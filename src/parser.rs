use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;

use crate::ast::{ASTNode, Expression, Function, Prototype, MAX_EXPR_DEPTH};
use crate::lexer::{Lexer, Token};

lazy_static! {
    /// binary operators and how tightly they bind, higher first
    pub static ref DEFAULT_PRECEDENCE: HashMap<char, i32> = {
        let mut operator_precedence = HashMap::new();
        operator_precedence.insert('<', 10);
        operator_precedence.insert('+', 20);
        operator_precedence.insert('-', 20);
        operator_precedence.insert('*', 40);
        operator_precedence
    };
}

#[derive(Debug, PartialEq, Clone, thiserror::Error)]
pub enum ParserError {
    #[error("expected an expression, found {0}")]
    ExpectedExpression(Token),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: &'static str, found: Token },
    #[error("duplicate parameter '{param}' in prototype '{name}'")]
    DuplicateParameter { name: String, param: String },
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

pub type PartialParseResult = Result<Expression, ParserError>;

/// Recursive-descent parser with one token of lookahead.
///
/// Every routine either returns a complete node or an error; on error the
/// lookahead is left on the token that caused it.
pub struct Parser<I: Iterator<Item = char>> {
    lexer: Lexer<I>,
    current: Token,
    /// expressions currently being parsed, outermost included
    nesting: usize,
    pub operator_precedence: HashMap<char, i32>,
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// The lookahead reads as end of input until the first call to
    /// [`Parser::next_token`].
    pub fn new(lexer: Lexer<I>) -> Self {
        Parser {
            lexer,
            current: Token::Eof,
            nesting: 0,
            operator_precedence: DEFAULT_PRECEDENCE.clone(),
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn next_token(&mut self) -> &Token {
        self.current = self.lexer.next_token();
        &self.current
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T, ParserError> {
        Err(ParserError::UnexpectedToken {
            expected,
            found: self.current.clone(),
        })
    }

    fn expect_char(&mut self, c: char, expected: &'static str) -> Result<(), ParserError> {
        if self.current != Token::Char(c) {
            return self.unexpected(expected);
        }
        self.next_token();
        Ok(())
    }

    /// the current token as a binary operator, if the table knows it
    fn binary_operator(&self) -> Option<(char, i32)> {
        match self.current {
            Token::Char(op) if op.is_ascii() => match self.operator_precedence.get(&op) {
                Some(&precedence) if precedence > 0 => Some((op, precedence)),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_number(&mut self, value: f64) -> PartialParseResult {
        self.next_token();
        Ok(Expression::Literal(value))
    }

    fn parse_identifier(&mut self, ident: String) -> PartialParseResult {
        self.next_token();
        if self.current != Token::Char('(') {
            return Ok(Expression::Variable(ident));
        }

        self.next_token();
        let mut args = Vec::new();
        if self.current != Token::Char(')') {
            loop {
                args.push(self.parse_expr()?);

                if self.current == Token::Char(')') {
                    break;
                }
                if self.current != Token::Char(',') {
                    return self.unexpected("')' or ',' in argument list");
                }
                self.next_token();
            }
        }
        self.next_token();

        let call = Expression::Call(ident, args);
        if call.depth() > MAX_EXPR_DEPTH {
            return Err(ParserError::TooDeep(MAX_EXPR_DEPTH));
        }
        Ok(call)
    }

    fn parse_nested(&mut self) -> PartialParseResult {
        self.next_token();
        let res = self.parse_expr()?;
        self.expect_char(')', "')'")?;
        Ok(res)
    }

    fn parse_primary(&mut self) -> PartialParseResult {
        match &self.current {
            Token::Number(num) => {
                let num = *num;
                self.parse_number(num)
            }
            Token::Ident(ident) => {
                let ident = ident.clone();
                self.parse_identifier(ident)
            }
            Token::Char('(') => self.parse_nested(),
            tok => Err(ParserError::ExpectedExpression(tok.clone())),
        }
    }

    fn parse_rhs(&mut self, expr_precedence: i32, lhs: Expression) -> PartialParseResult {
        let mut depth = lhs.depth();
        let mut result = lhs;

        loop {
            let (operator, precedence) = match self.binary_operator() {
                Some((op, pr)) if pr >= expr_precedence => (op, pr),
                _ => return Ok(result),
            };
            self.next_token();

            let mut rhs = self.parse_primary()?;

            if let Some((_, next_precedence)) = self.binary_operator() {
                if precedence < next_precedence {
                    rhs = self.parse_rhs(precedence + 1, rhs)?;
                }
            }

            depth = 1 + depth.max(rhs.depth());
            if depth > MAX_EXPR_DEPTH {
                return Err(ParserError::TooDeep(MAX_EXPR_DEPTH));
            }
            result = Expression::Binary(operator, Box::new(result), Box::new(rhs));
        }
    }

    pub fn parse_expr(&mut self) -> PartialParseResult {
        if self.nesting >= MAX_EXPR_DEPTH {
            return Err(ParserError::TooDeep(MAX_EXPR_DEPTH));
        }

        self.nesting += 1;
        let res = self
            .parse_primary()
            .and_then(|lhs| self.parse_rhs(0, lhs));
        self.nesting -= 1;
        res
    }

    pub fn parse_prototype(&mut self) -> Result<Prototype, ParserError> {
        let name = match &self.current {
            Token::Ident(name) => name.clone(),
            _ => return self.unexpected("function name in prototype"),
        };

        self.next_token();
        if self.current != Token::Char('(') {
            return self.unexpected("'(' in prototype");
        }

        let mut args: Vec<String> = Vec::new();
        while let Token::Ident(arg) = self.next_token() {
            if args.contains(arg) {
                return Err(ParserError::DuplicateParameter {
                    name,
                    param: arg.clone(),
                });
            }
            args.push(arg.clone());
        }
        self.expect_char(')', "')' in prototype")?;

        Ok(Prototype { name, args })
    }

    pub fn parse_definition(&mut self) -> Result<Function, ParserError> {
        self.next_token();
        let prototype = self.parse_prototype()?;
        let body = self.parse_expr()?;
        Ok(Function { prototype, body })
    }

    pub fn parse_extern(&mut self) -> Result<Prototype, ParserError> {
        self.next_token();
        self.parse_prototype()
    }

    pub fn parse_top_level_expr(&mut self) -> Result<Function, ParserError> {
        let body = self.parse_expr()?;
        Ok(Function::anonymous(body))
    }

    /// parse a definition, extern or top-level expression depending on the
    /// current token
    pub fn parse_unit(&mut self) -> Result<ASTNode, ParserError> {
        match self.current {
            Token::Def => {
                debug!("parsing definition");
                self.parse_definition().map(ASTNode::Function)
            }
            Token::Extern => {
                debug!("parsing extern");
                self.parse_extern().map(ASTNode::Extern)
            }
            _ => {
                debug!("parsing top-level expression");
                self.parse_top_level_expr().map(ASTNode::Function)
            }
        }
    }

    /// parse every unit up to end of input, stopping at the first error
    pub fn parse_all(&mut self) -> Result<Vec<ASTNode>, ParserError> {
        let mut ast = Vec::new();
        self.next_token();

        loop {
            match self.current {
                Token::Eof => break,
                Token::Char(';') => {
                    self.next_token();
                }
                _ => ast.push(self.parse_unit()?),
            }
        }

        Ok(ast)
    }
}

pub fn parse_str(input: &str) -> Result<Vec<ASTNode>, ParserError> {
    Parser::new(Lexer::new(input.chars())).parse_all()
}
