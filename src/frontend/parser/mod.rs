//! Parser
//!
//! Recursive-descent statement parsing on top of a Pratt expression parser.
//! The parser holds exactly two tokens (`cur_token`, `peek_token`) at all
//! times. It never fails hard: every violation is recorded as a diagnostic,
//! the offending construct yields `None`, and the enclosing sequence simply
//! drops it and carries on from wherever the cursor ended up.

pub mod ast;
pub mod pratt;

#[cfg(test)]
mod tests;

use self::ast::{Block, Param, Program, Stmt};
use self::pratt::precedence::Precedence;
use crate::frontend::lexer::tokens::{Token, TokenKind};
use crate::frontend::lexer::Lexer;
use crate::util::span::Position;
use thiserror::Error;

/// Parse diagnostic
///
/// Ordered, human-readable; none of these aborts the parse as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got {found} instead")]
    ExpectedToken {
        expected: TokenKind,
        found: TokenKind,
        position: Position,
    },
    #[error("no prefix parse function for {kind} found")]
    NoPrefixFn { kind: TokenKind, position: Position },
    #[error("could not parse `{literal}` as {target}")]
    InvalidLiteral {
        literal: String,
        target: &'static str,
        position: Position,
    },
    #[error("call target must be a plain identifier")]
    InvalidCallTarget { position: Position },
}

/// The parser
pub struct Parser {
    tokens: std::vec::IntoIter<Token>,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a parser over an already-scanned token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut parser = Self {
            tokens: tokens.into_iter(),
            cur_token: Token::eof(Position::dummy()),
            peek_token: Token::eof(Position::dummy()),
            errors: Vec::new(),
        };
        // prime the two-token window
        parser.next_token();
        parser.next_token();
        parser
    }

    /// Convenience constructor straight from source text
    pub fn from_source(source: &str) -> Self {
        Self::new(Lexer::new(source).tokenize())
    }

    /// Parse a whole program, returning it together with the ordered list of
    /// parse diagnostics
    pub fn parse_program(mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::default();

        while self.cur_token.kind != TokenKind::Eof {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }

        (program, self.errors)
    }

    // ===== token window =====

    pub(crate) fn next_token(&mut self) {
        let next = self
            .tokens
            .next()
            .unwrap_or_else(|| Token::eof(self.peek_token.position));
        self.cur_token = std::mem::replace(&mut self.peek_token, next);
    }

    pub(crate) fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur_token.kind == kind
    }

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek_token.kind == kind
    }

    pub(crate) fn cur_token(&self) -> &Token {
        &self.cur_token
    }

    /// Advance if the peek token has the expected kind; otherwise record a
    /// diagnostic and leave the cursor alone
    pub(crate) fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(ParseError::ExpectedToken {
                expected: kind,
                found: self.peek_token.kind,
                position: self.peek_token.position,
            });
            false
        }
    }

    pub(crate) fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur_token.kind)
    }

    pub(crate) fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek_token.kind)
    }

    pub(crate) fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    // ===== statements =====

    fn parse_statement(&mut self) -> Option<Stmt> {
        // `name = ...` wins over generic dispatch
        if self.cur_is(TokenKind::Ident) && self.peek_is(TokenKind::Assign) {
            return self.parse_assign_statement();
        }
        match self.cur_token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Fn => self.parse_function_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Expression(expr))
    }

    /// `let IDENT : TYPE = EXPR ;`
    fn parse_let_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::Colon) {
            return None;
        }
        if !self.expect_peek(TokenKind::TypeName) {
            return None;
        }
        let ty = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        // skip forward to the statement terminator
        while !self.cur_is(TokenKind::Semicolon) && !self.cur_is(TokenKind::Eof) {
            self.next_token();
        }

        Some(Stmt::Let { name, ty, value })
    }

    /// `fn IDENT ( PARAMS? ) -> TYPE { BLOCK }`
    fn parse_function_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let params = self.parse_function_params()?;

        if !self.expect_peek(TokenKind::Arrow) {
            return None;
        }
        if !self.expect_peek(TokenKind::TypeName) {
            return None;
        }
        let return_type = self.cur_token.literal.clone();

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Stmt::Function {
            name,
            params,
            return_type,
            body,
        })
    }

    /// `IDENT : TYPE (, IDENT : TYPE)*`, cursor on the opening paren
    fn parse_function_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(params);
        }

        loop {
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            let name = self.cur_token.literal.clone();
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            if !self.expect_peek(TokenKind::TypeName) {
                return None;
            }
            params.push(Param {
                name,
                ty: self.cur_token.literal.clone(),
            });

            if self.peek_is(TokenKind::Comma) {
                self.next_token();
            } else {
                break;
            }
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(params)
    }

    /// `return EXPR ;`
    fn parse_return_statement(&mut self) -> Option<Stmt> {
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::Return { value })
    }

    /// `{ STMT* }`, cursor on the opening brace; statements that fail to
    /// parse are dropped from the block
    pub(crate) fn parse_block_statement(&mut self) -> Block {
        let mut block = Block::default();
        self.next_token();

        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                block.statements.push(stmt);
            }
            self.next_token();
        }

        block
    }

    /// `IDENT = EXPR` - the grammar does not require a trailing semicolon;
    /// the cursor advances exactly once past the value
    fn parse_assign_statement(&mut self) -> Option<Stmt> {
        let name = self.cur_token.literal.clone();

        self.next_token(); // onto '='
        self.next_token(); // onto the first token of the value

        let value = self.parse_expression(Precedence::Lowest)?;

        self.next_token();

        Some(Stmt::Assign { name, value })
    }
}
