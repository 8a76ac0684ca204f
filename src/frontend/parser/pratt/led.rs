//! Infix (led) handlers
//!
//! Binary operators and call argument lists. The handler is invoked with the
//! already-parsed left expression and the cursor on the operator token.

use super::precedence::Precedence;
use crate::frontend::lexer::tokens::TokenKind;
use crate::frontend::parser::ast::{BinOp, Expr};
use crate::frontend::parser::{ParseError, Parser};

impl Parser {
    pub(crate) fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur_token().kind {
            TokenKind::LParen => self.parse_call_expression(left),
            _ => self.parse_binary_expression(left),
        }
    }

    fn parse_binary_expression(&mut self, left: Expr) -> Option<Expr> {
        let op = match self.cur_token().kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Asterisk => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::Caret => BinOp::Pow,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::NotEq => BinOp::Neq,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::GtEq => BinOp::Ge,
            // unreachable while the precedence table and this list agree
            _ => return Some(left),
        };

        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expr::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `IDENT ( ARGS? )` - the callee must already be a plain identifier
    fn parse_call_expression(&mut self, callee: Expr) -> Option<Expr> {
        let name = match callee {
            Expr::Ident(name) => name,
            _ => {
                let position = self.cur_token().position;
                self.error(ParseError::InvalidCallTarget { position });
                return None;
            }
        };

        let args = self.parse_call_args()?;
        Some(Expr::Call { callee: name, args })
    }

    /// Comma-separated argument list, cursor on the opening paren
    fn parse_call_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();

        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(args);
        }

        self.next_token();
        args.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            args.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(args)
    }
}
