//! Token types

use crate::util::span::Position;
use std::fmt;

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Eof,
    Illegal,

    // Identifiers and literals
    Ident,
    Int,
    Float,
    Str,

    // Arithmetic operators
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Caret,

    // Comparison operators
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Assign,

    // Delimiters
    Colon,
    Comma,
    Semicolon,
    Arrow,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Keywords
    Let,
    Fn,
    Return,
    If,
    Elif,
    Else,
    True,
    False,

    // Built-in type names (`int`, `float`, ...)
    TypeName,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Token
///
/// A classified lexical unit: kind, raw literal text and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            position,
        }
    }

    /// Eof sentinel token (end of input is a token, not an absence)
    pub fn eof(position: Position) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }
}

/// Map an identifier to its keyword or type-name kind, if any
pub fn lookup_ident(ident: &str) -> TokenKind {
    match ident {
        "let" => TokenKind::Let,
        "fn" => TokenKind::Fn,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "int" | "float" => TokenKind::TypeName,
        _ => TokenKind::Ident,
    }
}
