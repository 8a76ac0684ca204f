//! Lexer
//!
//! Turns source text into the flat token stream the parser consumes.
//! Scans one character at a time, tracking line and column for every token.

pub mod tokens;

use self::tokens::{lookup_ident, Token, TokenKind};
use crate::util::span::Position;
use std::iter::Peekable;
use std::str::Chars;

/// Main lexer structure
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Current position
    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        match self.chars.next() {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
                Some('\n')
            }
            Some(c) => {
                self.column += 1;
                Some(c)
            }
            None => None,
        }
    }

    /// Peek at next character
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Skip whitespace and `//` line comments
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '/' => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() == Some(&'/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let position = self.position();
        let c = match self.advance() {
            Some(c) => c,
            None => return Token::eof(position),
        };

        match c {
            '+' => Token::new(TokenKind::Plus, "+", position),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    Token::new(TokenKind::Arrow, "->", position)
                } else {
                    Token::new(TokenKind::Minus, "-", position)
                }
            }
            '*' => Token::new(TokenKind::Asterisk, "*", position),
            '/' => Token::new(TokenKind::Slash, "/", position),
            '%' => Token::new(TokenKind::Percent, "%", position),
            '^' => Token::new(TokenKind::Caret, "^", position),
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::EqEq, "==", position)
                } else {
                    Token::new(TokenKind::Assign, "=", position)
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::NotEq, "!=", position)
                } else {
                    Token::new(TokenKind::Illegal, "!", position)
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::LtEq, "<=", position)
                } else {
                    Token::new(TokenKind::Lt, "<", position)
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    Token::new(TokenKind::GtEq, ">=", position)
                } else {
                    Token::new(TokenKind::Gt, ">", position)
                }
            }
            ':' => Token::new(TokenKind::Colon, ":", position),
            ',' => Token::new(TokenKind::Comma, ",", position),
            ';' => Token::new(TokenKind::Semicolon, ";", position),
            '(' => Token::new(TokenKind::LParen, "(", position),
            ')' => Token::new(TokenKind::RParen, ")", position),
            '{' => Token::new(TokenKind::LBrace, "{", position),
            '}' => Token::new(TokenKind::RBrace, "}", position),
            '"' => self.scan_string(position),
            c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(c, position),
            c if c.is_ascii_digit() => self.scan_number(c, position),
            c => Token::new(TokenKind::Illegal, c.to_string(), position),
        }
    }

    /// Scan the whole source into a token vector, Eof included
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn scan_identifier(&mut self, first: char, position: Position) -> Token {
        let mut literal = String::from(first);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(lookup_ident(&literal), literal, position)
    }

    fn scan_number(&mut self, first: char, position: Position) -> Token {
        let mut literal = String::from(first);
        let mut dots = 0usize;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                literal.push(c);
                self.advance();
            } else if c == '.' {
                dots += 1;
                literal.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = match dots {
            0 => TokenKind::Int,
            1 => TokenKind::Float,
            _ => TokenKind::Illegal,
        };
        Token::new(kind, literal, position)
    }

    fn scan_string(&mut self, position: Position) -> Token {
        let mut literal = String::new();
        loop {
            match self.advance() {
                Some('"') => return Token::new(TokenKind::Str, literal, position),
                Some(c) => literal.push(c),
                // unterminated string
                None => return Token::new(TokenKind::Illegal, literal, position),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_let_statement() {
        assert_eq!(
            kinds("let x: int = 5;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::TypeName,
                TokenKind::Assign,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_operators() {
        assert_eq!(
            kinds("+ - * / % ^ == != < <= > >= = ->"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Asterisk,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Caret,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Assign,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::new("let x\nfn y").tokenize();
        assert_eq!(tokens[0].position.line, 1);
        assert_eq!(tokens[0].position.column, 1);
        assert_eq!(tokens[1].position.column, 5);
        assert_eq!(tokens[2].position.line, 2);
        assert_eq!(tokens[2].position.column, 1);
        assert_eq!(tokens[3].position.column, 4);
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("// heading\nlet // trailing\n"),
            vec![TokenKind::Let, TokenKind::Eof]
        );
    }

    #[test]
    fn float_and_int_literals() {
        let tokens = Lexer::new("5 3.14 1.2.3").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].literal, "3.14");
        assert_eq!(tokens[2].kind, TokenKind::Illegal);
    }

    #[test]
    fn string_literal() {
        let tokens = Lexer::new("\"hi there\"").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, "hi there");
    }

    #[test]
    fn unknown_character_is_illegal() {
        let tokens = Lexer::new("@").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
        assert_eq!(tokens[0].literal, "@");
    }
}
