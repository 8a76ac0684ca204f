//! Parser unit tests


use crate::frontend::parser::ast::{Expr, Program, Stmt};
use crate::frontend::parser::{ParseError, Parser};

/// Parse source and return the program with its diagnostics
pub(super) fn parse(source: &str) -> (Program, Vec<ParseError>) {
    Parser::from_source(source).parse_program()
}

/// Parse source expected to be a single clean expression statement
pub(super) fn parse_expr(source: &str) -> Expr {
    let (program, errors) = parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
    assert_eq!(program.statements.len(), 1, "expected one statement");
    match program.statements.into_iter().next() {
        Some(Stmt::Expression(expr)) => expr,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}
