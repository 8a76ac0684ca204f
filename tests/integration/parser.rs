//! Parsing through the public pipeline API

use karst::frontend::parser::ast::{BinOp, ElseArm, Expr, Stmt};
use karst::parse_source;

#[test]
fn clean_program_parses_without_diagnostics() {
    let source = "let x: int = 5; let y: int = 10; fn add() -> int { return x + y; }";
    let (program, errors) = parse_source(source);
    assert!(errors.is_empty());
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn precedence_shapes_survive_the_pipeline() {
    let (program, errors) = parse_source("1 + 2 * 3;");
    assert!(errors.is_empty());
    match &program.statements[0] {
        Stmt::Expression(Expr::Infix { op, right, .. }) => {
            assert_eq!(*op, BinOp::Add);
            assert!(matches!(&**right, Expr::Infix { op: BinOp::Mul, .. }));
        }
        other => panic!("expected an infix statement, got {other:?}"),
    }
}

#[test]
fn diagnostics_come_back_in_source_order() {
    let (_, errors) = parse_source("let 1; return 2");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].to_string().contains("Ident"));
    assert!(errors[1].to_string().contains("Semicolon"));
}

#[test]
fn elif_else_chain_parses_depth_two() {
    let (program, errors) = parse_source("if a { 1; } elif b { 2; } else { 3; }");
    assert!(errors.is_empty());
    let outer = match &program.statements[0] {
        Stmt::Expression(expr @ Expr::If { .. }) => expr,
        other => panic!("expected if, got {other:?}"),
    };
    let Expr::If { alternative, .. } = outer else {
        unreachable!()
    };
    match alternative.as_deref() {
        Some(ElseArm::Elif(Expr::If { alternative, .. })) => {
            assert!(matches!(alternative.as_deref(), Some(ElseArm::Else(_))));
        }
        other => panic!("expected elif nesting, got {other:?}"),
    }
}

#[test]
fn ast_serializes_to_json() {
    let (program, errors) = parse_source("let x: int = 1;");
    assert!(errors.is_empty());
    let json = serde_json::to_string(&program).expect("AST must serialize");
    assert!(json.contains("\"Let\""));
    assert!(json.contains("\"x\""));
}
